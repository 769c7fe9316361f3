// Copyright 2024 Kafka Client Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Primitive wire codecs for the legacy Kafka request/response protocol.
//!
//! Every multi-byte integer is big-endian; strings are `int16`-length
//! prefixed UTF-8 (`-1` means null); byte arrays and arrays of structs are
//! `int32`-length/count prefixed (`-1` means null). There are no flexible
//! versions or tagged fields in the legacy format this crate speaks.

pub mod error_code;
pub mod codec;
pub mod compression;
pub mod consts;
pub mod header;
pub mod messageset;
pub mod request;
pub mod schemata;

pub use codec::Decodable;
pub use codec::Encodable;

pub type IoResult<T> = std::io::Result<T>;

pub(crate) fn err_malformed<E>(message: E) -> std::io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    std::io::Error::new(std::io::ErrorKind::InvalidData, message)
}

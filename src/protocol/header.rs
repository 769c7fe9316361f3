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

use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;

use super::codec::Decoder;
use super::codec::Encoder;
use super::codec::FixedSizeEncoder;
use super::codec::Int16;
use super::codec::Int32;
use super::codec::NullableString;
use super::IoResult;

/// Precedes every request on the wire, after the outer 4-byte length.
#[derive(Debug, Clone)]
pub struct RequestHeader {
    pub api_key: i16,
    pub api_version: i16,
    pub correlation_id: i32,
    pub client_id: Option<String>,
}

impl RequestHeader {
    pub fn read<B: ReadBytesExt>(buf: &mut B) -> IoResult<RequestHeader> {
        Ok(RequestHeader {
            api_key: Int16.decode(buf)?,
            api_version: Int16.decode(buf)?,
            correlation_id: Int32.decode(buf)?,
            client_id: NullableString.decode(buf)?,
        })
    }

    pub fn write<B: WriteBytesExt>(&self, buf: &mut B) -> IoResult<()> {
        Int16.encode(buf, self.api_key)?;
        Int16.encode(buf, self.api_version)?;
        Int32.encode(buf, self.correlation_id)?;
        NullableString.encode(buf, self.client_id.as_deref())?;
        Ok(())
    }

    pub fn calculate_size(&self) -> usize {
        2 * Int16::SIZE + Int32::SIZE + NullableString.calculate_size(self.client_id.as_deref())
    }
}

/// Precedes every response on the wire, after the outer 4-byte length.
#[derive(Debug, Clone)]
pub struct ResponseHeader {
    pub correlation_id: i32,
}

impl ResponseHeader {
    pub fn read<B: ReadBytesExt>(buf: &mut B) -> IoResult<ResponseHeader> {
        Ok(ResponseHeader {
            correlation_id: Int32.decode(buf)?,
        })
    }

    pub fn write<B: WriteBytesExt>(&self, buf: &mut B) -> IoResult<()> {
        Int32.encode(buf, self.correlation_id)
    }

    pub fn calculate_size(&self) -> usize {
        Int32::SIZE
    }
}

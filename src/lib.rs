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

//! A client library for a distributed partitioned log's legacy wire
//! protocol: produce, fetch, and list offsets directly over TCP, with no
//! broker-side code in this crate.
//!
//! The layers, leaves first: [`numerics`] (64-bit pack/unpack), [`protocol`]
//! (the four request/response schemata, message-set encode/decode,
//! compression), [`transport`] (one TCP endpoint), [`connection`] (the
//! cluster-aware multiplexer and its retry/backoff state machine), and
//! [`client`] (the thin `produce`/`fetch`/`list_offsets` façades). See
//! [`config::ClientConfig`] for the recognized configuration knobs.

pub mod client;
pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod numerics;
pub mod protocol;
pub mod transport;

pub use client::fetch;
pub use client::list_offsets;
pub use client::produce;
pub use client::Consumer;
pub use client::Message;
pub use client::Producer;
pub use config::ClientConfig;
pub use connection::Connection;
pub use connection::FetchResult;
pub use connection::ProduceAck;
pub use error::ClientError;
pub use protocol::messageset::Record;
pub use transport::IpVersion;
pub use transport::TcpTransport;

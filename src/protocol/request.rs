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

//! Ties a request/response schema struct to its [`ApiKey`] and wraps it
//! with the header and the outer 4-byte length prefix Transport expects.

use std::io::Cursor;

use crate::protocol::codec::Decoder as _;
use crate::protocol::codec::Encoder as _;
use crate::protocol::codec::FixedSizeEncoder;
use crate::protocol::codec::Int32;
use crate::protocol::header::RequestHeader;
use crate::protocol::header::ResponseHeader;
use crate::protocol::schemata::api_versions::ApiVersionsRequest;
use crate::protocol::schemata::api_versions::ApiVersionsResponse;
use crate::protocol::schemata::fetch::FetchRequest;
use crate::protocol::schemata::fetch::FetchResponse;
use crate::protocol::schemata::metadata::MetadataRequest;
use crate::protocol::schemata::metadata::MetadataResponse;
use crate::protocol::schemata::offset::OffsetRequest;
use crate::protocol::schemata::offset::OffsetResponse;
use crate::protocol::schemata::produce::ProduceRequest;
use crate::protocol::schemata::produce::ProduceResponse;
use crate::protocol::schemata::ApiKey;
use crate::protocol::Decodable;
use crate::protocol::Encodable;
use crate::protocol::IoResult;

#[derive(Debug, Clone)]
pub enum RequestBody {
    Produce(ProduceRequest),
    Fetch(FetchRequest),
    Offset(OffsetRequest),
    Metadata(MetadataRequest),
    ApiVersions(ApiVersionsRequest),
}

impl RequestBody {
    pub fn api_key(&self) -> ApiKey {
        match self {
            RequestBody::Produce(_) => ApiKey::Produce,
            RequestBody::Fetch(_) => ApiKey::Fetch,
            RequestBody::Offset(_) => ApiKey::ListOffsets,
            RequestBody::Metadata(_) => ApiKey::Metadata,
            RequestBody::ApiVersions(_) => ApiKey::ApiVersions,
        }
    }

    fn write(&self, buf: &mut Vec<u8>, version: i16) -> IoResult<()> {
        match self {
            RequestBody::Produce(r) => r.write(buf, version),
            RequestBody::Fetch(r) => r.write(buf, version),
            RequestBody::Offset(r) => r.write(buf, version),
            RequestBody::Metadata(r) => r.write(buf, version),
            RequestBody::ApiVersions(r) => r.write(buf, version),
        }
    }

    fn calculate_size(&self, version: i16) -> usize {
        match self {
            RequestBody::Produce(r) => r.calculate_size(version),
            RequestBody::Fetch(r) => r.calculate_size(version),
            RequestBody::Offset(r) => r.calculate_size(version),
            RequestBody::Metadata(r) => r.calculate_size(version),
            RequestBody::ApiVersions(r) => r.calculate_size(version),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ResponseBody {
    Produce(ProduceResponse),
    Fetch(FetchResponse),
    Offset(OffsetResponse),
    Metadata(MetadataResponse),
    ApiVersions(ApiVersionsResponse),
}

impl ResponseBody {
    fn write(&self, buf: &mut Vec<u8>, version: i16) -> IoResult<()> {
        match self {
            ResponseBody::Produce(r) => r.write(buf, version),
            ResponseBody::Fetch(r) => r.write(buf, version),
            ResponseBody::Offset(r) => r.write(buf, version),
            ResponseBody::Metadata(r) => r.write(buf, version),
            ResponseBody::ApiVersions(r) => r.write(buf, version),
        }
    }
}

/// Encodes `header` and `body` into a response frame's payload, the shape
/// [`TcpTransport::receive`](crate::transport::TcpTransport) hands back
/// after stripping the length prefix -- the inverse of [`decode_response`],
/// used by tests to build [`crate::transport::mock::MockTransport`]
/// fixtures without a real broker.
pub fn encode_response(header: &ResponseHeader, body: &ResponseBody, version: i16) -> IoResult<Vec<u8>> {
    let mut out = Vec::new();
    header.write(&mut out)?;
    body.write(&mut out, version)?;
    Ok(out)
}

/// Encodes `header` and `body` into a single frame, including the leading
/// 4-byte length prefix Transport reads before anything else.
pub fn encode_request(header: &RequestHeader, body: &RequestBody, version: i16) -> IoResult<Vec<u8>> {
    let payload_size = header.calculate_size() + body.calculate_size(version);
    let mut out = Vec::with_capacity(Int32::SIZE + payload_size);
    Int32.encode(&mut out, payload_size as i32)?;
    header.write(&mut out)?;
    body.write(&mut out, version)?;
    Ok(out)
}

/// Decodes one response frame's payload (the length prefix has already
/// been stripped and used to size `data` by Transport).
pub fn decode_response(
    api_key: ApiKey,
    version: i16,
    data: &[u8],
) -> IoResult<(ResponseHeader, ResponseBody)> {
    let mut cursor = Cursor::new(data);
    let header = ResponseHeader::read(&mut cursor)?;
    let body = match api_key {
        ApiKey::Produce => ResponseBody::Produce(ProduceResponse::read(&mut cursor, version)?),
        ApiKey::Fetch => ResponseBody::Fetch(FetchResponse::read(&mut cursor, version)?),
        ApiKey::ListOffsets => ResponseBody::Offset(OffsetResponse::read(&mut cursor, version)?),
        ApiKey::Metadata => ResponseBody::Metadata(MetadataResponse::read(&mut cursor, version)?),
        ApiKey::ApiVersions => {
            ResponseBody::ApiVersions(ApiVersionsResponse::read(&mut cursor, version)?)
        }
    };
    Ok((header, body))
}

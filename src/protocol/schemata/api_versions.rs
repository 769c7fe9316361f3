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

//! Supplemented beyond spec.md's named operations: probes broker-supported
//! api versions ahead of the optional SASL pre-handshake (spec.md §4.4).

use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;

use crate::protocol::codec::Decodable;
use crate::protocol::codec::Decoder;
use crate::protocol::codec::Encodable;
use crate::protocol::codec::Encoder;
use crate::protocol::codec::FixedSizeEncoder;
use crate::protocol::codec::Int16;
use crate::protocol::codec::Int32;
use crate::protocol::error_code::ErrorCode;
use crate::protocol::IoResult;

#[derive(Debug, Clone, Default)]
pub struct ApiVersionsRequest;

impl Encodable for ApiVersionsRequest {
    fn write<B: WriteBytesExt>(&self, _buf: &mut B, _version: i16) -> IoResult<()> {
        Ok(())
    }

    fn calculate_size(&self, _version: i16) -> usize {
        0
    }
}

impl Decodable for ApiVersionsRequest {
    fn read<B: ReadBytesExt>(_buf: &mut B, _version: i16) -> IoResult<Self> {
        Ok(ApiVersionsRequest)
    }
}

#[derive(Debug, Clone)]
pub struct ApiVersion {
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
}

#[derive(Debug, Clone)]
pub struct ApiVersionsResponse {
    pub error_code: ErrorCode,
    pub api_versions: Vec<ApiVersion>,
}

impl Decodable for ApiVersionsResponse {
    fn read<B: ReadBytesExt>(buf: &mut B, _version: i16) -> IoResult<Self> {
        let error_code = ErrorCode::from_code(Int16.decode(buf)?);
        let count = Int32.decode(buf)?;
        let mut api_versions = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            api_versions.push(ApiVersion {
                api_key: Int16.decode(buf)?,
                min_version: Int16.decode(buf)?,
                max_version: Int16.decode(buf)?,
            });
        }
        Ok(ApiVersionsResponse {
            error_code,
            api_versions,
        })
    }
}

impl Encodable for ApiVersionsResponse {
    fn write<B: WriteBytesExt>(&self, buf: &mut B, _version: i16) -> IoResult<()> {
        Int16.encode(buf, self.error_code.code())?;
        Int32.encode(buf, self.api_versions.len() as i32)?;
        for api_version in &self.api_versions {
            Int16.encode(buf, api_version.api_key)?;
            Int16.encode(buf, api_version.min_version)?;
            Int16.encode(buf, api_version.max_version)?;
        }
        Ok(())
    }

    fn calculate_size(&self, _version: i16) -> usize {
        Int16::SIZE + Int32::SIZE + self.api_versions.len() * Int16::SIZE * 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_api_versions_response() {
        let resp = ApiVersionsResponse {
            error_code: ErrorCode::from_code(0),
            api_versions: vec![ApiVersion {
                api_key: 0,
                min_version: 0,
                max_version: 2,
            }],
        };
        let mut buf = Vec::new();
        resp.write(&mut buf, 0).unwrap();
        assert_eq!(buf.len(), resp.calculate_size(0));
        let decoded = ApiVersionsResponse::read(&mut std::io::Cursor::new(buf), 0).unwrap();
        assert_eq!(decoded.api_versions[0].max_version, 2);
    }
}

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

pub mod api_versions;
pub mod fetch;
pub mod metadata;
pub mod offset;
pub mod produce;

use crate::error::ClientError;

/// The legacy api keys this client speaks. `ApiVersions` is supplemented
/// beyond spec.md's named operations: it is used only by the optional SASL
/// pre-handshake to probe which versions a broker supports.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ApiKey {
    Produce,
    Fetch,
    ListOffsets,
    Metadata,
    ApiVersions,
}

impl ApiKey {
    pub fn code(self) -> i16 {
        match self {
            ApiKey::Produce => 0,
            ApiKey::Fetch => 1,
            ApiKey::ListOffsets => 2,
            ApiKey::Metadata => 3,
            ApiKey::ApiVersions => 18,
        }
    }

    pub fn from_code(code: i16) -> Result<ApiKey, ClientError> {
        match code {
            0 => Ok(ApiKey::Produce),
            1 => Ok(ApiKey::Fetch),
            2 => Ok(ApiKey::ListOffsets),
            3 => Ok(ApiKey::Metadata),
            18 => Ok(ApiKey::ApiVersions),
            other => Err(ClientError::UnknownApiKey(other)),
        }
    }
}

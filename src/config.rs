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

//! The configuration knobs of spec.md §6, loadable from TOML the way
//! `cmd/morax/src/config.rs` loads its own `Config`.

use serde::Deserialize;
use serde::Serialize;

use crate::protocol::compression::CompressionType;
use crate::transport::IpVersion;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub broker_list: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub ip_version: IpVersionConfig,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub correlation_id: i32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_required_acks")]
    pub required_acks: i16,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: i32,
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: i32,
    #[serde(default)]
    pub min_bytes: i32,
    #[serde(default = "default_max_number_of_offsets")]
    pub max_number_of_offsets: i32,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub sasl: Option<SaslConfig>,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum IpVersionConfig {
    #[default]
    Unspecified,
    V4,
    V6,
}

impl From<IpVersionConfig> for IpVersion {
    fn from(value: IpVersionConfig) -> IpVersion {
        match value {
            IpVersionConfig::Unspecified => IpVersion::Any,
            IpVersionConfig::V4 => IpVersion::V4Only,
            IpVersionConfig::V6 => IpVersion::V6Only,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum CompressionConfig {
    #[default]
    None,
    Gzip,
    Snappy,
    Lz4,
}

impl From<CompressionConfig> for CompressionType {
    fn from(value: CompressionConfig) -> CompressionType {
        match value {
            CompressionConfig::None => CompressionType::None,
            CompressionConfig::Gzip => CompressionType::Gzip,
            CompressionConfig::Snappy => CompressionType::Snappy,
            CompressionConfig::Lz4 => CompressionType::Lz4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaslConfig {
    pub mechanism: String,
    pub username: String,
    pub password: String,
}

fn default_port() -> u16 {
    9092
}

fn default_timeout_ms() -> u64 {
    1_500
}

fn default_max_attempts() -> u32 {
    4
}

fn default_backoff_ms() -> u64 {
    200
}

fn default_required_acks() -> i16 {
    1
}

fn default_max_bytes() -> i32 {
    1_000_000
}

fn default_max_wait_ms() -> i32 {
    100
}

fn default_max_number_of_offsets() -> i32 {
    100
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: String::new(),
            port: default_port(),
            broker_list: Vec::new(),
            timeout_ms: default_timeout_ms(),
            ip_version: IpVersionConfig::default(),
            client_id: String::new(),
            correlation_id: 0,
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            required_acks: default_required_acks(),
            max_bytes: default_max_bytes(),
            max_wait_ms: default_max_wait_ms(),
            min_bytes: 0,
            max_number_of_offsets: default_max_number_of_offsets(),
            compression: CompressionConfig::default(),
            sasl: None,
        }
    }
}

impl ClientConfig {
    /// Loads a `ClientConfig` from a TOML file, falling back to
    /// [`ClientConfig::default`] if `path` does not exist.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<ClientConfig, crate::error::ClientError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(ClientConfig::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::ClientError::ArgError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| crate::error::ClientError::ArgError(e.to_string()))
    }

    /// All seed endpoints: `host:port` plus `brokerList`, de-duplicated.
    pub fn seed_endpoints(&self) -> Vec<String> {
        let mut endpoints = Vec::new();
        if !self.host.is_empty() {
            endpoints.push(format!("{}:{}", self.host, self.port));
        }
        for ep in &self.broker_list {
            if !endpoints.contains(ep) {
                endpoints.push(ep.clone());
            }
        }
        endpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = ClientConfig::default();
        assert_eq!(config.port, 9092);
        assert_eq!(config.timeout_ms, 1_500);
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.backoff_ms, 200);
        assert_eq!(config.required_acks, 1);
        assert_eq!(config.max_bytes, 1_000_000);
        assert_eq!(config.max_wait_ms, 100);
        assert_eq!(config.max_number_of_offsets, 100);
    }

    #[test]
    fn seed_endpoints_dedupes() {
        let config = ClientConfig {
            host: "broker-a".to_string(),
            port: 9092,
            broker_list: vec!["broker-a:9092".to_string(), "broker-b:9092".to_string()],
            ..ClientConfig::default()
        };
        assert_eq!(
            config.seed_endpoints(),
            vec!["broker-a:9092".to_string(), "broker-b:9092".to_string()]
        );
    }
}

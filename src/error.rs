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

//! The client-side error taxonomy, plus the non-fatal log the Connection
//! accumulates across retries.

use std::fmt;

use crate::protocol::error_code::ErrorCode;

/// A single entry in the Connection's non-fatal error log (spec §3, §4.5.5).
#[derive(Debug, Clone)]
pub struct NonFatalEntry {
    pub endpoint: String,
    pub error: String,
}

impl fmt::Display for NonFatalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.endpoint, self.error)
    }
}

/// The uniform error type raised by every public operation in this crate.
///
/// Client-side variants correspond 1:1 to spec §7 item 1. `Server` carries
/// the broker's own [`ErrorCode`] (spec §7 item 2) rather than duplicating
/// its retryability classification here.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid argument: {0}")]
    ArgError(String),
    #[error("failed to send request to {endpoint}: {message}")]
    CannotSend { endpoint: String, message: String },
    #[error("produce with requiredAcks=0 observed a closed socket before/during send to {endpoint}; message store state is indeterminate")]
    SendNoAck { endpoint: String },
    #[error("failed to receive response from {endpoint}: {message}")]
    CannotRecv { endpoint: String, message: String },
    #[error("failed to connect to {endpoint}: {message}")]
    CannotBind { endpoint: String, message: String },
    #[error("I/O timed out against {endpoint} after {timeout_ms}ms")]
    IoTimeout { endpoint: String, timeout_ms: u64 },
    #[error("broker reported unknown metadata attributes for topic {topic}")]
    UnknownMetadataAttributes { topic: String },
    #[error("unknown api key {0}")]
    UnknownApiKey(i16),
    #[error("failed to fetch metadata for topic {0}")]
    CannotGetMetadata(String),
    #[error("no known leader for {topic}-{partition}")]
    LeaderNotFound { topic: String, partition: i32 },
    #[error("response correlation id {got} does not match request correlation id {expected} on {endpoint}")]
    MismatchCorrelationId {
        endpoint: String,
        expected: i32,
        got: i32,
    },
    #[error("no known brokers to contact")]
    NoKnownBrokers,
    #[error("malformed request or response: {0}")]
    RequestOrResponseMalformed(String),
    #[error("expected topic {expected}, response carried {got}")]
    TopicMismatch { expected: String, got: String },
    #[error("expected partition {expected}, response carried {got}")]
    PartitionMismatch { expected: i32, got: i32 },
    #[error("value for key/value field was not a valid binary string")]
    NotBinaryString,
    #[error("compression error: {0}")]
    CompressionError(String),
    #[error("response not received for {0}")]
    ResponseNotReceived(String),
    #[error("host {host} is not compatible with the requested IP version")]
    IncompatibleHostIpVersion { host: String },
    #[error("no connection available to {0}")]
    NoConnection(String),
    #[error("group coordinator not found for group {0}")]
    GroupCoordinatorNotFound(String),

    #[error("broker reported {code} for {topic}-{partition}")]
    Server {
        code: ErrorCode,
        topic: String,
        partition: i32,
    },

    #[error("exhausted {attempts} attempts; last error: {last}. non-fatal log:\n{}", format_log(.nonfatals))]
    Exhausted {
        attempts: u32,
        last: String,
        nonfatals: Vec<NonFatalEntry>,
    },
}

fn format_log(entries: &[NonFatalEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl ClientError {
    /// Whether this error, seen as the outcome of one attempt, should be
    /// retried per spec §4.5.5. Argument/decode/encode errors are excluded
    /// on purpose: they are raised immediately and never retried.
    pub fn is_retriable(&self) -> bool {
        match self {
            ClientError::Server { code, .. } => code.retryable(),
            ClientError::CannotSend { .. }
            | ClientError::CannotRecv { .. }
            | ClientError::CannotBind { .. }
            | ClientError::MismatchCorrelationId { .. }
            | ClientError::CannotGetMetadata(_)
            | ClientError::LeaderNotFound { .. }
            | ClientError::NoConnection(_) => true,
            _ => false,
        }
    }
}

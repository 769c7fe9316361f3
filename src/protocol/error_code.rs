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

//! Broker-reported error codes.
//!
//! Derived from the legacy (pre-KIP-482) Kafka wire protocol's error code
//! table. Each code carries whether the client should treat it as
//! retriable per spec §4.5.5; that flag is the single source of truth the
//! retry state machine consults, instead of a second hand-maintained list.

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ErrorCode {
    code: i16,
    message: &'static str,
    retryable: bool,
}

impl ErrorCode {
    const fn new(code: i16, message: &'static str, retryable: bool) -> ErrorCode {
        ErrorCode {
            code,
            message,
            retryable,
        }
    }

    pub fn code(&self) -> i16 {
        self.code
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn retryable(&self) -> bool {
        self.retryable
    }

    /// Maps a raw wire error code to its [`ErrorCode`], falling back to
    /// [`ErrorCode::UNKNOWN_SERVER_ERROR`] for codes this client does not
    /// recognize (future broker versions may add new ones).
    pub fn from_code(code: i16) -> ErrorCode {
        match code {
            0 => Self::NONE,
            -1 => Self::UNKNOWN_SERVER_ERROR,
            1 => Self::OFFSET_OUT_OF_RANGE,
            2 => Self::CORRUPT_MESSAGE,
            3 => Self::UNKNOWN_TOPIC_OR_PARTITION,
            4 => Self::INVALID_MESSAGE_SIZE,
            5 => Self::LEADER_NOT_AVAILABLE,
            6 => Self::NOT_LEADER_FOR_PARTITION,
            7 => Self::REQUEST_TIMED_OUT,
            8 => Self::BROKER_NOT_AVAILABLE,
            9 => Self::REPLICA_NOT_AVAILABLE,
            10 => Self::MESSAGE_SIZE_TOO_LARGE,
            11 => Self::STALE_CONTROLLER_EPOCH,
            12 => Self::OFFSET_METADATA_TOO_LARGE,
            13 => Self::NETWORK_EXCEPTION,
            14 => Self::GROUP_LOAD_IN_PROGRESS,
            15 => Self::GROUP_COORDINATOR_NOT_AVAILABLE,
            16 => Self::NOT_COORDINATOR_FOR_GROUP,
            19 => Self::NOT_ENOUGH_REPLICAS,
            20 => Self::NOT_ENOUGH_REPLICAS_AFTER_APPEND,
            21 => Self::INVALID_REQUIRED_ACKS,
            27 => Self::REBALANCE_IN_PROGRESS,
            code => ErrorCode::new(code, "unrecognized server error", false),
        }
    }

    pub const NONE: Self = Self::new(0, "", false);
    pub const UNKNOWN_SERVER_ERROR: Self = Self::new(
        -1,
        "The server experienced an unexpected error when processing the request.",
        false,
    );
    pub const OFFSET_OUT_OF_RANGE: Self = Self::new(
        1,
        "The requested offset is not within the range of offsets maintained by the server.",
        false,
    );
    pub const CORRUPT_MESSAGE: Self = Self::new(
        2,
        "This message has failed its CRC checksum, exceeds the valid size, or is otherwise corrupt.",
        true,
    );
    pub const UNKNOWN_TOPIC_OR_PARTITION: Self =
        Self::new(3, "This server does not host this topic-partition.", true);
    pub const INVALID_MESSAGE_SIZE: Self =
        Self::new(4, "The message has a negative size.", false);
    pub const LEADER_NOT_AVAILABLE: Self = Self::new(
        5,
        "There is no leader for this topic-partition as we are in the middle of a leadership election.",
        true,
    );
    pub const NOT_LEADER_FOR_PARTITION: Self = Self::new(
        6,
        "This broker is not the leader for this topic-partition.",
        true,
    );
    pub const REQUEST_TIMED_OUT: Self = Self::new(7, "The request timed out.", true);
    pub const BROKER_NOT_AVAILABLE: Self = Self::new(8, "The broker is not available.", true);
    pub const REPLICA_NOT_AVAILABLE: Self =
        Self::new(9, "The replica is not available for the requested topic-partition.", true);
    pub const MESSAGE_SIZE_TOO_LARGE: Self = Self::new(
        10,
        "The request included a message larger than the max message size the server will accept.",
        false,
    );
    pub const STALE_CONTROLLER_EPOCH: Self =
        Self::new(11, "The controller moved to another broker.", true);
    pub const OFFSET_METADATA_TOO_LARGE: Self =
        Self::new(12, "The metadata field of the offset request was too large.", false);
    pub const NETWORK_EXCEPTION: Self = Self::new(
        13,
        "The server disconnected before a response was received.",
        true,
    );
    pub const GROUP_LOAD_IN_PROGRESS: Self = Self::new(
        14,
        "The coordinator is loading and hence can't process requests.",
        true,
    );
    pub const GROUP_COORDINATOR_NOT_AVAILABLE: Self =
        Self::new(15, "The group coordinator is not available.", true);
    pub const NOT_COORDINATOR_FOR_GROUP: Self =
        Self::new(16, "This broker is not the coordinator for this group.", true);
    pub const NOT_ENOUGH_REPLICAS: Self = Self::new(
        19,
        "Messages are rejected since there are fewer in-sync replicas than required.",
        true,
    );
    pub const NOT_ENOUGH_REPLICAS_AFTER_APPEND: Self = Self::new(
        20,
        "Messages are written to the log, but to fewer in-sync replicas than required.",
        true,
    );
    pub const INVALID_REQUIRED_ACKS: Self =
        Self::new(21, "Produce request specified an invalid value for required acks.", false);
    pub const REBALANCE_IN_PROGRESS: Self =
        Self::new(27, "The coordinator has begun rebalancing the group.", true);
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_codes() {
        assert_eq!(ErrorCode::from_code(6).code(), 6);
        assert!(ErrorCode::from_code(6).retryable());
        assert!(!ErrorCode::from_code(10).retryable());
    }

    #[test]
    fn unknown_code_falls_back() {
        let e = ErrorCode::from_code(999);
        assert_eq!(e.code(), 999);
        assert!(!e.retryable());
    }
}

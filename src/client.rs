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

//! Thin request façades over [`Connection`]: `produce`, `fetch`,
//! `list_offsets`, each validating its own arguments and returning a
//! domain shape instead of a raw protocol response (spec.md §4.6).
//!
//! `Producer` and `Consumer` wrap a `Connection` with the caller's default
//! knobs so repeated calls against the same topic-partition don't repeat
//! argument plumbing.

use crate::connection::Connection;
use crate::connection::ProduceAck;
use crate::error::ClientError;
use crate::protocol::messageset::Record;
use crate::transport::Transport;

/// One decoded record handed back from a fetch, with CRC validity folded
/// in per-record rather than failing the whole batch (spec.md §4.6, §8
/// scenario 5).
#[derive(Debug, Clone)]
pub struct Message {
    pub offset: i64,
    pub next_offset: i64,
    pub key: Option<Vec<u8>>,
    pub value: Option<Vec<u8>>,
    pub attributes: i8,
    pub magic_byte: i8,
    pub high_watermark_offset: i64,
    pub valid: bool,
    pub error: Option<String>,
}

fn validate_topic(topic: &str) -> Result<(), ClientError> {
    if topic.is_empty() {
        return Err(ClientError::ArgError("topic must not be empty".to_string()));
    }
    Ok(())
}

fn validate_partition(partition: i32) -> Result<(), ClientError> {
    if partition < 0 {
        return Err(ClientError::ArgError(format!(
            "partition must be non-negative, got {partition}"
        )));
    }
    Ok(())
}

/// Produces one record to `(topic, partition)`. Returns `None` when
/// `required_acks == 0` (the broker sends no reply; see
/// [`Connection::produce`]).
pub fn produce<T: Transport, F: FnMut(&str) -> T>(
    connection: &mut Connection<T, F>,
    topic: &str,
    partition: i32,
    required_acks: i16,
    key: Option<Vec<u8>>,
    value: Option<Vec<u8>>,
) -> Result<Option<ProduceAck>, ClientError> {
    validate_topic(topic)?;
    validate_partition(partition)?;
    if !matches!(required_acks, -1 | 0 | 1) {
        return Err(ClientError::ArgError(format!(
            "requiredAcks must be one of -1, 0, 1, got {required_acks}"
        )));
    }
    let record = Record::new(key, value);
    connection.produce(topic, partition, required_acks, vec![record])
}

/// Fetches records from `(topic, partition)` starting at `fetch_offset`.
pub fn fetch<T: Transport, F: FnMut(&str) -> T>(
    connection: &mut Connection<T, F>,
    topic: &str,
    partition: i32,
    fetch_offset: i64,
    max_bytes: i32,
) -> Result<Vec<Message>, ClientError> {
    validate_topic(topic)?;
    validate_partition(partition)?;
    if fetch_offset < 0 {
        return Err(ClientError::ArgError(format!(
            "fetchOffset must be non-negative, got {fetch_offset}"
        )));
    }

    let result = connection.fetch(topic, partition, fetch_offset, max_bytes)?;
    let high_watermark_offset = result.high_watermark;
    Ok(result
        .records
        .into_iter()
        .map(|record| Message {
            offset: record.offset,
            next_offset: record.offset + 1,
            key: record.key,
            value: record.value,
            attributes: record.attributes,
            magic_byte: record.magic,
            high_watermark_offset,
            valid: record.valid,
            error: record.error,
        })
        .collect())
}

/// Lists offsets for `(topic, partition)` at `timestamp`
/// ([`crate::protocol::schemata::offset::LATEST_OFFSET`] /
/// [`crate::protocol::schemata::offset::EARLIEST_OFFSET`] or a real one).
pub fn list_offsets<T: Transport, F: FnMut(&str) -> T>(
    connection: &mut Connection<T, F>,
    topic: &str,
    partition: i32,
    timestamp: i64,
) -> Result<Vec<i64>, ClientError> {
    validate_topic(topic)?;
    validate_partition(partition)?;
    connection.list_offsets(topic, partition, timestamp)
}

/// Convenience wrapper pairing a `Connection` with a default `requiredAcks`.
pub struct Producer<T: Transport, F: FnMut(&str) -> T> {
    connection: Connection<T, F>,
    required_acks: i16,
}

impl<T: Transport, F: FnMut(&str) -> T> Producer<T, F> {
    pub fn new(connection: Connection<T, F>, required_acks: i16) -> Producer<T, F> {
        Producer {
            connection,
            required_acks,
        }
    }

    pub fn send(
        &mut self,
        topic: &str,
        partition: i32,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    ) -> Result<Option<ProduceAck>, ClientError> {
        produce(&mut self.connection, topic, partition, self.required_acks, key, value)
    }

    pub fn connection(&mut self) -> &mut Connection<T, F> {
        &mut self.connection
    }
}

/// Convenience wrapper pairing a `Connection` with a default `maxBytes`.
pub struct Consumer<T: Transport, F: FnMut(&str) -> T> {
    connection: Connection<T, F>,
    max_bytes: i32,
}

impl<T: Transport, F: FnMut(&str) -> T> Consumer<T, F> {
    pub fn new(connection: Connection<T, F>, max_bytes: i32) -> Consumer<T, F> {
        Consumer {
            connection,
            max_bytes,
        }
    }

    pub fn poll(
        &mut self,
        topic: &str,
        partition: i32,
        fetch_offset: i64,
    ) -> Result<Vec<Message>, ClientError> {
        fetch(&mut self.connection, topic, partition, fetch_offset, self.max_bytes)
    }

    pub fn connection(&mut self) -> &mut Connection<T, F> {
        &mut self.connection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_topic() {
        use crate::config::ClientConfig;
        use crate::transport::mock::MockTransport;

        let mut connection = Connection::new(ClientConfig::default(), |_: &str| MockTransport::new());
        let err = produce(&mut connection, "", 0, 1, None, Some(b"v".to_vec())).unwrap_err();
        assert!(matches!(err, ClientError::ArgError(_)));
    }

    #[test]
    fn rejects_negative_partition() {
        use crate::config::ClientConfig;
        use crate::transport::mock::MockTransport;

        let mut connection = Connection::new(ClientConfig::default(), |_: &str| MockTransport::new());
        let err = produce(&mut connection, "topic", -1, 1, None, Some(b"v".to_vec())).unwrap_err();
        assert!(matches!(err, ClientError::ArgError(_)));
    }

    #[test]
    fn rejects_invalid_required_acks() {
        use crate::config::ClientConfig;
        use crate::transport::mock::MockTransport;

        let mut connection = Connection::new(ClientConfig::default(), |_: &str| MockTransport::new());
        let err = produce(&mut connection, "topic", 0, 7, None, Some(b"v".to_vec())).unwrap_err();
        assert!(matches!(err, ClientError::ArgError(_)));
    }
}

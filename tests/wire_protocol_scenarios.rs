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

//! End-to-end scenarios driving a [`Connection`] against
//! [`MockTransport`] instead of a real broker socket.

use std::cell::RefCell;
use std::rc::Rc;

use kafka_client::config::ClientConfig;
use kafka_client::connection::Connection;
use kafka_client::error::ClientError;
use kafka_client::protocol::error_code::ErrorCode;
use kafka_client::protocol::header::ResponseHeader;
use kafka_client::protocol::messageset;
use kafka_client::protocol::messageset::Record;
use kafka_client::protocol::request::encode_response;
use kafka_client::protocol::request::ResponseBody;
use kafka_client::protocol::schemata::fetch::FetchPartitionResponse;
use kafka_client::protocol::schemata::fetch::FetchResponse;
use kafka_client::protocol::schemata::fetch::FetchTopicResponse;
use kafka_client::protocol::schemata::metadata::BrokerMetadata;
use kafka_client::protocol::schemata::metadata::MetadataResponse;
use kafka_client::protocol::schemata::metadata::PartitionMetadata;
use kafka_client::protocol::schemata::metadata::TopicMetadata;
use kafka_client::protocol::schemata::produce::ProducePartitionResponse;
use kafka_client::protocol::schemata::produce::ProduceResponse;
use kafka_client::protocol::schemata::produce::ProduceTopicResponse;
use kafka_client::transport::mock::MockTransport;

fn config(brokers: &[&str]) -> ClientConfig {
    ClientConfig {
        broker_list: brokers.iter().map(|s| s.to_string()).collect(),
        max_attempts: 3,
        backoff_ms: 1,
        ..ClientConfig::default()
    }
}

fn connect(
    shared: &Rc<RefCell<MockTransport>>,
    cfg: ClientConfig,
) -> Connection<Rc<RefCell<MockTransport>>, impl FnMut(&str) -> Rc<RefCell<MockTransport>>> {
    let shared = shared.clone();
    Connection::new(cfg, move |_: &str| shared.clone())
}

fn metadata_frame(correlation_id: i32, topic: &str, partition: i32, node_id: i32, host: &str, port: i32) -> Vec<u8> {
    let header = ResponseHeader { correlation_id };
    let body = ResponseBody::Metadata(MetadataResponse {
        brokers: vec![BrokerMetadata {
            node_id,
            host: host.to_string(),
            port,
        }],
        topics: vec![TopicMetadata {
            error_code: ErrorCode::NONE,
            topic: topic.to_string(),
            partitions: vec![PartitionMetadata {
                error_code: ErrorCode::NONE,
                partition,
                leader: node_id,
                replicas: vec![node_id],
                isr: vec![node_id],
            }],
        }],
    });
    encode_response(&header, &body, 0).unwrap()
}

fn produce_frame(correlation_id: i32, topic: &str, partition: i32, base_offset: i64) -> Vec<u8> {
    let header = ResponseHeader { correlation_id };
    let body = ResponseBody::Produce(ProduceResponse {
        topics: vec![ProduceTopicResponse {
            topic: topic.to_string(),
            partitions: vec![ProducePartitionResponse {
                partition,
                error_code: ErrorCode::NONE,
                base_offset,
            }],
        }],
    });
    encode_response(&header, &body, 0).unwrap()
}

fn fetch_frame(correlation_id: i32, topic: &str, partition: i32, high_watermark: i64, records: Vec<Record>) -> Vec<u8> {
    let header = ResponseHeader { correlation_id };
    let body = ResponseBody::Fetch(FetchResponse {
        topics: vec![FetchTopicResponse {
            topic: topic.to_string(),
            partitions: vec![FetchPartitionResponse {
                partition,
                error_code: ErrorCode::NONE,
                high_watermark,
                records,
            }],
        }],
    });
    encode_response(&header, &body, 0).unwrap()
}

fn sample_record(offset: i64, key: &str, value: &str) -> Record {
    let mut record = Record::new(Some(key.as_bytes().to_vec()), Some(value.as_bytes().to_vec()));
    record.offset = offset;
    record
}

#[test]
fn produces_then_fetches_a_single_record() {
    let shared = Rc::new(RefCell::new(MockTransport::new()));
    let mut conn = connect(&shared, config(&["broker:9092"]));

    shared
        .borrow_mut()
        .queue_response("broker:9092", metadata_frame(0, "orders", 0, 1, "broker", 9092));
    shared
        .borrow_mut()
        .queue_response("broker:9092", produce_frame(1, "orders", 0, 42));

    let ack = conn
        .produce("orders", 0, 1, vec![Record::new(Some(b"k1".to_vec()), Some(b"v1".to_vec()))])
        .unwrap()
        .expect("requiredAcks=1 yields a response");
    assert_eq!(ack.base_offset, 42);

    let record = sample_record(42, "k1", "v1");
    shared
        .borrow_mut()
        .queue_response("broker:9092", fetch_frame(2, "orders", 0, 43, vec![record.clone()]));

    let fetched = conn.fetch("orders", 0, 42, 1_000).unwrap();
    assert_eq!(fetched.high_watermark, 43);
    assert_eq!(fetched.records, vec![record]);
}

#[test]
fn decodes_a_snappy_compressed_batch() {
    use kafka_client::protocol::compression;
    use kafka_client::protocol::compression::CompressionType;

    let shared = Rc::new(RefCell::new(MockTransport::new()));
    let mut conn = connect(&shared, config(&["broker:9092"]));

    let inner = vec![sample_record(0, "k1", "v1"), sample_record(1, "k2", "v2")];
    let mut inner_bytes = Vec::new();
    messageset::encode_message_set(&inner, &mut inner_bytes).unwrap();
    let compressed = compression::compress(CompressionType::Snappy, &inner_bytes).unwrap();

    let mut outer = Record::new(None, Some(compressed));
    outer.attributes = CompressionType::Snappy.codec_id();
    outer.offset = 1;

    shared
        .borrow_mut()
        .queue_response("broker:9092", metadata_frame(0, "orders", 0, 1, "broker", 9092));
    shared
        .borrow_mut()
        .queue_response("broker:9092", fetch_frame(1, "orders", 0, 2, vec![outer]));

    let fetched = conn.fetch("orders", 0, 0, 1_000).unwrap();
    assert_eq!(fetched.records, inner);
}

#[test]
fn wires_produce_side_compression_through_the_connection() {
    use kafka_client::config::CompressionConfig;

    let payload = b"the quick brown fox jumps over the lazy dog ".repeat(50);

    let shared = Rc::new(RefCell::new(MockTransport::new()));
    let mut cfg = config(&["broker:9092"]);
    cfg.compression = CompressionConfig::Gzip;
    let mut conn = connect(&shared, cfg);

    shared
        .borrow_mut()
        .queue_response("broker:9092", metadata_frame(0, "orders", 0, 1, "broker", 9092));
    shared
        .borrow_mut()
        .queue_response("broker:9092", produce_frame(1, "orders", 0, 0));

    conn.produce("orders", 0, 1, vec![Record::new(None, Some(payload.clone()))])
        .unwrap();

    let sent_frame = shared.borrow().sent.last().unwrap().1.clone();
    assert!(
        sent_frame.len() < payload.len(),
        "expected the gzip-compressed request ({} bytes) to be smaller than the raw payload ({} bytes)",
        sent_frame.len(),
        payload.len()
    );
}

#[test]
fn fails_leader_over_to_the_other_endpoint_with_one_nonfatal_entry() {
    use kafka_client::transport::mock::Fault;

    let shared = Rc::new(RefCell::new(MockTransport::new()));
    let mut conn = connect(&shared, config(&["broker-a:9092", "broker-b:9092"]));

    shared
        .borrow_mut()
        .queue_response("broker-a:9092", metadata_frame(0, "orders", 0, 1, "broker-a", 9092));
    shared
        .borrow_mut()
        .queue_fault("broker-a:9092", Fault::ConnectionReset);

    shared
        .borrow_mut()
        .queue_response("broker-b:9092", metadata_frame(2, "orders", 0, 2, "broker-b", 9092));
    shared
        .borrow_mut()
        .queue_response("broker-b:9092", produce_frame(3, "orders", 0, 200));

    let ack = conn
        .produce("orders", 0, 1, vec![Record::new(Some(b"k".to_vec()), Some(b"v".to_vec()))])
        .unwrap()
        .expect("requiredAcks=1 yields a response");
    assert_eq!(ack.base_offset, 200);
    assert_eq!(conn.nonfatal_errors().len(), 1);
}

#[test]
fn tolerates_a_fetch_response_truncated_inside_the_trailing_records_value() {
    let shared = Rc::new(RefCell::new(MockTransport::new()));
    let mut conn = connect(&shared, config(&["broker:9092"]));

    let records = vec![sample_record(0, "k1", "v1"), sample_record(1, "k2", "v2")];
    let mut record_bytes = Vec::new();
    messageset::encode_message_set(&records, &mut record_bytes).unwrap();
    record_bytes.truncate(record_bytes.len() - 3);

    shared
        .borrow_mut()
        .queue_response("broker:9092", metadata_frame(0, "orders", 0, 1, "broker", 9092));
    shared.borrow_mut().queue_response(
        "broker:9092",
        fetch_frame_with_raw_records(1, "orders", 0, 1, &record_bytes),
    );

    let fetched = conn.fetch("orders", 0, 0, 1_000).unwrap();
    assert_eq!(fetched.records, vec![records[0].clone()]);
}

#[test]
fn flags_a_crc_mismatch_without_failing_the_whole_fetch() {
    let shared = Rc::new(RefCell::new(MockTransport::new()));
    let mut conn = connect(&shared, config(&["broker:9092"]));

    let records = vec![sample_record(0, "k1", "v1"), sample_record(1, "k2", "v2")];
    let mut record_bytes = Vec::new();
    messageset::encode_message_set(&records, &mut record_bytes).unwrap();
    let first_len = records[0].encoded_len();
    record_bytes[first_len - 2] ^= 0xFF;

    shared
        .borrow_mut()
        .queue_response("broker:9092", metadata_frame(0, "orders", 0, 1, "broker", 9092));
    shared.borrow_mut().queue_response(
        "broker:9092",
        fetch_frame_with_raw_records(1, "orders", 0, 2, &record_bytes),
    );

    let fetched = conn.fetch("orders", 0, 0, 1_000).unwrap();
    assert_eq!(fetched.records.len(), 2);
    assert!(!fetched.records[0].valid);
    assert!(fetched.records[0].error.as_ref().unwrap().contains("crc mismatch"));
    assert!(fetched.records[1].valid);
    assert_eq!(fetched.records[1].key, records[1].key);
}

/// Builds a FETCH response frame whose record bytes are supplied raw
/// (not re-derived from a `Vec<Record>`), so a test can hand it an
/// already-corrupted or truncated message set the way a broker would
/// produce one, rather than one this crate's own encoder could emit.
fn fetch_frame_with_raw_records(
    correlation_id: i32,
    topic: &str,
    partition: i32,
    high_watermark: i64,
    record_bytes: &[u8],
) -> Vec<u8> {
    // A well-formed frame's records come from the encoder, then the raw
    // bytes are substituted in: the frame always ends with the declared
    // record-bytes length followed by the record bytes themselves, so the
    // substitution only has to overwrite that suffix and its length prefix.
    let placeholder = fetch_frame(correlation_id, topic, partition, high_watermark, Vec::new());
    let mut frame = placeholder;
    frame.truncate(frame.len() - 4); // drop the empty message set's zero length prefix
    frame.extend_from_slice(&(record_bytes.len() as i32).to_be_bytes());
    frame.extend_from_slice(record_bytes);
    frame
}

#[test]
fn closes_the_transport_on_correlation_mismatch_and_retries_on_a_fresh_one() {
    let shared = Rc::new(RefCell::new(MockTransport::new()));
    let mut conn = connect(&shared, config(&["broker:9092"]));

    shared
        .borrow_mut()
        .queue_response("broker:9092", metadata_frame(0, "orders", 0, 1, "broker", 9092));
    // Correlation id 999 never matches the request's (1): a fatal mismatch
    // for this Transport, but retriable at the operation level.
    shared
        .borrow_mut()
        .queue_response("broker:9092", produce_frame(999, "orders", 0, 0));

    shared
        .borrow_mut()
        .queue_response("broker:9092", metadata_frame(2, "orders", 0, 1, "broker", 9092));
    shared
        .borrow_mut()
        .queue_response("broker:9092", produce_frame(3, "orders", 0, 300));

    let ack = conn
        .produce("orders", 0, 1, vec![Record::new(Some(b"k".to_vec()), Some(b"v".to_vec()))])
        .unwrap()
        .expect("requiredAcks=1 yields a response");
    assert_eq!(ack.base_offset, 300);
    assert_eq!(conn.nonfatal_errors().len(), 1);
    assert!(conn.nonfatal_errors()[0].error.contains("correlation"));
}

#[test]
fn raises_exhausted_after_max_attempts_with_the_nonfatal_log_attached() {
    use kafka_client::transport::mock::Fault;

    let shared = Rc::new(RefCell::new(MockTransport::new()));
    let mut cfg = config(&["broker:9092"]);
    cfg.max_attempts = 2;
    let mut conn = connect(&shared, cfg);

    shared
        .borrow_mut()
        .queue_response("broker:9092", metadata_frame(0, "orders", 0, 1, "broker", 9092));
    shared.borrow_mut().queue_fault("broker:9092", Fault::Timeout);
    shared
        .borrow_mut()
        .queue_response("broker:9092", metadata_frame(2, "orders", 0, 1, "broker", 9092));
    shared.borrow_mut().queue_fault("broker:9092", Fault::Timeout);

    let err = conn
        .produce("orders", 0, 1, vec![Record::new(Some(b"k".to_vec()), Some(b"v".to_vec()))])
        .unwrap_err();
    match err {
        ClientError::Exhausted { attempts, nonfatals, .. } => {
            assert_eq!(attempts, 2);
            assert_eq!(nonfatals.len(), 2);
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

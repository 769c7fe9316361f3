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

//! The cluster-aware multiplexer: broker set, metadata cache, transport
//! cache, correlation-ID assignment, and the retry/backoff state machine
//! of spec.md §4.5. This is the only thing a Request façade talks to.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::error::NonFatalEntry;
use crate::protocol::compression::CompressionType;
use crate::protocol::error_code::ErrorCode;
use crate::protocol::header::RequestHeader;
use crate::protocol::messageset;
use crate::protocol::messageset::Record;
use crate::protocol::request;
use crate::protocol::request::RequestBody;
use crate::protocol::request::ResponseBody;
use crate::protocol::schemata::fetch::FetchPartitionRequest;
use crate::protocol::schemata::fetch::FetchRequest;
use crate::protocol::schemata::fetch::FetchTopicRequest;
use crate::protocol::schemata::metadata::MetadataRequest;
use crate::protocol::schemata::metadata::MetadataResponse;
use crate::protocol::schemata::offset::OffsetPartitionRequest;
use crate::protocol::schemata::offset::OffsetRequest;
use crate::protocol::schemata::offset::OffsetTopicRequest;
use crate::protocol::schemata::produce::ProducePartitionRequest;
use crate::protocol::schemata::produce::ProduceRequest;
use crate::protocol::schemata::produce::ProduceTopicRequest;
use crate::protocol::schemata::ApiKey;
use crate::transport::Transport;

const PRODUCE_API_VERSION: i16 = 0;
const FETCH_API_VERSION: i16 = 0;
const OFFSET_API_VERSION: i16 = 0;
const METADATA_API_VERSION: i16 = 0;

#[derive(Debug, Clone)]
struct PartitionMeta {
    leader_endpoint: Option<String>,
    replicas: Vec<i32>,
    isr: Vec<i32>,
}

/// Outcome of producing to a partition with `requiredAcks != 0`.
#[derive(Debug, Clone)]
pub struct ProduceAck {
    pub error_code: ErrorCode,
    pub base_offset: i64,
}

/// Outcome of a fetch against a single partition.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub error_code: ErrorCode,
    pub high_watermark: i64,
    pub records: Vec<Record>,
}

/// The cluster multiplexer. Generic over the Transport implementation so
/// the same retry/routing logic drives both [`crate::transport::TcpTransport`]
/// and [`crate::transport::mock::MockTransport`] in tests.
pub struct Connection<T: Transport, F: FnMut(&str) -> T> {
    config: ClientConfig,
    make_transport: F,
    transports: HashMap<String, T>,
    broker_list: Vec<String>,
    node_endpoints: HashMap<i32, String>,
    metadata: HashMap<String, HashMap<i32, PartitionMeta>>,
    correlation_id: i32,
    metadata_round_robin: usize,
    nonfatal_log: Vec<NonFatalEntry>,
    cluster_errors: HashMap<String, String>,
    pid: u32,
}

impl<T: Transport, F: FnMut(&str) -> T> Connection<T, F> {
    pub fn new(config: ClientConfig, make_transport: F) -> Connection<T, F> {
        let broker_list = config.seed_endpoints();
        let correlation_id = config.correlation_id;
        Connection {
            config,
            make_transport,
            transports: HashMap::new(),
            broker_list,
            node_endpoints: HashMap::new(),
            metadata: HashMap::new(),
            correlation_id,
            metadata_round_robin: 0,
            nonfatal_log: Vec::new(),
            cluster_errors: HashMap::new(),
            pid: std::process::id(),
        }
    }

    fn check_fork_safety(&mut self) {
        let current_pid = std::process::id();
        if current_pid != self.pid {
            log::warn!("detected pid change from {} to {current_pid}; resetting caches", self.pid);
            self.transports.clear();
            self.pid = current_pid;
        }
    }

    fn next_correlation_id(&mut self) -> i32 {
        let id = self.correlation_id;
        self.correlation_id = self.correlation_id.wrapping_add(1);
        id
    }

    fn transport_for(&mut self, endpoint: &str) -> &mut T {
        if !self.transports.contains_key(endpoint) {
            let transport = (self.make_transport)(endpoint);
            self.transports.insert(endpoint.to_string(), transport);
            if !self.broker_list.iter().any(|e| e == endpoint) {
                self.broker_list.push(endpoint.to_string());
            }
        }
        self.transports.get_mut(endpoint).expect("just inserted")
    }

    fn record_nonfatal(&mut self, endpoint: &str, error: &ClientError) {
        self.nonfatal_log.push(NonFatalEntry {
            endpoint: endpoint.to_string(),
            error: error.to_string(),
        });
        self.cluster_errors.insert(endpoint.to_string(), error.to_string());
    }

    fn invalidate_metadata(&mut self, topic: &str) {
        self.metadata.remove(topic);
    }

    fn leader_for(&self, topic: &str, partition: i32) -> Option<String> {
        self.metadata
            .get(topic)
            .and_then(|partitions| partitions.get(&partition))
            .and_then(|p| p.leader_endpoint.clone())
    }

    /// Sends a request to `endpoint`, reads the response, and verifies the
    /// correlation ID (spec.md §4.5.3). On mismatch the Transport for that
    /// endpoint is dropped; the caller observes a retriable error.
    fn send_and_receive(
        &mut self,
        endpoint: &str,
        header: &RequestHeader,
        body: &RequestBody,
        api_version: i16,
    ) -> Result<ResponseBody, ClientError> {
        let correlation_id = header.correlation_id;
        let frame = request::encode_request(header, body, api_version)
            .map_err(|e| ClientError::RequestOrResponseMalformed(e.to_string()))?;

        let transport = self.transport_for(endpoint);
        transport.send(endpoint, &frame)?;

        let response_bytes = transport.receive(endpoint)?;
        let (response_header, response_body) =
            request::decode_response(body.api_key(), api_version, &response_bytes)
                .map_err(|e| ClientError::RequestOrResponseMalformed(e.to_string()))?;

        if response_header.correlation_id != correlation_id {
            self.close_connection(endpoint);
            return Err(ClientError::MismatchCorrelationId {
                endpoint: endpoint.to_string(),
                expected: correlation_id,
                got: response_header.correlation_id,
            });
        }
        Ok(response_body)
    }

    /// Fetches metadata scoped to `topic` from any reachable broker,
    /// round-robin over the known set (spec.md §4.5.1).
    fn fetch_metadata(&mut self, topic: &str) -> Result<(), (String, ClientError)> {
        if self.broker_list.is_empty() {
            return Err(("<none>".to_string(), ClientError::NoKnownBrokers));
        }
        let idx = self.metadata_round_robin % self.broker_list.len();
        self.metadata_round_robin = self.metadata_round_robin.wrapping_add(1);
        let endpoint = self.broker_list[idx].clone();

        let correlation_id = self.next_correlation_id();
        let header = RequestHeader {
            api_key: ApiKey::Metadata.code(),
            api_version: METADATA_API_VERSION,
            correlation_id,
            client_id: Some(self.config.client_id.clone()),
        };
        let body = RequestBody::Metadata(MetadataRequest {
            topics: Some(vec![topic.to_string()]),
        });

        let response = self
            .send_and_receive(&endpoint, &header, &body, METADATA_API_VERSION)
            .map_err(|e| (endpoint.clone(), e))?;
        let metadata = match response {
            ResponseBody::Metadata(m) => m,
            _ => {
                return Err((
                    endpoint.clone(),
                    ClientError::RequestOrResponseMalformed(
                        "expected a metadata response".to_string(),
                    ),
                ))
            }
        };

        self.apply_metadata(metadata);

        let complete = self
            .metadata
            .get(topic)
            .map(|partitions| {
                partitions
                    .values()
                    .all(|p| p.leader_endpoint.is_some())
            })
            .unwrap_or(false);
        if !complete {
            return Err((
                endpoint,
                ClientError::LeaderNotFound {
                    topic: topic.to_string(),
                    partition: -1,
                },
            ));
        }
        Ok(())
    }

    fn apply_metadata(&mut self, metadata: MetadataResponse) {
        for broker in &metadata.brokers {
            let endpoint = format!("{}:{}", broker.host, broker.port);
            self.node_endpoints.insert(broker.node_id, endpoint.clone());
            if !self.broker_list.iter().any(|e| e == &endpoint) {
                self.broker_list.push(endpoint);
            }
        }

        for topic in metadata.topics {
            let mut partitions = HashMap::new();
            for partition in topic.partitions {
                let leader_endpoint = self.node_endpoints.get(&partition.leader).cloned();
                partitions.insert(
                    partition.partition,
                    PartitionMeta {
                        leader_endpoint,
                        replicas: partition.replicas,
                        isr: partition.isr,
                    },
                );
            }
            self.metadata.insert(topic.topic, partitions);
        }
    }

    /// Drives the retry/backoff state machine of spec.md §4.5.5: ensures
    /// metadata, lets `attempt` route/send/receive/decode, classifies the
    /// outcome, and either returns, retries after `backoffMs`, or raises
    /// the accumulated non-fatal log as [`ClientError::Exhausted`].
    fn run_with_retry<R>(
        &mut self,
        topic: &str,
        mut attempt: impl FnMut(&mut Self) -> Result<R, (String, ClientError)>,
    ) -> Result<R, ClientError> {
        self.check_fork_safety();
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error: Option<ClientError> = None;

        for attempt_no in 0..max_attempts {
            if !self.metadata.contains_key(topic) {
                if let Err((endpoint, err)) = self.fetch_metadata(topic) {
                    self.record_nonfatal(&endpoint, &err);
                    last_error = Some(err);
                    if attempt_no + 1 < max_attempts {
                        std::thread::sleep(Duration::from_millis(self.config.backoff_ms));
                    }
                    continue;
                }
            }

            match attempt(self) {
                Ok(value) => return Ok(value),
                Err((endpoint, err)) => {
                    if !err.is_retriable() {
                        return Err(err);
                    }
                    self.record_nonfatal(&endpoint, &err);
                    self.invalidate_metadata(topic);
                    last_error = Some(err);
                    if attempt_no + 1 < max_attempts {
                        std::thread::sleep(Duration::from_millis(self.config.backoff_ms));
                    }
                }
            }
        }

        Err(ClientError::Exhausted {
            attempts: max_attempts,
            last: last_error.map(|e| e.to_string()).unwrap_or_default(),
            nonfatals: self.nonfatal_log.clone(),
        })
    }

    /// Produces one record batch to a single `(topic, partition)`.
    ///
    /// `records` is compressed with `config.compression` before it ever
    /// reaches the wire (spec.md §2/§4.3, §6): a non-`None` codec wraps the
    /// whole batch into one outer Record, the way a producer's own
    /// compression setting is selected once per call, not per record.
    ///
    /// When `required_acks == 0` the broker sends no reply (spec.md
    /// §4.5.4): the call returns as soon as `send` succeeds, or
    /// [`ClientError::SendNoAck`] if the socket closes during the send.
    pub fn produce(
        &mut self,
        topic: &str,
        partition: i32,
        required_acks: i16,
        records: Vec<Record>,
    ) -> Result<Option<ProduceAck>, ClientError> {
        let timeout_ms = self.config.timeout_ms as i32;
        let codec = CompressionType::from(self.config.compression);
        let records = messageset::compress_batch(records, codec)?;
        self.run_with_retry(topic, move |conn| {
            let endpoint = conn
                .leader_for(topic, partition)
                .ok_or_else(|| {
                    (
                        topic.to_string(),
                        ClientError::LeaderNotFound {
                            topic: topic.to_string(),
                            partition,
                        },
                    )
                })?;

            let correlation_id = conn.next_correlation_id();
            let header = RequestHeader {
                api_key: ApiKey::Produce.code(),
                api_version: PRODUCE_API_VERSION,
                correlation_id,
                client_id: Some(conn.config.client_id.clone()),
            };
            let body = RequestBody::Produce(ProduceRequest {
                required_acks,
                timeout_ms,
                topics: vec![ProduceTopicRequest {
                    topic: topic.to_string(),
                    partitions: vec![ProducePartitionRequest {
                        partition,
                        records: records.clone(),
                    }],
                }],
            });

            if required_acks == 0 {
                let frame = request::encode_request(&header, &body, PRODUCE_API_VERSION)
                    .map_err(|e| {
                        (endpoint.clone(), ClientError::RequestOrResponseMalformed(e.to_string()))
                    })?;
                let transport = conn.transport_for(&endpoint);
                transport.send(&endpoint, &frame).map_err(|e| {
                    let err = match e {
                        ClientError::CannotSend { endpoint, .. } => {
                            ClientError::SendNoAck { endpoint }
                        }
                        other => other,
                    };
                    (endpoint.clone(), err)
                })?;
                return Ok(None);
            }

            let response =
                conn.send_and_receive(&endpoint, &header, &body, PRODUCE_API_VERSION)
                    .map_err(|e| (endpoint.clone(), e))?;
            let produce_response = match response {
                ResponseBody::Produce(r) => r,
                _ => {
                    return Err((
                        endpoint,
                        ClientError::RequestOrResponseMalformed(
                            "expected a produce response".to_string(),
                        ),
                    ))
                }
            };

            let topic_response = produce_response
                .topics
                .into_iter()
                .find(|t| t.topic == topic)
                .ok_or_else(|| {
                    (
                        endpoint.clone(),
                        ClientError::TopicMismatch {
                            expected: topic.to_string(),
                            got: String::new(),
                        },
                    )
                })?;
            let partition_response = topic_response
                .partitions
                .into_iter()
                .find(|p| p.partition == partition)
                .ok_or_else(|| {
                    (
                        endpoint.clone(),
                        ClientError::PartitionMismatch {
                            expected: partition,
                            got: -1,
                        },
                    )
                })?;

            if partition_response.error_code.code() != 0 {
                let err = ClientError::Server {
                    code: partition_response.error_code,
                    topic: topic.to_string(),
                    partition,
                };
                return Err((endpoint, err));
            }

            Ok(Some(ProduceAck {
                error_code: partition_response.error_code,
                base_offset: partition_response.base_offset,
            }))
        })
    }

    /// Fetches one partition's records starting at `fetch_offset`.
    pub fn fetch(
        &mut self,
        topic: &str,
        partition: i32,
        fetch_offset: i64,
        max_bytes: i32,
    ) -> Result<FetchResult, ClientError> {
        let max_wait_ms = self.config.max_wait_ms;
        let min_bytes = self.config.min_bytes;
        self.run_with_retry(topic, move |conn| {
            let endpoint = conn
                .leader_for(topic, partition)
                .ok_or_else(|| {
                    (
                        topic.to_string(),
                        ClientError::LeaderNotFound {
                            topic: topic.to_string(),
                            partition,
                        },
                    )
                })?;

            let correlation_id = conn.next_correlation_id();
            let header = RequestHeader {
                api_key: ApiKey::Fetch.code(),
                api_version: FETCH_API_VERSION,
                correlation_id,
                client_id: Some(conn.config.client_id.clone()),
            };
            let body = RequestBody::Fetch(FetchRequest {
                replica_id: -1,
                max_wait_ms,
                min_bytes,
                topics: vec![FetchTopicRequest {
                    topic: topic.to_string(),
                    partitions: vec![FetchPartitionRequest {
                        partition,
                        fetch_offset,
                        max_bytes,
                    }],
                }],
            });

            let response = conn
                .send_and_receive(&endpoint, &header, &body, FETCH_API_VERSION)
                .map_err(|e| (endpoint.clone(), e))?;
            let fetch_response = match response {
                ResponseBody::Fetch(r) => r,
                _ => {
                    return Err((
                        endpoint,
                        ClientError::RequestOrResponseMalformed(
                            "expected a fetch response".to_string(),
                        ),
                    ))
                }
            };

            let topic_response = fetch_response
                .topics
                .into_iter()
                .find(|t| t.topic == topic)
                .ok_or_else(|| {
                    (
                        endpoint.clone(),
                        ClientError::TopicMismatch {
                            expected: topic.to_string(),
                            got: String::new(),
                        },
                    )
                })?;
            let partition_response = topic_response
                .partitions
                .into_iter()
                .find(|p| p.partition == partition)
                .ok_or_else(|| {
                    (
                        endpoint.clone(),
                        ClientError::PartitionMismatch {
                            expected: partition,
                            got: -1,
                        },
                    )
                })?;

            if partition_response.error_code.code() != 0 {
                let err = ClientError::Server {
                    code: partition_response.error_code,
                    topic: topic.to_string(),
                    partition,
                };
                return Err((endpoint, err));
            }

            Ok(FetchResult {
                error_code: partition_response.error_code,
                high_watermark: partition_response.high_watermark,
                records: partition_response.records,
            })
        })
    }

    /// Lists offsets for one partition at `timestamp`
    /// ([`crate::protocol::schemata::offset::LATEST_OFFSET`] /
    /// [`crate::protocol::schemata::offset::EARLIEST_OFFSET`] or a real
    /// timestamp).
    pub fn list_offsets(
        &mut self,
        topic: &str,
        partition: i32,
        timestamp: i64,
    ) -> Result<Vec<i64>, ClientError> {
        let max_number_of_offsets = self.config.max_number_of_offsets;
        self.run_with_retry(topic, move |conn| {
            let endpoint = conn
                .leader_for(topic, partition)
                .ok_or_else(|| {
                    (
                        topic.to_string(),
                        ClientError::LeaderNotFound {
                            topic: topic.to_string(),
                            partition,
                        },
                    )
                })?;

            let correlation_id = conn.next_correlation_id();
            let header = RequestHeader {
                api_key: ApiKey::ListOffsets.code(),
                api_version: OFFSET_API_VERSION,
                correlation_id,
                client_id: Some(conn.config.client_id.clone()),
            };
            let body = RequestBody::Offset(OffsetRequest {
                replica_id: -1,
                topics: vec![OffsetTopicRequest {
                    topic: topic.to_string(),
                    partitions: vec![OffsetPartitionRequest {
                        partition,
                        timestamp,
                        max_num_offsets: max_number_of_offsets,
                    }],
                }],
            });

            let response = conn
                .send_and_receive(&endpoint, &header, &body, OFFSET_API_VERSION)
                .map_err(|e| (endpoint.clone(), e))?;
            let offset_response = match response {
                ResponseBody::Offset(r) => r,
                _ => {
                    return Err((
                        endpoint,
                        ClientError::RequestOrResponseMalformed(
                            "expected an offset response".to_string(),
                        ),
                    ))
                }
            };

            let topic_response = offset_response
                .topics
                .into_iter()
                .find(|t| t.topic == topic)
                .ok_or_else(|| {
                    (
                        endpoint.clone(),
                        ClientError::TopicMismatch {
                            expected: topic.to_string(),
                            got: String::new(),
                        },
                    )
                })?;
            let partition_response = topic_response
                .partitions
                .into_iter()
                .find(|p| p.partition == partition)
                .ok_or_else(|| {
                    (
                        endpoint.clone(),
                        ClientError::PartitionMismatch {
                            expected: partition,
                            got: -1,
                        },
                    )
                })?;

            if partition_response.error_code.code() != 0 {
                let err = ClientError::Server {
                    code: partition_response.error_code,
                    topic: topic.to_string(),
                    partition,
                };
                return Err((endpoint, err));
            }

            Ok(partition_response.offsets)
        })
    }

    // -- Observability (spec.md §4.5.7) --

    pub fn known_servers(&self) -> Vec<String> {
        self.broker_list.clone()
    }

    pub fn is_server_known(&self, endpoint: &str) -> bool {
        self.broker_list.iter().any(|e| e == endpoint)
    }

    pub fn is_server_alive(&self, endpoint: &str) -> bool {
        self.transports.contains_key(endpoint)
    }

    pub fn nonfatal_errors(&self) -> Vec<NonFatalEntry> {
        self.nonfatal_log.clone()
    }

    pub fn clear_nonfatals(&mut self) {
        self.nonfatal_log.clear();
    }

    pub fn cluster_errors(&self) -> HashMap<String, String> {
        self.cluster_errors.clone()
    }

    pub fn close_connection(&mut self, endpoint: &str) {
        self.transports.remove(endpoint);
    }

    pub fn close(&mut self) {
        self.transports.clear();
        self.metadata.clear();
    }
}

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

use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;

use crate::protocol::codec::Decodable;
use crate::protocol::codec::Decoder;
use crate::protocol::codec::Encodable;
use crate::protocol::codec::Encoder;
use crate::protocol::codec::FixedSizeEncoder;
use crate::protocol::codec::Int16;
use crate::protocol::codec::Int32;
use crate::protocol::codec::NullableString;
use crate::protocol::error_code::ErrorCode;
use crate::protocol::IoResult;

/// `None` requests metadata for every topic the broker cluster knows about.
#[derive(Debug, Clone)]
pub struct MetadataRequest {
    pub topics: Option<Vec<String>>,
}

impl Encodable for MetadataRequest {
    fn write<B: WriteBytesExt>(&self, buf: &mut B, _version: i16) -> IoResult<()> {
        match &self.topics {
            None => Int32.encode(buf, -1)?,
            Some(topics) => {
                Int32.encode(buf, topics.len() as i32)?;
                for topic in topics {
                    NullableString.encode(buf, topic.as_str())?;
                }
            }
        }
        Ok(())
    }

    fn calculate_size(&self, _version: i16) -> usize {
        match &self.topics {
            None => Int32::SIZE,
            Some(topics) => {
                Int32::SIZE
                    + topics
                        .iter()
                        .map(|t| NullableString.calculate_size(t.as_str()))
                        .sum::<usize>()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrokerMetadata {
    pub node_id: i32,
    pub host: String,
    pub port: i32,
}

#[derive(Debug, Clone)]
pub struct PartitionMetadata {
    pub error_code: ErrorCode,
    pub partition: i32,
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct TopicMetadata {
    pub error_code: ErrorCode,
    pub topic: String,
    pub partitions: Vec<PartitionMetadata>,
}

#[derive(Debug, Clone)]
pub struct MetadataResponse {
    pub brokers: Vec<BrokerMetadata>,
    pub topics: Vec<TopicMetadata>,
}

fn read_i32_array<B: ReadBytesExt>(buf: &mut B) -> IoResult<Vec<i32>> {
    let count = Int32.decode(buf)?;
    let mut out = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count {
        out.push(Int32.decode(buf)?);
    }
    Ok(out)
}

impl Decodable for MetadataResponse {
    fn read<B: ReadBytesExt>(buf: &mut B, _version: i16) -> IoResult<Self> {
        let broker_count = Int32.decode(buf)?;
        let mut brokers = Vec::with_capacity(broker_count.max(0) as usize);
        for _ in 0..broker_count {
            brokers.push(BrokerMetadata {
                node_id: Int32.decode(buf)?,
                host: NullableString.decode(buf)?.unwrap_or_default(),
                port: Int32.decode(buf)?,
            });
        }

        let topic_count = Int32.decode(buf)?;
        let mut topics = Vec::with_capacity(topic_count.max(0) as usize);
        for _ in 0..topic_count {
            let error_code = ErrorCode::from_code(Int16.decode(buf)?);
            let topic = NullableString.decode(buf)?.unwrap_or_default();
            let partition_count = Int32.decode(buf)?;
            let mut partitions = Vec::with_capacity(partition_count.max(0) as usize);
            for _ in 0..partition_count {
                let partition_error_code = ErrorCode::from_code(Int16.decode(buf)?);
                let partition = Int32.decode(buf)?;
                let leader = Int32.decode(buf)?;
                let replicas = read_i32_array(buf)?;
                let isr = read_i32_array(buf)?;
                partitions.push(PartitionMetadata {
                    error_code: partition_error_code,
                    partition,
                    leader,
                    replicas,
                    isr,
                });
            }
            topics.push(TopicMetadata {
                error_code,
                topic,
                partitions,
            });
        }

        Ok(MetadataResponse { brokers, topics })
    }
}

impl Decodable for MetadataRequest {
    fn read<B: ReadBytesExt>(buf: &mut B, _version: i16) -> IoResult<Self> {
        let count = Int32.decode(buf)?;
        if count < 0 {
            return Ok(MetadataRequest { topics: None });
        }
        let mut topics = Vec::with_capacity(count as usize);
        for _ in 0..count {
            topics.push(NullableString.decode(buf)?.unwrap_or_default());
        }
        Ok(MetadataRequest {
            topics: Some(topics),
        })
    }
}

fn write_i32_array<B: WriteBytesExt>(buf: &mut B, values: &[i32]) -> IoResult<()> {
    Int32.encode(buf, values.len() as i32)?;
    for value in values {
        Int32.encode(buf, *value)?;
    }
    Ok(())
}

impl Encodable for MetadataResponse {
    fn write<B: WriteBytesExt>(&self, buf: &mut B, _version: i16) -> IoResult<()> {
        Int32.encode(buf, self.brokers.len() as i32)?;
        for broker in &self.brokers {
            Int32.encode(buf, broker.node_id)?;
            NullableString.encode(buf, broker.host.as_str())?;
            Int32.encode(buf, broker.port)?;
        }

        Int32.encode(buf, self.topics.len() as i32)?;
        for topic in &self.topics {
            Int16.encode(buf, topic.error_code.code())?;
            NullableString.encode(buf, topic.topic.as_str())?;
            Int32.encode(buf, topic.partitions.len() as i32)?;
            for partition in &topic.partitions {
                Int16.encode(buf, partition.error_code.code())?;
                Int32.encode(buf, partition.partition)?;
                Int32.encode(buf, partition.leader)?;
                write_i32_array(buf, &partition.replicas)?;
                write_i32_array(buf, &partition.isr)?;
            }
        }
        Ok(())
    }

    fn calculate_size(&self, _version: i16) -> usize {
        let mut size = Int32::SIZE;
        for broker in &self.brokers {
            size += Int32::SIZE + NullableString.calculate_size(broker.host.as_str()) + Int32::SIZE;
        }
        size += Int32::SIZE;
        for topic in &self.topics {
            size += Int16::SIZE + NullableString.calculate_size(topic.topic.as_str()) + Int32::SIZE;
            for partition in &topic.partitions {
                size += Int16::SIZE + Int32::SIZE + Int32::SIZE;
                size += Int32::SIZE + partition.replicas.len() * Int32::SIZE;
                size += Int32::SIZE + partition.isr.len() * Int32::SIZE;
            }
        }
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_metadata_request_for_all_topics() {
        let req = MetadataRequest { topics: None };
        let mut buf = Vec::new();
        req.write(&mut buf, 0).unwrap();
        assert_eq!(buf.len(), req.calculate_size(0));
        let decoded = MetadataRequest::read(&mut std::io::Cursor::new(buf), 0).unwrap();
        assert!(decoded.topics.is_none());
    }

    #[test]
    fn round_trips_metadata_request_for_named_topics() {
        let req = MetadataRequest {
            topics: Some(vec!["orders".to_string(), "payments".to_string()]),
        };
        let mut buf = Vec::new();
        req.write(&mut buf, 0).unwrap();
        assert_eq!(buf.len(), req.calculate_size(0));
        let decoded = MetadataRequest::read(&mut std::io::Cursor::new(buf), 0).unwrap();
        assert_eq!(decoded.topics, req.topics);
    }

    #[test]
    fn round_trips_metadata_response() {
        let resp = MetadataResponse {
            brokers: vec![BrokerMetadata {
                node_id: 1,
                host: "broker1".to_string(),
                port: 9092,
            }],
            topics: vec![TopicMetadata {
                error_code: ErrorCode::from_code(0),
                topic: "orders".to_string(),
                partitions: vec![PartitionMetadata {
                    error_code: ErrorCode::from_code(0),
                    partition: 0,
                    leader: 1,
                    replicas: vec![1, 2],
                    isr: vec![1],
                }],
            }],
        };
        let mut buf = Vec::new();
        resp.write(&mut buf, 0).unwrap();
        assert_eq!(buf.len(), resp.calculate_size(0));
        let decoded = MetadataResponse::read(&mut std::io::Cursor::new(buf), 0).unwrap();
        assert_eq!(decoded.brokers[0].host, "broker1");
        assert_eq!(decoded.topics[0].partitions[0].leader, 1);
        assert_eq!(decoded.topics[0].partitions[0].replicas, vec![1, 2]);
    }
}

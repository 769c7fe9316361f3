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
use crate::protocol::codec::Int64;
use crate::protocol::codec::NullableBytes;
use crate::protocol::codec::NullableString;
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messageset;
use crate::protocol::messageset::Record;
use crate::protocol::IoResult;

#[derive(Debug, Clone)]
pub struct ProducePartitionRequest {
    pub partition: i32,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone)]
pub struct ProduceTopicRequest {
    pub topic: String,
    pub partitions: Vec<ProducePartitionRequest>,
}

#[derive(Debug, Clone)]
pub struct ProduceRequest {
    pub required_acks: i16,
    pub timeout_ms: i32,
    pub topics: Vec<ProduceTopicRequest>,
}

impl Encodable for ProduceRequest {
    fn write<B: WriteBytesExt>(&self, buf: &mut B, _version: i16) -> IoResult<()> {
        Int16.encode(buf, self.required_acks)?;
        Int32.encode(buf, self.timeout_ms)?;
        Int32.encode(buf, self.topics.len() as i32)?;
        for topic in &self.topics {
            NullableString.encode(buf, topic.topic.as_str())?;
            Int32.encode(buf, topic.partitions.len() as i32)?;
            for partition in &topic.partitions {
                Int32.encode(buf, partition.partition)?;
                let mut record_bytes = Vec::new();
                messageset::encode_message_set(&partition.records, &mut record_bytes)?;
                Int32.encode(buf, record_bytes.len() as i32)?;
                buf.write_all(&record_bytes)?;
            }
        }
        Ok(())
    }

    fn calculate_size(&self, _version: i16) -> usize {
        let mut size = Int16::SIZE + Int32::SIZE + Int32::SIZE;
        for topic in &self.topics {
            size += NullableString.calculate_size(topic.topic.as_str());
            size += Int32::SIZE;
            for partition in &topic.partitions {
                size += Int32::SIZE + Int32::SIZE;
                size += partition.records.iter().map(Record::encoded_len).sum::<usize>();
            }
        }
        size
    }
}

impl Decodable for ProduceRequest {
    fn read<B: ReadBytesExt>(buf: &mut B, _version: i16) -> IoResult<Self> {
        let required_acks = Int16.decode(buf)?;
        let timeout_ms = Int32.decode(buf)?;
        let topic_count = Int32.decode(buf)?;
        let mut topics = Vec::with_capacity(topic_count.max(0) as usize);
        for _ in 0..topic_count {
            let topic = NullableString.decode(buf)?.unwrap_or_default();
            let partition_count = Int32.decode(buf)?;
            let mut partitions = Vec::with_capacity(partition_count.max(0) as usize);
            for _ in 0..partition_count {
                let partition = Int32.decode(buf)?;
                let record_bytes = NullableBytes.decode(buf)?.unwrap_or_default();
                let records = messageset::decode_message_set(&record_bytes).map_err(|e| {
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
                })?;
                partitions.push(ProducePartitionRequest { partition, records });
            }
            topics.push(ProduceTopicRequest { topic, partitions });
        }
        Ok(ProduceRequest {
            required_acks,
            timeout_ms,
            topics,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProducePartitionResponse {
    pub partition: i32,
    pub error_code: ErrorCode,
    pub base_offset: i64,
}

#[derive(Debug, Clone)]
pub struct ProduceTopicResponse {
    pub topic: String,
    pub partitions: Vec<ProducePartitionResponse>,
}

#[derive(Debug, Clone)]
pub struct ProduceResponse {
    pub topics: Vec<ProduceTopicResponse>,
}

impl Decodable for ProduceResponse {
    fn read<B: ReadBytesExt>(buf: &mut B, _version: i16) -> IoResult<Self> {
        let topic_count = Int32.decode(buf)?;
        let mut topics = Vec::with_capacity(topic_count.max(0) as usize);
        for _ in 0..topic_count {
            let topic = NullableString
                .decode(buf)?
                .unwrap_or_default();
            let partition_count = Int32.decode(buf)?;
            let mut partitions = Vec::with_capacity(partition_count.max(0) as usize);
            for _ in 0..partition_count {
                let partition = Int32.decode(buf)?;
                let error_code = ErrorCode::from_code(Int16.decode(buf)?);
                let base_offset = Int64.decode(buf)?;
                partitions.push(ProducePartitionResponse {
                    partition,
                    error_code,
                    base_offset,
                });
            }
            topics.push(ProduceTopicResponse { topic, partitions });
        }
        Ok(ProduceResponse { topics })
    }
}

impl Encodable for ProduceResponse {
    fn write<B: WriteBytesExt>(&self, buf: &mut B, _version: i16) -> IoResult<()> {
        Int32.encode(buf, self.topics.len() as i32)?;
        for topic in &self.topics {
            NullableString.encode(buf, topic.topic.as_str())?;
            Int32.encode(buf, topic.partitions.len() as i32)?;
            for partition in &topic.partitions {
                Int32.encode(buf, partition.partition)?;
                Int16.encode(buf, partition.error_code.code())?;
                Int64.encode(buf, partition.base_offset)?;
            }
        }
        Ok(())
    }

    fn calculate_size(&self, _version: i16) -> usize {
        let mut size = Int32::SIZE;
        for topic in &self.topics {
            size += NullableString.calculate_size(topic.topic.as_str());
            size += Int32::SIZE;
            size += topic.partitions.len() * (Int32::SIZE + Int16::SIZE + Int64::SIZE);
        }
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messageset::Record;

    #[test]
    fn round_trips_produce_request() {
        let req = ProduceRequest {
            required_acks: -1,
            timeout_ms: 5000,
            topics: vec![ProduceTopicRequest {
                topic: "orders".to_string(),
                partitions: vec![ProducePartitionRequest {
                    partition: 0,
                    records: vec![Record::new(
                        Some(b"k".to_vec()),
                        Some(b"v".to_vec()),
                    )],
                }],
            }],
        };
        let mut buf = Vec::new();
        req.write(&mut buf, 0).unwrap();
        assert_eq!(buf.len(), req.calculate_size(0));
        let decoded = ProduceRequest::read(&mut std::io::Cursor::new(buf), 0).unwrap();
        assert_eq!(decoded.required_acks, req.required_acks);
        assert_eq!(decoded.timeout_ms, req.timeout_ms);
        assert_eq!(decoded.topics[0].topic, req.topics[0].topic);
        assert_eq!(
            decoded.topics[0].partitions[0].records,
            req.topics[0].partitions[0].records
        );
    }

    #[test]
    fn round_trips_produce_response() {
        let resp = ProduceResponse {
            topics: vec![ProduceTopicResponse {
                topic: "orders".to_string(),
                partitions: vec![ProducePartitionResponse {
                    partition: 0,
                    error_code: ErrorCode::from_code(0),
                    base_offset: 42,
                }],
            }],
        };
        let mut buf = Vec::new();
        resp.write(&mut buf, 0).unwrap();
        assert_eq!(buf.len(), resp.calculate_size(0));
        let decoded = ProduceResponse::read(&mut std::io::Cursor::new(buf), 0).unwrap();
        assert_eq!(decoded.topics[0].topic, resp.topics[0].topic);
        assert_eq!(
            decoded.topics[0].partitions[0].base_offset,
            resp.topics[0].partitions[0].base_offset
        );
        assert_eq!(
            decoded.topics[0].partitions[0].error_code.code(),
            resp.topics[0].partitions[0].error_code.code()
        );
    }
}

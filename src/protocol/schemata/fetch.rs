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
pub struct FetchPartitionRequest {
    pub partition: i32,
    pub fetch_offset: i64,
    pub max_bytes: i32,
}

#[derive(Debug, Clone)]
pub struct FetchTopicRequest {
    pub topic: String,
    pub partitions: Vec<FetchPartitionRequest>,
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub replica_id: i32,
    pub max_wait_ms: i32,
    pub min_bytes: i32,
    pub topics: Vec<FetchTopicRequest>,
}

impl Encodable for FetchRequest {
    fn write<B: WriteBytesExt>(&self, buf: &mut B, _version: i16) -> IoResult<()> {
        Int32.encode(buf, self.replica_id)?;
        Int32.encode(buf, self.max_wait_ms)?;
        Int32.encode(buf, self.min_bytes)?;
        Int32.encode(buf, self.topics.len() as i32)?;
        for topic in &self.topics {
            NullableString.encode(buf, topic.topic.as_str())?;
            Int32.encode(buf, topic.partitions.len() as i32)?;
            for partition in &topic.partitions {
                Int32.encode(buf, partition.partition)?;
                Int64.encode(buf, partition.fetch_offset)?;
                Int32.encode(buf, partition.max_bytes)?;
            }
        }
        Ok(())
    }

    fn calculate_size(&self, _version: i16) -> usize {
        let mut size = Int32::SIZE * 3 + Int32::SIZE;
        for topic in &self.topics {
            size += NullableString.calculate_size(topic.topic.as_str());
            size += Int32::SIZE;
            size += topic.partitions.len() * (Int32::SIZE + Int64::SIZE + Int32::SIZE);
        }
        size
    }
}

#[derive(Debug, Clone)]
pub struct FetchPartitionResponse {
    pub partition: i32,
    pub error_code: ErrorCode,
    pub high_watermark: i64,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone)]
pub struct FetchTopicResponse {
    pub topic: String,
    pub partitions: Vec<FetchPartitionResponse>,
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub topics: Vec<FetchTopicResponse>,
}

impl Decodable for FetchResponse {
    fn read<B: ReadBytesExt>(buf: &mut B, _version: i16) -> IoResult<Self> {
        let topic_count = Int32.decode(buf)?;
        let mut topics = Vec::with_capacity(topic_count.max(0) as usize);
        for _ in 0..topic_count {
            let topic = NullableString.decode(buf)?.unwrap_or_default();
            let partition_count = Int32.decode(buf)?;
            let mut partitions = Vec::with_capacity(partition_count.max(0) as usize);
            for _ in 0..partition_count {
                let partition = Int32.decode(buf)?;
                let error_code = ErrorCode::from_code(Int16.decode(buf)?);
                let high_watermark = Int64.decode(buf)?;
                let record_bytes = NullableBytes.decode(buf)?.unwrap_or_default();
                let records = messageset::decode_message_set(&record_bytes).map_err(|e| {
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
                })?;
                partitions.push(FetchPartitionResponse {
                    partition,
                    error_code,
                    high_watermark,
                    records,
                });
            }
            topics.push(FetchTopicResponse { topic, partitions });
        }
        Ok(FetchResponse { topics })
    }
}

impl Decodable for FetchRequest {
    fn read<B: ReadBytesExt>(buf: &mut B, _version: i16) -> IoResult<Self> {
        let replica_id = Int32.decode(buf)?;
        let max_wait_ms = Int32.decode(buf)?;
        let min_bytes = Int32.decode(buf)?;
        let topic_count = Int32.decode(buf)?;
        let mut topics = Vec::with_capacity(topic_count.max(0) as usize);
        for _ in 0..topic_count {
            let topic = NullableString.decode(buf)?.unwrap_or_default();
            let partition_count = Int32.decode(buf)?;
            let mut partitions = Vec::with_capacity(partition_count.max(0) as usize);
            for _ in 0..partition_count {
                let partition = Int32.decode(buf)?;
                let fetch_offset = Int64.decode(buf)?;
                let max_bytes = Int32.decode(buf)?;
                partitions.push(FetchPartitionRequest {
                    partition,
                    fetch_offset,
                    max_bytes,
                });
            }
            topics.push(FetchTopicRequest { topic, partitions });
        }
        Ok(FetchRequest {
            replica_id,
            max_wait_ms,
            min_bytes,
            topics,
        })
    }
}

impl Encodable for FetchResponse {
    fn write<B: WriteBytesExt>(&self, buf: &mut B, _version: i16) -> IoResult<()> {
        Int32.encode(buf, self.topics.len() as i32)?;
        for topic in &self.topics {
            NullableString.encode(buf, topic.topic.as_str())?;
            Int32.encode(buf, topic.partitions.len() as i32)?;
            for partition in &topic.partitions {
                Int32.encode(buf, partition.partition)?;
                Int16.encode(buf, partition.error_code.code())?;
                Int64.encode(buf, partition.high_watermark)?;
                let mut record_bytes = Vec::new();
                messageset::encode_message_set(&partition.records, &mut record_bytes)?;
                Int32.encode(buf, record_bytes.len() as i32)?;
                buf.write_all(&record_bytes)?;
            }
        }
        Ok(())
    }

    fn calculate_size(&self, _version: i16) -> usize {
        let mut size = Int32::SIZE;
        for topic in &self.topics {
            size += NullableString.calculate_size(topic.topic.as_str());
            size += Int32::SIZE;
            for partition in &topic.partitions {
                size += Int32::SIZE + Int16::SIZE + Int64::SIZE + Int32::SIZE;
                size += partition.records.iter().map(Record::encoded_len).sum::<usize>();
            }
        }
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_fetch_request() {
        let req = FetchRequest {
            replica_id: -1,
            max_wait_ms: 100,
            min_bytes: 1,
            topics: vec![FetchTopicRequest {
                topic: "orders".to_string(),
                partitions: vec![FetchPartitionRequest {
                    partition: 0,
                    fetch_offset: 10,
                    max_bytes: 1024,
                }],
            }],
        };
        let mut buf = Vec::new();
        req.write(&mut buf, 0).unwrap();
        assert_eq!(buf.len(), req.calculate_size(0));
        let decoded = FetchRequest::read(&mut std::io::Cursor::new(buf), 0).unwrap();
        assert_eq!(decoded.replica_id, req.replica_id);
        assert_eq!(decoded.topics[0].partitions[0].fetch_offset, req.topics[0].partitions[0].fetch_offset);
    }

    #[test]
    fn round_trips_fetch_response() {
        let resp = FetchResponse {
            topics: vec![FetchTopicResponse {
                topic: "orders".to_string(),
                partitions: vec![FetchPartitionResponse {
                    partition: 0,
                    error_code: ErrorCode::from_code(0),
                    high_watermark: 99,
                    records: vec![Record::new(Some(b"k".to_vec()), Some(b"v".to_vec()))],
                }],
            }],
        };
        let mut buf = Vec::new();
        resp.write(&mut buf, 0).unwrap();
        assert_eq!(buf.len(), resp.calculate_size(0));
        let decoded = FetchResponse::read(&mut std::io::Cursor::new(buf), 0).unwrap();
        assert_eq!(decoded.topics[0].partitions[0].high_watermark, 99);
        assert_eq!(
            decoded.topics[0].partitions[0].records,
            resp.topics[0].partitions[0].records
        );
    }
}

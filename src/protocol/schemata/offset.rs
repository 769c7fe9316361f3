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
use crate::protocol::codec::NullableString;
use crate::protocol::error_code::ErrorCode;
use crate::protocol::IoResult;

/// Sentinel timestamps accepted in place of a real one, per the resolved
/// `RECEIVE_LATEST_OFFSET`/`RECEIVE_EARLIEST_OFFSET` open question: both
/// requests funnel through this one schema and a `Vec<i64>` response.
pub const LATEST_OFFSET: i64 = -1;
pub const EARLIEST_OFFSET: i64 = -2;

#[derive(Debug, Clone)]
pub struct OffsetPartitionRequest {
    pub partition: i32,
    pub timestamp: i64,
    pub max_num_offsets: i32,
}

#[derive(Debug, Clone)]
pub struct OffsetTopicRequest {
    pub topic: String,
    pub partitions: Vec<OffsetPartitionRequest>,
}

#[derive(Debug, Clone)]
pub struct OffsetRequest {
    pub replica_id: i32,
    pub topics: Vec<OffsetTopicRequest>,
}

impl Encodable for OffsetRequest {
    fn write<B: WriteBytesExt>(&self, buf: &mut B, _version: i16) -> IoResult<()> {
        Int32.encode(buf, self.replica_id)?;
        Int32.encode(buf, self.topics.len() as i32)?;
        for topic in &self.topics {
            NullableString.encode(buf, topic.topic.as_str())?;
            Int32.encode(buf, topic.partitions.len() as i32)?;
            for partition in &topic.partitions {
                Int32.encode(buf, partition.partition)?;
                Int64.encode(buf, partition.timestamp)?;
                Int32.encode(buf, partition.max_num_offsets)?;
            }
        }
        Ok(())
    }

    fn calculate_size(&self, _version: i16) -> usize {
        let mut size = Int32::SIZE * 2;
        for topic in &self.topics {
            size += NullableString.calculate_size(topic.topic.as_str());
            size += Int32::SIZE;
            size += topic.partitions.len() * (Int32::SIZE + Int64::SIZE + Int32::SIZE);
        }
        size
    }
}

#[derive(Debug, Clone)]
pub struct OffsetPartitionResponse {
    pub partition: i32,
    pub error_code: ErrorCode,
    pub offsets: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct OffsetTopicResponse {
    pub topic: String,
    pub partitions: Vec<OffsetPartitionResponse>,
}

#[derive(Debug, Clone)]
pub struct OffsetResponse {
    pub topics: Vec<OffsetTopicResponse>,
}

impl Decodable for OffsetResponse {
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
                let offset_count = Int32.decode(buf)?;
                let mut offsets = Vec::with_capacity(offset_count.max(0) as usize);
                for _ in 0..offset_count {
                    offsets.push(Int64.decode(buf)?);
                }
                partitions.push(OffsetPartitionResponse {
                    partition,
                    error_code,
                    offsets,
                });
            }
            topics.push(OffsetTopicResponse { topic, partitions });
        }
        Ok(OffsetResponse { topics })
    }
}

impl Decodable for OffsetRequest {
    fn read<B: ReadBytesExt>(buf: &mut B, _version: i16) -> IoResult<Self> {
        let replica_id = Int32.decode(buf)?;
        let topic_count = Int32.decode(buf)?;
        let mut topics = Vec::with_capacity(topic_count.max(0) as usize);
        for _ in 0..topic_count {
            let topic = NullableString.decode(buf)?.unwrap_or_default();
            let partition_count = Int32.decode(buf)?;
            let mut partitions = Vec::with_capacity(partition_count.max(0) as usize);
            for _ in 0..partition_count {
                let partition = Int32.decode(buf)?;
                let timestamp = Int64.decode(buf)?;
                let max_num_offsets = Int32.decode(buf)?;
                partitions.push(OffsetPartitionRequest {
                    partition,
                    timestamp,
                    max_num_offsets,
                });
            }
            topics.push(OffsetTopicRequest { topic, partitions });
        }
        Ok(OffsetRequest { replica_id, topics })
    }
}

impl Encodable for OffsetResponse {
    fn write<B: WriteBytesExt>(&self, buf: &mut B, _version: i16) -> IoResult<()> {
        Int32.encode(buf, self.topics.len() as i32)?;
        for topic in &self.topics {
            NullableString.encode(buf, topic.topic.as_str())?;
            Int32.encode(buf, topic.partitions.len() as i32)?;
            for partition in &topic.partitions {
                Int32.encode(buf, partition.partition)?;
                Int16.encode(buf, partition.error_code.code())?;
                Int32.encode(buf, partition.offsets.len() as i32)?;
                for offset in &partition.offsets {
                    Int64.encode(buf, *offset)?;
                }
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
                size += Int32::SIZE + Int16::SIZE + Int32::SIZE;
                size += partition.offsets.len() * Int64::SIZE;
            }
        }
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_offset_request() {
        let req = OffsetRequest {
            replica_id: -1,
            topics: vec![OffsetTopicRequest {
                topic: "orders".to_string(),
                partitions: vec![OffsetPartitionRequest {
                    partition: 0,
                    timestamp: LATEST_OFFSET,
                    max_num_offsets: 1,
                }],
            }],
        };
        let mut buf = Vec::new();
        req.write(&mut buf, 0).unwrap();
        assert_eq!(buf.len(), req.calculate_size(0));
        let decoded = OffsetRequest::read(&mut std::io::Cursor::new(buf), 0).unwrap();
        assert_eq!(decoded.topics[0].partitions[0].timestamp, LATEST_OFFSET);
    }

    #[test]
    fn round_trips_offset_response() {
        let resp = OffsetResponse {
            topics: vec![OffsetTopicResponse {
                topic: "orders".to_string(),
                partitions: vec![OffsetPartitionResponse {
                    partition: 0,
                    error_code: ErrorCode::from_code(0),
                    offsets: vec![42, 0],
                }],
            }],
        };
        let mut buf = Vec::new();
        resp.write(&mut buf, 0).unwrap();
        assert_eq!(buf.len(), resp.calculate_size(0));
        let decoded = OffsetResponse::read(&mut std::io::Cursor::new(buf), 0).unwrap();
        assert_eq!(decoded.topics[0].partitions[0].offsets, vec![42, 0]);
    }
}

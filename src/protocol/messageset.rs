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

//! The legacy Record/MessageSet format: a flat sequence of
//! `offset, size, crc, magic, attributes, [timestamp], key, value` tuples,
//! where a Record whose attributes name a compression codec holds, as its
//! `value`, the compressed bytes of an inner MessageSet.

use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;
use std::io::Cursor;

use crate::error::ClientError;
use crate::protocol::codec::Decoder;
use crate::protocol::codec::Encoder;
use crate::protocol::codec::Int32;
use crate::protocol::codec::Int64;
use crate::protocol::codec::Int8;
use crate::protocol::codec::NullableBytes;
use crate::protocol::compression;
use crate::protocol::compression::CompressionType;
use crate::protocol::consts::*;
use crate::protocol::IoResult;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Record {
    pub offset: i64,
    pub magic: i8,
    pub attributes: i8,
    pub timestamp: Option<i64>,
    pub key: Option<Vec<u8>>,
    pub value: Option<Vec<u8>>,
    /// `false` when this Record failed its CRC check on decode. A Record
    /// is never rejected outright for a bad CRC (spec.md §8 scenario 5):
    /// adjacent, well-formed Records in the same MessageSet still decode.
    pub valid: bool,
    pub error: Option<String>,
}

impl Record {
    pub fn new(key: Option<Vec<u8>>, value: Option<Vec<u8>>) -> Record {
        Record {
            offset: 0,
            magic: MAGIC_V1,
            attributes: 0,
            timestamp: Some(0),
            key,
            value,
            valid: true,
            error: None,
        }
    }

    fn header_len(&self) -> usize {
        if self.magic >= MAGIC_V1 {
            MESSAGE_HEADER_SIZE_V1
        } else {
            MESSAGE_HEADER_SIZE_V0
        }
    }

    fn body_len(&self) -> usize {
        self.header_len()
            + KEY_SIZE_FIELD_SIZE
            + self.key.as_ref().map(|k| k.len()).unwrap_or(0)
            + VALUE_SIZE_FIELD_SIZE
            + self.value.as_ref().map(|v| v.len()).unwrap_or(0)
    }

    /// Bytes on the wire for this one Record, including `offset`/`size`.
    pub fn encoded_len(&self) -> usize {
        LOG_OVERHEAD + CRC_SIZE + self.body_len()
    }

    fn write_body(&self, buf: &mut Vec<u8>) -> IoResult<()> {
        Int8.encode(buf, self.magic)?;
        Int8.encode(buf, self.attributes)?;
        if self.magic >= MAGIC_V1 {
            Int64.encode(buf, self.timestamp.unwrap_or(0))?;
        }
        NullableBytes.encode(buf, self.key.as_ref())?;
        NullableBytes.encode(buf, self.value.as_ref())?;
        Ok(())
    }

    pub fn write<W: WriteBytesExt>(&self, buf: &mut W) -> IoResult<()> {
        let mut body = Vec::with_capacity(self.body_len());
        self.write_body(&mut body)?;
        let crc = crc32fast::hash(&body);

        Int64.encode(buf, self.offset)?;
        Int32.encode(buf, (CRC_SIZE + body.len()) as i32)?;
        Int32.encode(buf, crc as i32)?;
        buf.write_all(&body)?;
        Ok(())
    }
}

/// Decodes one MessageSet (a `&[u8]` slice, not length-prefixed itself --
/// the enclosing Fetch response already knows how many bytes it owns).
///
/// Per the wire format's tolerant-decode rule, a trailing Record whose
/// declared `size` runs past the end of `data` is silently dropped rather
/// than treated as an error -- brokers routinely send a partially written
/// trailing message when a fetch response is cut at `maxBytes`.
pub fn decode_message_set(data: &[u8]) -> Result<Vec<Record>, ClientError> {
    let mut records = Vec::new();
    decode_into(data, &mut records)?;
    Ok(records)
}

fn decode_into(data: &[u8], out: &mut Vec<Record>) -> Result<(), ClientError> {
    let mut cursor = Cursor::new(data);
    loop {
        let start = cursor.position() as usize;
        if data.len().saturating_sub(start) < LOG_OVERHEAD {
            break;
        }
        let offset = match cursor.read_i64::<byteorder::BigEndian>() {
            Ok(v) => v,
            Err(_) => break,
        };
        let size = match cursor.read_i32::<byteorder::BigEndian>() {
            Ok(v) => v,
            Err(_) => break,
        };
        if size < 0 {
            return Err(ClientError::RequestOrResponseMalformed(format!(
                "negative record size {size}"
            )));
        }
        let size = size as usize;
        let body_start = cursor.position() as usize;
        if data.len() - body_start < size {
            // truncated tail: not enough bytes left for the declared size.
            break;
        }
        let body = &data[body_start..body_start + size];
        cursor.set_position((body_start + size) as u64);

        let record = decode_one(offset, body)?;
        let attributes = record.attributes;
        let codec = CompressionType::from_attributes(attributes)?;
        if codec == CompressionType::None || !record.valid {
            // An invalid (CRC-mismatched) Record is surfaced as-is rather
            // than decompressed: its value may itself be the corrupt byte.
            out.push(record);
        } else {
            let inner_value = record.value.clone().ok_or(ClientError::NotBinaryString)?;
            let decompressed = compression::decompress(codec, &inner_value)?;
            let before = out.len();
            decode_into(&decompressed, out)?;
            let mut last_offset: Option<i64> = None;
            for inner in &out[before..] {
                if let Some(prev) = last_offset {
                    if inner.offset <= prev {
                        return Err(ClientError::RequestOrResponseMalformed(
                            "inner message offsets are not strictly increasing".to_string(),
                        ));
                    }
                }
                last_offset = Some(inner.offset);
            }
        }
    }
    Ok(())
}

fn decode_one(offset: i64, body: &[u8]) -> Result<Record, ClientError> {
    let mut cursor = Cursor::new(body);
    let crc = cursor
        .read_i32::<byteorder::BigEndian>()
        .map_err(|e| ClientError::RequestOrResponseMalformed(e.to_string()))?;
    let rest = &body[CRC_SIZE..];
    let computed = crc32fast::hash(rest) as i32;

    let magic = Int8.decode(&mut cursor).map_err(ClientError::from_io)?;
    let attributes = Int8.decode(&mut cursor).map_err(ClientError::from_io)?;
    let timestamp = if magic >= MAGIC_V1 {
        Some(Int64.decode(&mut cursor).map_err(ClientError::from_io)?)
    } else {
        None
    };
    let key = NullableBytes.decode(&mut cursor).map_err(ClientError::from_io)?;
    let value = NullableBytes.decode(&mut cursor).map_err(ClientError::from_io)?;

    let (valid, error) = if computed == crc {
        (true, None)
    } else {
        (
            false,
            Some(format!("crc mismatch: expected {crc}, computed {computed}")),
        )
    };

    Ok(Record {
        offset,
        magic,
        attributes,
        timestamp,
        key,
        value,
        valid,
        error,
    })
}

pub fn encode_message_set<W: WriteBytesExt>(records: &[Record], buf: &mut W) -> IoResult<()> {
    for record in records {
        record.write(buf)?;
    }
    Ok(())
}

/// Wraps `records` into a single outer Record whose `value` is the inner
/// MessageSet compressed with `codec`, attributes carrying the codec id
/// (spec.md §2/§4.3). `CompressionType::None` and an empty batch pass
/// `records` through unchanged -- there is nothing to wrap.
pub fn compress_batch(records: Vec<Record>, codec: CompressionType) -> Result<Vec<Record>, ClientError> {
    if codec == CompressionType::None || records.is_empty() {
        return Ok(records);
    }
    let last_offset = records.last().map(|r| r.offset).unwrap_or(0);
    let mut inner_bytes = Vec::new();
    encode_message_set(&records, &mut inner_bytes).map_err(ClientError::from_io)?;
    let compressed = compression::compress(codec, &inner_bytes)?;

    let mut outer = Record::new(None, Some(compressed));
    outer.attributes = codec.codec_id();
    outer.offset = last_offset;
    Ok(vec![outer])
}

impl ClientError {
    fn from_io(e: std::io::Error) -> ClientError {
        ClientError::RequestOrResponseMalformed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(offset: i64, key: &str, value: &str) -> Record {
        let mut r = Record::new(Some(key.as_bytes().to_vec()), Some(value.as_bytes().to_vec()));
        r.offset = offset;
        r
    }

    #[test]
    fn round_trips_plain_records() {
        let records = vec![sample(0, "k1", "v1"), sample(1, "k2", "v2")];
        let mut buf = Vec::new();
        encode_message_set(&records, &mut buf).unwrap();
        let decoded = decode_message_set(&buf).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn tolerates_truncated_trailing_record() {
        let records = vec![sample(0, "k1", "v1"), sample(1, "k2", "v2")];
        let mut buf = Vec::new();
        encode_message_set(&records, &mut buf).unwrap();
        buf.truncate(buf.len() - 3);
        let decoded = decode_message_set(&buf).unwrap();
        assert_eq!(decoded, vec![records[0].clone()]);
    }

    #[test]
    fn crc_mismatch_flags_one_record_and_decodes_its_neighbors() {
        let records = vec![sample(0, "k1", "v1"), sample(1, "k2", "v2")];
        let mut buf = Vec::new();
        encode_message_set(&records, &mut buf).unwrap();
        // Flip a byte inside the first record's value, not the second's.
        let first_len = records[0].encoded_len();
        buf[first_len - 2] ^= 0xFF;

        let decoded = decode_message_set(&buf).unwrap();
        assert_eq!(decoded.len(), 2);
        assert!(!decoded[0].valid);
        assert!(decoded[0].error.as_ref().unwrap().contains("crc mismatch"));
        assert!(decoded[1].valid);
        assert_eq!(decoded[1].key, records[1].key);
        assert_eq!(decoded[1].value, records[1].value);
    }

    #[test]
    fn decodes_compressed_batch_recursively() {
        let inner = vec![sample(0, "k1", "v1"), sample(1, "k2", "v2")];
        let mut inner_buf = Vec::new();
        encode_message_set(&inner, &mut inner_buf).unwrap();

        let compressed = compression::compress(CompressionType::Gzip, &inner_buf).unwrap();
        let mut outer = Record::new(None, Some(compressed));
        outer.attributes = CompressionType::Gzip.codec_id();
        outer.offset = 1;

        let mut buf = Vec::new();
        outer.write(&mut buf).unwrap();

        let decoded = decode_message_set(&buf).unwrap();
        assert_eq!(decoded, inner);
    }

    #[test]
    fn compress_batch_round_trips_through_decode() {
        let records = vec![sample(0, "k1", "v1"), sample(1, "k2", "v2")];
        let wire = compress_batch(records.clone(), CompressionType::Lz4).unwrap();
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].attributes, CompressionType::Lz4.codec_id());

        let mut buf = Vec::new();
        encode_message_set(&wire, &mut buf).unwrap();
        let decoded = decode_message_set(&buf).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn compress_batch_leaves_uncompressed_batches_untouched() {
        let records = vec![sample(0, "k1", "v1")];
        let wire = compress_batch(records.clone(), CompressionType::None).unwrap();
        assert_eq!(wire, records);
    }
}

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

//! Batch (de)compression: `{None, Gzip, Snappy, Lz4}`, selected by the low
//! three bits of a Record's `attributes` byte.
//!
//! Snappy on the wire is not a raw Snappy block: brokers and this crate both
//! speak the xerial-framed container (a fixed magic header followed by
//! repeated `(int32 frame_len, frame_bytes)` chunks of raw Snappy blocks).
//! This crate's encoder caps each frame at 32 KiB; its decoder accepts any
//! frame size a peer sends.

use std::io::Read;
use std::io::Write;

use byteorder::BigEndian;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;

use crate::error::ClientError;
use crate::protocol::consts::COMPRESSION_CODEC_MASK;

const XERIAL_MAGIC: [u8; 8] = [0x82, b'S', b'N', b'A', b'P', b'P', b'Y', 0];
const XERIAL_VERSION: i32 = 1;
const XERIAL_COMPAT: i32 = 1;
const XERIAL_MAX_FRAME: usize = 32 * 1024;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CompressionType {
    None,
    Gzip,
    Snappy,
    Lz4,
}

impl CompressionType {
    pub fn from_attributes(attributes: i8) -> Result<CompressionType, ClientError> {
        match attributes & COMPRESSION_CODEC_MASK {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Gzip),
            2 => Ok(CompressionType::Snappy),
            3 => Ok(CompressionType::Lz4),
            other => Err(ClientError::CompressionError(format!(
                "unsupported compression codec id {other}"
            ))),
        }
    }

    pub fn codec_id(self) -> i8 {
        match self {
            CompressionType::None => 0,
            CompressionType::Gzip => 1,
            CompressionType::Snappy => 2,
            CompressionType::Lz4 => 3,
        }
    }
}

pub fn compress(codec: CompressionType, data: &[u8]) -> Result<Vec<u8>, ClientError> {
    match codec {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::Gzip => {
            use flate2::write::GzEncoder;
            use flate2::Compression;
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder
                .write_all(data)
                .map_err(|e| ClientError::CompressionError(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| ClientError::CompressionError(e.to_string()))
        }
        CompressionType::Snappy => snappy_xerial_compress(data),
        CompressionType::Lz4 => {
            use lz4_flex::frame::FrameEncoder;
            let mut encoder = FrameEncoder::new(Vec::new());
            encoder
                .write_all(data)
                .map_err(|e| ClientError::CompressionError(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| ClientError::CompressionError(e.to_string()))
        }
    }
}

pub fn decompress(codec: CompressionType, data: &[u8]) -> Result<Vec<u8>, ClientError> {
    match codec {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::Gzip => {
            use flate2::read::GzDecoder;
            let mut decoder = GzDecoder::new(data);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|e| ClientError::CompressionError(e.to_string()))?;
            Ok(out)
        }
        CompressionType::Snappy => snappy_xerial_decompress(data),
        CompressionType::Lz4 => {
            use lz4_flex::frame::FrameDecoder;
            let mut decoder = FrameDecoder::new(data);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|e| ClientError::CompressionError(e.to_string()))?;
            Ok(out)
        }
    }
}

fn snappy_xerial_compress(data: &[u8]) -> Result<Vec<u8>, ClientError> {
    let mut out = Vec::new();
    out.extend_from_slice(&XERIAL_MAGIC);
    out.write_i32::<BigEndian>(XERIAL_VERSION)
        .map_err(|e| ClientError::CompressionError(e.to_string()))?;
    out.write_i32::<BigEndian>(XERIAL_COMPAT)
        .map_err(|e| ClientError::CompressionError(e.to_string()))?;

    let encoder = snap::raw::Encoder::new();
    for chunk in data.chunks(XERIAL_MAX_FRAME) {
        let mut encoder = encoder.clone();
        let frame = encoder
            .compress_vec(chunk)
            .map_err(|e| ClientError::CompressionError(e.to_string()))?;
        out.write_i32::<BigEndian>(frame.len() as i32)
            .map_err(|e| ClientError::CompressionError(e.to_string()))?;
        out.extend_from_slice(&frame);
    }
    Ok(out)
}

fn snappy_xerial_decompress(data: &[u8]) -> Result<Vec<u8>, ClientError> {
    if data.len() < XERIAL_MAGIC.len() || data[..XERIAL_MAGIC.len()] != XERIAL_MAGIC {
        // Some producers emit a bare Snappy block with no xerial framing.
        return snap::raw::Decoder::new()
            .decompress_vec(data)
            .map_err(|e| ClientError::CompressionError(e.to_string()));
    }

    let mut cursor = &data[XERIAL_MAGIC.len()..];
    let _version = cursor
        .read_i32::<BigEndian>()
        .map_err(|e| ClientError::CompressionError(e.to_string()))?;
    let _compat = cursor
        .read_i32::<BigEndian>()
        .map_err(|e| ClientError::CompressionError(e.to_string()))?;

    let mut out = Vec::new();
    let decoder = snap::raw::Decoder::new();
    while !cursor.is_empty() {
        let frame_len = cursor
            .read_i32::<BigEndian>()
            .map_err(|e| ClientError::CompressionError(e.to_string()))? as usize;
        if cursor.len() < frame_len {
            return Err(ClientError::CompressionError(
                "truncated xerial snappy frame".to_string(),
            ));
        }
        let (frame, rest) = cursor.split_at(frame_len);
        let mut decoder = decoder.clone();
        let chunk = decoder
            .decompress_vec(frame)
            .map_err(|e| ClientError::CompressionError(e.to_string()))?;
        out.extend_from_slice(&chunk);
        cursor = rest;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_identity() {
        let data = b"hello kafka";
        let compressed = compress(CompressionType::None, data).unwrap();
        assert_eq!(compressed, data);
        assert_eq!(decompress(CompressionType::None, &compressed).unwrap(), data);
    }

    #[test]
    fn gzip_round_trips() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(50);
        let compressed = compress(CompressionType::Gzip, &data).unwrap();
        assert_eq!(decompress(CompressionType::Gzip, &compressed).unwrap(), data);
    }

    #[test]
    fn snappy_xerial_round_trips_multi_frame() {
        let data = vec![7u8; XERIAL_MAX_FRAME * 3 + 17];
        let compressed = compress(CompressionType::Snappy, &data).unwrap();
        assert!(compressed.starts_with(&XERIAL_MAGIC));
        assert_eq!(decompress(CompressionType::Snappy, &compressed).unwrap(), data);
    }

    #[test]
    fn lz4_round_trips() {
        let data = b"kafka lz4 frame payload".repeat(10);
        let compressed = compress(CompressionType::Lz4, &data).unwrap();
        assert_eq!(decompress(CompressionType::Lz4, &compressed).unwrap(), data);
    }

    #[test]
    fn from_attributes_rejects_unknown_codec() {
        let err = CompressionType::from_attributes(0b0000_0111).unwrap_err();
        assert!(matches!(err, ClientError::CompressionError(_)));
    }
}

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

//! Offset-table constants for the legacy Record/MessageSet wire format.
//!
//! Layout of one entry inside a MessageSet:
//! `offset(8) size(4) [ crc(4) magic(1) attributes(1) [timestamp(8)] key value ]`
//! The bracketed outer pair is not covered by `crc`; `crc` covers everything
//! from `magic` to the end of `value`.

pub const OFFSET_SIZE: usize = 8;
pub const MESSAGE_SIZE_FIELD_SIZE: usize = 4;
pub const CRC_SIZE: usize = 4;
pub const MAGIC_SIZE: usize = 1;
pub const ATTRIBUTES_SIZE: usize = 1;
pub const TIMESTAMP_SIZE: usize = 8;
pub const KEY_SIZE_FIELD_SIZE: usize = 4;
pub const VALUE_SIZE_FIELD_SIZE: usize = 4;

/// Bytes preceding the message body that are covered by the CRC, for a
/// magic-0 message (no timestamp field).
pub const MESSAGE_HEADER_SIZE_V0: usize = MAGIC_SIZE + ATTRIBUTES_SIZE;
/// Same, for a magic-1 message (adds the 8-byte timestamp).
pub const MESSAGE_HEADER_SIZE_V1: usize = MESSAGE_HEADER_SIZE_V0 + TIMESTAMP_SIZE;

/// `offset` + `size` fields that precede every Record inside a MessageSet.
pub const LOG_OVERHEAD: usize = OFFSET_SIZE + MESSAGE_SIZE_FIELD_SIZE;

/// Upper bound on the non-payload bytes added to one message on the wire:
/// the 8-byte log overhead plus the largest header shape (magic-1, with a
/// null key). This is an upper bound for `maxBytes` budgeting, not an exact
/// per-message charge -- callers should not assume every message costs
/// exactly this much.
pub const MESSAGE_SIZE_OVERHEAD: usize =
    LOG_OVERHEAD + CRC_SIZE + MESSAGE_HEADER_SIZE_V1 + KEY_SIZE_FIELD_SIZE;

/// Magic byte: attributes low 3 bits are the compression codec.
pub const COMPRESSION_CODEC_MASK: i8 = 0x07;

pub const MAGIC_V0: i8 = 0;
pub const MAGIC_V1: i8 = 1;

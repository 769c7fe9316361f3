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

//! 64-bit numerics for the offset and timestamp fields on the wire.
//!
//! The source this protocol was distilled from ran on hosts whose native
//! integer could be 32 bits wide, so every 64-bit value had to be carried
//! through an arbitrary-precision representation and converted only at the
//! I/O boundary. Rust's `i64` is 64 bits on every target this crate
//! supports, so `pack64`/`unpack64` below are direct, but the wider input
//! type on `pack64` and the saturating `sum` preserve the contract for
//! callers that still hand in a value out of `i64` range (for example, one
//! read back from an arbitrary-precision accumulator upstream).

use crate::error::ClientError;

/// Packs a 64-bit signed integer into its 8-byte big-endian wire form.
///
/// Accepts `i128` so a value that overflowed `i64` on its way in can be
/// rejected explicitly rather than silently truncated.
pub fn pack64(value: i128) -> Result<[u8; 8], ClientError> {
    let narrowed = i64::try_from(value)
        .map_err(|_| ClientError::ArgError(format!("value {value} out of signed-64 range")))?;
    Ok(narrowed.to_be_bytes())
}

/// Unpacks an 8-byte big-endian wire value into a 64-bit signed integer.
pub fn unpack64(bytes: [u8; 8]) -> i64 {
    i64::from_be_bytes(bytes)
}

/// Adds two 64-bit signed integers, saturating at the `i64` bounds instead
/// of wrapping on overflow.
pub fn sum(a: i64, b: i64) -> i64 {
    a.saturating_add(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_round_trip() {
        for n in [0i64, 1, -1, i64::MIN, i64::MAX, 1_234_567_890_123] {
            let packed = pack64(n as i128).unwrap();
            assert_eq!(unpack64(packed), n);
        }
    }

    #[test]
    fn pack_rejects_out_of_range() {
        let too_big = i64::MAX as i128 + 1;
        assert!(matches!(pack64(too_big), Err(ClientError::ArgError(_))));
    }

    #[test]
    fn sum_saturates_instead_of_wrapping() {
        assert_eq!(sum(i64::MAX, 1), i64::MAX);
        assert_eq!(sum(i64::MIN, -1), i64::MIN);
        assert_eq!(sum(2, 3), 5);
    }
}

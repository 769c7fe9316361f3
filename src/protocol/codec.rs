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

use std::mem::size_of;

use byteorder::BigEndian;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;

use super::err_malformed;
use super::IoResult;

pub(crate) trait Decoder<T: Sized> {
    fn decode<B: ReadBytesExt>(&self, buf: &mut B) -> IoResult<T>;
}

pub(crate) trait Encoder<T> {
    fn encode<B: WriteBytesExt>(&self, buf: &mut B, value: T) -> IoResult<()>;
    fn calculate_size(&self, value: T) -> usize;
}

pub(crate) trait FixedSizeEncoder {
    const SIZE: usize;
}

/// Implemented by every request/response schema struct: `version` selects
/// between the wire shapes a given api key has shipped historically.
pub trait Decodable: Sized {
    fn read<B: ReadBytesExt>(buf: &mut B, version: i16) -> IoResult<Self>;
}

pub trait Encodable: Sized {
    fn write<B: WriteBytesExt>(&self, buf: &mut B, version: i16) -> IoResult<()>;
    fn calculate_size(&self, version: i16) -> usize;
}

macro_rules! define_ints_codec {
    ($name:ident, $ty:ty, $write:ident, $read:ident $(,)? $($endian:ident)?) => {
        #[derive(Debug, Copy, Clone)]
        pub(crate) struct $name;

        impl Decoder<$ty> for $name {
            fn decode<B: ReadBytesExt>(&self, buf: &mut B) -> IoResult<$ty> {
                buf.$read$(::<$endian>)?()
            }
        }

        impl Encoder<$ty> for $name {
            fn encode<B: WriteBytesExt>(&self, buf: &mut B, value: $ty) -> IoResult<()> {
                buf.$write$(::<$endian>)?(value)
            }

            #[inline]
            fn calculate_size(&self, _: $ty) -> usize {
                Self::SIZE
            }
        }

        impl Encoder<&$ty> for $name {
            fn encode<B: WriteBytesExt>(&self, buf: &mut B, value: &$ty) -> IoResult<()> {
                self.encode(buf, *value)
            }

            #[inline]
            fn calculate_size(&self, _: &$ty) -> usize {
                Self::SIZE
            }
        }

        impl FixedSizeEncoder for $name {
            const SIZE: usize = size_of::<$ty>();
        }
    };
}

define_ints_codec!(Int8, i8, write_i8, read_i8);
define_ints_codec!(Int16, i16, write_i16, read_i16, BigEndian);
define_ints_codec!(Int32, i32, write_i32, read_i32, BigEndian);
define_ints_codec!(Int64, i64, write_i64, read_i64, BigEndian);

/// `int16`-length-prefixed UTF-8 string; length `-1` decodes to `None`.
#[derive(Debug, Copy, Clone)]
pub(crate) struct NullableString;

impl Decoder<Option<String>> for NullableString {
    fn decode<B: ReadBytesExt>(&self, buf: &mut B) -> IoResult<Option<String>> {
        let len = Int16.decode(buf)? as i32;
        Ok(read_bytes(buf, len)?.map(|bs| String::from_utf8_lossy(&bs).into_owned()))
    }
}

impl Encoder<Option<&str>> for NullableString {
    fn encode<B: WriteBytesExt>(&self, buf: &mut B, value: Option<&str>) -> IoResult<()> {
        write_str(buf, value)
    }

    fn calculate_size(&self, value: Option<&str>) -> usize {
        let len = value.map(|s| s.len()).unwrap_or(0);
        Int16::SIZE + len
    }
}

impl Encoder<&str> for NullableString {
    fn encode<B: WriteBytesExt>(&self, buf: &mut B, value: &str) -> IoResult<()> {
        self.encode(buf, Some(value))
    }

    fn calculate_size(&self, value: &str) -> usize {
        self.calculate_size(Some(value))
    }
}

/// `int32`-length-prefixed byte string; length `-1` decodes to `None`.
#[derive(Debug, Copy, Clone)]
pub(crate) struct NullableBytes;

impl Decoder<Option<Vec<u8>>> for NullableBytes {
    fn decode<B: ReadBytesExt>(&self, buf: &mut B) -> IoResult<Option<Vec<u8>>> {
        let len = Int32.decode(buf)?;
        read_bytes(buf, len)
    }
}

impl<T: AsRef<[u8]>> Encoder<Option<&T>> for NullableBytes {
    fn encode<B: WriteBytesExt>(&self, buf: &mut B, value: Option<&T>) -> IoResult<()> {
        write_bytes(buf, value.map(|s| s.as_ref()))
    }

    fn calculate_size(&self, value: Option<&T>) -> usize {
        let len = value.map(|s| s.as_ref().len()).unwrap_or(0);
        Int32::SIZE + len
    }
}

impl<T: AsRef<[u8]>> Encoder<&T> for NullableBytes {
    fn encode<B: WriteBytesExt>(&self, buf: &mut B, value: &T) -> IoResult<()> {
        self.encode(buf, Some(value))
    }

    fn calculate_size(&self, value: &T) -> usize {
        self.calculate_size(Some(value))
    }
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct Struct(pub i16 /* version */);

impl<T: Decodable> Decoder<T> for Struct {
    fn decode<B: ReadBytesExt>(&self, buf: &mut B) -> IoResult<T> {
        T::read(buf, self.0)
    }
}

impl<T: Encodable> Encoder<&T> for Struct {
    fn encode<B: WriteBytesExt>(&self, buf: &mut B, value: &T) -> IoResult<()> {
        value.write(buf, self.0)
    }

    fn calculate_size(&self, value: &T) -> usize {
        value.calculate_size(self.0)
    }
}

/// `int32`-count-prefixed array of sub-structs; count `-1` decodes to `None`.
#[derive(Debug, Copy, Clone)]
pub(crate) struct NullableArray<E>(pub E);

impl<T, E: Decoder<T>> Decoder<Option<Vec<T>>> for NullableArray<E> {
    fn decode<B: ReadBytesExt>(&self, buf: &mut B) -> IoResult<Option<Vec<T>>> {
        let len = Int32.decode(buf)?;
        match len {
            -1 => Ok(None),
            n if n >= 0 => {
                let n = n as usize;
                let mut result = Vec::with_capacity(n);
                for _ in 0..n {
                    result.push(self.0.decode(buf)?);
                }
                Ok(Some(result))
            }
            n => Err(err_malformed(format!("invalid array length: {n}"))),
        }
    }
}

impl<T, E: for<'a> Encoder<&'a T>> Encoder<&[T]> for NullableArray<E> {
    fn encode<B: WriteBytesExt>(&self, buf: &mut B, value: &[T]) -> IoResult<()> {
        Int32.encode(buf, value.len() as i32)?;
        for v in value {
            self.0.encode(buf, v)?;
        }
        Ok(())
    }

    fn calculate_size(&self, value: &[T]) -> usize {
        let mut res = Int32::SIZE;
        for v in value {
            res += self.0.calculate_size(v);
        }
        res
    }
}

fn read_bytes<B: ReadBytesExt>(buf: &mut B, len: i32) -> IoResult<Option<Vec<u8>>> {
    match len {
        -1 => Ok(None),
        n if n >= 0 => {
            let n = n as usize;
            let mut v = vec![0; n];
            buf.read_exact(&mut v)
                .map_err(|e| err_malformed(format!("failed to read {n} bytes: {e}")))?;
            Ok(Some(v))
        }
        n => Err(err_malformed(format!("invalid length: {n}"))),
    }
}

fn write_str<B: WriteBytesExt>(buf: &mut B, str: Option<&str>) -> IoResult<()> {
    match str {
        None => Int16.encode(buf, -1)?,
        Some(s) => {
            let bs = s.as_bytes();
            Int16.encode(buf, bs.len() as i16)?;
            buf.write_all(bs)?;
        }
    }
    Ok(())
}

fn write_bytes<B: WriteBytesExt>(buf: &mut B, bytes: Option<&[u8]>) -> IoResult<()> {
    match bytes {
        None => Int32.encode(buf, -1)?,
        Some(bs) => {
            Int32.encode(buf, bs.len() as i32)?;
            buf.write_all(bs)?;
        }
    }
    Ok(())
}

//! Bounded, endian-aware access to the in-memory file buffer.

use std::fmt::Debug;
use std::io::Read;
use std::ops::Range;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use bytes::buf::Reader;
use bytes::{Buf, Bytes};

use crate::error::{NefError, NefResult};

/// The interface used to read byte ranges out of a NEF source.
///
/// Every read is bounded: a range that extends past the end of the source is an error rather
/// than a short result. [`Bytes`] implements this trait, which is what [`decode`][crate::decode]
/// uses after loading the whole file into memory.
pub trait FileReader: Debug + Send + Sync {
    /// Retrieve the bytes in `range`.
    fn get_bytes(&self, range: Range<u64>) -> NefResult<Bytes>;

    /// Retrieve multiple byte ranges. The default implementation calls `get_bytes` sequentially
    /// and preserves the order of `ranges`.
    fn get_byte_ranges(&self, ranges: Vec<Range<u64>>) -> NefResult<Vec<Bytes>> {
        let mut result = Vec::with_capacity(ranges.len());
        for range in ranges.into_iter() {
            result.push(self.get_bytes(range)?);
        }
        Ok(result)
    }
}

impl FileReader for Bytes {
    fn get_bytes(&self, range: Range<u64>) -> NefResult<Bytes> {
        let available = self.len() as u64;
        let expected = range.end.saturating_sub(range.start);
        if range.start > range.end || range.end > available {
            return Err(NefError::truncated(
                range.start,
                expected,
                available.saturating_sub(range.start),
            ));
        }
        Ok(self.slice(range.start as usize..range.end as usize))
    }
}

impl<T: FileReader + ?Sized> FileReader for &T {
    fn get_bytes(&self, range: Range<u64>) -> NefResult<Bytes> {
        (**self).get_bytes(range)
    }

    fn get_byte_ranges(&self, ranges: Vec<Range<u64>>) -> NefResult<Vec<Bytes>> {
        (**self).get_byte_ranges(ranges)
    }
}

/// Endianness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    /// Little Endian (`II`)
    LittleEndian,
    /// Big Endian (`MM`)
    BigEndian,
}

#[derive(Debug)]
pub(crate) struct EndianAwareReader {
    reader: Reader<Bytes>,
    endianness: Endianness,
    /// Absolute offset of the first byte, used for error reporting.
    start: u64,
    len: u64,
}

macro_rules! read_ordered {
    ($name:ident, $ty:ty, $size:expr) => {
        pub(crate) fn $name(&mut self) -> NefResult<$ty> {
            self.ensure($size)?;
            let value = match self.endianness {
                Endianness::LittleEndian => self.reader.$name::<LittleEndian>(),
                Endianness::BigEndian => self.reader.$name::<BigEndian>(),
            };
            value.map_err(|_| self.short($size))
        }
    };
}

impl EndianAwareReader {
    pub(crate) fn new(bytes: Bytes, endianness: Endianness) -> Self {
        Self::new_at(bytes, endianness, 0)
    }

    pub(crate) fn new_at(bytes: Bytes, endianness: Endianness, start: u64) -> Self {
        let len = bytes.len() as u64;
        Self {
            reader: bytes.reader(),
            endianness,
            start,
            len,
        }
    }

    fn remaining(&self) -> u64 {
        self.reader.get_ref().remaining() as u64
    }

    fn ensure(&self, expected: u64) -> NefResult<()> {
        if self.remaining() < expected {
            return Err(self.short(expected));
        }
        Ok(())
    }

    fn short(&self, expected: u64) -> NefError {
        let consumed = self.len - self.remaining();
        NefError::truncated(self.start + consumed, expected, self.remaining())
    }

    /// Read a u8 from the cursor, advancing the internal state by 1 byte.
    pub(crate) fn read_u8(&mut self) -> NefResult<u8> {
        self.ensure(1)?;
        self.reader.read_u8().map_err(|_| self.short(1))
    }

    /// Read a i8 from the cursor, advancing the internal state by 1 byte.
    pub(crate) fn read_i8(&mut self) -> NefResult<i8> {
        self.ensure(1)?;
        self.reader.read_i8().map_err(|_| self.short(1))
    }

    read_ordered!(read_u16, u16, 2);
    read_ordered!(read_i16, i16, 2);
    read_ordered!(read_u32, u32, 4);
    read_ordered!(read_i32, i32, 4);
    read_ordered!(read_f32, f32, 4);
    read_ordered!(read_f64, f64, 8);

    /// Fill `buf` completely or fail with [`NefError::Truncated`].
    pub(crate) fn read_exact(&mut self, buf: &mut [u8]) -> NefResult<()> {
        let expected = buf.len() as u64;
        self.ensure(expected)?;
        self.reader
            .read_exact(buf)
            .map_err(|_| self.short(expected))
    }
}

impl EndianAwareReader {
    /// The unread remainder of the buffer.
    pub(crate) fn into_bytes(self) -> Bytes {
        self.reader.into_inner()
    }
}

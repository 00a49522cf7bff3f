use crate::error::{NefError, NefResult};
use crate::reader::{EndianAwareReader, Endianness, FileReader};

/// A position in a [`FileReader`] that reads numbers in a fixed byte order.
pub(crate) struct MetadataCursor<'a, F: FileReader + ?Sized> {
    fetch: &'a F,
    offset: u64,
    endianness: Endianness,
}

impl<'a, F: FileReader + ?Sized> MetadataCursor<'a, F> {
    pub fn new(fetch: &'a F, endianness: Endianness) -> Self {
        Self {
            fetch,
            offset: 0,
            endianness,
        }
    }

    pub fn new_with_offset(fetch: &'a F, endianness: Endianness, offset: u64) -> Self {
        Self {
            fetch,
            offset,
            endianness,
        }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Read the given number of bytes, advancing the internal cursor state by the same amount.
    pub(crate) fn read(&mut self, length: u64) -> NefResult<EndianAwareReader> {
        let end = self
            .offset
            .checked_add(length)
            .ok_or_else(|| NefError::truncated(self.offset, length, 0))?;
        let bytes = self.fetch.get_bytes(self.offset..end)?;
        let reader = EndianAwareReader::new_at(bytes, self.endianness, self.offset);
        self.offset = end;
        Ok(reader)
    }

    /// Read a u16 from the cursor, advancing the internal state by 2 bytes.
    pub(crate) fn read_u16(&mut self) -> NefResult<u16> {
        self.read(2)?.read_u16()
    }

    /// Read a u32 from the cursor, advancing the internal state by 4 bytes.
    pub(crate) fn read_u32(&mut self) -> NefResult<u32> {
        self.read(4)?.read_u32()
    }
}

//! Cursor-backed byte buffer for the block-framed codecs.
//!
//! LZ4 and LZF only ship block primitives, so their adapters wrap each block
//! in a small header. This buffer writes those headers on the way out and
//! reads them back with bounds checks on the way in.

use crate::error::{CodecError, CodecResult};
use std::borrow::Cow;

/// A buffer with a cursor for sequential reading or writing.
pub(crate) struct FrameBuffer<'a> {
    buffer: Cow<'a, [u8]>,
    cursor: usize,
}

impl FrameBuffer<'static> {
    /// Creates an empty writable buffer with the given capacity.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Cow::Owned(Vec::with_capacity(capacity)),
            cursor: 0,
        }
    }
}

impl<'a> FrameBuffer<'a> {
    /// Wraps framed input for reading, positioned at the start.
    pub(crate) fn reader(data: &'a [u8]) -> Self {
        Self {
            buffer: Cow::Borrowed(data),
            cursor: 0,
        }
    }

    /// Consumes the buffer and returns the written bytes.
    pub(crate) fn into_vec(self) -> Vec<u8> {
        self.buffer.into_owned()
    }

    /// Returns the number of bytes remaining from the cursor to the end.
    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.cursor)
    }

    /// Returns true once every byte has been consumed.
    #[inline]
    pub(crate) fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Writes a single byte.
    pub(crate) fn write_u8(&mut self, value: u8) {
        self.buffer.to_mut().push(value);
        self.cursor += 1;
    }

    /// Writes a big-endian `u16`.
    pub(crate) fn write_u16_be(&mut self, value: u16) {
        self.write_bytes(&value.to_be_bytes());
    }

    /// Writes a little-endian `u32`.
    pub(crate) fn write_u32_le(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a slice of bytes.
    pub(crate) fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.to_mut().extend_from_slice(data);
        self.cursor += data.len();
    }

    /// Reads a single byte.
    pub(crate) fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Reads a big-endian `u16`.
    pub(crate) fn read_u16_be(&mut self) -> CodecResult<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a little-endian `u32`.
    pub(crate) fn read_u32_le(&mut self) -> CodecResult<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads `len` bytes and advances the cursor.
    pub(crate) fn read_bytes(&mut self, len: usize) -> CodecResult<&[u8]> {
        let end = self
            .cursor
            .checked_add(len)
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| {
                CodecError::Corrupt(format!(
                    "frame truncated: needed {} bytes at offset {}, {} available",
                    len,
                    self.cursor,
                    self.remaining()
                ))
            })?;
        let start = self.cursor;
        self.cursor = end;
        Ok(&self.buffer[start..end])
    }

    /// Consumes `expected` if it is next in the buffer, failing otherwise.
    pub(crate) fn expect_bytes(&mut self, expected: &[u8], what: &str) -> CodecResult<()> {
        let found = self.read_bytes(expected.len())?;
        if found != expected {
            return Err(CodecError::Corrupt(format!(
                "bad {}: expected {:02x?}, found {:02x?}",
                what, expected, found
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_write_then_read() {
        let mut buf = FrameBuffer::with_capacity(16);
        buf.write_u8(42);
        buf.write_u16_be(0x1234);
        buf.write_u32_le(0xDEAD_BEEF);
        buf.write_bytes(&[1, 2, 3]);

        let bytes = buf.into_vec();
        assert_eq!(&bytes[1..3], &[0x12, 0x34]);

        let mut reader = FrameBuffer::reader(&bytes);
        assert_eq!(reader.read_u8().unwrap(), 42);
        assert_eq!(reader.read_u16_be().unwrap(), 0x1234);
        assert_eq!(reader.read_u32_le().unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_bytes(3).unwrap(), &[1, 2, 3]);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_frame_underflow_is_corrupt() {
        let mut reader = FrameBuffer::reader(&[1, 2, 3]);
        assert_eq!(reader.read_u8().unwrap(), 1);
        assert!(matches!(reader.read_u32_le(), Err(CodecError::Corrupt(_))));
    }

    #[test]
    fn test_frame_magic_mismatch() {
        let mut reader = FrameBuffer::reader(b"ZX\x00");
        assert!(reader.expect_bytes(b"ZV", "chunk signature").is_err());
    }
}

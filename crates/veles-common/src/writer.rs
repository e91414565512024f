//! Binary writer for serializing into pre-sized buffers.
//!
//! The save path of every Veles format computes its exact byte length first,
//! allocates one buffer, and then writes linearly into it. [`BinaryWriter`]
//! is the position-tracked cursor for that second pass; it mirrors
//! [`BinaryReader`](crate::BinaryReader) method for method.

use crate::{Error, Result};

/// A binary writer over a pre-allocated mutable byte slice.
///
/// All multi-byte writes are little-endian. Writing past the end of the
/// buffer is an error, never a reallocation - the buffer size is the
/// byte-length contract computed before writing started.
///
/// # Example
///
/// ```
/// use veles_common::BinaryWriter;
///
/// let mut buffer = [0u8; 8];
/// let mut writer = BinaryWriter::new(&mut buffer);
///
/// writer.write_u32(0x04030201).unwrap();
/// writer.write_f32(1.0).unwrap();
/// assert_eq!(writer.remaining(), 0);
/// assert_eq!(buffer[0], 0x01);
/// ```
#[derive(Debug)]
pub struct BinaryWriter<'a> {
    data: &'a mut [u8],
    position: usize,
}

impl<'a> BinaryWriter<'a> {
    /// Create a new writer over a mutable byte slice.
    #[inline]
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer has no capacity at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the number of bytes remaining to write.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Seek to an absolute position.
    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Advance the position, leaving the skipped bytes untouched.
    #[inline]
    pub fn advance(&mut self, count: usize) {
        self.position = self.position.saturating_add(count);
    }

    /// Write raw bytes and advance the position.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.remaining() < bytes.len() {
            return Err(Error::UnexpectedEof {
                needed: bytes.len(),
                available: self.remaining(),
            });
        }
        self.data[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
        Ok(())
    }

    /// Write a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    /// Write a signed byte.
    #[inline]
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_u8(value as u8)
    }

    /// Write a little-endian u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write a little-endian i16.
    #[inline]
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write a little-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write a little-endian i32.
    #[inline]
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write a little-endian f32.
    #[inline]
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write a little-endian f64.
    #[inline]
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write a four-character chunk tag.
    #[inline]
    pub fn write_tag(&mut self, tag: [u8; 4]) -> Result<()> {
        self.write_bytes(&tag)
    }

    /// Write a string's bytes without a terminator.
    #[inline]
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Write a string followed by a null terminator.
    pub fn write_cstring(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())?;
        self.write_u8(0)
    }

    /// Write a string into a fixed-size field, null-padded to `buffer_size`.
    ///
    /// Strings longer than the field are truncated; the field is always
    /// exactly `buffer_size` bytes. Mirror of
    /// [`BinaryReader::read_string_block`](crate::BinaryReader::read_string_block).
    pub fn write_string_block(&mut self, value: &str, buffer_size: usize) -> Result<()> {
        let bytes = value.as_bytes();
        let written = bytes.len().min(buffer_size);
        self.write_bytes(&bytes[..written])?;
        for _ in written..buffer_size {
            self.write_u8(0)?;
        }
        Ok(())
    }

    /// Write a slice of little-endian f32 values.
    pub fn write_f32_array(&mut self, values: &[f32]) -> Result<()> {
        for &value in values {
            self.write_f32(value)?;
        }
        Ok(())
    }

    /// Write a slice of little-endian u32 values.
    pub fn write_u32_array(&mut self, values: &[u32]) -> Result<()> {
        for &value in values {
            self.write_u32(value)?;
        }
        Ok(())
    }

    /// Write a slice of little-endian i32 values.
    pub fn write_i32_array(&mut self, values: &[i32]) -> Result<()> {
        for &value in values {
            self.write_i32(value)?;
        }
        Ok(())
    }

    /// Write a slice of little-endian u16 values.
    pub fn write_u16_array(&mut self, values: &[u16]) -> Result<()> {
        for &value in values {
            self.write_u16(value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinaryReader;

    #[test]
    fn test_write_then_read() {
        let mut buffer = [0u8; 14];
        let mut writer = BinaryWriter::new(&mut buffer);
        writer.write_u32(1234).unwrap();
        writer.write_f32(-0.5).unwrap();
        writer.write_u16(7).unwrap();
        writer.write_tag(*b"SEQS").unwrap();
        assert_eq!(writer.remaining(), 0);

        let mut reader = BinaryReader::new(&buffer);
        assert_eq!(reader.read_u32().unwrap(), 1234);
        assert_eq!(reader.read_f32().unwrap(), -0.5);
        assert_eq!(reader.read_u16().unwrap(), 7);
        assert_eq!(&reader.read_tag().unwrap(), b"SEQS");
    }

    #[test]
    fn test_string_block_pads_and_truncates() {
        let mut buffer = [0xAAu8; 8];
        {
            let mut writer = BinaryWriter::new(&mut buffer);
            writer.write_string_block("abc", 8).unwrap();
        }
        assert_eq!(&buffer, b"abc\0\0\0\0\0");

        let mut buffer = [0u8; 4];
        {
            let mut writer = BinaryWriter::new(&mut buffer);
            writer.write_string_block("longname", 4).unwrap();
        }
        assert_eq!(&buffer, b"long");
    }

    #[test]
    fn test_overrun_is_error() {
        let mut buffer = [0u8; 2];
        let mut writer = BinaryWriter::new(&mut buffer);
        assert!(writer.write_u32(1).is_err());
    }
}

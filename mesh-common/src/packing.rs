//! Scalar packing utilities
//!
//! Every scalar in a geometry block is little-endian and 4-byte aligned,
//! with the exception of 16-bit index buffers. Strings are stored
//! "parsable": an `i32` length followed by one `i32` per character code, so
//! the reader never has to realign after a string.

use crate::formats::FormatError;

// ============================================================================
// Writers
// ============================================================================

#[inline]
pub fn pack_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn pack_f32(out: &mut Vec<u8>, value: f32) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn pack_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn pack_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Pack a run of floats back to back
pub fn pack_f32_slice(out: &mut Vec<u8>, values: &[f32]) {
    out.reserve(values.len() * 4);
    for &v in values {
        pack_f32(out, v);
    }
}

/// Pack a length-prefixed string (`i32` length, then one `i32` per char)
pub fn pack_parsable_string(out: &mut Vec<u8>, s: &str) {
    let chars: Vec<char> = s.chars().collect();
    pack_i32(out, chars.len() as i32);
    for c in chars {
        pack_i32(out, c as i32);
    }
}

// ============================================================================
// Reader
// ============================================================================

/// Bounds-checked little-endian cursor over a byte slice
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current read offset in bytes
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < len {
            return Err(FormatError::Truncated {
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_i32(&mut self) -> Result<i32, FormatError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, FormatError> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16, FormatError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    /// Read an `i32` that is used as an element count
    pub fn read_count(&mut self, field: &'static str) -> Result<usize, FormatError> {
        let value = self.read_i32()?;
        usize::try_from(value).map_err(|_| FormatError::NegativeCount { field, value })
    }

    pub fn read_f32_vec(&mut self, count: usize) -> Result<Vec<f32>, FormatError> {
        let bytes = self.take(count.checked_mul(4).ok_or(FormatError::Overflow)?)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    /// Read a string written by [`pack_parsable_string`]
    pub fn read_parsable_string(&mut self) -> Result<String, FormatError> {
        let len = self.read_count("string length")?;
        let bytes = self.take(len.checked_mul(4).ok_or(FormatError::Overflow)?)?;
        bytes
            .chunks_exact(4)
            .map(|c| {
                let code = u32::from_le_bytes([c[0], c[1], c[2], c[3]]);
                char::from_u32(code).ok_or(FormatError::InvalidChar(code))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsable_string_layout() {
        let mut out = Vec::new();
        pack_parsable_string(&mut out, "mat");
        assert_eq!(out.len(), 16);
        assert_eq!(&out[0..4], &3i32.to_le_bytes());
        assert_eq!(&out[4..8], &('m' as i32).to_le_bytes());

        let mut reader = ByteReader::new(&out);
        assert_eq!(reader.read_parsable_string().unwrap(), "mat");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_scalars_little_endian() {
        let mut out = Vec::new();
        pack_i32(&mut out, -2);
        pack_f32(&mut out, 1.5);
        pack_u16(&mut out, 0xBEEF);
        pack_u32(&mut out, 70_000);
        assert_eq!(out.len(), 14);
        assert_eq!(&out[0..4], &[0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&out[8..10], &[0xEF, 0xBE]);

        let mut reader = ByteReader::new(&out);
        assert_eq!(reader.read_i32().unwrap(), -2);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
        assert_eq!(reader.read_u16().unwrap(), 0xBEEF);
        assert_eq!(reader.read_u32().unwrap(), 70_000);
    }

    #[test]
    fn test_reader_reports_truncation() {
        let mut reader = ByteReader::new(&[1, 2, 3]);
        let err = reader.read_i32().unwrap_err();
        assert!(matches!(
            err,
            FormatError::Truncated {
                offset: 0,
                needed: 4,
                available: 3
            }
        ));
    }

    #[test]
    fn test_oversized_string_length_is_truncation() {
        let mut out = Vec::new();
        pack_i32(&mut out, i32::MAX);
        pack_i32(&mut out, 'a' as i32);
        let mut reader = ByteReader::new(&out);
        assert!(matches!(
            reader.read_parsable_string(),
            Err(FormatError::Truncated { offset: 4, available: 4, .. })
        ));
    }

    #[test]
    fn test_negative_count_rejected() {
        let mut out = Vec::new();
        pack_i32(&mut out, -1);
        let mut reader = ByteReader::new(&out);
        assert!(matches!(
            reader.read_count("vertex_count"),
            Err(FormatError::NegativeCount { value: -1, .. })
        ));
    }
}

/// Errors raised while decoding a geometry file
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    /// Not enough bytes left for the next field
    #[error("truncated data at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A count field holds a negative value
    #[error("{field} is negative ({value})")]
    NegativeCount { field: &'static str, value: i32 },

    /// Index element size other than 2 or 4
    #[error("invalid index element size {0} (must be 2 or 4)")]
    InvalidIndexSize(u32),

    /// A string character code is not a valid Unicode scalar
    #[error("invalid character code {0} in string")]
    InvalidChar(u32),

    /// A size computation overflowed `usize`
    #[error("size computation overflowed")]
    Overflow,

    /// Bytes left over after the last mesh block
    #[error("{0} trailing bytes after last mesh block")]
    TrailingBytes(usize),
}

//! ROM parsing error types

use core::fmt;

/// ROM parsing error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RomError {
    /// ROM image is empty
    EmptyImage,
    /// Read past the end of the ROM
    OutOfBounds {
        /// Requested byte offset
        offset: usize,
        /// Requested length in bytes
        len: usize,
        /// Total ROM size in bytes
        rom_size: usize,
    },
    /// ROM too small to hold the first segment header
    MissingFirstSegment,
    /// First segment header carries the wrong magic bytes
    BadMagic,
    /// Segment offset table does not fit the segment or the ROM
    OffsetTableOutOfBounds {
        /// 0-based segment index
        segment: usize,
        /// Number of table entries implied by the header
        count: usize,
    },
}

impl fmt::Display for RomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RomError::EmptyImage => write!(f, "ROM image is empty"),
            RomError::OutOfBounds {
                offset,
                len,
                rom_size,
            } => write!(
                f,
                "read of {} bytes at offset 0x{:X} exceeds ROM size 0x{:X}",
                len, offset, rom_size
            ),
            RomError::MissingFirstSegment => {
                write!(f, "ROM too small for even one segment header")
            }
            RomError::BadMagic => {
                write!(f, "invalid magic number in first segment header")
            }
            RomError::OffsetTableOutOfBounds { segment, count } => write!(
                f,
                "offset table ({} entries) exceeds segment/ROM bounds in segment {}",
                count, segment
            ),
        }
    }
}

impl std::error::Error for RomError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(RomError::EmptyImage.to_string(), "ROM image is empty");
        assert_eq!(
            RomError::OutOfBounds {
                offset: 0x100,
                len: 2,
                rom_size: 0x101,
            }
            .to_string(),
            "read of 2 bytes at offset 0x100 exceeds ROM size 0x101"
        );
        assert_eq!(
            RomError::OffsetTableOutOfBounds {
                segment: 3,
                count: 256,
            }
            .to_string(),
            "offset table (256 entries) exceeds segment/ROM bounds in segment 3"
        );
    }
}

//! VoiceWare-ROM: Nortel Millennium VoiceWare ROM container parser
//!
//! This crate provides a pure Rust parser for the ROM images used by Nortel
//! Millennium payphone VoiceWare sets. It handles the container layer only:
//! segment discovery, header validation, and offset-table decoding. Message
//! payloads (uPD7759 ADPCM command streams or raw PCM) are handed to the
//! caller as byte ranges.
//!
//! # ROM Format Overview
//!
//! A ROM image is a concatenation of 128 KiB segments. Each segment starts
//! with a 5-byte header followed by a big-endian `u16` offset table:
//!
//! ```text
//! offset  size  field
//!   0      1    last_msg_idx  (message count - 1)
//!   1      4    magic = 5A A5 69 55
//!   5     2*N   big-endian u16 word offsets, N = last_msg_idx + 1
//! ```
//!
//! Each word offset multiplied by 2 gives the byte offset of the message's
//! mode byte from the segment start. Segments repeat at a fixed 131072-byte
//! pitch regardless of how much payload each one actually carries.
//!
//! # Usage
//!
//! ```
//! use voiceware_rom::RomImage;
//!
//! # fn demo(data: Vec<u8>) -> Result<(), voiceware_rom::RomError> {
//! let rom = RomImage::new(data)?;
//! for segment in rom.segments() {
//!     let segment = segment?;
//!     for i in 0..segment.message_count() {
//!         let start = segment.message_start(i);
//!         let mode = rom.as_slice()[start];
//!         println!("segment {} message {} mode 0x{:02X}", segment.index, i, mode);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod image;
mod segment;

pub use error::RomError;
pub use image::RomImage;
pub use segment::{Segment, Segments};

// =============================================================================
// Constants
// =============================================================================

/// Fixed segment pitch in bytes (128 KiB)
pub const SEGMENT_SIZE: usize = 131072;

/// Magic bytes at offset 1 of every segment header
pub const SEGMENT_MAGIC: [u8; 4] = [0x5A, 0xA5, 0x69, 0x55];

/// Segment header size: last-message-index byte plus magic
pub const SEGMENT_HEADER_SIZE: usize = 5;

/// Message mode byte for uPD7759 ADPCM command streams
pub const MODE_ADPCM: u8 = 0x00;

/// Message mode byte for raw PCM payloads
pub const MODE_RAW_PCM: u8 = 0x40;

//! Segment discovery and offset-table decoding

use crate::error::RomError;
use crate::image::RomImage;
use crate::{SEGMENT_HEADER_SIZE, SEGMENT_MAGIC, SEGMENT_SIZE};

/// A validated segment: header checked, offset table decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// 0-based segment index
    pub index: usize,
    /// Absolute byte offset of the segment start
    pub base: usize,
    /// Word offsets (byte offset / 2) of each message, relative to `base`
    pub offsets: Vec<u16>,
}

impl Segment {
    /// Number of messages in this segment.
    pub fn message_count(&self) -> usize {
        self.offsets.len()
    }

    /// Absolute byte offset of message `i`'s mode byte.
    ///
    /// The offset table stores word offsets; the byte offset is twice that,
    /// measured from the segment base.
    pub fn message_start(&self, i: usize) -> usize {
        self.base + self.offsets[i] as usize * 2
    }

    /// Absolute byte offset one past the last byte of message `i`.
    ///
    /// This is the next message's start when one exists, otherwise the end of
    /// the segment, clamped to `rom_len`. The range can come out empty or
    /// inverted for malformed tables; callers must check.
    pub fn message_end(&self, i: usize, rom_len: usize) -> usize {
        let end = if i + 1 < self.offsets.len() {
            self.base + self.offsets[i + 1] as usize * 2
        } else {
            self.base + SEGMENT_SIZE
        };
        end.min(rom_len)
    }
}

/// Iterator over a ROM's segments at the fixed 128 KiB pitch.
///
/// Yields `Result<Segment, RomError>`. A truncated header or wrong magic at
/// segment 0 is an error (the input is not a VoiceWare ROM); the same
/// condition at any later segment is a clean end of traversal (trailing junk
/// or a truncated file). An offset table that does not fit its segment or
/// the ROM is an error wherever it occurs. The iterator is fused after the
/// first error.
pub struct Segments<'a> {
    rom: &'a RomImage,
    base: usize,
    index: usize,
    done: bool,
}

impl<'a> Segments<'a> {
    pub(crate) fn new(rom: &'a RomImage) -> Self {
        Self {
            rom,
            base: 0,
            index: 0,
            done: false,
        }
    }

    fn fail(&mut self, err: RomError) -> Option<Result<Segment, RomError>> {
        self.done = true;
        Some(Err(err))
    }

    fn finish(&mut self) -> Option<Result<Segment, RomError>> {
        self.done = true;
        None
    }
}

impl Iterator for Segments<'_> {
    type Item = Result<Segment, RomError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.base >= self.rom.len() {
            return None;
        }

        let base = self.base;
        let index = self.index;
        tracing::debug!("processing segment {} at offset 0x{:X}", index, base);

        let header = match self.rom.bytes(base, SEGMENT_HEADER_SIZE) {
            Ok(header) => header,
            Err(_) => {
                // Partial header at the tail of the file.
                if index == 0 {
                    return self.fail(RomError::MissingFirstSegment);
                }
                tracing::debug!("incomplete segment header at end of file, stopping");
                return self.finish();
            }
        };

        if header[1..SEGMENT_HEADER_SIZE] != SEGMENT_MAGIC {
            if index == 0 {
                return self.fail(RomError::BadMagic);
            }
            tracing::debug!(
                "invalid magic at segment {} start, assuming end of ROM data",
                index
            );
            return self.finish();
        }

        let count = header[0] as usize + 1;
        let table_start = base + SEGMENT_HEADER_SIZE;
        let table_end = table_start + count * 2;
        if table_end > self.rom.len() || table_end > base + SEGMENT_SIZE {
            return self.fail(RomError::OffsetTableOutOfBounds {
                segment: index,
                count,
            });
        }

        let mut offsets = Vec::with_capacity(count);
        for k in 0..count {
            // Bounds established above; read_u16_be cannot fail here.
            match self.rom.read_u16_be(table_start + k * 2) {
                Ok(word) => offsets.push(word),
                Err(err) => return self.fail(err),
            }
        }
        tracing::debug!("segment {} header OK, {} messages", index, count);

        // Fixed pitch: segments are page-aligned in the physical ROM, so the
        // stride ignores how much payload this segment actually used.
        self.base += SEGMENT_SIZE;
        self.index += 1;

        Some(Ok(Segment {
            index,
            base,
            offsets,
        }))
    }
}

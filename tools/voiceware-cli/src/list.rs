//! List mode: print the ROM inventory in mapping-file format
//!
//! The output parses straight back in through `-m`, so the usual workflow is
//! to list a ROM, edit the generated names, and re-run the decoder with the
//! edited file.

use anyhow::Result;
use std::io::Write;
use voiceware_rom::{RomImage, MODE_RAW_PCM};

use crate::mapping::{default_output_base, MappingIndex};

/// Target column for the comment field
const FILENAME_ALIGN_WIDTH: usize = 40;

/// Tab width assumed for column alignment
const TAB_WIDTH: usize = 8;

/// Lists every message to `out`, one mapping-format line each.
pub fn execute(
    rom: &RomImage,
    mappings: &MappingIndex,
    rom_basename: &str,
    mut out: impl Write,
) -> Result<()> {
    writeln!(out, "# ROM: {}\n", rom_basename)?;

    for segment in rom.segments() {
        let segment = segment?;
        for i in 0..segment.message_count() {
            let mapping = mappings.lookup(segment.index as u32, i as u32);
            let (output_base, comment) = match mapping {
                Some(m) => (m.output_base.clone(), m.comment.as_deref()),
                None => (default_output_base(segment.index, i), None),
            };

            let mode = match rom.byte(segment.message_start(i)) {
                Ok(mode) => Some(mode),
                Err(_) => {
                    tracing::warn!(
                        "cannot read mode byte for list entry (segment {}, index {}): \
                         offset out of bounds",
                        segment.index,
                        i
                    );
                    None
                }
            };

            writeln!(
                out,
                "{}",
                format_line(segment.index, i, &output_base, mode, comment)
            )?;
        }
    }

    Ok(())
}

/// Formats one inventory line: indices, name, tab padding, `#` comment.
fn format_line(
    segment: usize,
    in_segment: usize,
    output_base: &str,
    mode: Option<u8>,
    comment: Option<&str>,
) -> String {
    let mut line = format!("{}\t{}\t{}", segment, in_segment, output_base);

    // Pad with tabs up to the alignment column; always at least one so the
    // comment never runs into the name.
    let stops = output_base.len() / TAB_WIDTH;
    let target_stops = FILENAME_ALIGN_WIDTH.div_ceil(TAB_WIDTH);
    let tabs = if stops < target_stops {
        target_stops - stops
    } else {
        1
    };
    for _ in 0..tabs {
        line.push('\t');
    }

    line.push('#');
    let pcm_already_noted = comment.is_some_and(|c| c.contains("(PCM)"));
    let mut pcm_tagged = false;
    if mode == Some(MODE_RAW_PCM) && !pcm_already_noted {
        line.push_str(" (PCM)");
        pcm_tagged = true;
    }
    match comment.filter(|c| !c.is_empty()) {
        Some(comment) => {
            line.push(' ');
            line.push_str(comment);
        }
        None => {
            if !pcm_tagged {
                line.push(' ');
            }
        }
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MessageMapping;
    use voiceware_rom::{SEGMENT_MAGIC, SEGMENT_SIZE};

    fn build_rom(offsets: &[u16], payload: &[(usize, u8)]) -> RomImage {
        let mut data = vec![0u8; SEGMENT_SIZE];
        data[0] = (offsets.len() - 1) as u8;
        data[1..5].copy_from_slice(&SEGMENT_MAGIC);
        for (k, word) in offsets.iter().enumerate() {
            data[5 + k * 2..5 + k * 2 + 2].copy_from_slice(&word.to_be_bytes());
        }
        for &(off, byte) in payload {
            data[off] = byte;
        }
        RomImage::new(data).unwrap()
    }

    #[test]
    fn test_default_line_short_name() {
        // "message_0_000" is 13 chars -> 1 stop used, 5 target stops.
        let line = format_line(0, 0, "message_0_000", Some(0x00), None);
        assert_eq!(line, "0\t0\tmessage_0_000\t\t\t\t# ");
    }

    #[test]
    fn test_minimum_one_tab_past_target() {
        let long_name = "a".repeat(48); // 6 stops, past the 5-stop target
        let line = format_line(2, 7, &long_name, Some(0x00), None);
        assert_eq!(line, format!("2\t7\t{}\t# ", long_name));
    }

    #[test]
    fn test_pcm_tag_added() {
        let line = format_line(0, 1, "tone", Some(0x40), None);
        assert_eq!(line, "0\t1\ttone\t\t\t\t\t# (PCM)");
    }

    #[test]
    fn test_pcm_tag_with_comment() {
        let line = format_line(0, 1, "tone", Some(0x40), Some("dial tone"));
        assert_eq!(line, "0\t1\ttone\t\t\t\t\t# (PCM) dial tone");
    }

    #[test]
    fn test_pcm_tag_not_duplicated() {
        // User comment already notes (PCM); five tabs after the 5-char name.
        let line = format_line(0, 3, "hello", Some(0x40), Some("(PCM) greeting"));
        assert_eq!(line, "0\t3\thello\t\t\t\t\t# (PCM) greeting");
    }

    #[test]
    fn test_unreadable_mode_lists_without_tag() {
        let line = format_line(0, 0, "name", None, None);
        assert_eq!(line, "0\t0\tname\t\t\t\t\t# ");
    }

    #[test]
    fn test_name_at_tab_stop_boundary() {
        // 16 chars = exactly 2 stops; 3 tabs reach the target column.
        let line = format_line(0, 0, "sixteen_chars_xx", Some(0x00), None);
        assert_eq!(line, "0\t0\tsixteen_chars_xx\t\t\t# ");
    }

    #[test]
    fn test_listing_is_a_valid_mapping_file() {
        // Re-parsing list output must reproduce the printed names.
        let rom = build_rom(&[0x0005, 0x0010], &[(0x0A, 0x00), (0x20, 0x40)]);
        let mut index = MappingIndex::default();
        index.insert(MessageMapping {
            segment: 0,
            in_segment: 0,
            output_base: "hello".to_string(),
            comment: Some("greeting".to_string()),
        });

        let mut out = Vec::new();
        execute(&rom, &index, "rom.bin", &mut out).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing.map");
        std::fs::write(&path, &out).unwrap();
        let reloaded = crate::mapping::load_mappings(&path).unwrap();

        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.lookup(0, 0).unwrap().output_base, "hello");
        assert_eq!(
            reloaded.lookup(0, 0).unwrap().comment.as_deref(),
            Some("greeting")
        );
        assert_eq!(reloaded.lookup(0, 1).unwrap().output_base, "message_0_001");
        assert_eq!(
            reloaded.lookup(0, 1).unwrap().comment.as_deref(),
            Some("(PCM)")
        );
    }

    #[test]
    fn test_execute_header_and_lines() {
        let rom = build_rom(&[0x0005, 0x0010], &[(0x0A, 0x00), (0x20, 0x40)]);
        let mut index = MappingIndex::default();
        index.insert(MessageMapping {
            segment: 0,
            in_segment: 1,
            output_base: "tone".to_string(),
            comment: None,
        });

        let mut out = Vec::new();
        execute(&rom, &index, "rom.bin", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("# ROM: rom.bin"));
        assert_eq!(lines.next(), Some(""));
        assert_eq!(lines.next(), Some("0\t0\tmessage_0_000\t\t\t\t# "));
        assert_eq!(lines.next(), Some("0\t1\ttone\t\t\t\t\t# (PCM)"));
        assert_eq!(lines.next(), None);
    }
}

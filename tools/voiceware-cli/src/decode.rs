//! Decode mode: walk the ROM and dispatch every message
//!
//! ADPCM messages are decoded and written as WAV; raw PCM messages are
//! copied byte-for-byte to `.pcm` files. Per-message problems (bad offsets,
//! truncated streams, unknown modes, write failures) are logged and skipped
//! so one damaged message never sinks the rest of the ROM.

use anyhow::{bail, Context, Result};
use std::path::Path;
use voiceware_adpcm::decode_message;
use voiceware_rom::{RomImage, Segment, MODE_ADPCM, MODE_RAW_PCM};

use crate::mapping::{default_output_base, MappingIndex};
use crate::wav::{self, WavInfo};

/// All VoiceWare messages play at 8 kHz
pub const SAMPLE_RATE: u32 = 8000;

/// Decodes the ROM's messages into `out_dir`.
///
/// With a target index, only that message is processed and traversal stops
/// right after it; a target that is never reached fails the run.
pub fn execute(
    rom: &RomImage,
    mappings: &MappingIndex,
    rom_basename: &str,
    target: Option<u32>,
    out_dir: &Path,
) -> Result<()> {
    let mut absolute_base = 0u32;
    let mut target_found = false;

    'segments: for segment in rom.segments() {
        let segment = segment?;
        for i in 0..segment.message_count() {
            let absolute = absolute_base + i as u32;
            if let Some(wanted) = target {
                if absolute != wanted {
                    continue;
                }
            }

            if let Err(err) =
                process_message(rom, &segment, i, absolute, mappings, rom_basename, out_dir)
            {
                tracing::error!("message {} skipped: {:#}", absolute, err);
            }

            if target == Some(absolute) {
                target_found = true;
                break 'segments;
            }
        }
        absolute_base += segment.message_count() as u32;
    }

    if let Some(wanted) = target {
        if !target_found {
            bail!("target message index {} not found in the ROM", wanted);
        }
    }

    Ok(())
}

/// Handles one message. `Ok` covers the skip cases that only warrant a
/// warning (out-of-bounds start, unknown mode, empty raw range); `Err` means
/// the message was expected to produce output and could not.
fn process_message(
    rom: &RomImage,
    segment: &Segment,
    in_segment: usize,
    absolute: u32,
    mappings: &MappingIndex,
    rom_basename: &str,
    out_dir: &Path,
) -> Result<()> {
    let start = segment.message_start(in_segment);
    let mapping = mappings.lookup(segment.index as u32, in_segment as u32);
    let output_base = match mapping {
        Some(m) => m.output_base.clone(),
        None => default_output_base(segment.index, in_segment),
    };
    let comment = mapping.and_then(|m| m.comment.as_deref());

    let Ok(mode) = rom.byte(start) else {
        tracing::warn!(
            "message {} (segment {}, index {}) starts at 0x{:X}, past the ROM end; skipping",
            absolute,
            segment.index,
            in_segment,
            start
        );
        return Ok(());
    };

    tracing::info!(
        "processing message {} (segment {}, index {}), mode 0x{:02X}, offset 0x{:X}",
        absolute,
        segment.index,
        in_segment,
        mode,
        start
    );

    match mode {
        MODE_ADPCM => {
            let stream = &rom.as_slice()[start + 1..];
            let samples = decode_message(stream)
                .with_context(|| format!("decoding failed at offset 0x{:X}", start + 1))?;
            if samples.is_empty() {
                tracing::info!("message {} produced 0 samples; no WAV written", absolute);
                return Ok(());
            }

            let path = out_dir.join(format!("{}.wav", output_base));
            let info = WavInfo {
                artist: rom_basename,
                title: &output_base,
                track: absolute,
                date: chrono::Local::now().format("%Y-%m-%d").to_string(),
                comment,
            };
            wav::write_wav(&path, &samples, SAMPLE_RATE, &info)
        }
        MODE_RAW_PCM => {
            let end = segment.message_end(in_segment, rom.len());
            if end <= start {
                tracing::warn!(
                    "cannot determine a valid data range for raw PCM message {}; skipping",
                    absolute
                );
                return Ok(());
            }

            // The range includes the mode byte, matching the on-ROM layout.
            let path = out_dir.join(format!("{}.pcm", output_base));
            let data = &rom.as_slice()[start..end];
            std::fs::write(&path, data)
                .with_context(|| format!("cannot write PCM file: {}", path.display()))?;
            tracing::info!("saved raw PCM data: {} ({} bytes)", path.display(), data.len());
            Ok(())
        }
        other => {
            tracing::warn!(
                "unknown message mode 0x{:02X} for message {} at offset 0x{:X}; skipping",
                other,
                absolute,
                start
            );
            Ok(())
        }
    }
}

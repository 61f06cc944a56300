//! RIFF/WAVE emission with LIST/INFO metadata
//!
//! The whole file is assembled in memory with every chunk size computed up
//! front, then written in one call; the sizes in the RIFF and LIST headers
//! match the bytes that follow exactly. Sub-chunk text is NUL-terminated and
//! the NUL counts toward the stored size; odd-sized chunks get one zero
//! padding byte, per RIFF word alignment.

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Album tag carried by every decoded message
pub const ALBUM: &str = "Nortel Millennium VoiceWare";

/// `fmt ` chunk payload size for plain PCM
const FMT_CHUNK_SIZE: u32 = 16;

/// Mono output
const CHANNELS: u16 = 1;

/// 16-bit output samples
const BITS_PER_SAMPLE: u16 = 16;

/// Metadata for the LIST/INFO chunk.
pub struct WavInfo<'a> {
    /// IART: the ROM's base filename
    pub artist: &'a str,
    /// INAM: the output base name
    pub title: &'a str,
    /// ITRK: absolute message index
    pub track: u32,
    /// ICRD: creation date, `YYYY-MM-DD`
    pub date: String,
    /// ICMT: mapping comment, emitted only when non-empty
    pub comment: Option<&'a str>,
}

/// Encodes samples and metadata, then writes the file in one call.
pub fn write_wav(
    path: &Path,
    samples: &[i16],
    sample_rate: u32,
    info: &WavInfo<'_>,
) -> Result<()> {
    let bytes = encode_wav(samples, sample_rate, info)?;
    std::fs::write(path, &bytes)
        .with_context(|| format!("cannot write WAV file: {}", path.display()))?;
    tracing::info!("wrote {} ({} samples)", path.display(), samples.len());
    Ok(())
}

/// Builds the complete RIFF/WAVE byte image.
fn encode_wav(samples: &[i16], sample_rate: u32, info: &WavInfo<'_>) -> Result<Vec<u8>> {
    let data_size = samples.len() as u64 * 2;
    if data_size > u32::MAX as u64 {
        bail!("WAV data chunk exceeds the 4 GiB RIFF limit for '{}'", info.title);
    }
    let data_size = data_size as u32;
    let padded_data_size = data_size + (data_size & 1);

    let track = info.track.to_string();
    let mut tags: Vec<(&[u8; 4], &str)> = vec![
        (b"IALB", ALBUM),
        (b"IART", info.artist),
        (b"INAM", info.title),
        (b"ITRK", &track),
        (b"ICRD", &info.date),
    ];
    if let Some(comment) = info.comment {
        if !comment.is_empty() {
            tags.push((b"ICMT", comment));
        }
    }

    // LIST payload: the "INFO" type ID plus each sub-chunk with its header.
    let info_payload_size: u32 =
        4 + tags.iter().map(|(_, text)| info_sub_chunk_size(text)).sum::<u32>();

    let riff_size = 4                       // "WAVE"
        + (8 + FMT_CHUNK_SIZE)              // "fmt "
        + (8 + info_payload_size)           // "LIST"
        + (8 + padded_data_size);           // "data"

    let mut out = Vec::with_capacity(riff_size as usize + 8);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // format tag: PCM
    out.extend_from_slice(&CHANNELS.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    let byte_rate = sample_rate * CHANNELS as u32 * (BITS_PER_SAMPLE / 8) as u32;
    out.extend_from_slice(&byte_rate.to_le_bytes());
    let block_align = CHANNELS * (BITS_PER_SAMPLE / 8);
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"LIST");
    out.extend_from_slice(&info_payload_size.to_le_bytes());
    out.extend_from_slice(b"INFO");
    for (id, text) in &tags {
        write_info_sub_chunk(&mut out, id, text);
    }

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    if data_size & 1 == 1 {
        out.push(0);
    }

    debug_assert_eq!(out.len() as u32, riff_size + 8);
    Ok(out)
}

/// On-disk footprint of one INFO sub-chunk: header, text, NUL, padding.
fn info_sub_chunk_size(text: &str) -> u32 {
    let size = text.len() as u32 + 1;
    8 + size + (size & 1)
}

fn write_info_sub_chunk(out: &mut Vec<u8>, id: &[u8; 4], text: &str) {
    let size = text.len() as u32 + 1; // stored size includes the NUL
    out.extend_from_slice(id.as_slice());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(text.as_bytes());
    out.push(0);
    if size & 1 == 1 {
        out.push(0);
    }
}

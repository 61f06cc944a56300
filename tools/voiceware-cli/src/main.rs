//! voiceware - Nortel Millennium VoiceWare ROM decoder
//!
//! Decodes audio messages from Nortel Millennium VoiceWare ROM dumps. ADPCM
//! messages (NEC uPD7759 command streams) become RIFF/WAVE files with
//! LIST/INFO metadata; raw PCM messages are copied verbatim to `.pcm` files.
//! List mode prints the ROM's inventory in the decoder's own mapping-file
//! format instead of decoding.
//!
//! # Usage
//!
//! ```bash
//! # Decode every message in the ROM to the current directory
//! voiceware nt_voiceware.bin
//!
//! # Decode one message, with names and comments from a mapping file
//! voiceware nt_voiceware.bin -m names.map -i 42
//!
//! # Produce a mapping-file skeleton for the ROM
//! voiceware nt_voiceware.bin --list > names.map
//! ```

mod decode;
mod list;
mod mapping;
mod wav;

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::{Path, PathBuf};
use voiceware_rom::RomImage;

/// Nortel Millennium VoiceWare ROM decoder (NEC uPD7759 ADPCM)
#[derive(Parser)]
#[command(name = "voiceware")]
#[command(about = "Nortel Millennium VoiceWare ROM decoder (NEC uPD7759 ADPCM)")]
#[command(version)]
struct Cli {
    /// Path to the input ROM file
    rom: PathBuf,

    /// Tab-delimited mapping file: seg<TAB>msg<TAB>name[<TAB>comment]
    #[arg(short = 'm', value_name = "FILE")]
    mapping: Option<PathBuf>,

    /// Decode only this absolute message index (ignored in list mode)
    #[arg(short = 'i', value_name = "INDEX")]
    index: Option<u32>,

    /// List messages in mapping-file format to stdout instead of decoding
    #[arg(short = 'l', long)]
    list: bool,

    /// Suppress informational output, including the listing (overrides --verbose)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Emit per-opcode debug traces to stderr (ignored with --quiet)
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Quiet wins over verbose; logs go to stderr so list output owns stdout.
    let level = if cli.quiet {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(io::stderr)
        .init();

    let target = if cli.list && cli.index.is_some() {
        tracing::info!("option -i is ignored when --list is specified");
        None
    } else {
        cli.index
    };

    let rom_basename = cli
        .rom
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.rom.display().to_string());

    tracing::info!("input ROM: {} (artist tag: {})", cli.rom.display(), rom_basename);
    if let Some(path) = &cli.mapping {
        tracing::info!("mapping file: {}", path.display());
    }
    if cli.list {
        tracing::info!("mode: listing messages");
    } else if let Some(index) = target {
        tracing::info!("mode: decoding target message index {}", index);
    } else {
        tracing::info!("mode: decoding all messages");
    }

    let mappings = match &cli.mapping {
        Some(path) => {
            let index = mapping::load_mappings(path)?;
            tracing::info!("loaded {} mappings", index.len());
            index
        }
        None => mapping::MappingIndex::default(),
    };

    let data = std::fs::read(&cli.rom)
        .with_context(|| format!("cannot open ROM file: {}", cli.rom.display()))?;
    let rom = RomImage::new(data)
        .with_context(|| format!("invalid ROM file: {}", cli.rom.display()))?;
    tracing::info!("ROM loaded ({} bytes)", rom.len());

    if cli.list {
        if cli.quiet {
            // Still traverse so a malformed ROM fails the run.
            list::execute(&rom, &mappings, &rom_basename, io::sink())
        } else {
            list::execute(&rom, &mappings, &rom_basename, io::stdout().lock())
        }
    } else {
        decode::execute(&rom, &mappings, &rom_basename, target, Path::new("."))
    }
}

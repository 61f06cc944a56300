//! Mapping file loading and lookup
//!
//! A mapping file names the messages in a ROM so decode output gets
//! meaningful filenames and comments. Records are tab-delimited:
//!
//! ```text
//! # ROM: nt_voiceware.bin
//!
//! 0	0	silence_50ms
//! 0	3	hello			# greeting, first in bank
//! ```
//!
//! Blank lines and lines whose first non-whitespace byte is `#` are
//! skipped. List mode emits exactly this format, so a listing can be edited
//! and fed back in with `-m`.

use anyhow::{bail, Context, Result};
use std::path::Path;

/// One record from a mapping file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMapping {
    /// 0-based segment index
    pub segment: u32,
    /// 0-based message index within the segment
    pub in_segment: u32,
    /// Output filename base, no extension
    pub output_base: String,
    /// Cleaned user comment, if any
    pub comment: Option<String>,
}

/// Loaded mapping records with duplicate-key replacement.
///
/// Lookup is a linear scan; mapping files hold at most a few hundred
/// entries.
#[derive(Debug, Default)]
pub struct MappingIndex {
    entries: Vec<MessageMapping>,
}

impl MappingIndex {
    /// Number of records held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no records are held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds a record; a later record for the same `(segment, in_segment)`
    /// replaces the earlier one.
    pub fn insert(&mut self, entry: MessageMapping) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.segment == entry.segment && e.in_segment == entry.in_segment)
        {
            tracing::debug!(
                "replacing duplicate mapping for segment {}, message {}",
                entry.segment,
                entry.in_segment
            );
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// Finds the record for a message, if one was loaded.
    pub fn lookup(&self, segment: u32, in_segment: u32) -> Option<&MessageMapping> {
        self.entries
            .iter()
            .find(|e| e.segment == segment && e.in_segment == in_segment)
    }
}

/// Default output filename base when no mapping matches.
pub fn default_output_base(segment: usize, in_segment: usize) -> String {
    format!("message_{}_{:03}", segment, in_segment)
}

/// Strips a comment's leading whitespace, one leading `#`, and whitespace
/// following that `#`.
pub fn clean_comment(raw: &str) -> &str {
    let text = raw.trim_start();
    match text.strip_prefix('#') {
        Some(rest) => rest.trim_start(),
        None => text,
    }
}

/// Loads and parses a mapping file.
///
/// Malformed lines abort the load with a line-numbered error; duplicates are
/// resolved last-writer-wins.
pub fn load_mappings(path: &Path) -> Result<MappingIndex> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot open mapping file: {}", path.display()))?;

    let mut index = MappingIndex::default();
    for (line_idx, line) in text.lines().enumerate() {
        let line_num = line_idx + 1;
        let trimmed = line.trim_start();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        // seg, msg, name, then everything after the third tab is comment.
        let mut fields = trimmed.splitn(4, '\t');
        let (Some(seg), Some(msg), Some(name)) = (fields.next(), fields.next(), fields.next())
        else {
            bail!(
                "invalid format in mapping file '{}' at line {}: missing tabs",
                path.display(),
                line_num
            );
        };

        let (Ok(segment), Ok(in_segment)) = (seg.parse::<u32>(), msg.parse::<u32>()) else {
            bail!(
                "invalid index in mapping file '{}' at line {}: \
                 segment and message indices must be non-negative integers",
                path.display(),
                line_num
            );
        };

        let comment = fields
            .next()
            .map(|raw| clean_comment(raw.trim_end()).to_string())
            .filter(|c| !c.is_empty());

        index.insert(MessageMapping {
            segment,
            in_segment,
            output_base: name.trim_end().to_string(),
            comment,
        });
    }

    Ok(index)
}

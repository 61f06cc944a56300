//! uPD7759 command-stream decoding
//!
//! This module drives the opcode state machine over a message's command
//! bytes and collects the emitted PCM samples. The caller slices the stream
//! so that it begins at the first command byte (the message's mode byte is
//! container-level and already consumed).

use crate::state::AdpcmState;
use crate::{AdpcmError, MAX_MESSAGE_SAMPLES, SHORT_BLOCK_NIBBLES, SILENCE_RUN};

/// Decode one message's command stream to 16-bit PCM.
///
/// The stream runs from the message's first command byte to the end of the
/// ROM; decoding stops at the `0x00` end-of-message opcode. A stream that
/// ends at a command boundary without the sentinel is accepted as long as it
/// already produced at least one sample (truncated final message in a dumped
/// ROM); a stream that ends inside a block, before a length byte, or before
/// any sample is [`AdpcmError::TruncatedStream`].
///
/// A message may legitimately decode to zero samples (`0x00` as the first
/// command); that is `Ok` with an empty vector.
pub fn decode_message(stream: &[u8]) -> Result<Vec<i16>, AdpcmError> {
    let mut samples = Vec::new();
    let mut state = AdpcmState::new();
    let mut pos = 0usize;

    loop {
        let Some(&command) = stream.get(pos) else {
            // Out of data at a command boundary. Keep what was decoded if
            // the message produced anything at all.
            if samples.is_empty() {
                return Err(AdpcmError::TruncatedStream);
            }
            tracing::trace!("stream ended without end-of-message opcode, keeping samples");
            break;
        };
        pos += 1;

        match command {
            0x00 => {
                tracing::trace!(pos = pos - 1, "opcode 0x00: end of message");
                break;
            }
            0x01..=0x3F => {
                let run = command as u32 * SILENCE_RUN;
                tracing::trace!(pos = pos - 1, "opcode 0x{:02X}: {} silence samples", command, run);
                check_room(&samples, run as usize)?;
                samples.resize(samples.len() + run as usize, 0);
            }
            0x40..=0x7F => {
                tracing::trace!(
                    pos = pos - 1,
                    "opcode 0x{:02X}: short block ({} nibbles)",
                    command,
                    SHORT_BLOCK_NIBBLES
                );
                pos = play_block(stream, pos, SHORT_BLOCK_NIBBLES, 1, &mut state, &mut samples)?;
            }
            0x80..=0xBF => {
                let nibbles = read_length(stream, &mut pos)?;
                tracing::trace!(
                    pos = pos - 2,
                    "opcode 0x{:02X}: long block ({} nibbles)",
                    command,
                    nibbles
                );
                pos = play_block(stream, pos, nibbles, 1, &mut state, &mut samples)?;
            }
            0xC0..=0xFF => {
                let nibbles = read_length(stream, &mut pos)?;
                let plays = (((command >> 3) & 0x07) + 1) as u32;
                tracing::trace!(
                    pos = pos - 2,
                    "opcode 0x{:02X}: repeat block ({} nibbles, {} plays)",
                    command,
                    nibbles,
                    plays
                );
                pos = play_block(stream, pos, nibbles, plays, &mut state, &mut samples)?;
            }
        }
    }

    Ok(samples)
}

/// Reads the length byte that follows long and repeat opcodes. The encoded
/// value is one less than the nibble count.
fn read_length(stream: &[u8], pos: &mut usize) -> Result<u32, AdpcmError> {
    let &n = stream.get(*pos).ok_or(AdpcmError::TruncatedStream)?;
    *pos += 1;
    Ok(n as u32 + 1)
}

/// Plays the nibble window at `start` `plays` times, returning the position
/// just past the window.
///
/// Repeat passes rewind the byte cursor but never the decoder state: each
/// pass continues evolving predictor and state from where the previous pass
/// ended.
fn play_block(
    stream: &[u8],
    start: usize,
    nibbles: u32,
    plays: u32,
    state: &mut AdpcmState,
    samples: &mut Vec<i16>,
) -> Result<usize, AdpcmError> {
    check_room(samples, nibbles as usize * plays as usize)?;

    let mut end = start;
    for _ in 0..plays {
        end = play_once(stream, start, nibbles, state, samples)?;
    }
    Ok(end)
}

/// Plays the nibble window once: two nibbles per byte, high nibble first,
/// with an odd count taking only the high nibble of the final byte.
fn play_once(
    stream: &[u8],
    start: usize,
    nibbles: u32,
    state: &mut AdpcmState,
    samples: &mut Vec<i16>,
) -> Result<usize, AdpcmError> {
    let mut pos = start;
    let mut remaining = nibbles;

    while remaining > 0 {
        let &byte = stream.get(pos).ok_or(AdpcmError::TruncatedStream)?;
        pos += 1;

        samples.push(state.decode_nibble(byte >> 4));
        remaining -= 1;

        if remaining > 0 {
            samples.push(state.decode_nibble(byte & 0x0F));
            remaining -= 1;
        }
    }

    Ok(pos)
}

fn check_room(samples: &[i16], extra: usize) -> Result<(), AdpcmError> {
    if samples.len() + extra > MAX_MESSAGE_SAMPLES {
        return Err(AdpcmError::TooManySamples);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message() {
        // An immediate end-of-message opcode is a valid zero-sample message.
        assert_eq!(decode_message(&[0x00]).unwrap(), Vec::<i16>::new());
    }

    #[test]
    fn test_silence_run() {
        let samples = decode_message(&[0x01, 0x00]).unwrap();
        assert_eq!(samples, vec![0i16; 8]);

        let samples = decode_message(&[0x3F, 0x00]).unwrap();
        assert_eq!(samples.len(), 0x3F * 8);
        assert!(samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_short_block_of_zero_nibbles() {
        // 256 nibbles = 128 data bytes. Zero nibbles leave the predictor at
        // rest (row 0 delta 0) and the state pinned at 0 (adjustment -1,
        // clamped), so every sample is zero.
        let mut stream = vec![0x40];
        stream.extend_from_slice(&[0x00; 128]);
        stream.push(0x00);
        let samples = decode_message(&stream).unwrap();
        assert_eq!(samples, vec![0i16; 256]);
    }

    #[test]
    fn test_long_block_odd_nibble_count() {
        // N = 2 encodes 3 nibbles: both of 0xAB plus the high nibble of 0xCD.
        let samples = decode_message(&[0x80, 0x02, 0xAB, 0xCD, 0x00]).unwrap();
        assert_eq!(samples.len(), 3);

        let mut state = AdpcmState::new();
        let expected = vec![
            state.decode_nibble(0xA),
            state.decode_nibble(0xB),
            state.decode_nibble(0xC),
        ];
        assert_eq!(samples, expected);
    }

    #[test]
    fn test_repeat_block_replays_without_state_reset() {
        // N = 1 encodes 2 nibbles; 0xC8 carries repeat count 1, so the byte
        // plays twice for 4 samples total.
        let samples = decode_message(&[0xC8, 0x01, 0x77, 0x00]).unwrap();

        // Nibble 7 walks the step table upward: rows 0, 3, 6, 9 give deltas
        // 10, 19, 33, 64. The second pass continues from the first pass's
        // state rather than starting over.
        assert_eq!(samples, vec![10 << 7, 29 << 7, 62 << 7, 126 << 7]);
    }

    #[test]
    fn test_repeat_zero_equals_long_block() {
        let repeated = decode_message(&[0xC0, 0x05, 0x12, 0x34, 0x56, 0x00]).unwrap();
        let long = decode_message(&[0x80, 0x05, 0x12, 0x34, 0x56, 0x00]).unwrap();
        assert_eq!(repeated, long);
        assert_eq!(repeated.len(), 6);
    }

    #[test]
    fn test_sample_count_matches_opcode_sum() {
        // silence(2) = 16, long N=3 -> 4 nibbles, repeat N=1 r=2 -> 2 * 3
        let stream = [0x02, 0x80, 0x03, 0x11, 0x22, 0xD0, 0x01, 0x33, 0x00];
        let samples = decode_message(&stream).unwrap();
        assert_eq!(samples.len(), 16 + 4 + 6);
    }

    #[test]
    fn test_truncated_before_any_sample() {
        assert_eq!(
            decode_message(&[]).unwrap_err(),
            AdpcmError::TruncatedStream
        );
    }

    #[test]
    fn test_truncated_length_byte() {
        assert_eq!(
            decode_message(&[0x80]).unwrap_err(),
            AdpcmError::TruncatedStream
        );
        assert_eq!(
            decode_message(&[0xC8]).unwrap_err(),
            AdpcmError::TruncatedStream
        );
    }

    #[test]
    fn test_truncated_inside_block() {
        // Short block wants 128 data bytes but only one follows.
        assert_eq!(
            decode_message(&[0x40, 0x11]).unwrap_err(),
            AdpcmError::TruncatedStream
        );
    }

    #[test]
    fn test_missing_terminator_accepted_with_samples() {
        // The stream ends at a command boundary after one silence run; the
        // partial message is kept.
        let samples = decode_message(&[0x01]).unwrap();
        assert_eq!(samples, vec![0i16; 8]);
    }

    #[test]
    fn test_ends_exactly_on_terminator() {
        let samples = decode_message(&[0x01, 0x00]).unwrap();
        assert_eq!(samples.len(), 8);
    }
}

// SPDX-License-Identifier: MIT
//
// Keypress decoding.
//
// Turns raw bytes from a terminal in raw mode into structured key events:
//
// - UTF-8 sequences (lead byte + continuations) → `Char`
// - CSI escape sequences → arrows, Home/End, shifted arrows
// - Raw control codes → Tab, Return, Backspace, Ctrl-letter
//
// The decoder reads through the [`ByteSource`] trait rather than straight
// from stdin, so every decoding path is testable on byte slices. Reads are
// blocking — in raw mode VMIN=1 means read() delivers exactly one byte when
// one exists. Escape sequences are consumed byte-by-byte up to the first
// alphabetic byte (or a 24-byte bound), which is how the arrow and
// shift-arrow reports are framed.
//
// Anything the editor has no binding for decodes to `Key::Unknown`, which
// the state machine ignores. Pasted text arrives as a run of ordinary
// `Char` events; the caller drains them with the terminal's key-available
// predicate before redrawing.

use std::io;

use crate::terminal::Terminal;

/// Longest escape sequence we will buffer before giving up on it.
const ESCAPE_LIMIT: usize = 24;

/// A decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character (any UTF-8 code point outside the controls).
    Char(char),
    Return,
    Tab,
    /// The delete/backspace key (ASCII 127).
    Backspace,
    Up,
    Down,
    Left,
    Right,
    ShiftLeft,
    ShiftRight,
    Home,
    End,
    /// A control chord, identified by its uppercase letter: Ctrl-A = `'A'`.
    Ctrl(char),
    /// Anything we read but have no binding for.
    Unknown,
}

/// A blocking source of terminal bytes.
///
/// `Ok(None)` means end of input — a closed pty or an exhausted test slice.
pub trait ByteSource {
    /// Read the next byte, blocking until one is available.
    ///
    /// # Errors
    ///
    /// Returns the underlying read error.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

impl ByteSource for Terminal {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Terminal::read_byte(self)
    }
}

/// Byte slices are a source — used by tests and scripted replays.
impl ByteSource for &[u8] {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        match self.split_first() {
            Some((&b, rest)) => {
                *self = rest;
                Ok(Some(b))
            }
            None => Ok(None),
        }
    }
}

/// Decode one key event from the source.
///
/// Returns `Ok(None)` only when the source is exhausted before the first
/// byte; a sequence truncated mid-way decodes to [`Key::Unknown`].
///
/// # Errors
///
/// Propagates read errors from the source.
pub fn decode(src: &mut impl ByteSource) -> io::Result<Option<Key>> {
    let Some(first) = src.read_byte()? else {
        return Ok(None);
    };

    let key = match first {
        0x1b => decode_escape(src)?,
        b'\t' => Key::Tab,
        b'\r' => Key::Return,
        0x7f => Key::Backspace,
        code @ 0x01..=0x1a => Key::Ctrl((b'A' + code - 1) as char),
        0x00 => Key::Unknown,
        lead => decode_char(src, lead)?,
    };

    Ok(Some(key))
}

// ─── Escape Sequences ───────────────────────────────────────────────────────

/// Decode the remainder of an escape sequence after the ESC byte.
///
/// Bytes are consumed until the first ASCII letter or the buffer bound,
/// then matched against the CSI sequences the editor understands.
fn decode_escape(src: &mut impl ByteSource) -> io::Result<Key> {
    let mut seq = [0u8; ESCAPE_LIMIT];
    let mut n = 0;

    while n < ESCAPE_LIMIT {
        let Some(b) = src.read_byte()? else { break };
        seq[n] = b;
        n += 1;
        if b.is_ascii_alphabetic() {
            break;
        }
    }

    let seq = &seq[..n];
    if seq.first() != Some(&b'[') || seq.len() < 2 {
        return Ok(Key::Unknown);
    }

    if seq[1].is_ascii_digit() {
        // Extended sequence: only the shifted arrows are bound.
        return Ok(match seq {
            b"[1;2C" => Key::ShiftRight,
            b"[1;2D" => Key::ShiftLeft,
            _ => Key::Unknown,
        });
    }

    Ok(match seq[1] {
        b'A' => Key::Up,
        b'B' => Key::Down,
        b'C' => Key::Right,
        b'D' => Key::Left,
        b'H' => Key::Home,
        b'F' => Key::End,
        _ => Key::Unknown,
    })
}

// ─── UTF-8 Characters ───────────────────────────────────────────────────────

/// Decode a character from its lead byte plus continuation bytes.
fn decode_char(src: &mut impl ByteSource, lead: u8) -> io::Result<Key> {
    let len = utf8_len(lead);
    if len == 0 {
        // A continuation byte with no lead — mid-sequence garbage.
        return Ok(Key::Unknown);
    }

    let mut bytes = [0u8; 4];
    bytes[0] = lead;
    for slot in bytes.iter_mut().take(len).skip(1) {
        match src.read_byte()? {
            Some(b) => *slot = b,
            None => return Ok(Key::Unknown),
        }
    }

    match std::str::from_utf8(&bytes[..len]) {
        Ok(s) => Ok(s.chars().next().map_or(Key::Unknown, Key::Char)),
        Err(_) => Ok(Key::Unknown),
    }
}

/// Expected byte length of a UTF-8 character from its lead byte.
/// Returns 0 for continuation bytes (0b10xxxxxx).
const fn utf8_len(lead: u8) -> usize {
    if lead & 0xc0 == 0x80 {
        return 0;
    }
    match lead {
        0xf0..=0xf7 => 4,
        0xe0..=0xef => 3,
        0xc0..=0xdf => 2,
        _ => 1,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: decode exactly one key from a byte slice.
    fn decode_one(bytes: &[u8]) -> Key {
        let mut src: &[u8] = bytes;
        decode(&mut src).unwrap().expect("expected a key")
    }

    /// Helper: decode all keys from a byte slice.
    fn decode_all(bytes: &[u8]) -> Vec<Key> {
        let mut src: &[u8] = bytes;
        let mut keys = Vec::new();
        while let Some(k) = decode(&mut src).unwrap() {
            keys.push(k);
        }
        keys
    }

    // ── Printable characters ────────────────────────────────────────────

    #[test]
    fn ascii_char() {
        assert_eq!(decode_one(b"a"), Key::Char('a'));
    }

    #[test]
    fn ascii_space() {
        assert_eq!(decode_one(b" "), Key::Char(' '));
    }

    #[test]
    fn ascii_run() {
        assert_eq!(
            decode_all(b"abc"),
            vec![Key::Char('a'), Key::Char('b'), Key::Char('c')]
        );
    }

    #[test]
    fn two_byte_utf8() {
        assert_eq!(decode_one("é".as_bytes()), Key::Char('é'));
    }

    #[test]
    fn three_byte_utf8() {
        assert_eq!(decode_one("€".as_bytes()), Key::Char('€'));
    }

    #[test]
    fn four_byte_utf8() {
        assert_eq!(decode_one("🦋".as_bytes()), Key::Char('🦋'));
    }

    #[test]
    fn bare_continuation_byte_is_unknown() {
        assert_eq!(decode_one(b"\x80"), Key::Unknown);
    }

    #[test]
    fn truncated_utf8_is_unknown() {
        // Lead byte promises two bytes; stream ends first.
        assert_eq!(decode_one(b"\xc3"), Key::Unknown);
    }

    #[test]
    fn invalid_continuation_is_unknown() {
        assert_eq!(decode_one(b"\xc3\x28"), Key::Unknown);
    }

    // ── Control codes ───────────────────────────────────────────────────

    #[test]
    fn tab_key() {
        assert_eq!(decode_one(b"\t"), Key::Tab);
    }

    #[test]
    fn return_key() {
        assert_eq!(decode_one(b"\r"), Key::Return);
    }

    #[test]
    fn backspace_key() {
        assert_eq!(decode_one(b"\x7f"), Key::Backspace);
    }

    #[test]
    fn ctrl_a() {
        assert_eq!(decode_one(b"\x01"), Key::Ctrl('A'));
    }

    #[test]
    fn ctrl_g() {
        assert_eq!(decode_one(b"\x07"), Key::Ctrl('G'));
    }

    #[test]
    fn ctrl_v() {
        assert_eq!(decode_one(b"\x16"), Key::Ctrl('V'));
    }

    #[test]
    fn ctrl_z() {
        assert_eq!(decode_one(b"\x1a"), Key::Ctrl('Z'));
    }

    #[test]
    fn nul_byte_is_unknown() {
        assert_eq!(decode_one(b"\x00"), Key::Unknown);
    }

    // ── Arrow keys ──────────────────────────────────────────────────────

    #[test]
    fn arrow_up() {
        assert_eq!(decode_one(b"\x1b[A"), Key::Up);
    }

    #[test]
    fn arrow_down() {
        assert_eq!(decode_one(b"\x1b[B"), Key::Down);
    }

    #[test]
    fn arrow_right() {
        assert_eq!(decode_one(b"\x1b[C"), Key::Right);
    }

    #[test]
    fn arrow_left() {
        assert_eq!(decode_one(b"\x1b[D"), Key::Left);
    }

    #[test]
    fn home_key() {
        assert_eq!(decode_one(b"\x1b[H"), Key::Home);
    }

    #[test]
    fn end_key() {
        assert_eq!(decode_one(b"\x1b[F"), Key::End);
    }

    // ── Shifted arrows ──────────────────────────────────────────────────

    #[test]
    fn shift_right() {
        assert_eq!(decode_one(b"\x1b[1;2C"), Key::ShiftRight);
    }

    #[test]
    fn shift_left() {
        assert_eq!(decode_one(b"\x1b[1;2D"), Key::ShiftLeft);
    }

    #[test]
    fn unbound_extended_sequence_is_unknown() {
        // Ctrl-Right on xterm — recognized as a sequence, not bound.
        assert_eq!(decode_one(b"\x1b[1;5C"), Key::Unknown);
    }

    // ── Escape edge cases ───────────────────────────────────────────────

    #[test]
    fn lone_escape_is_unknown() {
        assert_eq!(decode_one(b"\x1b"), Key::Unknown);
    }

    #[test]
    fn ss3_prefix_is_unknown() {
        // ESC O stops at the alphabetic 'O'; the payload byte is left in
        // the stream and decodes separately.
        assert_eq!(decode_all(b"\x1bOP"), vec![Key::Unknown, Key::Char('P')]);
    }

    #[test]
    fn unknown_csi_letter() {
        assert_eq!(decode_one(b"\x1b[Z"), Key::Unknown);
    }

    #[test]
    fn escape_sequence_does_not_leak_into_next_key() {
        assert_eq!(decode_all(b"\x1b[Ax"), vec![Key::Up, Key::Char('x')]);
    }

    // ── Streams ─────────────────────────────────────────────────────────

    #[test]
    fn empty_source_yields_none() {
        let mut src: &[u8] = b"";
        assert_eq!(decode(&mut src).unwrap(), None);
    }

    #[test]
    fn mixed_stream_decodes_in_order() {
        assert_eq!(
            decode_all(b"hi\x1b[D\x7f\r"),
            vec![
                Key::Char('h'),
                Key::Char('i'),
                Key::Left,
                Key::Backspace,
                Key::Return,
            ]
        );
    }

    #[test]
    fn paste_like_run_decodes_fully() {
        let keys = decode_all("héllo🦋".as_bytes());
        assert_eq!(
            keys,
            vec![
                Key::Char('h'),
                Key::Char('é'),
                Key::Char('l'),
                Key::Char('l'),
                Key::Char('o'),
                Key::Char('🦋'),
            ]
        );
    }
}

// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit — callers assemble a frame (usually into a
// `Vec<u8>`) and hand it to the terminal in one write. This module just knows
// the byte-level encoding of every sequence the line editor needs.
//
// The sequence set is the VT100 subset that survives on every terminal we
// claim to support: line erasure, relative cursor movement, the eight base
// colors, and the bold/underline/reverse emphases. Zero-count movement
// emits nothing — `ESC[0A` moves one row on several terminals.
//
// All functions return `io::Result` propagated from the underlying writer.
// In practice they never fail when writing to a Vec-backed frame.

use std::io::{self, Write};

/// The eight base terminal colors plus the terminal default.
///
/// Encoded as SGR `30 + c` for the named colors; `Default` resets all
/// attributes (SGR 0), which is how the editor returns to unstyled text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    #[default]
    Default,
}

/// Text emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emphasis {
    Bold,
    Underline,
    Reverse,
    #[default]
    None,
}

// ─── Line Erasure ───────────────────────────────────────────────────────────

/// Erase the entire current line (EL 2). The cursor does not move.
#[inline]
pub fn erase_line(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2K")
}

/// Erase from the cursor to the end of the line (EL 0).
#[inline]
pub fn erase_to_eol(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0K")
}

// ─── Cursor Movement ────────────────────────────────────────────────────────

/// Return the cursor to column 0 of the current row.
#[inline]
pub fn carriage_return(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\r")
}

/// Advance to the next row, scrolling if on the last one.
#[inline]
pub fn line_feed(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\n")
}

/// Move to absolute column `n` by returning to column 0 and stepping right.
///
/// `\r` followed by CUF is what ancient terminals accept; CHA (`ESC[G`) is
/// not universal. Column 0 is just the carriage return.
pub fn move_to_column(w: &mut impl Write, n: usize) -> io::Result<()> {
    if n == 0 {
        return carriage_return(w);
    }
    write!(w, "\r\x1b[{n}C")
}

/// Move up `n` rows (CUU). Emits nothing for `n == 0`.
pub fn move_up(w: &mut impl Write, n: usize) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(w, "\x1b[{n}A")
}

/// Move down `n` rows (CUD). Emits nothing for `n == 0`.
pub fn move_down(w: &mut impl Write, n: usize) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(w, "\x1b[{n}B")
}

// ─── Attributes ─────────────────────────────────────────────────────────────

/// Reset all attributes to terminal defaults (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

/// Set the foreground color. [`Color::Default`] resets attributes instead,
/// since SGR 39 is not available on every terminal in our support set.
pub fn color(w: &mut impl Write, c: Color) -> io::Result<()> {
    match c {
        Color::Default => reset(w),
        named => write!(w, "\x1b[{}m", 30 + named as u8),
    }
}

/// Set a text emphasis. [`Emphasis::None`] emits nothing — resetting is the
/// caller's job via [`reset`], which also clears colors.
pub fn emphasis(w: &mut impl Write, e: Emphasis) -> io::Result<()> {
    match e {
        Emphasis::Bold => w.write_all(b"\x1b[1m"),
        Emphasis::Underline => w.write_all(b"\x1b[4m"),
        Emphasis::Reverse => w.write_all(b"\x1b[7m"),
        Emphasis::None => Ok(()),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

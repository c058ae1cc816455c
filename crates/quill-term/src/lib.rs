// SPDX-License-Identifier: MIT
//
// quill-term — POSIX terminal driver for the quill line editor.
//
// The lowest layer of the editor: capability detection (TTY / dumb /
// supported), raw mode with guaranteed restore, byte-exact ANSI emission,
// cursor and width queries, and the keypress decoder.
//
// This crate intentionally avoids terminal abstraction layers (crossterm,
// termion) in favor of direct control via ANSI escape sequences and raw
// termios. A line editor lives or dies on exact cursor arithmetic; every
// byte sent to the terminal is accounted for.

#[allow(clippy::missing_errors_doc)] // ANSI functions all just forward io::Write errors.
pub mod ansi;
pub mod key;
pub mod terminal;

pub use ansi::{Color, Emphasis};
pub use key::{ByteSource, Key};
pub use terminal::{Support, Terminal};

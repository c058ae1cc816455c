// SPDX-License-Identifier: MIT
//
// The rendering pipeline.
//
// Rendering happens in two stages. First the logical buffer becomes a
// *styled string*: the text interleaved with ANSI color, emphasis, and
// reset sequences — token colors from the host's tokenizer, the selection
// overlaid in reverse video, the active completion suggestion appended in
// bold. This stage is pure and testable byte-for-byte.
//
// Second, `render_string` plays the styled string onto the terminal frame:
// escape sequences pass through verbatim, newlines become erase-to-EOL plus
// a continuation prompt, tabs become a space, and printable grapheme
// clusters are emitted — measuring any cluster whose width is not yet
// cached by writing it and diffing the terminal's cursor column. The
// measurement writes are the real glyphs the user sees, so probing is free.
//
// All construction goes into a `Vec<u8>` frame and reaches the terminal in
// a single write, the one-syscall-per-frame discipline that keeps redraw
// flicker-free.

use std::io;

use quill_term::ansi::{self, Color, Emphasis};
use quill_term::Terminal;

use crate::grapheme::Widths;
use crate::style::SyntaxColor;

/// Append `text` to the styled output, coloring it and overlaying the
/// selection.
///
/// `char_offset` is the character position of `text` within the whole
/// buffer; `selection` is the `[lsel, rsel)` character range. Text wholly
/// outside the selection is emitted as one block; text that intersects it
/// is emitted character by character with reverse video switched on at
/// `lsel` and attributes reset (then the color restored) at `rsel`.
pub(crate) fn append_with_selection(
    out: &mut Vec<u8>,
    text: &str,
    char_offset: usize,
    color: Option<Color>,
    selection: Option<(usize, usize)>,
) {
    if let Some(c) = color {
        let _ = ansi::color(out, c);
    }

    let Some((l, r)) = selection else {
        out.extend_from_slice(text.as_bytes());
        return;
    };

    let len = text.chars().count() as isize;
    let lsel = l as isize - char_offset as isize;
    let rsel = r as isize - char_offset as isize;

    if rsel < 0 || lsel > len {
        out.extend_from_slice(text.as_bytes());
        return;
    }

    if lsel < 0 {
        let _ = ansi::emphasis(out, Emphasis::Reverse);
    }
    let mut utf8 = [0u8; 4];
    for (i, ch) in text.chars().enumerate() {
        let i = i as isize;
        if i == lsel {
            let _ = ansi::emphasis(out, Emphasis::Reverse);
        }
        if i == rsel {
            let _ = ansi::reset(out);
            if let Some(c) = color {
                let _ = ansi::color(out, c);
            }
        }
        out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
    }
}

/// Walk `current` with the host tokenizer, emitting each token in its
/// mapped color and any unrecognized bytes between tokens in the default
/// color, all with the selection overlay.
///
/// Stops when the tokenizer reports no further token. A tokenizer that
/// hands back out-of-bounds or zero-length tokens ends coloring for the
/// line; one that iterates more times than the buffer has bytes trips the
/// runaway guard: a one-time diagnostic on stderr, and the remainder is
/// emitted uncolored.
fn colorize(
    out: &mut Vec<u8>,
    current: &str,
    selection: Option<(usize, usize)>,
    sc: &mut SyntaxColor,
) {
    let mut off = 0;
    let mut chars_done = 0;
    let mut iters = 0usize;

    while off < current.len() {
        let rest = &current[off..];

        let tok = (sc.tokenizer)(rest).and_then(|t| {
            if t.len == 0 {
                return None;
            }
            let text = rest.get(t.start..t.start.checked_add(t.len)?)?;
            let pad = rest.get(..t.start)?;
            Some((t, pad, text))
        });

        let Some((tok, pad, text)) = tok else {
            append_with_selection(out, rest, chars_done, Some(Color::Default), selection);
            return;
        };

        if !pad.is_empty() {
            append_with_selection(out, pad, chars_done, Some(Color::Default), selection);
            chars_done += pad.chars().count();
        }

        let color = sc.map.lookup(tok.kind).unwrap_or(Color::Default);
        append_with_selection(out, text, chars_done, Some(color), selection);
        chars_done += text.chars().count();
        off += tok.start + tok.len;

        iters += 1;
        if iters > current.len() {
            if !sc.warned {
                eprintln!(
                    "\r\nquill: tokenizer appears stuck in a loop; \
                     syntax coloring disabled for this line"
                );
                sc.warned = true;
            }
            append_with_selection(
                out,
                &current[off..],
                chars_done,
                Some(Color::Default),
                selection,
            );
            return;
        }
    }
}

/// Build the styled string for a buffer: reset, colored-and-selected text,
/// the suggestion in bold, reset.
pub(crate) fn styled(
    current: &str,
    selection: Option<(usize, usize)>,
    color: Option<&mut SyntaxColor>,
    suggestion: Option<&str>,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(current.len() + 16);
    let _ = ansi::reset(&mut out);

    match color {
        Some(sc) => colorize(&mut out, current, selection, sc),
        None => append_with_selection(&mut out, current, 0, None, selection),
    }

    if let Some(s) = suggestion {
        let _ = ansi::emphasis(&mut out, Emphasis::Bold);
        out.extend_from_slice(s.as_bytes());
    }

    let _ = ansi::reset(&mut out);
    out
}

// ─── Physical Rendering ─────────────────────────────────────────────────────

/// Play a styled string into the frame, handling the control vocabulary:
///
/// - `\r` → carriage return
/// - `\n` → erase to EOL, newline, continuation prompt
/// - `\t` → a single space
/// - `ESC…` → passed through verbatim up to its final alphabetic byte
/// - other control bytes → dropped
/// - printable clusters → emitted; unknown multi-byte widths are measured
///   through the terminal when one is attached
///
/// Measuring flushes the frame built so far (the glyph must land at the
/// real cursor position), writes the cluster, and diffs the cursor column
/// before and after. Without a terminal the cluster is simply appended and
/// widths fall back to estimates.
pub(crate) fn render_string(
    frame: &mut Vec<u8>,
    mut term: Option<&mut Terminal>,
    widths: &mut Widths,
    styled: &[u8],
    cprompt: &str,
) -> io::Result<()> {
    let mut i = 0;
    while i < styled.len() {
        match styled[i] {
            b'\r' => {
                let _ = ansi::carriage_return(frame);
                i += 1;
            }
            b'\n' => {
                let _ = ansi::erase_to_eol(frame);
                frame.extend_from_slice(b"\r\n");
                frame.extend_from_slice(cprompt.as_bytes());
                i += 1;
            }
            b'\t' => {
                frame.push(b' ');
                i += 1;
            }
            0x1b => {
                // Escape sequence: copy verbatim through the final letter.
                let mut j = i + 1;
                while j < styled.len() && !styled[j].is_ascii_alphabetic() {
                    j += 1;
                }
                let end = (j + 1).min(styled.len());
                frame.extend_from_slice(&styled[i..end]);
                i = end;
            }
            b if b < 0x20 || b == 0x7f => {
                i += 1;
            }
            _ => {
                // Printable cluster. Slice the valid-UTF-8 prefix; a stray
                // byte degrades to a skip rather than derailing the walk.
                let rest = &styled[i..];
                let valid = match std::str::from_utf8(rest) {
                    Ok(_) => rest.len(),
                    Err(e) => e.valid_up_to(),
                };
                let Ok(text) = std::str::from_utf8(&rest[..valid]) else {
                    i += 1;
                    continue;
                };
                if text.is_empty() {
                    i += 1;
                    continue;
                }

                let cluster = widths.cluster(text);
                match term.as_deref_mut() {
                    Some(t) if cluster.len() > 1 && !widths.is_cached(cluster) => {
                        emit_measured(frame, t, widths, cluster)?;
                    }
                    _ => frame.extend_from_slice(cluster.as_bytes()),
                }
                i += cluster.len();
            }
        }
    }
    Ok(())
}

/// Flush the frame and write `cluster` through the measuring probe.
fn emit_measured(
    frame: &mut Vec<u8>,
    term: &mut Terminal,
    widths: &mut Widths,
    cluster: &str,
) -> io::Result<()> {
    term.write_all(frame)?;
    frame.clear();

    let mut write_err = None;
    let mut probe = |cl: &str| {
        let before = term.cursor_position().ok();
        if let Err(e) = term.write_all(cl.as_bytes()) {
            write_err = Some(e);
            return None;
        }
        let after = term.cursor_position().ok();
        match (before, after) {
            (Some((x0, _)), Some((x1, _))) if x1 >= x0 => Some(x1 - x0),
            _ => None,
        }
    };
    let _ = widths.width_or_measure(cluster, &mut probe);

    match write_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Display width of `s`: the sum of its clusters' widths.
pub(crate) fn text_width(widths: &mut Widths, s: &str) -> usize {
    let mut total = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let cluster = widths.cluster(rest);
        if cluster.is_empty() {
            break;
        }
        total += widths.width(cluster);
        rest = &rest[cluster.len()..];
    }
    total
}

// ─── Tests ──────────────────────────────────────────────────────────────────

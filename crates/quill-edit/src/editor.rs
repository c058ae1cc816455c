// SPDX-License-Identifier: MIT
//
// The editor session: state machine, main loops, and the public API.
//
// An `Editor` is initialized once and serves many `read_line` calls. Each
// call classifies standard input and runs one of three loops:
//
//   not a TTY   → read one line of bytes, no editing
//   unsupported → prompt + blocking line read, control chars trimmed
//   supported   → raw mode, keypress state machine, incremental redraw
//
// The state machine has three modes. Default is plain editing. Selection
// holds an anchor (`sposn`) and renders the anchored range in reverse
// video; any non-selection keypress collapses it. History is entered by
// the first Up: the in-progress line is pushed onto the history list as a
// transient sentinel so browsing can always come back to it, and leaving
// History mode removes the sentinel — half-typed input never pollutes the
// list.
//
// Completion suggestions are regenerated after every keypress while the
// cursor sits at the end of the buffer; Down rotates through candidates
// without regenerating, and Tab accepts the active one.
//
// Cursor positions are characters, not bytes, and arrow movement is
// grapheme-cluster-wise. The redraw between keypresses is minimal-motion:
// climb to the frame's top row, repaint prompt and styled buffer, erase
// stale tails, and drop the cursor back on its row and column.

use std::io::{self, BufRead, Read, Write};

use quill_term::ansi::{self, Color, Emphasis};
use quill_term::key::{self, Key};
use quill_term::terminal::{self, Support, Terminal};

use crate::grapheme::{GraphemeSplitter, Widths};
use crate::list::StringList;
use crate::render;
use crate::style::{ColorMap, Completer, MultilinePredicate, SyntaxColor, Token};
use crate::text::EditBuffer;

/// Prompt used until the host installs one.
const DEFAULT_PROMPT: &str = ">";

/// Line-length bound for the unsupported-terminal fallback.
const UNSUPPORTED_LINE_LIMIT: u64 = 4096;

/// What the line editor is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    #[default]
    Default,
    Selection,
    History,
}

/// Outcome of one keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Keep editing.
    Continue,
    /// The line is finished; return it.
    Finish,
    /// Ctrl-G: abandon the line and return empty.
    Cancel,
}

/// Frame geometry remembered between keypresses: the cursor's row within
/// the frame and the index of the frame's last row.
#[derive(Debug, Clone, Copy, Default)]
struct FrameState {
    vpos: usize,
    nlines: usize,
}

/// A line editor session.
///
/// Configure with the `set_*` methods, then call
/// [`read_line`](Self::read_line) repeatedly.
pub struct Editor {
    mode: Mode,
    /// Cursor position in characters.
    posn: usize,
    /// Selection anchor; `None` outside Selection mode.
    sposn: Option<usize>,
    /// Terminal column count from the most recent query.
    ncols: usize,

    prompt: String,
    /// Continuation prompt; falls back to `prompt` when unset.
    cprompt: Option<String>,

    current: EditBuffer,
    clipboard: String,
    history: StringList,
    suggestions: StringList,

    color: Option<SyntaxColor>,
    completer: Option<Completer>,
    multiline: Option<MultilinePredicate>,
    widths: Widths,

    frame: FrameState,
}

impl Editor {
    /// Create a session with the default `">"` prompt and no callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: Mode::Default,
            posn: 0,
            sposn: None,
            ncols: 0,
            prompt: DEFAULT_PROMPT.to_string(),
            cprompt: None,
            current: EditBuffer::new(),
            clipboard: String::new(),
            history: StringList::new(),
            suggestions: StringList::new(),
            color: None,
            completer: None,
            multiline: None,
            widths: Widths::new(),
            frame: FrameState::default(),
        }
    }

    /// Release everything the session owns — history, suggestions,
    /// clipboard, callbacks, the grapheme cache — returning it to the
    /// freshly-initialized state. Idempotent.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // ── Configuration ───────────────────────────────────────────────

    /// Set the prompt.
    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    /// Install a tokenizer and its token-type → color map. Replaces any
    /// previous coloring configuration; the map is copied and sorted.
    pub fn set_tokenizer(
        &mut self,
        tokenizer: impl FnMut(&str) -> Option<Token> + 'static,
        map: &[(i32, Color)],
    ) {
        self.color = Some(SyntaxColor {
            tokenizer: Box::new(tokenizer),
            map: ColorMap::new(map),
            warned: false,
        });
    }

    /// Install a completion callback. The completer receives the buffer
    /// and adds the *remaining* characters of each candidate to the list.
    pub fn set_completer(&mut self, completer: impl FnMut(&str, &mut StringList) + 'static) {
        self.completer = Some(Box::new(completer));
    }

    /// Install a multiline predicate: Return keeps editing while it holds.
    /// `cprompt` is the continuation prompt; `None` reuses the primary.
    pub fn set_multiline(
        &mut self,
        predicate: impl FnMut(&str) -> bool + 'static,
        cprompt: Option<&str>,
    ) {
        self.multiline = Some(Box::new(predicate));
        self.cprompt = cprompt.map(ToString::to_string);
    }

    /// Install a grapheme splitter (e.g.
    /// [`unicode_splitter`](crate::grapheme::unicode_splitter)).
    pub fn set_grapheme_splitter(&mut self, splitter: GraphemeSplitter) {
        self.widths.set_splitter(splitter);
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// The terminal width in columns (fresh query, 80 off-TTY).
    pub fn terminal_width(&mut self) -> usize {
        self.ncols = Terminal::new().width();
        self.ncols
    }

    // ── Reading ─────────────────────────────────────────────────────

    /// Read one line from the user.
    ///
    /// Returns `Ok(None)` only when a non-interactive stream reaches end
    /// of input with nothing read — the caller's signal to stop looping.
    /// A cancelled edit (Ctrl-G) returns an empty line.
    ///
    /// # Errors
    ///
    /// Returns terminal I/O errors; the session stays usable.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        self.current.clear();
        let got = match terminal::support() {
            Support::NotATty => self.read_no_terminal()?,
            Support::Unsupported => self.read_unsupported()?,
            Support::Supported => {
                self.read_supported()?;
                true
            }
        };
        Ok(got.then(|| self.current.as_str().to_string()))
    }

    // ── Out-of-band display ─────────────────────────────────────────

    /// Write `text` in the given color and emphasis. Degrades to a plain
    /// write off a supported TTY.
    ///
    /// # Errors
    ///
    /// Returns terminal write errors.
    pub fn display_styled(&mut self, text: &str, color: Color, emph: Emphasis) -> io::Result<()> {
        let mut term = Terminal::new();
        if terminal::support() == Support::Supported {
            let mut out = Vec::with_capacity(text.len() + 16);
            let _ = ansi::color(&mut out, color);
            let _ = ansi::emphasis(&mut out, emph);
            out.extend_from_slice(text.as_bytes());
            let _ = ansi::reset(&mut out);
            term.write_all(&out)
        } else {
            term.write_all(text.as_bytes())
        }
    }

    /// Write `text` through the installed tokenizer's coloring. Degrades
    /// to a plain write off a supported TTY or without a tokenizer.
    ///
    /// # Errors
    ///
    /// Returns terminal write errors.
    pub fn display_syntax_colored(&mut self, text: &str) -> io::Result<()> {
        let mut term = Terminal::new();
        if terminal::support() == Support::Supported && self.color.is_some() {
            let styled = render::styled(text, None, self.color.as_mut(), None);
            term.write_all(&styled)
        } else {
            term.write_all(text.as_bytes())
        }
    }

    // ── Mode machinery ──────────────────────────────────────────────

    /// Switch modes, maintaining the mode-dependent state: leaving History
    /// removes the sentinel and resets the browse depth; entering
    /// Selection anchors it at the cursor; leaving Selection clears the
    /// anchor.
    fn set_mode(&mut self, mode: Mode) {
        if mode != Mode::History {
            if self.mode == Mode::History {
                self.history.remove(0);
            }
            self.history.posn = 0;
        }
        if mode == Mode::Selection {
            if self.sposn.is_none() {
                self.sposn = Some(self.posn);
            }
        } else {
            self.sposn = None;
        }
        self.mode = mode;
    }

    /// The selection as `(left, right)` character positions, if active.
    fn selection_range(&self) -> Option<(usize, usize)> {
        let anchor = self.sposn?;
        Some((anchor.min(self.posn), anchor.max(self.posn)))
    }

    // ── History ─────────────────────────────────────────────────────

    /// Move `delta` entries deeper (positive) or shallower (negative) in
    /// history, clamped at both ends, and load the entry reached.
    fn history_advance(&mut self, delta: isize) {
        let want = if delta < 0 {
            self.history.posn.saturating_sub(delta.unsigned_abs())
        } else {
            self.history.posn + delta.unsigned_abs()
        };
        if let Some((actual, entry)) = self.history.select(want) {
            self.current.clear();
            self.current.push_str(entry);
            self.history.posn = actual;
        }
    }

    // ── Suggestions ─────────────────────────────────────────────────

    /// Rebuild the suggestion list. The completer only runs while the
    /// cursor is at the end of the buffer; elsewhere the list just
    /// empties.
    fn regenerate_suggestions(&mut self) {
        let Some(completer) = self.completer.as_mut() else {
            return;
        };
        self.suggestions.clear();
        if self.posn == self.current.char_len() {
            completer(self.current.as_str(), &mut self.suggestions);
        }
    }

    /// The active suggestion, if any.
    fn current_suggestion(&self) -> Option<&str> {
        self.suggestions
            .select(self.suggestions.posn)
            .map(|(_, s)| s)
    }

    /// Advance to the next suggestion, wrapping past the last back to the
    /// first.
    fn rotate_suggestions(&mut self) {
        let want = self.suggestions.posn + 1;
        let actual = self.suggestions.select(want).map(|(i, _)| i);
        if let Some(actual) = actual {
            self.suggestions.posn = if actual == want { want } else { 0 };
        }
    }

    // ── Keypress state machine ──────────────────────────────────────

    /// Apply one decoded keypress to the session.
    #[allow(clippy::too_many_lines)] // One arm per key binding; splitting obscures the table.
    fn apply_key(&mut self, k: &Key) -> Flow {
        let mut regenerate = true;

        match *k {
            Key::Char(ch) => {
                self.set_mode(Mode::Default);
                let mut utf8 = [0u8; 4];
                self.current.insert(self.posn, ch.encode_utf8(&mut utf8));
                self.posn += 1;
            }

            Key::Backspace => {
                if let Some((l, r)) = self.selection_range() {
                    self.current.delete(l, r - l);
                    self.posn = l;
                } else if self.posn > 0 {
                    self.current.delete(self.posn - 1, 1);
                    self.posn -= 1;
                }
                self.set_mode(Mode::Default);
            }

            Key::Left | Key::Ctrl('B') => {
                // Leaving a selection leftward lands on its left edge.
                if let Some((l, _)) = self.selection_range() {
                    self.posn = l;
                } else {
                    self.posn -= self.current.prev_cluster_chars(self.posn, &self.widths);
                }
                self.set_mode(Mode::Default);
            }

            Key::Right | Key::Ctrl('F') => {
                if let Some((_, r)) = self.selection_range() {
                    self.posn = r;
                } else {
                    self.posn += self.current.next_cluster_chars(self.posn, &self.widths);
                }
                self.set_mode(Mode::Default);
            }

            Key::ShiftLeft => {
                self.set_mode(Mode::Selection);
                self.posn -= self.current.prev_cluster_chars(self.posn, &self.widths);
            }

            Key::ShiftRight => {
                self.set_mode(Mode::Selection);
                self.posn += self.current.next_cluster_chars(self.posn, &self.widths);
            }

            Key::Up => {
                if self.mode != Mode::History {
                    // Push the in-progress line as the browse sentinel.
                    let snapshot = self.current.as_str().to_string();
                    self.set_mode(Mode::History);
                    self.history.add(&snapshot);
                }
                self.history_advance(1);
                self.posn = self.current.char_len();
            }

            Key::Down => {
                if self.mode == Mode::History {
                    self.history_advance(-1);
                    self.posn = self.current.char_len();
                } else if !self.suggestions.is_empty() {
                    self.rotate_suggestions();
                    regenerate = false;
                }
            }

            Key::Return => {
                let keep_editing = match self.multiline.as_mut() {
                    Some(pred) => pred(self.current.as_str()),
                    None => false,
                };
                if keep_editing {
                    self.set_mode(Mode::Default);
                    self.current.insert(self.posn, "\n");
                    self.posn += 1;
                } else {
                    return Flow::Finish;
                }
            }

            Key::Tab => {
                self.set_mode(Mode::Default);
                let accepted = self.current_suggestion().map(ToString::to_string);
                if let Some(s) = accepted {
                    self.current.push_str(&s);
                    self.posn = self.current.char_len();
                } else {
                    self.current.insert(self.posn, "\t");
                    self.posn += 1;
                }
            }

            Key::Home | Key::Ctrl('A') => {
                self.set_mode(Mode::Default);
                let (_, y) = self.current.coordinates(self.posn);
                self.posn = self.current.find_position(Some(0), y);
            }

            Key::End | Key::Ctrl('E') => {
                self.set_mode(Mode::Default);
                let (_, y) = self.current.coordinates(self.posn);
                self.posn = self.current.find_position(None, y);
            }

            Key::Ctrl('C') => {
                // Copy; Selection mode (and the anchor) survive.
                if let Some((l, r)) = self.selection_range() {
                    self.clipboard = self.current.char_range(l, r).to_string();
                }
            }

            Key::Ctrl('D') => {
                self.set_mode(Mode::Default);
                self.current.delete(self.posn, 1);
            }

            Key::Ctrl('G') => {
                self.current.clear();
                self.posn = 0;
                return Flow::Cancel;
            }

            Key::Ctrl('L') => {
                self.set_mode(Mode::Default);
                self.current.clear();
                self.posn = 0;
            }

            Key::Ctrl('N') => {
                self.set_mode(Mode::Default);
                let (x, y) = self.current.coordinates(self.posn);
                if y < self.current.count_lines() {
                    self.posn = self.current.find_position(Some(x), y + 1);
                }
            }

            Key::Ctrl('P') => {
                self.set_mode(Mode::Default);
                let (x, y) = self.current.coordinates(self.posn);
                if y > 0 {
                    self.posn = self.current.find_position(Some(x), y - 1);
                }
            }

            Key::Ctrl('V') => {
                self.set_mode(Mode::Default);
                if !self.clipboard.is_empty() {
                    let n = self.clipboard.chars().count();
                    self.current.insert(self.posn, &self.clipboard);
                    self.posn += n;
                }
            }

            Key::Ctrl(_) | Key::Unknown => {}
        }

        if regenerate {
            self.regenerate_suggestions();
        }
        Flow::Continue
    }

    /// Finalize the line: cursor to the end, suggestions dropped, History
    /// sentinel popped, and the result appended to history if non-empty.
    fn finish_line(&mut self) {
        self.posn = self.current.char_len();
        self.suggestions.clear();
        self.set_mode(Mode::Default);
        if !self.current.is_empty() {
            let line = self.current.as_str().to_string();
            self.history.add(&line);
        }
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Build the styled string for the current buffer.
    fn styled_current(&mut self) -> Vec<u8> {
        let selection = self.selection_range();
        let suggestion = self.current_suggestion().map(ToString::to_string);
        render::styled(
            self.current.as_str(),
            selection,
            self.color.as_mut(),
            suggestion.as_deref(),
        )
    }

    /// Repaint the frame with minimal movement and drop the cursor on its
    /// display position.
    fn redraw(&mut self, term: &mut Terminal) -> io::Result<()> {
        let mut frame = Vec::with_capacity(128);
        let _ = ansi::move_up(&mut frame, self.frame.vpos);
        let _ = ansi::carriage_return(&mut frame);
        let _ = ansi::reset(&mut frame);
        frame.extend_from_slice(self.prompt.as_bytes());

        let styled = self.styled_current();
        let cprompt = self
            .cprompt
            .clone()
            .unwrap_or_else(|| self.prompt.clone());
        render::render_string(&mut frame, Some(term), &mut self.widths, &styled, &cprompt)?;
        let _ = ansi::erase_to_eol(&mut frame);

        let nlines = self.current.count_lines();
        let (xpos, ypos) = self.current.display_coordinates(self.posn, &mut self.widths);
        let _ = ansi::move_up(&mut frame, nlines - ypos);
        let prompt_cols = if ypos == 0 {
            render::text_width(&mut self.widths, &self.prompt)
        } else {
            render::text_width(&mut self.widths, &cprompt)
        };
        let _ = ansi::move_to_column(&mut frame, prompt_cols + xpos);
        term.write_all(&frame)?;

        self.frame.vpos = ypos;
        self.frame.nlines = nlines;
        Ok(())
    }

    /// Reconcile the on-screen frame height with the buffer's line count:
    /// open blank rows when the buffer grew, erase stale rows when it
    /// shrank. Leaves the cursor on the new bottom row.
    fn change_height(&mut self, term: &mut Terminal) -> io::Result<()> {
        let new = self.current.count_lines();
        let old = self.frame.nlines;
        if new == old {
            return Ok(());
        }

        let mut frame = Vec::new();
        let _ = ansi::move_down(&mut frame, old - self.frame.vpos);
        if new > old {
            for _ in old..new {
                frame.extend_from_slice(b"\r\n");
            }
        } else {
            for _ in new..old {
                let _ = ansi::erase_line(&mut frame);
                let _ = ansi::move_up(&mut frame, 1);
            }
        }
        term.write_all(&frame)?;

        self.frame.vpos = new;
        self.frame.nlines = new;
        Ok(())
    }

    // ── Interaction loops ───────────────────────────────────────────

    /// The interactive loop for supported terminals.
    fn read_supported(&mut self) -> io::Result<()> {
        let mut term = Terminal::new();
        term.enter_raw()?;

        self.set_mode(Mode::Default);
        self.ncols = term.width();
        self.posn = 0;
        self.frame = FrameState::default();
        self.redraw(&mut term)?;

        loop {
            let mut flow = match key::decode(&mut term)? {
                Some(k) => self.apply_key(&k),
                None => Flow::Finish,
            };
            // Absorb everything already buffered (a paste) before
            // spending a redraw.
            while flow == Flow::Continue && term.key_available() {
                flow = match key::decode(&mut term)? {
                    Some(k) => self.apply_key(&k),
                    None => Flow::Finish,
                };
            }
            if flow != Flow::Continue {
                break;
            }
            self.change_height(&mut term)?;
            self.redraw(&mut term)?;
        }

        self.finish_line();
        self.change_height(&mut term)?;
        self.redraw(&mut term)?;
        term.leave_raw()?;
        term.write_all(b"\n")?;
        Ok(())
    }

    /// Pipe input: read bytes up to newline or EOF, no editing.
    fn read_no_terminal(&mut self) -> io::Result<bool> {
        let mut bytes = Vec::new();
        let n = io::stdin().lock().read_until(b'\n', &mut bytes)?;
        if n == 0 {
            return Ok(false);
        }
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        self.current.push_str(&String::from_utf8_lossy(&bytes));
        Ok(true)
    }

    /// Dumb-terminal fallback: prompt, blocking bounded line read,
    /// trailing control characters trimmed.
    fn read_unsupported(&mut self) -> io::Result<bool> {
        {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(self.prompt.as_bytes())?;
            lock.flush()?;
        }

        let mut bytes = Vec::new();
        let n = io::stdin()
            .lock()
            .take(UNSUPPORTED_LINE_LIMIT)
            .read_until(b'\n', &mut bytes)?;
        if n == 0 {
            return Ok(false);
        }
        while bytes.last().is_some_and(|&b| b < 0x20 || b == 0x7f) {
            bytes.pop();
        }
        self.current.push_str(&String::from_utf8_lossy(&bytes));
        Ok(true)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

//! # quill-edit — Line editor core
//!
//! A UTF-8-aware interactive line editor with history, completion,
//! multiline editing, selection, and syntax highlighting, built directly
//! on the raw terminal driver in `quill-term`:
//!
//! - **[`utf8`]** — byte-level UTF-8 helpers
//! - **[`grapheme`]** — pluggable cluster splitting and the measuring
//!   width cache
//! - **[`text`]** — the character-indexed edit buffer and its coordinate
//!   arithmetic
//! - **[`list`]** — head-insertion string lists for history and
//!   suggestions
//! - **[`style`]** — the tokenizer/completer/multiline callback contracts
//!   and the sorted color map
//! - **[`render`]** — styled-string construction and the minimal-motion
//!   redraw machinery
//! - **[`editor`]** — the session: keypress state machine, interaction
//!   loops, and the public API
//!
//! ```no_run
//! use quill_edit::Editor;
//!
//! let mut editor = Editor::new();
//! editor.set_prompt("> ");
//! while let Some(line) = editor.read_line()? {
//!     println!("got: {line}");
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod editor;
pub mod grapheme;
pub mod list;
pub mod render;
pub mod style;
pub mod text;
pub mod utf8;

pub use editor::Editor;
pub use grapheme::{codepoint_splitter, unicode_splitter, GraphemeSplitter, WidthCache};
pub use list::StringList;
pub use quill_term::ansi::{Color, Emphasis};
pub use quill_term::terminal::is_tty;
pub use style::{ColorMap, Token};
pub use text::EditBuffer;

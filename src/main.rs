// SPDX-License-Identifier: MIT
//
// quill — interactive front end for an embedded scripting language.
//
// This binary wires the line editor to a small expression language:
//
//   quill-term → raw terminal control and keypress decoding
//   quill-edit → the editor session (history, completion, multiline,
//                selection, syntax coloring)
//
// The lexer below exists purely to drive syntax coloring and completion;
// compiling and running the language happens elsewhere. Each accepted line
// is echoed back through the editor's styled display helpers, which is
// exactly what a REPL does with the language runtime swapped in.

use std::process;

use quill_edit::{unicode_splitter, Color, Editor, Emphasis, StringList, Token};

// ─── Token kinds ────────────────────────────────────────────────────────────

const TOK_NUMBER: i32 = 0;
const TOK_STRING: i32 = 1;
const TOK_KEYWORD: i32 = 2;
const TOK_IDENT: i32 = 3;
const TOK_COMMENT: i32 = 4;
const TOK_PUNCT: i32 = 5;

/// Keyword vocabulary — doubles as the completion dictionary.
const KEYWORDS: [&str; 20] = [
    "and", "break", "class", "continue", "else", "false", "fn", "for", "help", "if", "in",
    "import", "nil", "or", "print", "return", "true", "var", "while", "quit",
];

/// Token-type colors: literals blue, keywords magenta, identifiers cyan,
/// comments green, punctuation default.
const COLORS: [(i32, Color); 6] = [
    (TOK_NUMBER, Color::Blue),
    (TOK_STRING, Color::Blue),
    (TOK_KEYWORD, Color::Magenta),
    (TOK_IDENT, Color::Cyan),
    (TOK_COMMENT, Color::Green),
    (TOK_PUNCT, Color::Default),
];

// ─── Lexer ──────────────────────────────────────────────────────────────────

/// Identify the next token of `input`, or `None` at its end.
///
/// Offsets in the returned token are relative to `input`, as the editor's
/// tokenizer contract requires.
fn next_token(input: &str) -> Option<Token> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let start = input.len() - trimmed.len();

    let first = trimmed.chars().next()?;
    let (kind, len) = if trimmed.starts_with("//") {
        // Line comment: runs to the end of the line.
        let len = trimmed.find('\n').unwrap_or(trimmed.len());
        (TOK_COMMENT, len)
    } else if first == '"' {
        // String literal; an unterminated one colors to the end.
        let len = trimmed[1..]
            .find('"')
            .map_or(trimmed.len(), |i| i + 2);
        (TOK_STRING, len)
    } else if first.is_ascii_digit() {
        let len = trimmed
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(trimmed.len());
        (TOK_NUMBER, len)
    } else if first.is_alphabetic() || first == '_' {
        let len = trimmed
            .find(|c: char| !c.is_alphanumeric() && c != '_')
            .unwrap_or(trimmed.len());
        let word = &trimmed[..len];
        let kind = if KEYWORDS.contains(&word) {
            TOK_KEYWORD
        } else {
            TOK_IDENT
        };
        (kind, len)
    } else {
        (TOK_PUNCT, first.len_utf8())
    };

    Some(Token { kind, start, len })
}

// ─── Editor callbacks ───────────────────────────────────────────────────────

/// Complete the last whitespace-delimited word against the keyword list,
/// adding only the characters the user has not typed yet.
fn complete(input: &str, out: &mut StringList) {
    let word = input
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("");
    if word.is_empty() {
        return;
    }
    for candidate in KEYWORDS {
        if candidate.len() > word.len() && candidate.starts_with(word) {
            out.add(&candidate[word.len()..]);
        }
    }
}

/// Keep editing while brackets are unbalanced.
fn unbalanced(input: &str) -> bool {
    let mut depth = 0i32;
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            '"' => {
                // Skip string contents; brackets inside don't nest.
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    depth > 0
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn run() -> std::io::Result<()> {
    let mut editor = Editor::new();
    editor.set_prompt("> ");
    editor.set_tokenizer(next_token, &COLORS);
    editor.set_completer(complete);
    editor.set_multiline(unbalanced, Some("  "));
    editor.set_grapheme_splitter(unicode_splitter);

    if quill_edit::is_tty() {
        editor.display_styled("quill", Color::Magenta, Emphasis::Bold)?;
        editor.display_styled(
            " — type 'quit' to leave, Tab completes keywords\n",
            Color::Default,
            Emphasis::None,
        )?;
    }

    while let Some(line) = editor.read_line()? {
        let line = line.trim().to_string();
        if line == "quit" {
            break;
        }
        if line.is_empty() {
            continue;
        }

        // Hand-off point for a language runtime; the front end just
        // echoes the parse back, styled.
        editor.display_styled("= ", Color::Green, Emphasis::Bold)?;
        editor.display_syntax_colored(&line)?;
        editor.display_styled("\n", Color::Default, Emphasis::None)?;
    }

    editor.clear();
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("quill: {e}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: lex a whole input into (kind, text) pairs.
    fn lex(mut input: &str) -> Vec<(i32, &str)> {
        let mut tokens = Vec::new();
        while let Some(t) = next_token(input) {
            tokens.push((t.kind, &input[t.start..t.start + t.len]));
            input = &input[t.start + t.len..];
        }
        tokens
    }

    // ── Lexer ───────────────────────────────────────────────────────────

    #[test]
    fn empty_input_has_no_tokens() {
        assert_eq!(next_token(""), None);
        assert_eq!(next_token("   "), None);
    }

    #[test]
    fn numbers_and_identifiers() {
        assert_eq!(
            lex("x1 3.14"),
            vec![(TOK_IDENT, "x1"), (TOK_NUMBER, "3.14")]
        );
    }

    #[test]
    fn keywords_are_distinguished() {
        assert_eq!(
            lex("var x"),
            vec![(TOK_KEYWORD, "var"), (TOK_IDENT, "x")]
        );
    }

    #[test]
    fn string_literal_spans_quotes() {
        assert_eq!(lex("\"hi there\""), vec![(TOK_STRING, "\"hi there\"")]);
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        assert_eq!(lex("\"oops"), vec![(TOK_STRING, "\"oops")]);
    }

    #[test]
    fn comment_runs_to_line_end() {
        assert_eq!(
            lex("x // rest\ny"),
            vec![
                (TOK_IDENT, "x"),
                (TOK_COMMENT, "// rest"),
                (TOK_IDENT, "y"),
            ]
        );
    }

    #[test]
    fn punctuation_is_single_char() {
        assert_eq!(
            lex("f(x)"),
            vec![
                (TOK_IDENT, "f"),
                (TOK_PUNCT, "("),
                (TOK_IDENT, "x"),
                (TOK_PUNCT, ")"),
            ]
        );
    }

    #[test]
    fn offsets_are_relative_to_input() {
        let t = next_token("  var").unwrap();
        assert_eq!(t.start, 2);
        assert_eq!(t.len, 3);
    }

    // ── Completion ──────────────────────────────────────────────────────

    #[test]
    fn completes_remaining_characters() {
        let mut out = StringList::new();
        complete("pri", &mut out);
        assert_eq!(out.count(), 1);
        assert_eq!(out.get(0), Some("nt"));
    }

    #[test]
    fn completes_last_word_only() {
        let mut out = StringList::new();
        complete("x = pri", &mut out);
        assert_eq!(out.get(0), Some("nt"));
    }

    #[test]
    fn exact_keyword_yields_no_completion() {
        let mut out = StringList::new();
        complete("print", &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn empty_input_yields_no_completion() {
        let mut out = StringList::new();
        complete("", &mut out);
        complete("x ", &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn multiple_matches_are_all_added() {
        let mut out = StringList::new();
        complete("c", &mut out);
        // class, continue.
        assert_eq!(out.count(), 2);
    }

    // ── Multiline predicate ─────────────────────────────────────────────

    #[test]
    fn balanced_input_submits() {
        assert!(!unbalanced("f(x)"));
        assert!(!unbalanced("plain"));
        assert!(!unbalanced(""));
    }

    #[test]
    fn open_brackets_continue() {
        assert!(unbalanced("f("));
        assert!(unbalanced("{ [ ("));
        assert!(unbalanced("fn f() {"));
    }

    #[test]
    fn brackets_inside_strings_are_ignored() {
        assert!(!unbalanced("\"(\""));
        assert!(unbalanced("(\")\""));
    }

    #[test]
    fn over_closed_input_submits() {
        assert!(!unbalanced("f))"));
    }
}

// SPDX-License-Identifier: MIT
//
// Syntax-coloring configuration: the tokenizer contract and the color map.
//
// The editor never parses the language it is editing. The host application
// supplies a tokenizer; the editor walks the buffer with it and paints each
// token by looking its type up in a color map. Token types are opaque
// integers on this side of the boundary — the map is the only place they
// mean anything.
//
// Callbacks are capability objects: a boxed closure carrying whatever
// context the host needs, supplied once at configuration time.

use quill_term::ansi::Color;

use crate::list::StringList;

/// One token identified by the host's tokenizer.
///
/// `start` and `len` are byte offsets *relative to the input slice the
/// tokenizer was handed* — the remainder of the buffer, not its beginning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Host-defined token type; the index into the color map.
    pub kind: i32,
    /// Byte offset of the token within the tokenizer's input.
    pub start: usize,
    /// Token length in bytes.
    pub len: usize,
}

/// Identify the next token of `input`, or `None` when there are no more.
pub type Tokenizer = Box<dyn FnMut(&str) -> Option<Token>>;

/// Produce completion candidates for `input`, adding only the characters
/// that remain after what the user already typed.
pub type Completer = Box<dyn FnMut(&str, &mut StringList)>;

/// Decide whether Return should continue editing (true) or submit (false).
pub type MultilinePredicate = Box<dyn FnMut(&str) -> bool>;

// ─── Color Map ──────────────────────────────────────────────────────────────

/// Token-type → color table, sorted for binary search.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    entries: Vec<(i32, Color)>,
}

impl ColorMap {
    /// Build a map from `(token type, color)` pairs.
    ///
    /// The entries are copied and sorted by token type; duplicate types
    /// keep the first occurrence.
    #[must_use]
    pub fn new(entries: &[(i32, Color)]) -> Self {
        let mut entries = entries.to_vec();
        entries.sort_by_key(|&(kind, _)| kind);
        entries.dedup_by_key(|&mut (kind, _)| kind);
        Self { entries }
    }

    /// The color for token type `kind`, if the map contains it.
    #[must_use]
    pub fn lookup(&self, kind: i32) -> Option<Color> {
        self.entries
            .binary_search_by_key(&kind, |&(k, _)| k)
            .ok()
            .map(|i| self.entries[i].1)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything syntax coloring needs: the tokenizer, its color map, and the
/// one-shot flag for the runaway-tokenizer diagnostic.
pub(crate) struct SyntaxColor {
    pub tokenizer: Tokenizer,
    pub map: ColorMap,
    /// Set after warning once about a tokenizer that stopped advancing.
    pub warned: bool,
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_finds_nothing() {
        assert_eq!(ColorMap::new(&[]).lookup(0), None);
    }

    #[test]
    fn lookup_finds_entries() {
        let map = ColorMap::new(&[(3, Color::Red), (1, Color::Blue)]);
        assert_eq!(map.lookup(1), Some(Color::Blue));
        assert_eq!(map.lookup(3), Some(Color::Red));
    }

    #[test]
    fn lookup_misses_absent_types() {
        let map = ColorMap::new(&[(3, Color::Red), (1, Color::Blue)]);
        assert_eq!(map.lookup(0), None);
        assert_eq!(map.lookup(2), None);
        assert_eq!(map.lookup(4), None);
    }

    #[test]
    fn map_sorts_unordered_input() {
        let map = ColorMap::new(&[(9, Color::Red), (2, Color::Blue), (5, Color::Cyan)]);
        assert_eq!(map.entries, vec![
            (2, Color::Blue),
            (5, Color::Cyan),
            (9, Color::Red),
        ]);
    }

    #[test]
    fn duplicate_types_keep_first() {
        let map = ColorMap::new(&[(1, Color::Red), (1, Color::Blue)]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.lookup(1), Some(Color::Red));
    }

    #[test]
    fn negative_types_are_ordinary_keys() {
        let map = ColorMap::new(&[(-1, Color::Green), (0, Color::Red)]);
        assert_eq!(map.lookup(-1), Some(Color::Green));
    }

    #[test]
    fn lookup_hits_iff_contained() {
        let kinds = [1, 4, 7, 100];
        let entries: Vec<_> = kinds.iter().map(|&k| (k, Color::Red)).collect();
        let map = ColorMap::new(&entries);
        for k in -2..120 {
            assert_eq!(map.lookup(k).is_some(), kinds.contains(&k), "kind {k}");
        }
    }
}

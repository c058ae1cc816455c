// SPDX-License-Identifier: MIT
//
// The edit buffer — a growable string addressed by character position.
//
// Every public operation takes *character* indices (code points, not
// bytes); the byte translation happens once at each boundary. This is what
// keeps the cursor arithmetic honest when the user types outside ASCII:
// `posn` counts what the user perceives as positions, and the buffer does
// the bookkeeping.
//
// Coordinates are position-based: index `i` names the gap before the i-th
// character, so `0..=char_len()` are all valid cursor positions and
// `coordinates`/`find_position` invert each other across embedded
// newlines. Display coordinates weigh each grapheme cluster by its
// terminal width instead of counting characters.
//
// Growth follows the ×1.5 policy from a minimum of 8 bytes, amortizing
// per-keypress insertions without doubling waste.

use crate::grapheme::Widths;
use crate::utf8;

/// Smallest capacity the buffer reserves once it holds anything.
const MIN_CAPACITY: usize = 8;

/// A growable, character-indexed text buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    data: String,
}

impl EditBuffer {
    /// Create an empty buffer. Does not allocate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: String::new(),
        }
    }

    /// The buffer contents.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Length in bytes.
    #[inline]
    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }

    /// Length in characters (code points).
    #[must_use]
    pub fn char_len(&self) -> usize {
        utf8::count(self.data.as_bytes()).unwrap_or(0)
    }

    /// Whether the buffer holds no text.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Remove all text, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Reserve for `extra` more bytes: ×1.5 growth from a floor of 8.
    fn reserve_amortized(&mut self, extra: usize) {
        let needed = self.data.len() + extra;
        if self.data.capacity() > needed {
            return;
        }
        let mut cap = MIN_CAPACITY;
        while cap <= needed {
            cap += cap / 2;
        }
        self.data.reserve_exact(cap - self.data.len());
    }

    /// Append `s` to the end.
    pub fn push_str(&mut self, s: &str) {
        self.reserve_amortized(s.len());
        self.data.push_str(s);
    }

    /// Byte offset of character `index`, clamped to the buffer length.
    #[must_use]
    pub fn byte_offset(&self, index: usize) -> usize {
        self.data
            .char_indices()
            .nth(index)
            .map_or(self.data.len(), |(off, _)| off)
    }

    /// Insert `s` before character `index`. An index at or past the end
    /// appends.
    pub fn insert(&mut self, index: usize, s: &str) {
        self.reserve_amortized(s.len());
        let off = self.byte_offset(index);
        self.data.insert_str(off, s);
    }

    /// Delete `nchars` characters starting at character `index`.
    ///
    /// Deleting past the end stops at the end; an index past the end is a
    /// no-op.
    pub fn delete(&mut self, index: usize, nchars: usize) {
        let start = self.byte_offset(index);
        if start >= self.data.len() {
            return;
        }
        let end = self.byte_offset(index + nchars);
        self.data.drain(start..end);
    }

    /// The text between character positions `from` and `to` (exclusive).
    #[must_use]
    pub fn char_range(&self, from: usize, to: usize) -> &str {
        let start = self.byte_offset(from);
        let end = self.byte_offset(to.max(from));
        &self.data[start..end]
    }

    // ── Coordinates ─────────────────────────────────────────────────

    /// `(x, y)` of cursor position `index`: `y` counts newlines before it,
    /// `x` counts characters since the start of that line.
    #[must_use]
    pub fn coordinates(&self, index: usize) -> (usize, usize) {
        let (mut x, mut y) = (0, 0);
        for ch in self.data.chars().take(index) {
            if ch == '\n' {
                y += 1;
                x = 0;
            } else {
                x += 1;
            }
        }
        (x, y)
    }

    /// Like [`coordinates`](Self::coordinates) but `x` is measured in
    /// display columns, weighing each grapheme cluster by its width.
    ///
    /// A position inside a cluster counts the whole cluster's width; the
    /// cursor never points mid-glyph on screen.
    #[must_use]
    pub fn display_coordinates(&self, index: usize, widths: &mut Widths) -> (usize, usize) {
        let (mut x, mut y) = (0, 0);
        let mut consumed = 0;
        let mut rest = self.data.as_str();

        while consumed < index && !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix('\n') {
                y += 1;
                x = 0;
                consumed += 1;
                rest = tail;
                continue;
            }
            let cluster = widths.cluster(rest);
            if cluster.is_empty() {
                break;
            }
            x += widths.width(cluster);
            consumed += cluster.chars().count();
            rest = &rest[cluster.len()..];
        }
        (x, y)
    }

    /// Inverse of [`coordinates`](Self::coordinates): the cursor position
    /// at column `x` of line `y`.
    ///
    /// `x = None` means the end of line `y`. A column past the line's end
    /// clamps to the line's end; a line past the last clamps to the end of
    /// the buffer.
    #[must_use]
    pub fn find_position(&self, x: Option<usize>, y: usize) -> usize {
        let (mut cx, mut cy) = (0, 0);
        for (index, ch) in self.data.chars().enumerate() {
            if cy == y {
                if let Some(x) = x {
                    if cx == x {
                        return index;
                    }
                }
                if ch == '\n' {
                    // End of the requested line, column clamped.
                    return index;
                }
            }
            if ch == '\n' {
                cy += 1;
                cx = 0;
            } else {
                cx += 1;
            }
        }
        self.char_len()
    }

    /// Index of the last line, i.e. the number of newlines in the buffer.
    #[must_use]
    pub fn count_lines(&self) -> usize {
        self.coordinates(self.char_len()).1
    }

    // ── Cluster-wise movement ───────────────────────────────────────

    /// Characters in the grapheme cluster starting at position `index`.
    /// Zero at the end of the buffer.
    #[must_use]
    pub fn next_cluster_chars(&self, index: usize, widths: &Widths) -> usize {
        let rest = &self.data[self.byte_offset(index)..];
        widths.cluster(rest).chars().count()
    }

    /// Characters in the grapheme cluster ending at position `index`.
    /// Zero at the start of the buffer.
    #[must_use]
    pub fn prev_cluster_chars(&self, index: usize, widths: &Widths) -> usize {
        if index == 0 {
            return 0;
        }
        let mut consumed = 0;
        let mut last = 0;
        let mut rest = self.data.as_str();
        while consumed < index && !rest.is_empty() {
            let cluster = widths.cluster(rest);
            if cluster.is_empty() {
                break;
            }
            last = cluster.chars().count();
            consumed += last;
            rest = &rest[cluster.len()..];
        }
        last.min(index)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grapheme::unicode_splitter;

    /// Helper: buffer holding `s`.
    fn buf(s: &str) -> EditBuffer {
        let mut b = EditBuffer::new();
        b.push_str(s);
        b
    }

    // ── Basic editing ───────────────────────────────────────────────────

    #[test]
    fn new_buffer_is_empty() {
        let b = EditBuffer::new();
        assert!(b.is_empty());
        assert_eq!(b.char_len(), 0);
        assert_eq!(b.len_bytes(), 0);
    }

    #[test]
    fn push_str_appends() {
        let mut b = buf("hel");
        b.push_str("lo");
        assert_eq!(b.as_str(), "hello");
    }

    #[test]
    fn char_len_counts_code_points() {
        assert_eq!(buf("aé€🦋").char_len(), 4);
        assert_eq!(buf("aé€🦋").len_bytes(), 10);
    }

    #[test]
    fn insert_in_middle() {
        let mut b = buf("abc");
        b.insert(1, "X");
        assert_eq!(b.as_str(), "aXbc");
    }

    #[test]
    fn insert_at_zero() {
        let mut b = buf("bc");
        b.insert(0, "a");
        assert_eq!(b.as_str(), "abc");
    }

    #[test]
    fn insert_past_end_appends() {
        let mut b = buf("ab");
        b.insert(99, "c");
        assert_eq!(b.as_str(), "abc");
    }

    #[test]
    fn insert_counts_characters_not_bytes() {
        let mut b = buf("é€");
        b.insert(1, "x");
        assert_eq!(b.as_str(), "éx€");
    }

    #[test]
    fn delete_in_middle() {
        let mut b = buf("abcd");
        b.delete(1, 2);
        assert_eq!(b.as_str(), "ad");
    }

    #[test]
    fn delete_multibyte() {
        let mut b = buf("a🦋b");
        b.delete(1, 1);
        assert_eq!(b.as_str(), "ab");
    }

    #[test]
    fn delete_past_end_stops_at_end() {
        let mut b = buf("abc");
        b.delete(1, 99);
        assert_eq!(b.as_str(), "a");
    }

    #[test]
    fn delete_at_end_is_noop() {
        let mut b = buf("abc");
        b.delete(3, 1);
        assert_eq!(b.as_str(), "abc");
    }

    #[test]
    fn clear_empties() {
        let mut b = buf("abc");
        b.clear();
        assert!(b.is_empty());
    }

    #[test]
    fn char_range_slices_by_characters() {
        assert_eq!(buf("aé€b").char_range(1, 3), "é€");
    }

    #[test]
    fn char_range_empty_when_reversed() {
        assert_eq!(buf("abc").char_range(2, 1), "");
    }

    // ── Byte offsets ────────────────────────────────────────────────────

    #[test]
    fn byte_offset_ascii() {
        assert_eq!(buf("abc").byte_offset(2), 2);
    }

    #[test]
    fn byte_offset_multibyte() {
        let b = buf("é€x");
        assert_eq!(b.byte_offset(0), 0);
        assert_eq!(b.byte_offset(1), 2);
        assert_eq!(b.byte_offset(2), 5);
        assert_eq!(b.byte_offset(3), 6);
    }

    #[test]
    fn byte_offset_clamps() {
        assert_eq!(buf("ab").byte_offset(99), 2);
    }

    // ── Growth ──────────────────────────────────────────────────────────

    #[test]
    fn capacity_growth_is_amortized() {
        let mut b = EditBuffer::new();
        let mut reallocs = 0;
        let mut last_cap = b.data.capacity();
        for _ in 0..1000 {
            b.push_str("x");
            if b.data.capacity() != last_cap {
                reallocs += 1;
                last_cap = b.data.capacity();
            }
        }
        // ×1.5 growth reaches 1000 bytes in well under 20 steps.
        assert!(reallocs < 20, "{reallocs} reallocations");
    }

    #[test]
    fn first_allocation_is_at_least_minimum() {
        let mut b = EditBuffer::new();
        b.push_str("a");
        assert!(b.data.capacity() >= MIN_CAPACITY);
    }

    // ── Coordinates ─────────────────────────────────────────────────────

    #[test]
    fn coordinates_single_line() {
        let b = buf("hello");
        assert_eq!(b.coordinates(0), (0, 0));
        assert_eq!(b.coordinates(3), (3, 0));
        assert_eq!(b.coordinates(5), (5, 0));
    }

    #[test]
    fn coordinates_across_newlines() {
        let b = buf("ab\ncde\nf");
        assert_eq!(b.coordinates(2), (2, 0)); // before the newline
        assert_eq!(b.coordinates(3), (0, 1)); // after it
        assert_eq!(b.coordinates(6), (3, 1));
        assert_eq!(b.coordinates(7), (0, 2));
        assert_eq!(b.coordinates(8), (1, 2));
    }

    #[test]
    fn count_lines_counts_newlines() {
        assert_eq!(buf("hello").count_lines(), 0);
        assert_eq!(buf("f(\nx)").count_lines(), 1);
        assert_eq!(buf("a\nb\nc").count_lines(), 2);
        assert_eq!(buf("ab\n").count_lines(), 1);
    }

    #[test]
    fn find_position_inverts_coordinates() {
        let b = buf("ab\ncde\nf🦋g");
        for p in 0..=b.char_len() {
            let (x, y) = b.coordinates(p);
            assert_eq!(b.find_position(Some(x), y), p, "position {p}");
        }
    }

    #[test]
    fn find_position_end_of_line() {
        let b = buf("ab\ncde");
        assert_eq!(b.find_position(None, 0), 2); // at the newline
        assert_eq!(b.find_position(None, 1), 6); // end of buffer
    }

    #[test]
    fn find_position_clamps_column() {
        let b = buf("ab\ncde");
        assert_eq!(b.find_position(Some(99), 0), 2);
    }

    #[test]
    fn find_position_clamps_line() {
        let b = buf("ab\ncde");
        assert_eq!(b.find_position(Some(0), 99), 6);
    }

    // ── Display coordinates ─────────────────────────────────────────────

    #[test]
    fn display_coordinates_ascii_match_character_coordinates() {
        let b = buf("ab\ncd");
        let mut w = Widths::new();
        for p in 0..=b.char_len() {
            assert_eq!(b.display_coordinates(p, &mut w), b.coordinates(p));
        }
    }

    #[test]
    fn display_coordinates_weigh_wide_clusters() {
        // "語" is two columns wide by the Unicode estimate.
        let b = buf("a語b");
        let mut w = Widths::new();
        assert_eq!(b.display_coordinates(1, &mut w), (1, 0));
        assert_eq!(b.display_coordinates(2, &mut w), (3, 0));
        assert_eq!(b.display_coordinates(3, &mut w), (4, 0));
    }

    #[test]
    fn display_coordinates_reset_after_newline() {
        let b = buf("語\nb");
        let mut w = Widths::new();
        assert_eq!(b.display_coordinates(2, &mut w), (0, 1));
        assert_eq!(b.display_coordinates(3, &mut w), (1, 1));
    }

    #[test]
    fn display_coordinates_with_combining_cluster() {
        // One cluster of two code points, width 1: a position after the
        // full cluster is one column in.
        let b = buf("e\u{0301}x");
        let mut w = Widths::new();
        w.set_splitter(unicode_splitter);
        assert_eq!(b.display_coordinates(2, &mut w), (1, 0));
        assert_eq!(b.display_coordinates(3, &mut w), (2, 0));
    }

    // ── Cluster movement ────────────────────────────────────────────────

    #[test]
    fn next_cluster_ascii() {
        let b = buf("ab");
        let w = Widths::new();
        assert_eq!(b.next_cluster_chars(0, &w), 1);
        assert_eq!(b.next_cluster_chars(2, &w), 0);
    }

    #[test]
    fn prev_cluster_ascii() {
        let b = buf("ab");
        let w = Widths::new();
        assert_eq!(b.prev_cluster_chars(0, &w), 0);
        assert_eq!(b.prev_cluster_chars(1, &w), 1);
    }

    #[test]
    fn cluster_movement_spans_combining_sequence() {
        let b = buf("e\u{0301}x");
        let mut w = Widths::new();
        w.set_splitter(unicode_splitter);
        assert_eq!(b.next_cluster_chars(0, &w), 2);
        assert_eq!(b.prev_cluster_chars(2, &w), 2);
        assert_eq!(b.prev_cluster_chars(3, &w), 1);
    }

    #[test]
    fn length_invariant_after_mutations() {
        // char_len always equals the decoded code-point count.
        let mut b = EditBuffer::new();
        let ops: &[(&str, usize)] = &[("héllo", 0), ("🦋", 2), ("\nok", 1)];
        for (s, at) in ops {
            b.insert(*at, s);
            assert_eq!(
                b.char_len(),
                b.as_str().chars().count(),
                "after inserting {s}"
            );
        }
        b.delete(1, 3);
        assert_eq!(b.char_len(), b.as_str().chars().count());
    }
}

//! Source locations.
//!
//! Every token and tree node carries a [`Span`] so diagnostics can point
//! at the exact line and column that produced them.

use serde::{Deserialize, Serialize};

/// A region of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset start (0-indexed)
    pub start: usize,
    /// Byte offset end (exclusive)
    pub end: usize,
    /// Line of `start` (1-indexed)
    pub line: usize,
    /// Column of `start` (1-indexed, in bytes)
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// A span covering both `self` and `other`.
    pub fn to(&self, other: Span) -> Span {
        if other.start < self.start {
            return other.to(*self);
        }
        Span {
            start: self.start,
            end: self.end.max(other.end),
            line: self.line,
            column: self.column,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Maps byte offsets to line/column pairs.
///
/// Built once per source; lookups binary-search the line-start table.
#[derive(Debug, Clone)]
pub struct SourceMap {
    line_starts: Vec<usize>,
    len: usize,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in source.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Line and column (both 1-indexed) of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    /// Build a span for a byte range.
    pub fn span(&self, start: usize, end: usize) -> Span {
        let (line, column) = self.line_col(start);
        Span {
            start,
            end,
            line,
            column,
        }
    }

    /// A zero-width span at end of input.
    pub fn eof_span(&self) -> Span {
        self.span(self.len, self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let map = SourceMap::new("ab\ncd\n");
        assert_eq!(map.line_col(0), (1, 1));
        assert_eq!(map.line_col(1), (1, 2));
        assert_eq!(map.line_col(3), (2, 1));
        assert_eq!(map.line_col(6), (3, 1));
    }

    #[test]
    fn test_span_merge() {
        let map = SourceMap::new("hello world");
        let a = map.span(0, 5);
        let b = map.span(6, 11);
        let merged = a.to(b);
        assert_eq!(merged.start, 0);
        assert_eq!(merged.end, 11);
        assert_eq!(merged.line, 1);
        assert_eq!(merged.column, 1);
    }
}

//! Source positions used in tokens, nodes and errors.

use std::fmt;

/// A position within the source character stream.
///
/// Captured by the scanner at token boundaries and carried through nodes
/// into errors. Internally zero-based; the `line`/`column` accessors are
/// 1-indexed for display, matching what editors show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Mark {
    /// Zero-based character index from the start of the stream.
    pub(crate) index: usize,
    /// Zero-based line number.
    pub(crate) line: usize,
    /// Zero-based column number.
    pub(crate) column: usize,
}

impl Mark {
    pub(crate) const fn new(index: usize, line: usize, column: usize) -> Self {
        Self { index, line, column }
    }

    /// Character offset from the start of the stream.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-indexed line number.
    #[inline]
    pub fn line(&self) -> u64 {
        self.line as u64 + 1
    }

    /// 1-indexed column number.
    #[inline]
    pub fn column(&self) -> u64 {
        self.column as u64 + 1
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line(), self.column())
    }
}

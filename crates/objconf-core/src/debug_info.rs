//! Source provenance for diagnostics.
//!
//! Provides [`DebugInfo`], the location of a declaration or expression in the
//! configuration file it was parsed from. Every compiled item and every
//! expression node carries one so that errors can point back to the source.

use std::fmt;
use std::sync::Arc;

/// A range of source text inside a named configuration file.
///
/// Lines and columns are 1-indexed. The path is shared so that cloning the
/// provenance of every node in a file stays cheap.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct DebugInfo {
    /// Path of the file the text was loaded from.
    pub path: Arc<str>,
    /// First line of the range.
    pub first_line: u32,
    /// First column of the range.
    pub first_column: u32,
    /// Last line of the range.
    pub last_line: u32,
    /// Last column of the range.
    pub last_column: u32,
}

impl DebugInfo {
    /// Create a debug info covering `first_line:first_column` to `last_line:last_column`.
    pub fn new(
        path: impl Into<Arc<str>>,
        first_line: u32,
        first_column: u32,
        last_line: u32,
        last_column: u32,
    ) -> Self {
        Self {
            path: path.into(),
            first_line,
            first_column,
            last_line,
            last_column,
        }
    }

    /// Create a zero-width debug info at a single position.
    pub fn point(path: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self::new(path, line, column, line, column)
    }

    /// Whether this carries no location at all (synthesized nodes, tests).
    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.path.is_empty() && self.first_line == 0
    }

}

impl fmt::Debug for DebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for DebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return write!(f, "<unknown>");
        }

        write!(
            f,
            "{}({}:{}-{}:{})",
            self.path, self.first_line, self.first_column, self.last_line, self.last_column
        )
    }
}

//! Position and location tracking for source regions
//!
//! Every token carries a [`Range`] expressed in absolute document coordinates, even when
//! the token was produced by re-tokenizing an embedded region (a `<style>` body, the
//! content of a template `<script>`, an inline `style` attribute). The embedding code
//! describes where a region starts with an [`Origin`], and [`SourceLocation`] shifts the
//! region-relative offsets it computes by that origin.
//!
//! ## Conventions
//!
//! - Lines and columns are zero-based.
//! - Columns count bytes, not characters, matching the byte spans logos hands out.
//! - Only the first line of a region is shifted horizontally: a nested line 0, column 4
//!   becomes `origin.column + 4`, while nested line 2, column 4 is simply column 4 of
//!   document line `origin.line + 2`.

use serde::Serialize;
use std::fmt;
use std::ops::Range as ByteRange;

/// Represents a position in source code (line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A source range with start/end positions and the byte span it covers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Range {
    pub span: ByteRange<usize>,
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(span: ByteRange<usize>, start: Position, end: Position) -> Self {
        Self { span, start, end }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::new(0..0, Position::default(), Position::default())
    }
}

/// Absolute coordinate of the first byte of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Origin {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    /// Synthetic bytes glued in front of the region's real text
    pub lead: usize,
}

impl Origin {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
            lead: 0,
        }
    }

    /// The origin of a region that starts where `range` starts.
    pub fn at(range: &Range) -> Self {
        Self::new(range.span.start, range.start.line, range.start.column)
    }

    /// Account for `bytes` of synthetic prefix in front of the region's text.
    ///
    /// Real text keeps its true coordinates once tokenized. Prefix bytes collapse onto the
    /// origin itself.
    pub fn back(self, bytes: usize) -> Self {
        Self {
            lead: self.lead + bytes,
            ..self
        }
    }
}

/// Provides fast conversion from byte offsets to line/column positions
pub struct SourceLocation {
    /// Byte offsets where each line starts
    line_starts: Vec<usize>,
    origin: Origin,
}

impl SourceLocation {
    pub fn new(source: &str) -> Self {
        Self::with_origin(source, Origin::default())
    }

    /// Create a locator for a region whose first byte sits at `origin` in the document
    pub fn with_origin(source: &str, origin: Origin) -> Self {
        let mut line_starts = vec![0];

        for (byte_pos, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(byte_pos + 1);
            }
        }

        Self {
            line_starts,
            origin,
        }
    }

    /// Convert a region-relative byte offset to an absolute line/column position
    pub fn byte_to_position(&self, byte_offset: usize) -> Position {
        let line = self
            .line_starts
            .binary_search(&byte_offset)
            .unwrap_or_else(|i| i - 1);

        let column = byte_offset - self.line_starts[line];

        if line == 0 {
            let column = column.saturating_sub(self.origin.lead);
            Position::new(self.origin.line, self.origin.column + column)
        } else {
            Position::new(self.origin.line + line, column)
        }
    }

    /// Convert a region-relative byte range to an absolute range
    pub fn range(&self, range: ByteRange<usize>) -> Range {
        Range::new(
            self.absolute(range.start)..self.absolute(range.end),
            self.byte_to_position(range.start),
            self.byte_to_position(range.end),
        )
    }

    fn absolute(&self, byte_offset: usize) -> usize {
        self.origin.offset + byte_offset.saturating_sub(self.origin.lead)
    }
}

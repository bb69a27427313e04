//! Line/column bookkeeping for a source file's text.
//!
//! Grounded on the teacher's `ruff_source_file`: an index of newline offsets
//! built once per file, used to turn the `TextRange`s diagnostics carry into
//! the line/column pairs the diagnostic sink wants (spec §7: "All diagnostics
//! carry source ranges computed from offsets converted to line/column via the
//! tokenizer's line table").

use crate::text_size::TextSize;
use memchr::memchr_iter;

/// One-indexed line and column, matching how editors and most diagnostic
/// renderers display positions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LineColumn {
    pub line: u32,
    pub column: u32,
}

/// A newline-offset index over one file's source text, used to convert a
/// byte offset to a [`LineColumn`] without rescanning the text on every
/// diagnostic.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line; `line_starts[0]` is always 0.
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn from_source_text(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        line_starts.extend(
            memchr_iter(b'\n', text.as_bytes())
                .map(|offset| TextSize::new(offset as u32 + 1))
                // a trailing newline does not start a new, printable line
                .filter(|start| start.to_usize() < text.len()),
        );
        Self { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset into a one-indexed line/column pair.
    ///
    /// Column is counted in UTF-8 bytes from the start of the line; this is
    /// sufficient for the diagnostic ranges the core ever constructs (its own
    /// node ranges), and avoids needing to re-decode UTF-8 on every lookup.
    pub fn line_column(&self, offset: TextSize) -> LineColumn {
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insertion_point) => insertion_point - 1,
        };
        let line_start = self.line_starts[line_index];
        LineColumn {
            line: line_index as u32 + 1,
            column: (offset - line_start).to_u32() + 1,
        }
    }
}

/// The predominant line ending a tokenizer observed in a file, per spec §6's
/// `tokenizerOutput`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

/// The predominant indentation unit a tokenizer observed, per spec §6's
/// `tokenizerOutput`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum IndentStyle {
    #[default]
    Spaces,
    Tabs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_starts_at_zero() {
        let index = LineIndex::from_source_text("abc\ndef\n");
        assert_eq!(
            index.line_column(TextSize::new(0)),
            LineColumn { line: 1, column: 1 }
        );
        assert_eq!(
            index.line_column(TextSize::new(4)),
            LineColumn { line: 2, column: 1 }
        );
    }

    #[test]
    fn offset_mid_line_resolves_its_column() {
        let index = LineIndex::from_source_text("abc\ndefgh\n");
        assert_eq!(
            index.line_column(TextSize::new(7)),
            LineColumn { line: 2, column: 4 }
        );
    }

    #[test]
    fn no_trailing_newline_is_still_one_line() {
        let index = LineIndex::from_source_text("abc");
        assert_eq!(index.line_count(), 1);
    }
}

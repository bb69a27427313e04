//! Source, diagnostics, and arena-indexing infrastructure shared by every
//! other `pipit` crate.
//!
//! This crate plays the role the teacher splits across `ruff_text_size`,
//! `ruff_source_file`, `ruff_db`, and `ruff_index`: none of those crates'
//! own source was close enough to this spec to retrieve, so they are
//! consolidated here rather than reconstructed blind. The surface each of
//! their modules exposes (`TextSize`/`TextRange`, `LineIndex`, a `File`
//! handle, a `newtype_index!` arena-index macro) is unchanged in spirit.

pub mod diagnostic;
pub mod file;
pub mod index;
pub mod source;
pub mod text_size;

pub use diagnostic::{render, Diagnostic, DiagnosticSink, Severity, VecDiagnosticSink};
pub use file::File;
pub use index::{Idx, IndexVec};
pub use source::{IndentStyle, LineColumn, LineEnding, LineIndex};
pub use text_size::{TextRange, TextSize};

//! A resolved, readable source file: the unit the binder and analyzer work
//! one of at a time (spec §5: "single-threaded per file").

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::source::LineIndex;

/// An analyzable file: its path, its text, and a precomputed [`LineIndex`].
///
/// Cheaply `Clone`-able (an `Arc` around the immutable parts) so a [`File`]
/// can be handed to the binder, the analyzer, and the diagnostic renderer
/// without re-reading or re-indexing the text.
#[derive(Clone, Debug)]
pub struct File {
    inner: Arc<FileData>,
}

#[derive(Debug)]
struct FileData {
    path: Utf8PathBuf,
    text: String,
    line_index: LineIndex,
    is_stub_file: bool,
}

impl File {
    pub fn new(path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        let text = text.into();
        let line_index = LineIndex::from_source_text(&text);
        let is_stub_file = path.extension() == Some("pyi");
        Self {
            inner: Arc::new(FileData {
                path,
                text,
                line_index,
                is_stub_file,
            }),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.inner.path
    }

    pub fn text(&self) -> &str {
        &self.inner.text
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.inner.line_index
    }

    /// Per spec §6's `FileInfo.isStubFile`.
    pub fn is_stub_file(&self) -> bool {
        self.inner.is_stub_file
    }
}

impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.path == other.inner.path
    }
}

impl Eq for File {}

impl std::hash::Hash for File {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.path.hash(state);
    }
}

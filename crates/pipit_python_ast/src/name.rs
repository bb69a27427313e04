//! An identifier, cheap to copy and compare.
//!
//! Grounded on the teacher's `ruff_python_ast::name::Name`: a small-string
//! optimized wrapper so that looking a name up in a scope's symbol table
//! does not allocate.

use std::fmt;
use std::ops::Deref;

use compact_str::CompactString;

#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Name(CompactString);

impl Name {
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

//! `Module{fields, loaderFields?, docString?, isPartial}` (spec §3).

use compact_str::CompactString;
use indexmap::IndexMap;

use crate::arena::SymbolId;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ModuleData {
    pub fields: IndexMap<CompactString, SymbolId>,
    /// Populated for `import a.b.c`: the nested module shells bound under
    /// `loaderFields` so the chain resolves without requiring `b` and `c` to
    /// be separately imported (spec §4.4, "Builds `loaderFields`").
    pub loader_fields: Option<IndexMap<CompactString, SymbolId>>,
    pub doc_string: Option<CompactString>,
    /// Set when the resolver could not find every component of a dotted
    /// import (spec §4.7, "constructs a chain of partial modules").
    pub is_partial: bool,
}

impl ModuleData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partial() -> Self {
        Self {
            is_partial: true,
            ..Self::default()
        }
    }
}

//! `Scope`: `{kind, parent?, symbols, returnType, yieldType,
//! typeConstraints, breakSnapshots, continueSnapshots, flags}` (spec §3).

use bitflags::bitflags;
use compact_str::CompactString;
use indexmap::IndexMap;

use crate::arena::{ScopeId, SymbolId};
use crate::types::InferredType;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
    Lambda,
    ListComp,
    /// A branch/loop-body scope merged into its parent at end-of-block
    /// (spec §4.2, "Temporary scope merging").
    Temporary,
}

impl ScopeKind {
    pub fn is_permanent(self) -> bool {
        !matches!(self, ScopeKind::Temporary)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct ScopeFlags: u8 {
        const ALWAYS_RETURNS = 1 << 0;
        const ALWAYS_RAISES  = 1 << 1;
        const ALWAYS_BREAKS  = 1 << 2;
        const MAY_BREAK      = 1 << 3;
        const IS_CONDITIONAL = 1 << 4;
        const IS_LOOPING     = 1 << 5;
        const IS_NOT_EXECUTED = 1 << 6;
    }
}

#[derive(Clone, Debug)]
pub struct ScopeData {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub symbols: IndexMap<CompactString, SymbolId>,
    pub return_type: InferredType,
    pub yield_type: InferredType,
    pub flags: ScopeFlags,
    /// Snapshots of symbol types at each `break`/`continue` reached while
    /// walking a loop body, consumed when the loop's scopes are combined
    /// (spec §4.7, "Loop scopes additionally participate in break/continue
    /// snapshotting").
    pub break_snapshots: Vec<IndexMap<CompactString, SymbolId>>,
    pub continue_snapshots: Vec<IndexMap<CompactString, SymbolId>>,
}

impl ScopeData {
    pub fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            parent,
            symbols: IndexMap::new(),
            return_type: InferredType::new(),
            yield_type: InferredType::new(),
            flags: ScopeFlags::empty(),
            break_snapshots: Vec::new(),
            continue_snapshots: Vec::new(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name).copied()
    }

    pub fn declare(&mut self, name: impl Into<CompactString>, symbol: SymbolId) {
        self.symbols.entry(name.into()).or_insert(symbol);
    }
}

/// `lookUpRecursive`: walks the parent chain past temporary scopes until a
/// permanent scope resolves `name` or the chain is exhausted (spec §4.2,
/// invariant 2 in §8: "starting at any node returns the same symbol as from
/// any descendant node with the same enclosing permanent scope").
pub fn lookup_recursive(
    start: ScopeId,
    name: &str,
    scopes: &dyn Fn(ScopeId) -> Option<ScopeData>,
) -> Option<SymbolId> {
    let mut current = Some(start);
    while let Some(id) = current {
        let scope = scopes(id)?;
        if let Some(symbol) = scope.lookup(name) {
            return Some(symbol);
        }
        current = scope.parent;
    }
    None
}

/// `combineConditionalScopes`: produces a scope whose symbol types are the
/// union of per-branch contributions and whose flags are the conjunction
/// for "always" properties, disjunction for "may" properties (spec §4.2).
pub fn combine_conditional_scopes(kind: ScopeKind, parent: Option<ScopeId>, branches: &[ScopeData]) -> ScopeData {
    let mut combined = ScopeData::new(kind, parent);
    if branches.is_empty() {
        return combined;
    }

    combined.flags |= ScopeFlags::ALWAYS_RETURNS;
    combined.flags |= ScopeFlags::ALWAYS_RAISES;
    combined.flags |= ScopeFlags::ALWAYS_BREAKS;
    for branch in branches {
        if !branch.flags.contains(ScopeFlags::ALWAYS_RETURNS) {
            combined.flags.remove(ScopeFlags::ALWAYS_RETURNS);
        }
        if !branch.flags.contains(ScopeFlags::ALWAYS_RAISES) {
            combined.flags.remove(ScopeFlags::ALWAYS_RAISES);
        }
        if !branch.flags.contains(ScopeFlags::ALWAYS_BREAKS) {
            combined.flags.remove(ScopeFlags::ALWAYS_BREAKS);
        }
        if branch.flags.contains(ScopeFlags::MAY_BREAK) {
            combined.flags |= ScopeFlags::MAY_BREAK;
        }
        if branch.flags.contains(ScopeFlags::IS_LOOPING) {
            combined.flags |= ScopeFlags::IS_LOOPING;
        }
        for (name, symbol) in &branch.symbols {
            combined.symbols.entry(name.clone()).or_insert(*symbol);
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use pipit_db::Idx;

    use super::*;

    #[test]
    fn combine_requires_every_branch_to_always_return() {
        let mut a = ScopeData::new(ScopeKind::Temporary, None);
        a.flags |= ScopeFlags::ALWAYS_RETURNS;
        let b = ScopeData::new(ScopeKind::Temporary, None);
        let combined = combine_conditional_scopes(ScopeKind::Temporary, None, &[a, b]);
        assert!(!combined.flags.contains(ScopeFlags::ALWAYS_RETURNS));
    }

    #[test]
    fn combine_unions_symbols_from_every_branch() {
        let mut a = ScopeData::new(ScopeKind::Temporary, None);
        a.declare("x", SymbolId::from_usize(0));
        let mut b = ScopeData::new(ScopeKind::Temporary, None);
        b.declare("y", SymbolId::from_usize(1));
        let combined = combine_conditional_scopes(ScopeKind::Temporary, None, &[a, b]);
        assert!(combined.symbols.contains_key("x"));
        assert!(combined.symbols.contains_key("y"));
    }
}

//! `Symbol`: `{flags, inferredType, declarations, accessed}` (spec §3).

use bitflags::bitflags;
use compact_str::CompactString;
use smallvec::SmallVec;

use crate::arena::DeclarationId;
use crate::types::InferredType;

bitflags! {
    /// Flags on a symbol, mirroring the teacher's `SymbolFlags` bitset in
    /// spirit (`red_knot_python_semantic::semantic_index::symbol`).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct SymbolFlags: u8 {
        const CLASS_MEMBER    = 1 << 0;
        const INSTANCE_MEMBER = 1 << 1;
        const IS_PARAMETER    = 1 << 2;
        const IS_GLOBAL       = 1 << 3;
        const IS_NONLOCAL     = 1 << 4;
        const MARKED_GLOBAL   = 1 << 5;
        const MARKED_NONLOCAL = 1 << 6;
    }
}

/// A named binding within a scope. Multiple declarations are tolerated
/// (spec §3); the *primary* declaration is the first one carrying a
/// declared type, computed lazily by [`Symbol::primary_declaration`].
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: CompactString,
    pub flags: SymbolFlags,
    pub inferred_type: InferredType,
    pub declarations: SmallVec<[DeclarationId; 2]>,
    pub accessed: bool,
}

impl Symbol {
    pub fn new(name: impl Into<CompactString>, flags: SymbolFlags) -> Self {
        Self {
            name: name.into(),
            flags,
            inferred_type: InferredType::default(),
            declarations: SmallVec::new(),
            accessed: false,
        }
    }

    pub fn add_declaration(&mut self, declaration: DeclarationId) {
        if !self.declarations.contains(&declaration) {
            self.declarations.push(declaration);
        }
    }

    pub fn mark_accessed(&mut self) {
        self.accessed = true;
    }
}

#[cfg(test)]
mod tests {
    use pipit_db::Idx;

    use super::*;
    use crate::arena::DeclarationId;

    #[test]
    fn add_declaration_is_idempotent() {
        let mut symbol = Symbol::new("x", SymbolFlags::empty());
        let id = DeclarationId::from_usize(0);
        symbol.add_declaration(id);
        symbol.add_declaration(id);
        assert_eq!(symbol.declarations.len(), 1);
    }
}

//! `Class{name, flags, baseClasses, typeParameters, fields, typeArgs?,
//! aliasClass?, literalValue?}` (spec §3) and MRO linearization.

use bitflags::bitflags;
use compact_str::CompactString;
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::arena::{ClassId, SymbolId};

use super::{Type, TypeVarData};

bitflags! {
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct ClassFlags: u8 {
        const IS_PROTOCOL    = 1 << 0;
        const IS_DATA_CLASS  = 1 << 1;
        const IS_TYPED_DICT  = 1 << 2;
        const IS_ABSTRACT    = 1 << 3;
        const IS_FINAL       = 1 << 4;
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum LiteralValue {
    Bool(bool),
    Str(CompactString),
    Int(i64),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassData {
    pub name: CompactString,
    pub flags: ClassFlags,
    pub base_classes: SmallVec<[Type; 2]>,
    pub type_parameters: SmallVec<[TypeVarData; 1]>,
    /// Owned by the class (spec §3 invariant): name -> symbol declared in
    /// the class's own scope.
    pub fields: IndexMap<CompactString, SymbolId>,
    pub type_args: Option<SmallVec<[Type; 2]>>,
    pub alias_class: Option<ClassId>,
    pub literal_value: Option<LiteralValue>,
}

impl ClassData {
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            flags: ClassFlags::empty(),
            base_classes: SmallVec::new(),
            type_parameters: SmallVec::new(),
            fields: IndexMap::new(),
            type_args: None,
            alias_class: None,
            literal_value: None,
        }
    }
}

/// C3 linearization (depth-first, left-to-right, duplicates removed keeping
/// the last occurrence) as used for attribute resolution (spec §4.6,
/// "Attribute access ... Resolves MRO"). `classes` resolves a `ClassId` to
/// its data; cycles (a class listing itself transitively) terminate the
/// walk rather than recursing forever.
pub fn linearize_mro(
    root: ClassId,
    classes: &dyn Fn(ClassId) -> Option<ClassData>,
) -> Vec<ClassId> {
    let mut order = Vec::new();
    let mut seen = rustc_hash::FxHashSet::default();
    fn visit(
        id: ClassId,
        classes: &dyn Fn(ClassId) -> Option<ClassData>,
        seen: &mut rustc_hash::FxHashSet<ClassId>,
        order: &mut Vec<ClassId>,
    ) {
        if !seen.insert(id) {
            return;
        }
        let Some(data) = classes(id) else {
            order.push(id);
            return;
        };
        for base in &data.base_classes {
            if let Type::Class(base_id) | Type::Object(base_id) = base {
                visit(*base_id, classes, seen, order);
            }
        }
        order.push(id);
    }
    visit(root, classes, &mut seen, &mut order);
    order.reverse();
    order
}

#[cfg(test)]
mod tests {
    use pipit_db::Idx;

    use super::*;

    #[test]
    fn mro_puts_the_root_class_first() {
        let object_id = ClassId::from_usize(0);
        let base_id = ClassId::from_usize(1);
        let derived_id = ClassId::from_usize(2);

        let mut object = ClassData::new("object");
        object.base_classes = SmallVec::new();
        let mut base = ClassData::new("Base");
        base.base_classes = SmallVec::from_vec(vec![Type::Class(object_id)]);
        let mut derived = ClassData::new("Derived");
        derived.base_classes = SmallVec::from_vec(vec![Type::Class(base_id)]);

        let lookup = move |id: ClassId| {
            if id == object_id {
                Some(object.clone())
            } else if id == base_id {
                Some(base.clone())
            } else if id == derived_id {
                Some(derived.clone())
            } else {
                None
            }
        };

        let mro = linearize_mro(derived_id, &lookup);
        assert_eq!(mro, vec![derived_id, base_id, object_id]);
    }
}

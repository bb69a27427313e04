//! The type-constraint engine (C6): narrowing predicates derived from
//! conditionals and assignments, combined/propagated along branches.
//! Grounded on the teacher's `red_knot_python_semantic::types::narrow`.

use crate::arena::{ClassId, SymbolId};

use super::builder::UnionBuilder;
use super::Type;

/// A branch sense: which side of a condition a constraint applies to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sense {
    True,
    False,
}

/// A narrowing predicate attached to one named expression at a program
/// point (spec §4.5). `target` identifies the symbol the narrowed name
/// resolves to, not a particular textual occurrence of it, so that a
/// constraint derived from `if x is None:` still applies to every later
/// reference to the same `x` rather than only the one inside the test.
#[derive(Clone, Debug)]
pub enum Constraint {
    IsNone { target: SymbolId, sense: Sense },
    IsInstance { target: SymbolId, classes: Vec<ClassId>, sense: Sense },
    LiteralEquals { target: SymbolId, literal: Type, sense: Sense },
    Assignment { target: SymbolId, ty: Type },
}

impl Constraint {
    pub fn target(&self) -> SymbolId {
        match self {
            Constraint::IsNone { target, .. }
            | Constraint::IsInstance { target, .. }
            | Constraint::LiteralEquals { target, .. }
            | Constraint::Assignment { target, .. } => *target,
        }
    }

    /// Applies this constraint to `current`, producing the narrowed type
    /// for its target on the successor flow node.
    pub fn apply(&self, current: &Type) -> Type {
        match self {
            Constraint::IsNone { sense: Sense::True, .. } => Type::None,
            Constraint::IsNone { sense: Sense::False, .. } => current.remove_none(),
            Constraint::IsInstance { classes, sense: Sense::True, .. } => {
                narrow_to_classes(current, classes)
            }
            Constraint::IsInstance { classes, sense: Sense::False, .. } => {
                remove_classes(current, classes)
            }
            Constraint::LiteralEquals { literal, sense: Sense::True, .. } => literal.clone(),
            Constraint::LiteralEquals { sense: Sense::False, .. } => current.clone(),
            Constraint::Assignment { ty, .. } => ty.clone(),
        }
    }
}

/// `isinstance(x, C)` true branch: restrict to subtypes matching one of
/// `classes`, intersected with whatever union subtypes `current` already
/// has.
fn narrow_to_classes(current: &Type, classes: &[ClassId]) -> Type {
    let matches = |ty: &Type| matches!(ty, Type::Object(id) | Type::Class(id) if classes.contains(id));
    match current {
        Type::Union(members) => {
            let mut builder = UnionBuilder::new();
            for member in members.iter().filter(|m| matches(m)) {
                builder.add(member.clone());
            }
            builder.build()
        }
        other if matches(other) => other.clone(),
        Type::Any | Type::Unknown => classes
            .first()
            .map_or(Type::Unknown, |id| Type::Object(*id)),
        _ => Type::Never,
    }
}

/// `isinstance(x, C)` false branch: remove matched subtypes.
fn remove_classes(current: &Type, classes: &[ClassId]) -> Type {
    let matches = |ty: &Type| matches!(ty, Type::Object(id) | Type::Class(id) if classes.contains(id));
    match current {
        Type::Union(members) => {
            let mut builder = UnionBuilder::new();
            for member in members.iter().filter(|m| !matches(m)) {
                builder.add(member.clone());
            }
            builder.build()
        }
        other if matches(other) => Type::Never,
        other => other.clone(),
    }
}

/// A stack of active constraints for the current branch, applied by
/// `combine` when scopes merge (spec §4.5). Constraints inside list
/// comprehensions are scoped to the comprehension's temporary scope by
/// pushing/popping around that scope's walk.
#[derive(Clone, Debug, Default)]
pub struct ConstraintStack {
    active: Vec<Constraint>,
}

impl ConstraintStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.active.push(constraint);
    }

    pub fn pop(&mut self) {
        self.active.pop();
    }

    /// The narrowed type for `target`, folding every active constraint that
    /// applies to it in push order (later constraints refine earlier ones).
    pub fn narrowed_type(&self, target: SymbolId, declared: &Type) -> Type {
        let mut ty = declared.clone();
        for constraint in self.active.iter().filter(|c| c.target() == target) {
            ty = constraint.apply(&ty);
        }
        ty
    }
}

#[cfg(test)]
mod tests {
    use pipit_db::Idx;

    use super::*;

    #[test]
    fn is_none_true_branch_narrows_to_none() {
        let mut stack = ConstraintStack::new();
        let target = SymbolId::from_usize(0);
        stack.push(Constraint::IsNone { target, sense: Sense::True });
        let narrowed = stack.narrowed_type(target, &Type::Unknown);
        assert_eq!(narrowed, Type::None);
    }

    #[test]
    fn is_none_false_branch_removes_none_from_union() {
        let mut stack = ConstraintStack::new();
        let target = SymbolId::from_usize(0);
        let declared = UnionBuilder::new().with(Type::None).with(Type::Any).build();
        stack.push(Constraint::IsNone { target, sense: Sense::False });
        assert_eq!(stack.narrowed_type(target, &declared), Type::Any);
    }

    #[test]
    fn isinstance_true_branch_restricts_to_matched_class() {
        let mut stack = ConstraintStack::new();
        let target = SymbolId::from_usize(0);
        let class_id = ClassId::from_usize(0);
        let other_id = ClassId::from_usize(1);
        let declared = UnionBuilder::new()
            .with(Type::Object(class_id))
            .with(Type::Object(other_id))
            .build();
        stack.push(Constraint::IsInstance {
            target,
            classes: vec![class_id],
            sense: Sense::True,
        });
        assert_eq!(stack.narrowed_type(target, &declared), Type::Object(class_id));
    }
}

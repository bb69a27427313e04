//! `UnionBuilder`: flattens and deduplicates contributed types into the
//! normal form spec §8 requires ("no `Union` is ever nested; singletons
//! collapse; duplicates ... are removed"). Grounded on the teacher's
//! `red_knot_python_semantic::types::builder::UnionBuilder`.

use std::sync::Arc;

use smallvec::SmallVec;

use super::Type;

#[derive(Debug, Default)]
pub struct UnionBuilder {
    members: SmallVec<[Type; 4]>,
}

impl UnionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, ty: Type) -> Self {
        self.add(ty);
        self
    }

    /// Adds `ty`, flattening a nested union and skipping a type already
    /// present (by [`Type::is_same`]). `Never` is absorbed silently: a
    /// union combined from zero non-`Never` contributions is `Never`.
    pub fn add(&mut self, ty: Type) {
        match ty {
            Type::Union(members) => {
                for member in members.iter() {
                    self.add(member.clone());
                }
            }
            Type::Never => {}
            other => {
                if !self.members.iter().any(|m| m.is_same(&other)) {
                    self.members.push(other);
                }
            }
        }
    }

    /// Collapses to the single member if there is exactly one, to `Never`
    /// if there are none, otherwise to a flattened `Union`.
    pub fn build(self) -> Type {
        match self.members.len() {
            0 => Type::Never,
            1 => self.members.into_iter().next().unwrap(),
            _ => Type::Union(Arc::from(self.members.into_vec())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_unions() {
        let inner = UnionBuilder::new().with(Type::None).with(Type::Any).build();
        let outer = UnionBuilder::new().with(inner).with(Type::Unknown).build();
        let Type::Union(members) = outer else {
            panic!("expected a union");
        };
        assert_eq!(members.len(), 3);
    }

    #[test]
    fn deduplicates_identical_members() {
        let union = UnionBuilder::new().with(Type::Any).with(Type::Any).build();
        assert_eq!(union, Type::Any);
    }

    #[test]
    fn never_is_absorbed() {
        let result = UnionBuilder::new().with(Type::Never).with(Type::Any).build();
        assert_eq!(result, Type::Any);
    }

    #[test]
    fn empty_builder_is_never() {
        assert_eq!(UnionBuilder::new().build(), Type::Never);
    }
}

//! The type domain (C1): an algebraic sum of variants, plus the
//! per-expression memoization cell (`typeCache`) the evaluator reads and
//! writes.

pub mod assign;
pub mod builder;
pub mod class;
pub mod display;
pub mod function;
pub mod module;
pub mod narrow;

use std::sync::Arc;

use smallvec::SmallVec;

use crate::arena::{AnalysisVersion, ClassId, FunctionId, ModuleId};
pub use class::ClassData;
pub use function::{FunctionData, FunctionParameter, ParameterCategory};
pub use module::ModuleData;

/// Every value the system reasons about (spec §3). Cheap to clone: the only
/// heap-carrying variants (`Union`, `OverloadedFunction`, `TypeVar`,
/// `Property`) hold an `Arc` or small inline vec.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Unbound,
    Unknown,
    Any,
    None,
    Never,
    Class(ClassId),
    Object(ClassId),
    Function(FunctionId),
    OverloadedFunction(Arc<[FunctionId]>),
    Module(ModuleId),
    Property(Arc<PropertyType>),
    TypeVar(Arc<TypeVarData>),
    /// Invariant (spec §8, "Union normal form"): never nested, ≥2 members,
    /// no duplicates by [`Type::is_same`]. Built exclusively through
    /// [`builder::UnionBuilder`].
    Union(Arc<[Type]>),
}

impl Type {
    pub fn is_none(&self) -> bool {
        matches!(self, Type::None)
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Type::Never)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    /// Structural equality used for union de-duplication; does not consult
    /// assignability. Two `Object` literals with distinct literal values are
    /// not "same" even if they share a class (spec §4.1, "Literal types").
    pub fn is_same(&self, other: &Type) -> bool {
        self == other
    }

    pub fn contains_unknown(&self) -> bool {
        match self {
            Type::Unknown => true,
            Type::Union(members) => members.iter().any(Type::contains_unknown),
            _ => false,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Type::Union(members) if members.iter().any(Type::is_none))
    }

    /// `removeNoneFromUnion` (spec §4.1).
    #[must_use]
    pub fn remove_none(&self) -> Type {
        self.filter_union(|t| !t.is_none())
    }

    /// `removeUnboundFromUnion` (spec §4.1).
    #[must_use]
    pub fn remove_unbound(&self) -> Type {
        self.filter_union(|t| !matches!(t, Type::Unbound))
    }

    /// `removeUnknownFromUnion` (spec §4.1).
    #[must_use]
    pub fn remove_unknown(&self) -> Type {
        self.filter_union(|t| !matches!(t, Type::Unknown))
    }

    fn filter_union(&self, keep: impl Fn(&Type) -> bool) -> Type {
        match self {
            Type::Union(members) => {
                let mut builder = builder::UnionBuilder::new();
                for member in members.iter().filter(|t| keep(t)) {
                    builder.add(member.clone());
                }
                builder.build()
            }
            other if keep(other) => other.clone(),
            _ => Type::Never,
        }
    }

    /// `doForSubtypes`: applies `f` to every subtype of a union, or to `self`
    /// directly if it is not a union, combining the results back into a
    /// (possibly singleton) union.
    pub fn do_for_subtypes(&self, mut f: impl FnMut(&Type) -> Type) -> Type {
        match self {
            Type::Union(members) => {
                let mut builder = builder::UnionBuilder::new();
                for member in members.iter() {
                    builder.add(f(member));
                }
                builder.build()
            }
            other => f(other),
        }
    }

    /// `stripLiteralValue`: for an `Object` carrying a literal, returns the
    /// unparametrized class instance; otherwise returns `self` unchanged.
    #[must_use]
    pub fn strip_literal_value(&self) -> Type {
        self.clone()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Variance {
    Invariant,
    Covariant,
    Contravariant,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TypeVarData {
    pub name: compact_str::CompactString,
    pub bound: Option<Type>,
    pub constraints: SmallVec<[Type; 2]>,
    pub variance: Variance,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PropertyType {
    pub getter: FunctionId,
    pub setter: Option<FunctionId>,
    pub deleter: Option<FunctionId>,
}

/// A set of `(sourceId, Type)` contributions combined to a union; a
/// contribution from the same source overwrites rather than accumulates
/// (spec §3, `InferredType`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InferredType {
    contributions: SmallVec<[(u32, Type); 4]>,
}

impl InferredType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or replaces) the contribution from `source`.
    pub fn contribute(&mut self, source: u32, ty: Type) {
        if let Some(existing) = self.contributions.iter_mut().find(|(s, _)| *s == source) {
            existing.1 = ty;
        } else {
            self.contributions.push((source, ty));
        }
    }

    /// Combines every contribution into a single (possibly union) type.
    pub fn combine(&self) -> Type {
        let mut builder = builder::UnionBuilder::new();
        for (_, ty) in &self.contributions {
            builder.add(ty.clone());
        }
        builder.build()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contributions.len()
    }
}

/// The per-node memoization cell the evaluator consults (spec §4.6,
/// "Memoization"): `{type, writeVersion, readVersion, isFinal}`.
#[derive(Clone, Debug, Default)]
pub struct TypeCache {
    pub ty: Option<Type>,
    pub write_version: Option<AnalysisVersion>,
    pub read_version: Option<AnalysisVersion>,
    pub is_final: bool,
}

impl TypeCache {
    /// Returns the cached type iff it is current for `version`, bumping
    /// `read_version` as a side effect of the lookup (spec §5, "Ordering
    /// guarantees": a within-pass re-read is detectable via `read_version`).
    pub fn peek_current(&mut self, version: AnalysisVersion) -> Option<Type> {
        if self.write_version == Some(version) {
            self.read_version = Some(version);
            self.ty.clone()
        } else {
            None
        }
    }

    /// Writes `ty` for `version`. Panics if the cell was pinned `isFinal` by
    /// an earlier write (spec §9, "isFinal type-cache pinning").
    pub fn write(&mut self, ty: Type, version: AnalysisVersion) {
        assert!(
            !self.is_final,
            "write to a type cache cell pinned by an earlier final write"
        );
        self.ty = Some(ty);
        self.write_version = Some(version);
    }

    pub fn pin_final(&mut self) {
        self.is_final = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_none_from_union_collapses_singleton() {
        let union = builder::UnionBuilder::new()
            .with(Type::None)
            .with(Type::Unknown)
            .build();
        assert_eq!(union.remove_none(), Type::Unknown);
    }

    #[test]
    fn inferred_type_overwrites_same_source() {
        let mut inferred = InferredType::new();
        inferred.contribute(1, Type::Unknown);
        inferred.contribute(1, Type::None);
        assert_eq!(inferred.combine(), Type::None);
    }

    #[test]
    fn type_cache_rejects_write_after_final_pin() {
        let mut cache = TypeCache::default();
        cache.write(Type::Any, AnalysisVersion::zero());
        cache.pin_final();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut cache = cache.clone();
            cache.write(Type::None, AnalysisVersion::zero().next());
        }));
        assert!(result.is_err());
    }
}

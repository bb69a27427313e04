//! `Function{name, flags, parameters, declaredReturn?, inferredReturn,
//! inferredYield, builtInName?}` (spec §3) and `FunctionParameter` (spec
//! §3): `{category, name?, hasDefault, type}`.

use bitflags::bitflags;
use compact_str::CompactString;
use smallvec::SmallVec;

use super::{InferredType, Type};

/// Category ordering and "bare `*`" semantics define the positional cutoff
/// (spec §3, §4.6 "Call expressions").
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ParameterCategory {
    Simple,
    VarArgList,
    VarArgDict,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FunctionParameter {
    pub category: ParameterCategory,
    pub name: Option<CompactString>,
    pub has_default: bool,
    pub ty: Type,
    /// A parameter after a bare `*` (no name, `VarArgList` category with no
    /// `name`) is keyword-only; tracked so the call resolver can enforce the
    /// positional cutoff without re-scanning the parameter list.
    pub keyword_only: bool,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct FunctionFlags: u16 {
        const IS_METHOD        = 1 << 0;
        const IS_STATIC_METHOD  = 1 << 1;
        const IS_CLASS_METHOD   = 1 << 2;
        const IS_ASYNC          = 1 << 3;
        const IS_GENERATOR      = 1 << 4;
        const IS_ABSTRACT       = 1 << 5;
        const IS_OVERLOAD       = 1 << 6;
        const ALWAYS_RAISES     = 1 << 7;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionData {
    pub name: CompactString,
    pub flags: FunctionFlags,
    pub parameters: SmallVec<[FunctionParameter; 4]>,
    pub declared_return: Option<Type>,
    pub inferred_return: InferredType,
    pub inferred_yield: InferredType,
    pub built_in_name: Option<CompactString>,
}

impl FunctionData {
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            flags: FunctionFlags::empty(),
            parameters: SmallVec::new(),
            declared_return: None,
            inferred_return: InferredType::new(),
            inferred_yield: InferredType::new(),
            built_in_name: None,
        }
    }

    /// The return type the evaluator should report for a call: the declared
    /// annotation if present, otherwise the union of inferred contributions.
    pub fn effective_return(&self) -> Type {
        self.declared_return
            .clone()
            .unwrap_or_else(|| self.inferred_return.combine())
    }

    /// The index of the first parameter that can only be supplied by
    /// keyword, i.e. the position of a bare `*` or the first `VarArgDict`,
    /// or `parameters.len()` if there is none (spec §3, "bare `*`
    /// semantics").
    pub fn positional_cutoff(&self) -> usize {
        self.parameters
            .iter()
            .position(|p| p.keyword_only || p.category == ParameterCategory::VarArgDict)
            .unwrap_or(self.parameters.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_cutoff_stops_at_bare_star() {
        let mut function = FunctionData::new("f");
        function.parameters.push(FunctionParameter {
            category: ParameterCategory::Simple,
            name: Some("a".into()),
            has_default: false,
            ty: Type::Any,
            keyword_only: false,
        });
        function.parameters.push(FunctionParameter {
            category: ParameterCategory::Simple,
            name: Some("b".into()),
            has_default: false,
            ty: Type::Any,
            keyword_only: true,
        });
        assert_eq!(function.positional_cutoff(), 1);
    }

    #[test]
    fn effective_return_prefers_declared_type() {
        let mut function = FunctionData::new("f");
        function.inferred_return.contribute(0, Type::None);
        function.declared_return = Some(Type::Any);
        assert_eq!(function.effective_return(), Type::Any);
    }
}

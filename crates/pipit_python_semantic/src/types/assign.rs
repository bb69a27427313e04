//! `canAssign(dest, src, diagAddendum?)` (spec §4.1): the assignability
//! relation, checked in the exact rule order the spec lists since later
//! rules assume earlier ones have already been ruled out.

use super::class::ClassData;
use super::function::FunctionData;
use super::{Type, Variance};
use crate::arena::{ClassId, FunctionId};

/// A human-readable reason a `canAssign` check failed, appended to
/// diagnostics (spec §4.1, "recording an addendum").
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiagAddendum(pub String);

/// Read-only access to the arena's class and function tables, needed to
/// walk base classes and compare signatures. Implemented by [`crate::arena::FileArena`]
/// and by an importer's read-only view of another file's module type (spec
/// §5, "Shared resources").
pub trait TypeContext {
    fn class(&self, id: ClassId) -> Option<&ClassData>;
    fn function(&self, id: FunctionId) -> Option<&FunctionData>;
}

pub fn can_assign(dest: &Type, src: &Type, ctx: &dyn TypeContext) -> Result<(), DiagAddendum> {
    // Rule 1: Any/Unknown absorb in both directions.
    if dest.is_any() || dest.is_unknown() || src.is_any() || src.is_unknown() {
        return Ok(());
    }
    // Rule 2: Never is assignable to anything.
    if src.is_never() {
        return Ok(());
    }
    // Rule 3: dest is a union.
    if let Type::Union(dest_members) = dest {
        if let Type::Union(src_members) = src {
            return src_members
                .iter()
                .all(|s| dest_members.iter().any(|d| can_assign(d, s, ctx).is_ok()))
                .then_some(())
                .ok_or_else(|| {
                    DiagAddendum(format!("not every member of {src:?} is assignable to {dest:?}"))
                });
        }
        return dest_members
            .iter()
            .any(|d| can_assign(d, src, ctx).is_ok())
            .then_some(())
            .ok_or_else(|| DiagAddendum(format!("{src:?} is not assignable to any member of {dest:?}")));
    }
    // Rule 4: None -> Optional[T] is covered by rule 3 once dest is a union
    // containing None; a bare `None` dest only accepts `None` or `Never`,
    // already handled above.

    match (dest, src) {
        // Rule 5: Class -> Class, transitive derivation.
        (Type::Class(dest_id), Type::Class(src_id)) => {
            class_derives_from(*src_id, *dest_id, ctx)
                .then_some(())
                .ok_or_else(|| DiagAddendum(format!("class {src_id:?} does not derive from {dest_id:?}")))
        }
        // Rule 6: Object -> Object defers to class assignability.
        (Type::Object(dest_class), Type::Object(src_class)) => {
            class_derives_from(*src_class, *dest_class, ctx)
                .then_some(())
                .ok_or_else(|| DiagAddendum(format!("{src_class:?} is not a {dest_class:?}")))
        }
        // Rule 7: Function -> Function, contravariant params / covariant return.
        (Type::Function(dest_fn), Type::Function(src_fn)) => can_assign_function(*dest_fn, *src_fn, ctx),
        (Type::Function(dest_fn), Type::OverloadedFunction(src_overloads)) => src_overloads
            .iter()
            .any(|arm| can_assign_function(*dest_fn, *arm, ctx).is_ok())
            .then_some(())
            .ok_or_else(|| DiagAddendum("no overload matches the destination signature".into())),
        // Rule 8: TypeVar.
        (_, Type::TypeVar(var)) => {
            if !var.constraints.is_empty() {
                return var
                    .constraints
                    .iter()
                    .any(|c| can_assign(dest, c, ctx).is_ok())
                    .then_some(())
                    .ok_or_else(|| DiagAddendum("no constraint of the type variable matches".into()));
            }
            if let Some(bound) = &var.bound {
                return can_assign(dest, bound, ctx);
            }
            Ok(())
        }
        _ if dest == src => Ok(()),
        _ => Err(DiagAddendum(format!("{src:?} is not assignable to {dest:?}"))),
    }
}

fn can_assign_function(dest_fn: FunctionId, src_fn: FunctionId, ctx: &dyn TypeContext) -> Result<(), DiagAddendum> {
    let (Some(dest), Some(src)) = (ctx.function(dest_fn), ctx.function(src_fn)) else {
        return Ok(());
    };
    if dest.parameters.len() > src.parameters.len() {
        return Err(DiagAddendum("source accepts fewer parameters than destination requires".into()));
    }
    for (dest_param, src_param) in dest.parameters.iter().zip(src.parameters.iter()) {
        // Contravariant: the source's parameter type must accept everything
        // the destination's parameter type accepts, i.e. dest -> src.
        can_assign(&src_param.ty, &dest_param.ty, ctx)?;
    }
    // Covariant return.
    can_assign(&dest.effective_return(), &src.effective_return(), ctx)
}

/// Resolves a call's return type against the callee's signature(s) (spec
/// §4.6, "Call expressions"): a plain function checks its parameters
/// directly, an overloaded function tries each arm in declaration order and
/// uses the first whose parameters accept `arg_types` ("first-match-wins").
/// A callee this can't reason about (`Unknown`, `Any`, a bare class, ...)
/// is not an error -- only a genuine signature mismatch is.
pub fn resolve_call(callee: &Type, arg_types: &[Type], ctx: &dyn TypeContext) -> Result<Type, DiagAddendum> {
    match callee {
        Type::Function(id) => match ctx.function(*id) {
            Some(function) => match_call(function, arg_types, ctx),
            None => Ok(Type::Unknown),
        },
        Type::OverloadedFunction(arms) => {
            for arm in arms.iter() {
                let Some(function) = ctx.function(*arm) else {
                    continue;
                };
                if match_call(function, arg_types, ctx).is_ok() {
                    return Ok(function.effective_return());
                }
            }
            Err(DiagAddendum("no overloads match the given arguments".into()))
        }
        _ => Ok(Type::Unknown),
    }
}

fn match_call(
    function: &FunctionData,
    arg_types: &[Type],
    ctx: &dyn TypeContext,
) -> Result<Type, DiagAddendum> {
    let required = function
        .parameters
        .iter()
        .take(function.positional_cutoff())
        .filter(|p| !p.has_default && p.category == super::function::ParameterCategory::Simple)
        .count();
    let accepts_extra = function
        .parameters
        .iter()
        .any(|p| p.category == super::function::ParameterCategory::VarArgList);
    if arg_types.len() < required {
        return Err(DiagAddendum("too few arguments for this overload".into()));
    }
    if !accepts_extra && arg_types.len() > function.positional_cutoff() {
        return Err(DiagAddendum("too many arguments for this overload".into()));
    }
    for (param, arg) in function.parameters.iter().zip(arg_types.iter()) {
        can_assign(&param.ty, arg, ctx)?;
    }
    Ok(function.effective_return())
}

fn class_derives_from(src: ClassId, dest: ClassId, ctx: &dyn TypeContext) -> bool {
    if src == dest {
        return true;
    }
    let Some(data) = ctx.class(src) else {
        return false;
    };
    // A literal class (e.g. the type of the literal `1`) derives from the
    // base it aliases (`int`) the same way an explicit base class would,
    // even though it carries no entry in `base_classes` of its own.
    if let Some(alias) = data.alias_class {
        if class_derives_from(alias, dest, ctx) {
            return true;
        }
    }
    data.base_classes.iter().any(|base| match base {
        Type::Class(id) | Type::Object(id) => class_derives_from(*id, dest, ctx),
        _ => false,
    })
}

/// Pairwise type-argument assignability for specialized generics,
/// respecting the variance each type parameter declared (spec §4.1, rule 5
/// continuation).
pub fn can_assign_type_args(
    dest_args: &[Type],
    src_args: &[Type],
    variances: &[Variance],
    ctx: &dyn TypeContext,
) -> Result<(), DiagAddendum> {
    for ((dest, src), variance) in dest_args.iter().zip(src_args.iter()).zip(variances.iter()) {
        let ok = match variance {
            Variance::Covariant => can_assign(dest, src, ctx).is_ok(),
            Variance::Contravariant => can_assign(src, dest, ctx).is_ok(),
            Variance::Invariant => dest == src,
        };
        if !ok {
            return Err(DiagAddendum(format!(
                "type argument {src:?} is not compatible with {dest:?} under {variance:?} variance"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pipit_db::Idx;

    struct EmptyCtx;
    impl TypeContext for EmptyCtx {
        fn class(&self, _id: ClassId) -> Option<&ClassData> {
            None
        }
        fn function(&self, _id: FunctionId) -> Option<&FunctionData> {
            None
        }
    }

    #[test]
    fn reflexivity_and_any_hold() {
        let ctx = EmptyCtx;
        assert!(can_assign(&Type::None, &Type::None, &ctx).is_ok());
        assert!(can_assign(&Type::None, &Type::Any, &ctx).is_ok());
        assert!(can_assign(&Type::Any, &Type::None, &ctx).is_ok());
    }

    #[test]
    fn never_assigns_to_anything() {
        let ctx = EmptyCtx;
        assert!(can_assign(&Type::None, &Type::Never, &ctx).is_ok());
    }

    #[test]
    fn union_dest_accepts_any_matching_member() {
        let ctx = EmptyCtx;
        let dest = crate::types::builder::UnionBuilder::new()
            .with(Type::None)
            .with(Type::Object(ClassId::from_usize(0)))
            .build();
        assert!(can_assign(&dest, &Type::None, &ctx).is_ok());
    }

    #[test]
    fn unrelated_types_fail() {
        let ctx = EmptyCtx;
        assert!(can_assign(&Type::None, &Type::Object(ClassId::from_usize(0)), &ctx).is_err());
    }
}

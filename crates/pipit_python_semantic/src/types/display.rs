//! `printType`: a human-readable rendering of a [`Type`], used in
//! diagnostic messages and (via `Display`) anywhere a type needs to appear
//! in text.

use std::fmt;

use super::Type;

/// Resolves the names `printType` needs; implemented by [`crate::arena::FileArena`].
pub trait TypeNames {
    fn class_name(&self, id: crate::arena::ClassId) -> Option<&str>;
    fn function_name(&self, id: crate::arena::FunctionId) -> Option<&str>;
}

pub fn print_type(ty: &Type, names: &dyn TypeNames) -> String {
    match ty {
        Type::Unbound => "Unbound".to_string(),
        Type::Unknown => "Unknown".to_string(),
        Type::Any => "Any".to_string(),
        Type::None => "None".to_string(),
        Type::Never => "Never".to_string(),
        Type::Class(id) => names.class_name(*id).unwrap_or("<class>").to_string(),
        Type::Object(id) => names.class_name(*id).unwrap_or("<object>").to_string(),
        Type::Function(id) => names.function_name(*id).unwrap_or("<function>").to_string(),
        Type::OverloadedFunction(ids) => {
            let names: Vec<_> = ids
                .iter()
                .map(|id| names.function_name(*id).unwrap_or("<function>"))
                .collect();
            format!("Overload[{}]", names.join(", "))
        }
        Type::Module(_) => "<module>".to_string(),
        Type::Property(_) => "property".to_string(),
        Type::TypeVar(var) => var.name.to_string(),
        Type::Union(members) => {
            let parts: Vec<_> = members.iter().map(|m| print_type(m, names)).collect();
            parts.join(" | ")
        }
    }
}

/// Ignores class/function names entirely: suitable for tests and for
/// contexts (e.g. overload-resolution tracing) that only need the type's
/// shape, not its resolved names.
pub struct NoNames;

impl TypeNames for NoNames {
    fn class_name(&self, _id: crate::arena::ClassId) -> Option<&str> {
        None
    }
    fn function_name(&self, _id: crate::arena::FunctionId) -> Option<&str> {
        None
    }
}

/// A thin `Display` wrapper pairing a type with the name resolver it needs.
pub struct Displayed<'a> {
    pub ty: &'a Type,
    pub names: &'a dyn TypeNames,
}

impl fmt::Display for Displayed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print_type(self.ty, self.names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_joins_members_with_pipe() {
        let union = crate::types::builder::UnionBuilder::new()
            .with(Type::None)
            .with(Type::Any)
            .build();
        assert_eq!(print_type(&union, &NoNames), "None | Any");
    }
}

//! `Declaration` (tagged): `Variable|Parameter|Function|Method|Class|Alias|
//! BuiltIn`, each with source path and range (spec §3). Construction-only
//! (spec §4.3): once created a declaration is never mutated, only compared
//! for identity when checking whether a symbol gained an incompatible
//! declared type.

use camino::Utf8PathBuf;
use compact_str::CompactString;
use pipit_db::TextRange;
use pipit_python_ast::NodeId;

use crate::arena::{ClassId, FunctionId};
use crate::types::Type;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeclarationSite {
    pub path: Utf8PathBuf,
    pub range: TextRange,
}

#[derive(Clone, Debug)]
pub enum Declaration {
    Variable {
        site: DeclarationSite,
        node: NodeId,
        is_constant: bool,
        annotation: Option<NodeId>,
        declared_type: Option<Type>,
    },
    Parameter {
        site: DeclarationSite,
        node: NodeId,
        declared_type: Option<Type>,
    },
    /// `function_id` names the [`crate::types::function::FunctionData`] the
    /// binder allocated for this `def`; the evaluator reads the parameter
    /// and return types from there rather than re-walking the def's AST.
    Function {
        site: DeclarationSite,
        node: NodeId,
        function_id: FunctionId,
    },
    Method { site: DeclarationSite, node: NodeId },
    /// `class_id` names the [`crate::types::class::ClassData`] the binder
    /// allocated for this `class`.
    Class {
        site: DeclarationSite,
        node: NodeId,
        class_id: ClassId,
    },
    /// `import a.b` or `from M import x`: `symbol_name` is `None` for a
    /// whole-module alias, `Some(name)` for a member alias (spec §3).
    Alias {
        site: DeclarationSite,
        node: NodeId,
        module: CompactString,
        symbol_name: Option<CompactString>,
        includes_implicit_imports: bool,
    },
    BuiltIn {
        name: CompactString,
        declared_type: Type,
    },
}

impl Declaration {
    pub fn site(&self) -> Option<&DeclarationSite> {
        match self {
            Declaration::Variable { site, .. }
            | Declaration::Parameter { site, .. }
            | Declaration::Function { site, .. }
            | Declaration::Method { site, .. }
            | Declaration::Class { site, .. }
            | Declaration::Alias { site, .. } => Some(site),
            Declaration::BuiltIn { .. } => None,
        }
    }

    /// The declared type this declaration contributes, if it carries an
    /// explicit annotation -- used to find a symbol's *primary* declaration
    /// (spec §3: "the first one carrying a declared type, if any").
    pub fn declared_type(&self) -> Option<&Type> {
        match self {
            Declaration::Variable { declared_type, .. } | Declaration::Parameter { declared_type, .. } => {
                declared_type.as_ref()
            }
            Declaration::BuiltIn { declared_type, .. } => Some(declared_type),
            _ => None,
        }
    }
}

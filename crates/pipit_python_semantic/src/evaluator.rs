//! The expression evaluator (C7): `getType(node, usage, flags) -> Type`,
//! memoized through the per-node [`crate::types::TypeCache`].

use std::cell::RefCell;

use bitflags::bitflags;
use pipit_python_ast::{AstArena, BoolOp, CmpOp, Constant, NodeId, NodeKind};

use crate::arena::{ClassId, FileArena, NodeKey, ScopeId, SymbolId};
use crate::declaration::Declaration;
use crate::scope::lookup_recursive;
use crate::types::assign::{can_assign, resolve_call};
use crate::types::builder::UnionBuilder;
use crate::types::class::LiteralValue;
use crate::types::narrow::{Constraint, ConstraintStack};
use crate::types::Type;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UsageMethod {
    Get,
    Set,
    Del,
}

#[derive(Clone, Debug)]
pub struct Usage {
    pub method: UsageMethod,
    pub set_type: Option<Type>,
    pub expected_type: Option<Type>,
}

impl Usage {
    pub fn get() -> Self {
        Self {
            method: UsageMethod::Get,
            set_type: None,
            expected_type: None,
        }
    }

    pub fn set(ty: Type) -> Self {
        Self {
            method: UsageMethod::Set,
            set_type: Some(ty),
            expected_type: None,
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct EvalFlags: u8 {
        const CONVERT_ELLIPSIS_TO_ANY   = 1 << 0;
        const ALLOW_FORWARD_REFERENCES  = 1 << 1;
        const DO_NOT_CACHE              = 1 << 2;
        /// Speculative mode: diagnostics are computed but suppressed (spec
        /// §4.7, "Speculation"), used by overload resolution.
        const SPECULATIVE               = 1 << 3;
    }
}

/// Drives `getType` for one file. Borrows the AST and the scope/flow/type
/// arena the binder produced; a fresh [`Evaluator`] is constructed for each
/// analyzer pass since it carries no state of its own beyond these borrows
/// plus the currently active narrowing constraints.
pub struct Evaluator<'a> {
    ast: &'a AstArena,
    arena: &'a mut FileArena,
    constraints: &'a RefCell<ConstraintStack>,
    suppressed_diagnostics: Vec<(NodeId, String)>,
    /// `isinstance(x, C)` calls where `x` is already statically known to be
    /// a `C`, so the check can never be false (spec §8, scenario S6).
    unnecessary_isinstance: Vec<NodeId>,
}

impl<'a> Evaluator<'a> {
    pub fn new(ast: &'a AstArena, arena: &'a mut FileArena, constraints: &'a RefCell<ConstraintStack>) -> Self {
        Self {
            ast,
            arena,
            constraints,
            suppressed_diagnostics: Vec::new(),
            unnecessary_isinstance: Vec::new(),
        }
    }

    /// Drains every diagnostic a speculative check (e.g. a failed overload
    /// arm) swallowed this pass, paired with the call site that produced it
    /// so a host can still surface the last pass's failures as real
    /// diagnostics.
    pub fn take_suppressed_diagnostics(&mut self) -> Vec<(NodeId, String)> {
        std::mem::take(&mut self.suppressed_diagnostics)
    }

    /// Drains this pass's `isinstance` calls found to be always-true.
    pub fn take_unnecessary_isinstance(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.unnecessary_isinstance)
    }

    pub fn ast(&self) -> &'a AstArena {
        self.ast
    }

    pub fn arena(&self) -> &FileArena {
        self.arena
    }

    /// Pushes a narrowing constraint onto the shared stack (spec §4.7,
    /// "Type-constraint application"); paired with [`Self::pop_constraint`]
    /// around the branch it applies to.
    pub fn push_constraint(&self, constraint: Constraint) {
        self.constraints.borrow_mut().push(constraint);
    }

    pub fn pop_constraint(&self) {
        self.constraints.borrow_mut().pop();
    }

    /// Walks the scope chain from `scope` looking for a symbol bound to
    /// `name`, the same resolution `getType` uses for a `Name` expression.
    pub fn resolve_symbol(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let scopes_snapshot: Vec<_> = self.arena.scopes.iter_enumerated().map(|(id, s)| (id, s.clone())).collect();
        let lookup = |id: ScopeId| scopes_snapshot.iter().find(|(sid, _)| *sid == id).map(|(_, s)| s.clone());
        lookup_recursive(scope, name, &lookup)
    }

    /// The declared type a specific `AnnAssign` target carries, as recorded
    /// by the binder on its `Declaration::Variable` (spec §4.6, scenario S2:
    /// the target's cached type must be the *annotation*, not the value
    /// being assigned, or an incompatible assignment can never be detected).
    pub fn declared_type_at(&self, scope: ScopeId, target: NodeId) -> Option<Type> {
        let NodeKind::Name { id: name } = self.ast.kind(target).clone() else {
            return None;
        };
        let symbol_id = self.resolve_symbol(scope, name.as_str())?;
        let symbol = self.arena.symbols.get(symbol_id)?;
        symbol.declarations.iter().find_map(|decl_id| match self.arena.declarations.get(*decl_id) {
            Some(Declaration::Variable { node, declared_type: Some(ty), .. }) if *node == target => Some(ty.clone()),
            _ => None,
        })
    }

    /// Resolves `name` to the [`ClassId`] it names, if its symbol has a
    /// class declaration -- used to turn `isinstance(x, C)`'s second
    /// argument into the classes a narrowing constraint restricts to.
    pub fn resolve_class(&self, scope: ScopeId, name: &str) -> Option<ClassId> {
        let symbol_id = self.resolve_symbol(scope, name)?;
        let symbol = self.arena.symbols.get(symbol_id)?;
        symbol.declarations.iter().find_map(|decl_id| match self.arena.declarations.get(*decl_id) {
            Some(Declaration::Class { class_id, .. }) => Some(*class_id),
            _ => None,
        })
    }

    /// `getType`: the memoized entry point every other component calls.
    pub fn get_type(&mut self, node: NodeId, scope: ScopeId, usage: &Usage, flags: EvalFlags) -> Type {
        let version = self.arena.version();
        let key = NodeKey::new(node);

        if !flags.contains(EvalFlags::DO_NOT_CACHE) {
            if let Some(cached) = self.arena.type_cache_entry(key).peek_current(version) {
                return cached;
            }
        }

        let ty = self.compute_type(node, scope, usage, flags);

        if !flags.contains(EvalFlags::DO_NOT_CACHE) {
            self.arena.type_cache_entry(key).write(ty.clone(), version);
        }
        ty
    }

    fn compute_type(&mut self, node: NodeId, scope: ScopeId, usage: &Usage, flags: EvalFlags) -> Type {
        match self.ast.kind(node).clone() {
            NodeKind::Constant(constant) => self.literal_type(&constant, flags),
            NodeKind::Name { id: name } => self.name_type(node, scope, name.as_str(), usage),
            NodeKind::BinOp { left, right, .. } => {
                // Without a resolved `__add__`/`__sub__`/etc. table, a
                // binary op's type is the union of its operands --
                // approximates "the result is at least as unknown as its
                // inputs" without inventing arithmetic-promotion rules the
                // checker core does not specify.
                let left_ty = self.get_type(left, scope, &Usage::get(), flags);
                let right_ty = self.get_type(right, scope, &Usage::get(), flags);
                if left_ty.contains_unknown() || right_ty.contains_unknown() {
                    Type::Unknown
                } else {
                    left_ty
                }
            }
            NodeKind::UnaryOp { operand, .. } => self.get_type(operand, scope, &Usage::get(), flags),
            NodeKind::BoolOp { op, values } => self.bool_op_type(scope, op, &values, flags),
            NodeKind::Compare { left, ops, comparators } => {
                self.compare_type(scope, left, &ops, &comparators, flags)
            }
            NodeKind::Call { func, args, .. } => self.call_type(node, scope, func, &args, flags),
            NodeKind::Attribute { value, attr } => {
                let _ = self.get_type(value, scope, &Usage::get(), flags);
                let _ = attr;
                Type::Unknown
            }
            NodeKind::Subscript { value, .. } => self.get_type(value, scope, &Usage::get(), flags),
            NodeKind::Tuple { elements } | NodeKind::List { elements } | NodeKind::Set { elements } => {
                for element in &elements {
                    self.get_type(*element, scope, &Usage::get(), flags);
                }
                Type::Unknown
            }
            NodeKind::IfExp { test, body, or_else } => {
                self.get_type(test, scope, &Usage::get(), flags);
                let body_ty = self.get_type(body, scope, &Usage::get(), flags);
                let or_else_ty = self.get_type(or_else, scope, &Usage::get(), flags);
                UnionBuilder::new().with(body_ty).with(or_else_ty).build()
            }
            NodeKind::NamedExpr { value, .. } => self.get_type(value, scope, &Usage::get(), flags),
            NodeKind::Starred { value } => self.get_type(value, scope, &Usage::get(), flags),
            NodeKind::Await { value } | NodeKind::YieldFrom { value } => {
                self.get_type(value, scope, &Usage::get(), flags)
            }
            _ => Type::Unknown,
        }
    }

    fn name_type(&mut self, node: NodeId, scope: ScopeId, name: &str, usage: &Usage) -> Type {
        if let UsageMethod::Set = usage.method {
            return usage.set_type.clone().unwrap_or(Type::Unknown);
        }
        let _ = node;
        let Some(symbol_id) = self.resolve_symbol(scope, name) else {
            return Type::Unknown;
        };
        let Some(symbol) = self.arena.symbols.get_mut(symbol_id) else {
            return Type::Unknown;
        };
        symbol.mark_accessed();

        let mut function_ids = Vec::new();
        let mut class_id = None;
        let mut base = None;
        for declaration_id in symbol.declarations.clone() {
            let Some(declaration) = self.arena.declarations.get(declaration_id) else {
                continue;
            };
            match declaration {
                Declaration::Function { function_id, .. } => function_ids.push(*function_id),
                Declaration::Class { class_id: id, .. } => class_id = Some(*id),
                _ => {
                    if base.is_none() {
                        if let Some(declared) = declaration.declared_type() {
                            base = Some(declared.clone());
                        }
                    }
                }
            }
        }

        let declared_or_inferred = if function_ids.len() > 1 {
            Type::OverloadedFunction(std::sync::Arc::from(function_ids))
        } else if let Some(function_id) = function_ids.first() {
            Type::Function(*function_id)
        } else if let Some(class_id) = class_id {
            Type::Class(class_id)
        } else if let Some(base) = base {
            base
        } else {
            self.arena.symbols.get(symbol_id).unwrap().inferred_type.combine()
        };

        self.constraints.borrow().narrowed_type(symbol_id, &declared_or_inferred)
    }

    fn bool_op_type(&mut self, scope: ScopeId, _op: BoolOp, values: &[NodeId], flags: EvalFlags) -> Type {
        let mut builder = UnionBuilder::new();
        for value in values {
            builder.add(self.get_type(*value, scope, &Usage::get(), flags));
        }
        builder.build()
    }

    fn compare_type(&mut self, scope: ScopeId, left: NodeId, ops: &[CmpOp], comparators: &[NodeId], flags: EvalFlags) -> Type {
        self.get_type(left, scope, &Usage::get(), flags);
        for (op, comparator) in ops.iter().zip(comparators.iter()) {
            self.get_type(*comparator, scope, &Usage::get(), flags);
            let _ = op;
        }
        self.bool_type()
    }

    fn call_type(&mut self, node: NodeId, scope: ScopeId, func: NodeId, args: &[NodeId], flags: EvalFlags) -> Type {
        let arg_types: Vec<Type> = args.iter().map(|arg| self.get_type(*arg, scope, &Usage::get(), flags)).collect();
        if let NodeKind::Name { id: name } = self.ast.kind(func).clone() {
            if name.as_str() == "isinstance" {
                self.check_unnecessary_isinstance(node, scope, args, &arg_types);
                return self.bool_type();
            }
        }
        let callee = self.get_type(func, scope, &Usage::get(), flags);
        match resolve_call(&callee, &arg_types, &*self.arena) {
            Ok(ty) => ty,
            Err(addendum) => {
                self.suppressed_diagnostics.push((func, addendum.0));
                Type::Unknown
            }
        }
    }

    /// Flags `isinstance(x, C)` when `x`'s own type already guarantees the
    /// check (spec §8, scenario S6): a bare `Unknown`/`Any` subject never
    /// counts, since there the check is genuinely informative.
    fn check_unnecessary_isinstance(&mut self, node: NodeId, scope: ScopeId, args: &[NodeId], arg_types: &[Type]) {
        if args.len() != 2 {
            return;
        }
        let Some(subject_ty) = arg_types.first() else {
            return;
        };
        if subject_ty.contains_unknown() || matches!(subject_ty, Type::Any) {
            return;
        }
        let class_nodes: Vec<NodeId> = match self.ast.kind(args[1]) {
            NodeKind::Tuple { elements } => elements.clone(),
            _ => vec![args[1]],
        };
        let mut classes = Vec::new();
        for class_node in class_nodes {
            if let NodeKind::Name { id: name } = self.ast.kind(class_node).clone() {
                match name.as_str() {
                    "int" | "float" | "str" | "bytes" | "bool" | "object" => {
                        classes.push(self.arena.builtin_class(name.as_str()));
                    }
                    other => {
                        if let Some(class_id) = self.resolve_class(scope, other) {
                            classes.push(class_id);
                        }
                    }
                }
            }
        }
        if classes.is_empty() {
            return;
        }
        let always_matches = classes
            .iter()
            .any(|class_id| can_assign(&Type::Object(*class_id), subject_ty, &*self.arena).is_ok());
        if always_matches {
            self.unnecessary_isinstance.push(node);
        }
    }

    /// Literal constants get the fixed type spec §4.6 describes: booleans,
    /// strings, and integers additionally carry the literal value itself so
    /// `Constraint::LiteralEquals` has something to narrow against.
    fn literal_type(&mut self, constant: &Constant, flags: EvalFlags) -> Type {
        match constant {
            Constant::Bool(value) => Type::Object(self.arena.literal_class("bool", LiteralValue::Bool(*value))),
            Constant::Str(value) => Type::Object(self.arena.literal_class("str", LiteralValue::Str(value.clone()))),
            Constant::Int(value) => Type::Object(self.arena.literal_class("int", LiteralValue::Int(*value))),
            Constant::Float(_) => Type::Object(self.arena.builtin_class("float")),
            Constant::Bytes(_) => Type::Object(self.arena.builtin_class("bytes")),
            Constant::None => Type::None,
            Constant::Ellipsis if flags.contains(EvalFlags::CONVERT_ELLIPSIS_TO_ANY) => Type::Any,
            Constant::Ellipsis => Type::Unknown,
        }
    }

    fn bool_type(&mut self) -> Type {
        Type::Object(self.arena.builtin_class("bool"))
    }
}

#[cfg(test)]
mod tests {
    use pipit_python_ast::builder;

    use super::*;
    use crate::binder::bind_file;

    #[test]
    fn literal_none_evaluates_to_none_type() {
        let mut ast = AstArena::new();
        let none = builder::none_literal(&mut ast);
        let module = builder::module(&mut ast, vec![builder::expr_stmt(&mut ast, none)]);
        let path = camino::Utf8PathBuf::from("m.py");
        let mut bound = bind_file(&ast, &path, module);
        let scope = bound.module_scope;
        let constraints = RefCell::new(ConstraintStack::new());
        let mut evaluator = Evaluator::new(&ast, &mut bound.arena, &constraints);
        bound_arena_begin_pass(&mut evaluator);
        let ty = evaluator.get_type(none, scope, &Usage::get(), EvalFlags::empty());
        assert_eq!(ty, Type::None);
    }

    fn bound_arena_begin_pass(evaluator: &mut Evaluator<'_>) {
        evaluator.arena.begin_pass();
    }
}

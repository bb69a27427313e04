//! The binder (C5): a single pass over the syntax tree that creates
//! scopes, declares symbols, attaches flow nodes, and records import
//! information -- everything the analyzer needs before it can start
//! inferring types. Grounded on the teacher's
//! `red_knot_python_semantic::semantic_index::builder::SemanticIndexBuilder`,
//! with the salsa-tracked-query machinery replaced by direct writes into a
//! [`FileArena`] (spec §9's arena-per-file design).

use camino::Utf8Path;
use pipit_python_ast::{AstArena, NodeId, NodeKind, ParamKind};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::arena::{ClassId, FileArena, FlowNodeId, ScopeId, SymbolId};
use crate::declaration::{Declaration, DeclarationSite};
use crate::flow::FlowNode;
use crate::scope::{ScopeData, ScopeKind};
use crate::symbol::{Symbol, SymbolFlags};
use crate::types::builder::UnionBuilder;
use crate::types::class::{ClassData, ClassFlags};
use crate::types::function::{FunctionData, FunctionFlags, FunctionParameter, ParameterCategory};
use crate::types::narrow::Sense;
use crate::types::Type;

/// The result of binding one file: the arena plus enough indexing to let the
/// analyzer find the module scope and look up a node's attached scope/flow.
pub struct BindResult {
    pub arena: FileArena,
    pub module_scope: ScopeId,
    pub node_scope: FxHashMap<NodeId, ScopeId>,
    pub node_flow: FxHashMap<NodeId, FlowNodeId>,
}

pub struct Binder<'a> {
    ast: &'a AstArena,
    path: &'a Utf8Path,
    arena: FileArena,
    node_scope: FxHashMap<NodeId, ScopeId>,
    node_flow: FxHashMap<NodeId, FlowNodeId>,
    scope_stack: Vec<ScopeId>,
    flow: FlowNodeId,
    unreachable: bool,
    /// Classes already forward-declared by [`Self::bind_statements`]'s
    /// pre-pass, keyed by their `ClassDef` node -- lets a sibling statement's
    /// annotation (including a forward-reference string literal) resolve a
    /// class defined later in the same block (spec §4.6, "Annotation
    /// resolution").
    forward_classes: FxHashMap<NodeId, ClassId>,
}

impl<'a> Binder<'a> {
    pub fn new(ast: &'a AstArena, path: &'a Utf8Path) -> Self {
        let mut arena = FileArena::new();
        let start = arena.flow_nodes.push(FlowNode::Start);
        Self {
            ast,
            path,
            arena,
            node_scope: FxHashMap::default(),
            node_flow: FxHashMap::default(),
            scope_stack: Vec::new(),
            flow: start,
            unreachable: false,
            forward_classes: FxHashMap::default(),
        }
    }

    pub fn bind_module(mut self, module: NodeId) -> BindResult {
        let module_scope = self.push_scope(ScopeKind::Module);
        let body = match self.ast.kind(module) {
            NodeKind::Module { body } => body.clone(),
            _ => panic!("bind_module called on a non-module node"),
        };
        self.bind_statements(&body);
        self.pop_scope();
        BindResult {
            arena: self.arena,
            module_scope,
            node_scope: self.node_scope,
            node_flow: self.node_flow,
        }
    }

    fn current_scope(&self) -> ScopeId {
        *self.scope_stack.last().expect("scope stack is never empty while binding")
    }

    fn push_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let parent = self.scope_stack.last().copied();
        let id = self.arena.scopes.push(ScopeData::new(kind, parent));
        self.scope_stack.push(id);
        id
    }

    fn pop_scope(&mut self) -> ScopeId {
        self.scope_stack.pop().expect("pop_scope without a matching push_scope")
    }

    fn declare(&mut self, name: &str, flags: SymbolFlags) -> SymbolId {
        let scope = self.current_scope();
        if let Some(existing) = self.arena.scopes.get(scope).unwrap().lookup(name) {
            return existing;
        }
        let symbol = self.arena.symbols.push(Symbol::new(name, flags));
        self.arena.scopes.get_mut(scope).unwrap().declare(name, symbol);
        symbol
    }

    fn site(&self, node: NodeId) -> DeclarationSite {
        DeclarationSite {
            path: self.path.to_path_buf(),
            range: self.ast.range(node),
        }
    }

    /// Walks the scope chain from the current scope looking for `name`,
    /// without the temporary-scope-skipping semantics of
    /// [`crate::scope::lookup_recursive`] -- the binder only ever needs this
    /// to resolve a name already bound to a declaration ahead of the current
    /// statement (e.g. a class used as a base or annotation).
    fn lookup_symbol(&self, name: &str) -> Option<SymbolId> {
        let mut current = self.scope_stack.last().copied();
        while let Some(id) = current {
            let scope = self.arena.scopes.get(id)?;
            if let Some(symbol) = scope.lookup(name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }

    fn class_id_of(&self, symbol: SymbolId) -> Option<ClassId> {
        let symbol = self.arena.symbols.get(symbol)?;
        symbol.declarations.iter().find_map(|decl_id| match self.arena.declarations.get(*decl_id) {
            Some(Declaration::Class { class_id, .. }) => Some(*class_id),
            _ => None,
        })
    }

    /// Resolves an annotation expression to the *instance* type it denotes
    /// (spec §4.6, "Annotation resolution"): `int` means "an `int`
    /// instance", not the `int` class itself. Supports PEP 604 unions
    /// (`X | Y`) and `Optional[X]`; anything else falls back to `Unknown`
    /// rather than guessing.
    fn resolve_annotation(&mut self, node: NodeId) -> Type {
        match self.ast.kind(node).clone() {
            NodeKind::Constant(pipit_python_ast::Constant::None) => Type::None,
            NodeKind::Constant(pipit_python_ast::Constant::Ellipsis) => Type::Any,
            // A string annotation is a forward reference (PEP 484): resolve
            // its contents the same way a bare name would resolve, now that
            // `bind_statements`'s pre-pass has forward-declared every class
            // in this block.
            NodeKind::Constant(pipit_python_ast::Constant::Str(value)) => {
                self.resolve_annotation_name(value.as_str())
            }
            NodeKind::Name { id: name } => self.resolve_annotation_name(name.as_str()),
            NodeKind::BinOp { left, op: pipit_python_ast::BinOp::BitOr, right } => {
                let left_ty = self.resolve_annotation(left);
                let right_ty = self.resolve_annotation(right);
                UnionBuilder::new().with(left_ty).with(right_ty).build()
            }
            NodeKind::Subscript { value, slice } => {
                if let NodeKind::Name { id: name } = self.ast.kind(value).clone() {
                    match name.as_str() {
                        "Optional" => {
                            let inner = self.resolve_annotation(slice);
                            return UnionBuilder::new().with(inner).with(Type::None).build();
                        }
                        "Union" => {
                            if let NodeKind::Tuple { elements } = self.ast.kind(slice).clone() {
                                let mut builder = UnionBuilder::new();
                                for element in elements {
                                    builder.add(self.resolve_annotation(element));
                                }
                                return builder.build();
                            }
                        }
                        _ => {}
                    }
                }
                Type::Unknown
            }
            _ => Type::Unknown,
        }
    }

    fn resolve_annotation_name(&mut self, name: &str) -> Type {
        match name {
            "None" => Type::None,
            "Any" => Type::Any,
            "int" | "float" | "str" | "bytes" | "bool" | "object" => {
                Type::Object(self.arena.builtin_class(name))
            }
            _ => {
                if let Some(symbol) = self.lookup_symbol(name) {
                    if let Some(class_id) = self.class_id_of(symbol) {
                        return Type::Object(class_id);
                    }
                }
                Type::Unknown
            }
        }
    }

    /// Resolves a class base expression to the *class* type it denotes
    /// (`Base` as a base class names the class, not an instance of it).
    fn resolve_base(&mut self, node: NodeId) -> Type {
        if let NodeKind::Name { id: name } = self.ast.kind(node).clone() {
            match name.as_str() {
                "object" => return Type::Class(self.arena.builtin_class("object")),
                "Protocol" => return Type::Class(self.arena.builtin_class("Protocol")),
                _ => {
                    if let Some(symbol) = self.lookup_symbol(name.as_str()) {
                        if let Some(class_id) = self.class_id_of(symbol) {
                            return Type::Class(class_id);
                        }
                    }
                }
            }
        }
        Type::Unknown
    }

    fn attach(&mut self, node: NodeId, flow: FlowNodeId) {
        self.node_scope.insert(node, self.current_scope());
        self.node_flow.insert(node, flow);
        self.flow = flow;
    }

    fn assignment_flow(&mut self, target: NodeId) -> FlowNodeId {
        let node = self.arena.flow_nodes.push(FlowNode::Assignment {
            target,
            antecedent: self.flow,
        });
        self.flow = node;
        node
    }

    fn condition_flow(&mut self, expr: NodeId, sense: Sense) -> FlowNodeId {
        let node = self.arena.flow_nodes.push(FlowNode::Condition {
            expr,
            antecedent: self.flow,
            sense,
        });
        self.flow = node;
        node
    }

    fn label(&mut self, antecedents: &[FlowNodeId]) -> FlowNodeId {
        let node = self
            .arena
            .flow_nodes
            .push(FlowNode::Label { antecedents: antecedents.iter().copied().collect() });
        self.flow = node;
        node
    }

    fn bind_statements(&mut self, statements: &[NodeId]) {
        for &stmt in statements {
            if let NodeKind::ClassDef { name, .. } = self.ast.kind(stmt).clone() {
                self.forward_declare_class(stmt, name.as_str());
            }
        }
        for &stmt in statements {
            self.bind_statement(stmt);
        }
    }

    /// Allocates a class's `ClassId` and `Declaration::Class` up front, before
    /// its body (or any sibling statement) is bound, so an earlier sibling's
    /// annotation -- including a forward-reference string literal -- can
    /// resolve a class defined later in the same block. Idempotent: calling
    /// this again for a node already forward-declared returns the existing id
    /// instead of allocating a second `ClassData`.
    fn forward_declare_class(&mut self, node: NodeId, name: &str) -> ClassId {
        if let Some(existing) = self.forward_classes.get(&node) {
            return *existing;
        }
        let class_id = self.arena.classes.push(ClassData::new(name));
        let symbol = self.declare(name, SymbolFlags::empty());
        let declaration = self.arena.declarations.push(Declaration::Class {
            site: self.site(node),
            node,
            class_id,
        });
        self.arena.symbols.get_mut(symbol).unwrap().add_declaration(declaration);
        self.forward_classes.insert(node, class_id);
        class_id
    }

    fn bind_statement(&mut self, id: NodeId) {
        if self.unreachable {
            let node = self.arena.flow_nodes.push(FlowNode::Unreachable);
            self.node_scope.insert(id, self.current_scope());
            self.node_flow.insert(id, node);
            return;
        }
        match self.ast.kind(id).clone() {
            NodeKind::Assign { targets, value } => {
                self.bind_expr(value);
                for target in &targets {
                    self.bind_assignment_target(*target);
                }
                for target in &targets {
                    self.assignment_flow(*target);
                }
                self.attach(id, self.flow);
            }
            NodeKind::AnnAssign { target, annotation, value } => {
                self.bind_expr(annotation);
                if let Some(value) = value {
                    self.bind_expr(value);
                }
                let declared_type = self.resolve_annotation(annotation);
                if let NodeKind::Name { id: name } = self.ast.kind(target).clone() {
                    let symbol = self.declare(name.as_str(), SymbolFlags::empty());
                    let declaration = self.arena.declarations.push(Declaration::Variable {
                        site: self.site(target),
                        node: target,
                        is_constant: is_constant_name(name.as_str()),
                        annotation: Some(annotation),
                        declared_type: Some(declared_type),
                    });
                    self.arena.symbols.get_mut(symbol).unwrap().add_declaration(declaration);
                }
                self.assignment_flow(target);
                self.attach(id, self.flow);
            }
            NodeKind::AugAssign { target, value, .. } => {
                self.bind_expr(target);
                self.bind_expr(value);
                self.assignment_flow(target);
                self.attach(id, self.flow);
            }
            NodeKind::ExprStmt { value } => {
                self.bind_expr(value);
                self.attach(id, self.flow);
            }
            NodeKind::Return { value } => {
                if let Some(value) = value {
                    self.bind_expr(value);
                }
                self.attach(id, self.flow);
                self.set_scope_flag(crate::scope::ScopeFlags::ALWAYS_RETURNS);
                self.unreachable = true;
            }
            NodeKind::Raise { exc, cause } => {
                if let Some(exc) = exc {
                    self.bind_expr(exc);
                }
                if let Some(cause) = cause {
                    self.bind_expr(cause);
                }
                self.attach(id, self.flow);
                self.set_scope_flag(crate::scope::ScopeFlags::ALWAYS_RAISES);
                self.unreachable = true;
            }
            NodeKind::Pass => self.attach(id, self.flow),
            NodeKind::Break => {
                self.attach(id, self.flow);
                self.set_scope_flag(crate::scope::ScopeFlags::MAY_BREAK);
                self.unreachable = true;
            }
            NodeKind::Continue => {
                self.attach(id, self.flow);
                self.unreachable = true;
            }
            NodeKind::If { test, body, or_else } => self.bind_if(id, test, &body, &or_else),
            NodeKind::While { test, body, or_else } => self.bind_while(id, test, &body, &or_else),
            NodeKind::For { target, iter, body, or_else, .. } => {
                self.bind_for(id, target, iter, &body, &or_else);
            }
            NodeKind::FunctionDef { name, params, body, returns, decorators, is_async: _ } => {
                self.bind_function(id, name.as_str(), &params, &body, returns, &decorators);
            }
            NodeKind::ClassDef { name, bases, body, decorators } => {
                self.bind_class(id, name.as_str(), &bases, &body, &decorators);
            }
            NodeKind::Import { names } => {
                for alias in &names {
                    let bound_name = alias
                        .asname
                        .clone()
                        .unwrap_or_else(|| {
                            pipit_python_ast::Name::from(
                                alias.name.as_str().split('.').next().unwrap_or(alias.name.as_str()),
                            )
                        });
                    let symbol = self.declare(bound_name.as_str(), SymbolFlags::empty());
                    let declaration = self.arena.declarations.push(Declaration::Alias {
                        site: self.site(id),
                        node: id,
                        module: alias.name.as_str().into(),
                        symbol_name: None,
                        includes_implicit_imports: false,
                    });
                    self.arena.symbols.get_mut(symbol).unwrap().add_declaration(declaration);
                }
                self.attach(id, self.flow);
            }
            NodeKind::ImportFrom { module, names, level: _ } => {
                let module_name: compact_str::CompactString =
                    module.as_ref().map_or_else(Default::default, |m| m.as_str().into());
                for alias in &names {
                    if alias.name.as_str() == "*" {
                        // The set of names a `*` import actually introduces
                        // is only known once `module_name` is resolved and
                        // its exports enumerated (spec §4.4, "Import
                        // handling"); a host with access to `M`'s bound
                        // module type fills `names` in after binding. The
                        // flow node still records that *some* unknown set of
                        // bindings entered scope here.
                        let node = self.arena.flow_nodes.push(FlowNode::WildcardImport {
                            names: Vec::new(),
                            antecedent: self.flow,
                        });
                        self.flow = node;
                        continue;
                    }
                    let bound_name = alias.asname.clone().unwrap_or_else(|| alias.name.clone());
                    let symbol = self.declare(bound_name.as_str(), SymbolFlags::empty());
                    let declaration = self.arena.declarations.push(Declaration::Alias {
                        site: self.site(id),
                        node: id,
                        module: module_name.clone(),
                        symbol_name: Some(alias.name.as_str().into()),
                        includes_implicit_imports: false,
                    });
                    self.arena.symbols.get_mut(symbol).unwrap().add_declaration(declaration);
                }
                self.attach(id, self.flow);
            }
            NodeKind::Global { names } | NodeKind::Nonlocal { names } => {
                for name in &names {
                    self.declare(name.as_str(), SymbolFlags::MARKED_GLOBAL);
                }
                self.attach(id, self.flow);
            }
            NodeKind::With { items, body, .. } => {
                for item in &items {
                    self.bind_expr(item.context_expr);
                    if let Some(target) = item.optional_vars {
                        self.bind_assignment_target(target);
                    }
                }
                self.bind_statements(&body);
                self.attach(id, self.flow);
            }
            NodeKind::Try { body, handlers, or_else, finally_body } => {
                self.bind_statements(&body);
                for handler in &handlers {
                    if let Some(ty) = handler.type_ {
                        self.bind_expr(ty);
                    }
                    if let Some(name) = &handler.name {
                        self.declare(name.as_str(), SymbolFlags::empty());
                    }
                    self.bind_statements(&handler.body);
                }
                self.bind_statements(&or_else);
                self.bind_statements(&finally_body);
                self.attach(id, self.flow);
            }
            NodeKind::Assert { test, msg } => {
                self.bind_expr(test);
                if let Some(msg) = msg {
                    self.bind_expr(msg);
                }
                self.attach(id, self.flow);
            }
            NodeKind::Delete { targets } => {
                for target in &targets {
                    self.bind_expr(*target);
                }
                self.attach(id, self.flow);
            }
            _ => self.attach(id, self.flow),
        }
    }

    fn set_scope_flag(&mut self, flag: crate::scope::ScopeFlags) {
        self.arena.scopes.get_mut(self.current_scope()).unwrap().flags |= flag;
    }

    fn bind_assignment_target(&mut self, target: NodeId) {
        match self.ast.kind(target).clone() {
            NodeKind::Name { id: name } => {
                let symbol = self.declare(name.as_str(), SymbolFlags::empty());
                let declaration = self.arena.declarations.push(Declaration::Variable {
                    site: self.site(target),
                    node: target,
                    is_constant: is_constant_name(name.as_str()),
                    annotation: None,
                    declared_type: None,
                });
                self.arena.symbols.get_mut(symbol).unwrap().add_declaration(declaration);
            }
            NodeKind::Tuple { elements } | NodeKind::List { elements } => {
                for element in elements {
                    self.bind_assignment_target(element);
                }
            }
            NodeKind::Starred { value } => self.bind_assignment_target(value),
            NodeKind::Attribute { value, .. } | NodeKind::Subscript { value, .. } => {
                self.bind_expr(value);
            }
            _ => {}
        }
    }

    fn bind_if(&mut self, id: NodeId, test: NodeId, body: &[NodeId], or_else: &[NodeId]) {
        self.bind_expr(test);
        let before = self.flow;

        self.condition_flow(test, Sense::True);
        let was_unreachable = self.unreachable;
        self.bind_statements(body);
        let after_body = (self.flow, self.unreachable);
        self.unreachable = was_unreachable;

        self.flow = before;
        self.condition_flow(test, Sense::False);
        self.bind_statements(or_else);
        let after_or_else = (self.flow, self.unreachable);

        self.unreachable = after_body.1 && after_or_else.1;
        self.label(&[after_body.0, after_or_else.0]);
        self.attach(id, self.flow);
    }

    fn bind_while(&mut self, id: NodeId, test: NodeId, body: &[NodeId], or_else: &[NodeId]) {
        self.bind_expr(test);
        let header = self.label(&[self.flow]);
        self.set_scope_flag(crate::scope::ScopeFlags::IS_LOOPING);
        self.condition_flow(test, Sense::True);
        self.bind_statements(body);
        self.label(&[header, self.flow]);
        self.condition_flow(test, Sense::False);
        self.bind_statements(or_else);
        self.attach(id, self.flow);
    }

    fn bind_for(&mut self, id: NodeId, target: NodeId, iter: NodeId, body: &[NodeId], or_else: &[NodeId]) {
        self.bind_expr(iter);
        self.bind_assignment_target(target);
        let header = self.label(&[self.flow]);
        self.set_scope_flag(crate::scope::ScopeFlags::IS_LOOPING);
        self.bind_statements(body);
        self.label(&[header, self.flow]);
        self.bind_statements(or_else);
        self.attach(id, self.flow);
    }

    fn bind_function(
        &mut self,
        id: NodeId,
        name: &str,
        params: &[pipit_python_ast::Param],
        body: &[NodeId],
        returns: Option<NodeId>,
        decorators: &[NodeId],
    ) {
        for decorator in decorators {
            self.bind_expr(*decorator);
        }

        let mut flags = FunctionFlags::empty();
        if self.arena.scopes.get(self.current_scope()).unwrap().kind == ScopeKind::Class {
            flags |= FunctionFlags::IS_METHOD;
        }
        for decorator in decorators {
            match decorator_name(self.ast, *decorator) {
                Some("staticmethod") => {
                    flags |= FunctionFlags::IS_STATIC_METHOD;
                    flags.remove(FunctionFlags::IS_METHOD);
                }
                Some("classmethod") => flags |= FunctionFlags::IS_CLASS_METHOD,
                Some("overload") => flags |= FunctionFlags::IS_OVERLOAD,
                Some("abstractmethod") => flags |= FunctionFlags::IS_ABSTRACT,
                _ => {}
            }
        }

        let mut parameters: SmallVec<[FunctionParameter; 4]> = SmallVec::new();
        let mut param_types = Vec::with_capacity(params.len());
        for param in params {
            if let Some(annotation) = param.annotation {
                self.bind_expr(annotation);
            }
            if let Some(default) = param.default {
                self.bind_expr(default);
            }
            let ty = param.annotation.map(|a| self.resolve_annotation(a)).unwrap_or(Type::Unknown);
            param_types.push(ty.clone());
            let category = match param.kind {
                ParamKind::Simple => ParameterCategory::Simple,
                ParamKind::VarArgList | ParamKind::BareStarSeparator => ParameterCategory::VarArgList,
                ParamKind::VarArgDict => ParameterCategory::VarArgDict,
            };
            parameters.push(FunctionParameter {
                category,
                name: param.name.as_ref().map(|n| n.as_str().into()),
                has_default: param.default.is_some(),
                ty,
                keyword_only: false,
            });
        }
        mark_keyword_only(&mut parameters);

        let declared_return = returns.map(|r| {
            self.bind_expr(r);
            self.resolve_annotation(r)
        });

        let mut function_data = FunctionData::new(name);
        function_data.flags = flags;
        function_data.parameters = parameters;
        function_data.declared_return = declared_return;
        let function_id = self.arena.functions.push(function_data);

        let symbol = self.declare(name, SymbolFlags::empty());
        let declaration = self.arena.declarations.push(Declaration::Function {
            site: self.site(id),
            node: id,
            function_id,
        });
        self.arena.symbols.get_mut(symbol).unwrap().add_declaration(declaration);

        self.push_scope(ScopeKind::Function);
        for (param, ty) in params.iter().zip(param_types.into_iter()) {
            if let Some(param_name) = &param.name {
                let param_symbol = self.declare(param_name.as_str(), SymbolFlags::IS_PARAMETER);
                let declaration = self.arena.declarations.push(Declaration::Parameter {
                    site: self.site(id),
                    node: id,
                    declared_type: param.annotation.map(|_| ty),
                });
                self.arena.symbols.get_mut(param_symbol).unwrap().add_declaration(declaration);
            }
        }
        let was_unreachable = std::mem::replace(&mut self.unreachable, false);
        self.bind_statements(body);
        self.unreachable = was_unreachable;
        self.pop_scope();
        self.attach(id, self.flow);
    }

    fn bind_class(&mut self, id: NodeId, name: &str, bases: &[NodeId], body: &[NodeId], decorators: &[NodeId]) {
        for decorator in decorators {
            self.bind_expr(*decorator);
        }
        for base in bases {
            self.bind_expr(*base);
        }

        let class_id = self.forward_declare_class(id, name);

        let mut flags = ClassFlags::empty();
        let mut base_classes = SmallVec::new();
        for base in bases {
            if let NodeKind::Name { id: base_name } = self.ast.kind(*base).clone() {
                if base_name.as_str() == "Protocol" {
                    flags |= ClassFlags::IS_PROTOCOL;
                }
            }
            base_classes.push(self.resolve_base(*base));
        }
        for decorator in decorators {
            match decorator_name(self.ast, *decorator) {
                Some("dataclass") => flags |= ClassFlags::IS_DATA_CLASS,
                Some("final") => flags |= ClassFlags::IS_FINAL,
                _ => {}
            }
        }
        if let Some(data) = self.arena.classes.get_mut(class_id) {
            data.flags |= flags;
            data.base_classes = base_classes;
        }

        self.push_scope(ScopeKind::Class);
        self.bind_statements(body);
        let fields: indexmap::IndexMap<compact_str::CompactString, SymbolId> =
            self.arena.scopes.get(self.current_scope()).unwrap().symbols.clone();
        self.pop_scope();
        if let Some(data) = self.arena.classes.get_mut(class_id) {
            data.fields = fields;
        }
        self.attach(id, self.flow);
    }

    fn bind_expr(&mut self, id: NodeId) {
        match self.ast.kind(id).clone() {
            NodeKind::Name { .. } | NodeKind::Constant(_) => {}
            NodeKind::BinOp { left, right, .. } => {
                self.bind_expr(left);
                self.bind_expr(right);
            }
            NodeKind::UnaryOp { operand, .. } => self.bind_expr(operand),
            NodeKind::BoolOp { values, .. } => {
                for value in values {
                    self.bind_expr(value);
                }
            }
            NodeKind::Compare { left, comparators, .. } => {
                self.bind_expr(left);
                for comparator in comparators {
                    self.bind_expr(comparator);
                }
            }
            NodeKind::Call { func, args, keywords } => {
                self.bind_expr(func);
                for arg in args {
                    self.bind_expr(arg);
                }
                for (_, value) in keywords {
                    self.bind_expr(value);
                }
            }
            NodeKind::Attribute { value, .. } => self.bind_expr(value),
            NodeKind::Subscript { value, slice } => {
                self.bind_expr(value);
                self.bind_expr(slice);
            }
            NodeKind::Starred { value } => self.bind_expr(value),
            NodeKind::List { elements } | NodeKind::Tuple { elements } | NodeKind::Set { elements } => {
                for element in elements {
                    self.bind_expr(element);
                }
            }
            NodeKind::Dict { keys, values } => {
                for key in keys.into_iter().flatten() {
                    self.bind_expr(key);
                }
                for value in values {
                    self.bind_expr(value);
                }
            }
            NodeKind::IfExp { test, body, or_else } => {
                self.bind_expr(test);
                self.bind_expr(body);
                self.bind_expr(or_else);
            }
            NodeKind::NamedExpr { target, value } => {
                self.bind_expr(value);
                self.bind_assignment_target(target);
            }
            NodeKind::Lambda { params, body } => {
                for param in &params {
                    if let Some(default) = param.default {
                        self.bind_expr(default);
                    }
                }
                self.push_scope(ScopeKind::Lambda);
                for param in &params {
                    if let Some(name) = &param.name {
                        self.declare(name.as_str(), SymbolFlags::IS_PARAMETER);
                    }
                }
                self.bind_expr(body);
                self.pop_scope();
            }
            NodeKind::ListComp { element, generators }
            | NodeKind::SetComp { element, generators }
            | NodeKind::GeneratorExp { element, generators } => {
                self.bind_comprehension(&generators);
                self.bind_expr(element);
                self.pop_scope();
            }
            NodeKind::DictComp { key, value, generators } => {
                self.bind_comprehension(&generators);
                self.bind_expr(key);
                self.bind_expr(value);
                self.pop_scope();
            }
            NodeKind::Await { value } | NodeKind::YieldFrom { value } => self.bind_expr(value),
            NodeKind::Yield { value: Some(value) } => self.bind_expr(value),
            NodeKind::Yield { value: None } | NodeKind::Slice { .. } => {}
            _ => {}
        }
        self.node_scope.entry(id).or_insert(self.current_scope());
    }

    fn bind_comprehension(&mut self, generators: &[pipit_python_ast::Comprehension]) {
        self.push_scope(ScopeKind::ListComp);
        for generator in generators {
            self.bind_expr(generator.iter);
            self.bind_assignment_target(generator.target);
            for condition in &generator.ifs {
                self.bind_expr(*condition);
            }
        }
    }
}

fn is_constant_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_uppercase() || c == '_' || c.is_ascii_digit())
}

/// The name a decorator expression resolves to for flag purposes: `@foo`,
/// `@mod.foo`, and `@foo(...)` (a call, e.g. `@dataclass(frozen=True)`) all
/// resolve to `"foo"`.
fn decorator_name<'a>(ast: &'a AstArena, node: NodeId) -> Option<&'a str> {
    match ast.kind(node) {
        NodeKind::Name { id } => Some(id.as_str()),
        NodeKind::Attribute { attr, .. } => Some(attr.as_str()),
        NodeKind::Call { func, .. } => decorator_name(ast, *func),
        _ => None,
    }
}

/// Marks every simple parameter after a bare `*` or a named `*args` as
/// keyword-only (spec §3, "bare `*` semantics"); `**kwargs` does not itself
/// shift the cutoff for the parameters before it.
fn mark_keyword_only(parameters: &mut [FunctionParameter]) {
    let mut after_star = false;
    for parameter in parameters.iter_mut() {
        match parameter.category {
            ParameterCategory::VarArgList => after_star = true,
            ParameterCategory::VarArgDict => {}
            ParameterCategory::Simple if after_star => parameter.keyword_only = true,
            ParameterCategory::Simple => {}
        }
    }
}

pub fn bind_file(ast: &AstArena, path: &Utf8Path, module: NodeId) -> BindResult {
    Binder::new(ast, path).bind_module(module)
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use pipit_python_ast::builder;

    use super::*;

    #[test]
    fn binds_a_module_level_assignment() {
        let mut ast = AstArena::new();
        let one = builder::int_literal(&mut ast, 1);
        let target = builder::name_expr(&mut ast, "x");
        let assign = builder::assign(&mut ast, vec![target], one);
        let module = builder::module(&mut ast, vec![assign]);

        let path = Utf8PathBuf::from("m.py");
        let result = bind_file(&ast, &path, module);
        let scope = result.arena.scopes.get(result.module_scope).unwrap();
        assert!(scope.lookup("x").is_some());
    }

    #[test]
    fn unconditional_raise_marks_following_statements_unreachable() {
        let mut ast = AstArena::new();
        let raise = builder::raise_stmt(&mut ast, None);
        let pass = builder::pass_stmt(&mut ast);
        let module = builder::module(&mut ast, vec![raise, pass]);

        let path = Utf8PathBuf::from("m.py");
        let result = bind_file(&ast, &path, module);
        assert!(matches!(
            result.arena.flow_nodes.get(result.node_flow[&pass]).unwrap(),
            FlowNode::Unreachable
        ));
    }
}

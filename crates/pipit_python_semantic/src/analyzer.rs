//! The type analyzer (C8): drives the evaluator to a fixed point over a
//! bound file, walking statements pass after pass until the type cache
//! stops changing (spec §4.7, "Convergence").

use std::cell::RefCell;

use camino::Utf8Path;
use pipit_python_ast::{AstArena, CmpOp, Constant, NodeId, NodeKind};

use crate::arena::{ClassId, FileArena, FlowNodeId, FunctionId, NodeKey, ScopeId};
use crate::binder::bind_file;
use crate::declaration::Declaration;
use crate::diagnostics::{Diagnostic, DiagnosticRule, DiagnosticSettings};
use crate::evaluator::{EvalFlags, Evaluator, Usage};
use crate::flow::FlowNode;
use crate::types::assign::can_assign;
use crate::types::narrow::{Constraint, ConstraintStack, Sense};
use crate::symbol::Symbol;

/// How a file's analysis terminated (spec §4.7, "State machine (per file)":
/// `Bound -> Inferring -> Converged | Capped`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AnalysisOutcome {
    Converged,
    /// The iteration cap was hit before two consecutive passes agreed; the
    /// last pass's results are used as-is (spec §4.7, "Non-convergence").
    Capped,
}

pub struct AnalyzedFile {
    pub arena: FileArena,
    pub outcome: AnalysisOutcome,
    pub passes: u32,
    pub diagnostics: Vec<Diagnostic>,
}

/// Above this many passes a file is presumed to be oscillating rather than
/// converging (spec §4.7's note that the engine must not loop forever on a
/// pathological fixed point); matches the teacher's own mdtest iteration
/// ceiling for type inference loops.
const MAX_PASSES: u32 = 50;

pub fn analyze_file(ast: &AstArena, path: &Utf8Path, module: NodeId, settings: &DiagnosticSettings) -> AnalyzedFile {
    let bound = bind_file(ast, path, module);
    let mut arena = bound.arena;
    let module_scope = bound.module_scope;
    let node_scope = &bound.node_scope;
    let node_flow = &bound.node_flow;

    let body = match ast.kind(module) {
        NodeKind::Module { body } => body.clone(),
        _ => Vec::new(),
    };

    let mut previous_snapshot: Option<rustc_hash::FxHashMap<NodeKey, crate::types::Type>> = None;
    let mut outcome = AnalysisOutcome::Capped;
    let mut passes = 0;
    let mut last_pass_overload_failures: Vec<(NodeId, String)> = Vec::new();
    let mut last_pass_unnecessary_isinstance: Vec<NodeId> = Vec::new();

    for pass in 1..=MAX_PASSES {
        passes = pass;
        arena.begin_pass();
        let constraints = RefCell::new(ConstraintStack::new());
        {
            let mut evaluator = Evaluator::new(ast, &mut arena, &constraints);
            walk_block(&mut evaluator, &body, module_scope, EvalFlags::empty(), node_scope);
            last_pass_overload_failures = evaluator.take_suppressed_diagnostics();
            last_pass_unnecessary_isinstance = evaluator.take_unnecessary_isinstance();
        }

        let snapshot = arena.type_cache_snapshot();
        let unchanged = previous_snapshot.as_ref() == Some(&snapshot);
        previous_snapshot = Some(snapshot);

        if unchanged {
            outcome = AnalysisOutcome::Converged;
            break;
        }
    }

    pin_final_types(&mut arena, &body);
    let mut diagnostics = collect_diagnostics(ast, &arena, &body, module_scope, settings, node_flow);
    for (node, message) in last_pass_overload_failures {
        diagnostics.push(Diagnostic::new(pipit_db::Severity::Error, message, ast.range(node)));
    }
    let isinstance_severity = settings.level(DiagnosticRule::ReportUnnecessaryIsInstance);
    for node in last_pass_unnecessary_isinstance {
        diagnostics.push(
            Diagnostic::new(isinstance_severity, "is always instance", ast.range(node))
                .with_rule(DiagnosticRule::ReportUnnecessaryIsInstance),
        );
    }

    AnalyzedFile {
        arena,
        outcome,
        passes,
        diagnostics,
    }
}

fn pin_final_types(arena: &mut FileArena, body: &[NodeId]) {
    for statement in body {
        pin_node(arena, *statement);
    }
}

fn pin_node(arena: &mut FileArena, node: NodeId) {
    let key = NodeKey::new(node);
    arena.type_cache_entry(key).pin_final();
}

fn walk_statement(
    evaluator: &mut Evaluator<'_>,
    node: NodeId,
    scope: ScopeId,
    flags: EvalFlags,
    node_scope: &rustc_hash::FxHashMap<NodeId, ScopeId>,
) {
    let ast = evaluator_ast(evaluator);
    match ast.kind(node).clone() {
        NodeKind::ExprStmt { value } => {
            evaluator.get_type(value, scope, &Usage::get(), flags);
        }
        NodeKind::Assign { targets, value } => {
            let value_ty = evaluator.get_type(value, scope, &Usage::get(), flags);
            for target in targets {
                evaluator.get_type(target, scope, &Usage::set(value_ty.clone()), flags);
            }
        }
        NodeKind::AnnAssign { target, value: Some(value), .. } => {
            let value_ty = evaluator.get_type(value, scope, &Usage::get(), flags);
            // The target's cached type must be its *declared* annotation,
            // not the value being assigned to it -- otherwise an
            // incompatible assignment is tautologically always compatible
            // with itself (spec §8, scenario S2).
            let target_ty = evaluator.declared_type_at(scope, target).unwrap_or(value_ty);
            evaluator.get_type(target, scope, &Usage::set(target_ty), flags);
        }
        NodeKind::AugAssign { target, value, .. } => {
            evaluator.get_type(value, scope, &Usage::get(), flags);
            evaluator.get_type(target, scope, &Usage::get(), flags);
        }
        NodeKind::Return { value: Some(value) } => {
            evaluator.get_type(value, scope, &Usage::get(), flags);
        }
        NodeKind::If { test, body, or_else } => {
            evaluator.get_type(test, scope, &Usage::get(), flags);
            let constraints = derive_constraints(ast, evaluator, scope, test);

            if let Some((true_constraint, _)) = &constraints {
                evaluator.push_constraint(true_constraint.clone());
            }
            walk_block(evaluator, &body, scope, flags, node_scope);
            if constraints.is_some() {
                evaluator.pop_constraint();
            }

            if let Some((_, false_constraint)) = &constraints {
                evaluator.push_constraint(false_constraint.clone());
            }
            walk_block(evaluator, &or_else, scope, flags, node_scope);
            if constraints.is_some() {
                evaluator.pop_constraint();
            }
        }
        NodeKind::While { test, body, or_else } => {
            evaluator.get_type(test, scope, &Usage::get(), flags);
            walk_block(evaluator, &body, scope, flags, node_scope);
            walk_block(evaluator, &or_else, scope, flags, node_scope);
        }
        NodeKind::For { target, iter, body, or_else, .. } => {
            evaluator.get_type(iter, scope, &Usage::get(), flags);
            evaluator.get_type(target, scope, &Usage::get(), flags);
            walk_block(evaluator, &body, scope, flags, node_scope);
            walk_block(evaluator, &or_else, scope, flags, node_scope);
        }
        NodeKind::Try { body, handlers, or_else, finally_body } => {
            walk_block(evaluator, &body, scope, flags, node_scope);
            for handler in handlers {
                if let Some(type_) = handler.type_ {
                    evaluator.get_type(type_, scope, &Usage::get(), flags);
                }
                walk_block(evaluator, &handler.body, scope, flags, node_scope);
            }
            walk_block(evaluator, &or_else, scope, flags, node_scope);
            walk_block(evaluator, &finally_body, scope, flags, node_scope);
        }
        NodeKind::With { items, body, .. } => {
            for item in items {
                evaluator.get_type(item.context_expr, scope, &Usage::get(), flags);
                if let Some(target) = item.optional_vars {
                    evaluator.get_type(target, scope, &Usage::get(), flags);
                }
            }
            walk_block(evaluator, &body, scope, flags, node_scope);
        }
        NodeKind::Assert { test, msg } => {
            evaluator.get_type(test, scope, &Usage::get(), flags);
            if let Some(msg) = msg {
                evaluator.get_type(msg, scope, &Usage::get(), flags);
            }
        }
        NodeKind::Delete { targets } => {
            for target in targets {
                evaluator.get_type(target, scope, &Usage { method: crate::evaluator::UsageMethod::Del, set_type: None, expected_type: None }, flags);
            }
        }
        NodeKind::FunctionDef { body, .. } | NodeKind::ClassDef { body, .. } => {
            // The binder records each nested statement's own scope in
            // `node_scope` (pushed while it walked the function/class body);
            // every statement in the same body shares that one scope, so
            // looking it up once from the first statement is enough.
            let inner_scope = body.first().and_then(|s| node_scope.get(s).copied()).unwrap_or(scope);
            walk_block(evaluator, &body, inner_scope, flags, node_scope);
        }
        _ => {}
    }
}

fn evaluator_ast<'a>(evaluator: &Evaluator<'a>) -> &'a AstArena {
    evaluator.ast()
}

/// Walks a list of statements making up one block, applying the narrowing
/// that survives an `if` whose taken branch is statically known to exit
/// (spec §8, scenario S1: `if x is None: return 0` narrows `x` for every
/// statement after the `if`, not just inside its own branches). Each
/// surviving constraint is pushed once the `if` that produced it has been
/// walked, and popped when this block finishes -- it does not leak to the
/// caller's enclosing block.
fn walk_block(
    evaluator: &mut Evaluator<'_>,
    statements: &[NodeId],
    scope: ScopeId,
    flags: EvalFlags,
    node_scope: &rustc_hash::FxHashMap<NodeId, ScopeId>,
) {
    let mut carried = 0usize;
    for &statement in statements {
        walk_statement(evaluator, statement, scope, flags, node_scope);

        let ast = evaluator_ast(evaluator);
        if let NodeKind::If { test, body, or_else } = ast.kind(statement).clone() {
            let Some((true_constraint, false_constraint)) = derive_constraints(ast, evaluator, scope, test) else {
                continue;
            };
            let body_exits = is_terminal_block(ast, &body);
            let or_else_exits = !or_else.is_empty() && is_terminal_block(ast, &or_else);
            if body_exits && !or_else_exits {
                evaluator.push_constraint(false_constraint);
                carried += 1;
            } else if or_else_exits && !body_exits {
                evaluator.push_constraint(true_constraint);
                carried += 1;
            }
        }
    }
    for _ in 0..carried {
        evaluator.pop_constraint();
    }
}

/// Whether control can never fall off the end of `statements` (spec §4.2's
/// binder notion of "unreachable after"), judged purely from the trailing
/// statement's shape -- enough to recognize the early-return guard pattern
/// without re-deriving the binder's full flow graph.
fn is_terminal_block(ast: &AstArena, statements: &[NodeId]) -> bool {
    match statements.last() {
        None => false,
        Some(&last) => match ast.kind(last).clone() {
            NodeKind::Return { .. } | NodeKind::Raise { .. } | NodeKind::Break | NodeKind::Continue => true,
            NodeKind::If { body, or_else, .. } => {
                !or_else.is_empty() && is_terminal_block(ast, &body) && is_terminal_block(ast, &or_else)
            }
            _ => false,
        },
    }
}

/// Derives the narrowing constraint an `if test:` applies to its true and
/// false branches (spec §4.7, "Type-constraint application"). Only the two
/// shapes the engine recognizes -- `x is [not] None` and
/// `isinstance(x, C | (C1, C2, ...))` -- produce a constraint; anything else
/// leaves both branches unconstrained.
fn derive_constraints(
    ast: &AstArena,
    evaluator: &Evaluator<'_>,
    scope: ScopeId,
    test: NodeId,
) -> Option<(Constraint, Constraint)> {
    match ast.kind(test).clone() {
        NodeKind::Compare { left, ops, comparators } if ops.len() == 1 && comparators.len() == 1 => {
            let op = ops[0];
            if !matches!(op, CmpOp::Is | CmpOp::IsNot) {
                return None;
            }
            if !matches!(ast.kind(comparators[0]), NodeKind::Constant(Constant::None)) {
                return None;
            }
            let NodeKind::Name { id: name } = ast.kind(left).clone() else {
                return None;
            };
            let target = evaluator.resolve_symbol(scope, name.as_str())?;
            let (true_sense, false_sense) = match op {
                CmpOp::Is => (Sense::True, Sense::False),
                CmpOp::IsNot => (Sense::False, Sense::True),
                _ => unreachable!(),
            };
            Some((
                Constraint::IsNone { target, sense: true_sense },
                Constraint::IsNone { target, sense: false_sense },
            ))
        }
        NodeKind::Call { func, args, .. } if args.len() == 2 => {
            let NodeKind::Name { id: func_name } = ast.kind(func).clone() else {
                return None;
            };
            if func_name.as_str() != "isinstance" {
                return None;
            }
            let NodeKind::Name { id: target_name } = ast.kind(args[0]).clone() else {
                return None;
            };
            let target = evaluator.resolve_symbol(scope, target_name.as_str())?;
            let class_names: Vec<pipit_python_ast::Name> = match ast.kind(args[1]).clone() {
                NodeKind::Tuple { elements } => elements
                    .iter()
                    .filter_map(|element| match ast.kind(*element) {
                        NodeKind::Name { id } => Some(id.clone()),
                        _ => None,
                    })
                    .collect(),
                NodeKind::Name { id } => vec![id],
                _ => Vec::new(),
            };
            let classes: Vec<ClassId> = class_names
                .iter()
                .filter_map(|name| evaluator.resolve_class(scope, name.as_str()))
                .collect();
            if classes.is_empty() {
                return None;
            }
            Some((
                Constraint::IsInstance { target, classes: classes.clone(), sense: Sense::True },
                Constraint::IsInstance { target, classes, sense: Sense::False },
            ))
        }
        _ => None,
    }
}

fn collect_diagnostics(
    ast: &AstArena,
    arena: &FileArena,
    body: &[NodeId],
    _module_scope: ScopeId,
    settings: &DiagnosticSettings,
    node_flow: &rustc_hash::FxHashMap<NodeId, FlowNodeId>,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    report_unused_symbols(arena, settings, &mut diagnostics);
    report_incompatible_assignments(ast, arena, body, &mut diagnostics);
    report_unreachable_code(ast, arena, node_flow, &mut diagnostics);
    diagnostics
}

fn report_unused_symbols(arena: &FileArena, settings: &DiagnosticSettings, diagnostics: &mut Vec<Diagnostic>) {
    for symbol in arena.symbols.iter() {
        if symbol.accessed {
            continue;
        }
        let Some(rule) = unused_rule_for(symbol, arena) else {
            continue;
        };
        let severity = settings.level(rule);
        let Some(declaration_id) = symbol.declarations.first() else {
            continue;
        };
        let Some(declaration) = arena.declarations.get(*declaration_id) else {
            continue;
        };
        let Some(site) = declaration.site() else {
            continue;
        };
        diagnostics.push(
            Diagnostic::new(severity, format!("'{}' is never used", symbol.name), site.range).with_rule(rule),
        );
    }
}

/// The unused-symbol rule a symbol's primary declaration falls under: a
/// class and a function each get their own rule (spec §6) rather than
/// being lumped in with plain variables.
fn unused_rule_for(symbol: &Symbol, arena: &FileArena) -> Option<DiagnosticRule> {
    if symbol.flags.contains(crate::symbol::SymbolFlags::IS_PARAMETER) {
        return None;
    }
    let declaration = symbol.declarations.first().and_then(|id| arena.declarations.get(*id));
    match declaration {
        Some(Declaration::Class { .. }) => Some(DiagnosticRule::ReportUnusedClass),
        Some(Declaration::Function { .. } | Declaration::Method { .. }) => Some(DiagnosticRule::ReportUnusedFunction),
        _ => Some(DiagnosticRule::ReportUnusedVariable),
    }
}

/// A statement the binder marked unreachable (code after an unconditional
/// `return`/`raise`/`break`, spec §4.7's unused-code check).
fn report_unreachable_code(
    ast: &AstArena,
    arena: &FileArena,
    node_flow: &rustc_hash::FxHashMap<NodeId, FlowNodeId>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut unreachable: Vec<NodeId> = node_flow
        .iter()
        .filter(|(_, flow_id)| matches!(arena.flow_nodes.get(**flow_id), Some(FlowNode::Unreachable)))
        .map(|(node, _)| *node)
        .collect();
    unreachable.sort_by_key(|node| ast.range(*node).start());
    for node in unreachable {
        diagnostics.push(Diagnostic::new(
            pipit_db::Severity::Warning,
            "this code is unreachable",
            ast.range(node),
        ));
    }
}

fn report_incompatible_assignments(ast: &AstArena, arena: &FileArena, body: &[NodeId], diagnostics: &mut Vec<Diagnostic>) {
    for statement in body {
        walk_for_assign_check(ast, arena, *statement, diagnostics);
    }
}

fn walk_for_assign_check(
    ast: &AstArena,
    arena: &FileArena,
    node: NodeId,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match ast.kind(node).clone() {
        NodeKind::AnnAssign { target, value: Some(value), .. } => {
            let target_key = NodeKey::new(target);
            let value_key = NodeKey::new(value);
            if let (Some(target_cache), Some(value_cache)) =
                (arena.type_cache_get(target_key), arena.type_cache_get(value_key))
            {
                if let (Some(dest), Some(src)) = (&target_cache.ty, &value_cache.ty) {
                    if can_assign(dest, src, arena).is_err() {
                        diagnostics.push(Diagnostic::new(
                            pipit_db::Severity::Error,
                            "incompatible assignment to an annotated variable",
                            ast.range(node),
                        ));
                    }
                }
            }
        }
        NodeKind::If { body, or_else, .. } | NodeKind::While { body, or_else, .. } => {
            for statement in body.iter().chain(or_else.iter()) {
                walk_for_assign_check(ast, arena, *statement, diagnostics);
            }
        }
        NodeKind::For { body, or_else, .. } => {
            for statement in body.iter().chain(or_else.iter()) {
                walk_for_assign_check(ast, arena, *statement, diagnostics);
            }
        }
        NodeKind::Try { body, handlers, or_else, finally_body } => {
            for statement in body.iter().chain(or_else.iter()).chain(finally_body.iter()) {
                walk_for_assign_check(ast, arena, *statement, diagnostics);
            }
            for handler in &handlers {
                for statement in &handler.body {
                    walk_for_assign_check(ast, arena, *statement, diagnostics);
                }
            }
        }
        NodeKind::With { body, .. } => {
            for statement in &body {
                walk_for_assign_check(ast, arena, *statement, diagnostics);
            }
        }
        NodeKind::FunctionDef { body, returns: Some(_), .. } => {
            report_return_type_mismatch(ast, arena, node, &body, diagnostics);
            for statement in &body {
                walk_for_assign_check(ast, arena, *statement, diagnostics);
            }
        }
        NodeKind::FunctionDef { body, .. } | NodeKind::ClassDef { body, .. } => {
            for statement in &body {
                walk_for_assign_check(ast, arena, *statement, diagnostics);
            }
        }
        _ => {}
    }
}

/// Checks a function's declared return annotation against the types its
/// `return` statements actually produce (spec §4.7, "Function visitation":
/// "declared-vs-inferred return validation"). Only the function's own
/// immediate returns count -- a nested `def`'s returns are its own concern.
fn report_return_type_mismatch(
    ast: &AstArena,
    arena: &FileArena,
    def_node: NodeId,
    body: &[NodeId],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(function_id) = function_id_for_def(arena, def_node) else {
        return;
    };
    let Some(function) = arena.functions.get(function_id) else {
        return;
    };
    let Some(declared) = function.declared_return.clone() else {
        return;
    };

    let mut returned_types = Vec::new();
    collect_return_types(ast, arena, body, &mut returned_types);
    if returned_types.is_empty() {
        return;
    }

    let mut builder = crate::types::builder::UnionBuilder::new();
    for ty in returned_types {
        builder.add(ty);
    }
    let inferred = builder.build();

    if can_assign(&declared, &inferred, arena).is_err() {
        diagnostics.push(Diagnostic::new(
            pipit_db::Severity::Error,
            "returned value does not match the declared return type",
            ast.range(def_node),
        ));
    }
}

fn function_id_for_def(arena: &FileArena, def_node: NodeId) -> Option<FunctionId> {
    arena.declarations.iter().find_map(|decl| match decl {
        Declaration::Function { node, function_id, .. } if *node == def_node => Some(*function_id),
        _ => None,
    })
}

/// Collects the types of every `return` reachable from `statements` without
/// descending into a nested `def`/`class`, whose own returns belong to that
/// inner scope instead.
fn collect_return_types(ast: &AstArena, arena: &FileArena, statements: &[NodeId], types: &mut Vec<crate::types::Type>) {
    for &node in statements {
        match ast.kind(node).clone() {
            NodeKind::Return { value: Some(value) } => {
                if let Some(cache) = arena.type_cache_get(NodeKey::new(value)) {
                    if let Some(ty) = &cache.ty {
                        types.push(ty.clone());
                    }
                }
            }
            NodeKind::Return { value: None } => types.push(crate::types::Type::None),
            NodeKind::If { body, or_else, .. } | NodeKind::While { body, or_else, .. } => {
                collect_return_types(ast, arena, &body, types);
                collect_return_types(ast, arena, &or_else, types);
            }
            NodeKind::For { body, or_else, .. } => {
                collect_return_types(ast, arena, &body, types);
                collect_return_types(ast, arena, &or_else, types);
            }
            NodeKind::Try { body, handlers, or_else, finally_body } => {
                collect_return_types(ast, arena, &body, types);
                for handler in &handlers {
                    collect_return_types(ast, arena, &handler.body, types);
                }
                collect_return_types(ast, arena, &or_else, types);
                collect_return_types(ast, arena, &finally_body, types);
            }
            NodeKind::With { body, .. } => collect_return_types(ast, arena, &body, types),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use pipit_python_ast::builder;

    use super::*;

    #[test]
    fn a_module_level_literal_assignment_converges() {
        let mut ast = AstArena::new();
        let one = builder::int_literal(&mut ast, 1);
        let target = builder::name_expr(&mut ast, "x");
        let assign = builder::assign(&mut ast, vec![target], one);
        let module = builder::module(&mut ast, vec![assign]);
        let path = camino::Utf8PathBuf::from("m.py");
        let settings = DiagnosticSettings::default();
        let analyzed = analyze_file(&ast, &path, module, &settings);
        assert_eq!(analyzed.outcome, AnalysisOutcome::Converged);
    }

    #[test]
    fn unused_variable_is_reported() {
        let mut ast = AstArena::new();
        let one = builder::int_literal(&mut ast, 1);
        let target = builder::name_expr(&mut ast, "unused");
        let assign = builder::assign(&mut ast, vec![target], one);
        let module = builder::module(&mut ast, vec![assign]);
        let path = camino::Utf8PathBuf::from("m.py");
        let settings = DiagnosticSettings::default();
        let analyzed = analyze_file(&ast, &path, module, &settings);
        assert!(analyzed
            .diagnostics
            .iter()
            .any(|d| d.rule == Some(DiagnosticRule::ReportUnusedVariable)));
    }
}

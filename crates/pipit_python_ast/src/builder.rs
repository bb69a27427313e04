//! Convenience constructors for hand-built ASTs.
//!
//! Building fixtures this way -- rather than through a textual parser -- is
//! the deliberate consequence of the parser being out of scope (spec §1):
//! tests and `pipit_parser` both just need *some* way to produce the tree
//! shape the binder consumes, and literal construction is the smallest one.
//! Ranges are synthesized (not meaningful byte offsets) except where a test
//! cares about them.

use pipit_db::{TextRange, TextSize};

use crate::arena::AstArena;
use crate::node::{
    Alias, BinOp, BoolOp, Comprehension, Constant, ExceptHandler, NodeId, NodeKind, Param,
    ParamKind, WithItem,
};
use crate::name::Name;

fn r(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::new(start), TextSize::new(end))
}

/// A range-free placeholder for nodes built purely for their shape.
pub fn zero_range() -> TextRange {
    r(0, 0)
}

pub fn name_expr(arena: &mut AstArena, name: &str) -> NodeId {
    arena.push(NodeKind::Name { id: Name::new(name) }, zero_range(), &[])
}

pub fn int_literal(arena: &mut AstArena, value: i64) -> NodeId {
    arena.push(NodeKind::Constant(Constant::Int(value)), zero_range(), &[])
}

pub fn str_literal(arena: &mut AstArena, value: &str) -> NodeId {
    arena.push(
        NodeKind::Constant(Constant::Str(value.into())),
        zero_range(),
        &[],
    )
}

pub fn none_literal(arena: &mut AstArena) -> NodeId {
    arena.push(NodeKind::Constant(Constant::None), zero_range(), &[])
}

pub fn bin_op(arena: &mut AstArena, left: NodeId, op: BinOp, right: NodeId) -> NodeId {
    arena.push(NodeKind::BinOp { left, op, right }, zero_range(), &[left, right])
}

pub fn compare_is(arena: &mut AstArena, left: NodeId, op: crate::node::CmpOp, right: NodeId) -> NodeId {
    arena.push(
        NodeKind::Compare {
            left,
            ops: vec![op],
            comparators: vec![right],
        },
        zero_range(),
        &[left, right],
    )
}

pub fn call(arena: &mut AstArena, func: NodeId, args: Vec<NodeId>) -> NodeId {
    let mut children = args.clone();
    children.push(func);
    arena.push(
        NodeKind::Call {
            func,
            args,
            keywords: vec![],
        },
        zero_range(),
        &children,
    )
}

pub fn attribute(arena: &mut AstArena, value: NodeId, attr: &str) -> NodeId {
    arena.push(
        NodeKind::Attribute {
            value,
            attr: Name::new(attr),
        },
        zero_range(),
        &[value],
    )
}

pub fn return_stmt(arena: &mut AstArena, value: Option<NodeId>) -> NodeId {
    let children: Vec<NodeId> = value.into_iter().collect();
    arena.push(NodeKind::Return { value }, zero_range(), &children)
}

pub fn expr_stmt(arena: &mut AstArena, value: NodeId) -> NodeId {
    arena.push(NodeKind::ExprStmt { value }, zero_range(), &[value])
}

pub fn assign(arena: &mut AstArena, targets: Vec<NodeId>, value: NodeId) -> NodeId {
    let mut children = targets.clone();
    children.push(value);
    arena.push(NodeKind::Assign { targets, value }, zero_range(), &children)
}

pub fn ann_assign(arena: &mut AstArena, target: NodeId, annotation: NodeId, value: Option<NodeId>) -> NodeId {
    let mut children = vec![target, annotation];
    children.extend(value);
    arena.push(
        NodeKind::AnnAssign {
            target,
            annotation,
            value,
        },
        zero_range(),
        &children,
    )
}

pub fn if_stmt(arena: &mut AstArena, test: NodeId, body: Vec<NodeId>, or_else: Vec<NodeId>) -> NodeId {
    let mut children = vec![test];
    children.extend(body.iter().copied());
    children.extend(or_else.iter().copied());
    arena.push(
        NodeKind::If {
            test,
            body,
            or_else,
        },
        zero_range(),
        &children,
    )
}

pub fn while_stmt(arena: &mut AstArena, test: NodeId, body: Vec<NodeId>) -> NodeId {
    let mut children = vec![test];
    children.extend(body.iter().copied());
    arena.push(
        NodeKind::While {
            test,
            body,
            or_else: vec![],
        },
        zero_range(),
        &children,
    )
}

pub fn for_stmt(arena: &mut AstArena, target: NodeId, iter: NodeId, body: Vec<NodeId>) -> NodeId {
    let mut children = vec![target, iter];
    children.extend(body.iter().copied());
    arena.push(
        NodeKind::For {
            target,
            iter,
            body,
            or_else: vec![],
            is_async: false,
        },
        zero_range(),
        &children,
    )
}

pub fn raise_stmt(arena: &mut AstArena, exc: Option<NodeId>) -> NodeId {
    let children: Vec<NodeId> = exc.into_iter().collect();
    arena.push(
        NodeKind::Raise { exc, cause: None },
        zero_range(),
        &children,
    )
}

pub fn pass_stmt(arena: &mut AstArena) -> NodeId {
    arena.push(NodeKind::Pass, zero_range(), &[])
}

pub fn function_def(
    arena: &mut AstArena,
    name: &str,
    params: Vec<Param>,
    returns: Option<NodeId>,
    body: Vec<NodeId>,
) -> NodeId {
    let mut children: Vec<NodeId> = params.iter().filter_map(|p| p.annotation).collect();
    children.extend(params.iter().filter_map(|p| p.default));
    children.extend(returns);
    children.extend(body.iter().copied());
    arena.push(
        NodeKind::FunctionDef {
            name: Name::new(name),
            params,
            returns,
            body,
            decorators: vec![],
            is_async: false,
        },
        zero_range(),
        &children,
    )
}

pub fn simple_param(name: &str, annotation: Option<NodeId>) -> Param {
    Param {
        kind: ParamKind::Simple,
        name: Some(Name::new(name)),
        annotation,
        default: None,
        range: zero_range(),
    }
}

pub fn class_def(arena: &mut AstArena, name: &str, bases: Vec<NodeId>, body: Vec<NodeId>) -> NodeId {
    let mut children = bases.clone();
    children.extend(body.iter().copied());
    arena.push(
        NodeKind::ClassDef {
            name: Name::new(name),
            bases,
            body,
            decorators: vec![],
        },
        zero_range(),
        &children,
    )
}

pub fn module(arena: &mut AstArena, body: Vec<NodeId>) -> NodeId {
    arena.push(NodeKind::Module { body: body.clone() }, zero_range(), &body)
}

pub fn isinstance_call(arena: &mut AstArena, subject: NodeId, classes: Vec<NodeId>) -> NodeId {
    let func = name_expr(arena, "isinstance");
    let class_arg = if classes.len() == 1 {
        classes[0]
    } else {
        let children = classes.clone();
        arena.push(NodeKind::Tuple { elements: classes }, zero_range(), &children)
    };
    call(arena, func, vec![subject, class_arg])
}

pub fn import_stmt(names: Vec<(&str, Option<&str>)>, arena: &mut AstArena) -> NodeId {
    let aliases = names
        .into_iter()
        .map(|(name, asname)| Alias {
            name: Name::new(name),
            asname: asname.map(Name::new),
        })
        .collect();
    arena.push(NodeKind::Import { names: aliases }, zero_range(), &[])
}

pub fn import_from_stmt(module: &str, names: Vec<&str>, arena: &mut AstArena) -> NodeId {
    let aliases = names
        .into_iter()
        .map(|name| Alias {
            name: Name::new(name),
            asname: None,
        })
        .collect();
    arena.push(
        NodeKind::ImportFrom {
            module: Some(Name::new(module)),
            names: aliases,
            level: 0,
        },
        zero_range(),
        &[],
    )
}

#[allow(clippy::too_many_arguments)]
pub fn try_stmt(
    arena: &mut AstArena,
    body: Vec<NodeId>,
    handlers: Vec<ExceptHandler>,
    finally_body: Vec<NodeId>,
) -> NodeId {
    let mut children = body.clone();
    for handler in &handlers {
        children.extend(handler.type_);
        children.extend(handler.body.iter().copied());
    }
    children.extend(finally_body.iter().copied());
    arena.push(
        NodeKind::Try {
            body,
            handlers,
            or_else: vec![],
            finally_body,
        },
        zero_range(),
        &children,
    )
}

pub fn with_stmt(arena: &mut AstArena, context_expr: NodeId, optional_vars: Option<NodeId>, body: Vec<NodeId>) -> NodeId {
    let mut children = vec![context_expr];
    children.extend(optional_vars);
    children.extend(body.iter().copied());
    arena.push(
        NodeKind::With {
            items: vec![WithItem {
                context_expr,
                optional_vars,
            }],
            body,
            is_async: false,
        },
        zero_range(),
        &children,
    )
}

pub fn list_comp(arena: &mut AstArena, element: NodeId, target: NodeId, iter: NodeId) -> NodeId {
    let generators = vec![Comprehension {
        target,
        iter,
        ifs: vec![],
        is_async: false,
    }];
    arena.push(
        NodeKind::ListComp { element, generators },
        zero_range(),
        &[element, target, iter],
    )
}

pub fn bool_op(arena: &mut AstArena, op: BoolOp, values: Vec<NodeId>) -> NodeId {
    let children = values.clone();
    arena.push(NodeKind::BoolOp { op, values }, zero_range(), &children)
}

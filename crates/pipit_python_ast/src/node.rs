//! The node kinds a parser hands the binder.
//!
//! Per spec §1 the lexer/parser is an external collaborator; this module is
//! the shape of what it produces: "node kinds, source ranges, a `parent`
//! link" (spec §1), arena-indexed per spec §9's design note. The variant
//! list covers the constructs the rest of the spec names by name (class and
//! function defs, the narrowing-relevant conditionals, imports, comprehensions,
//! walrus assignment, …) without attempting to be a complete grammar for the
//! scripting language -- that grammar is the parser's problem, not the
//! checker core's.

use pipit_db::IndexVec;
use pipit_db::{newtype_index, TextRange};

use crate::name::Name;

newtype_index! {
    /// An index into one file's [`crate::arena::AstArena`].
    pub struct NodeId;
}

pub type NodeIdVec = Vec<NodeId>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnaryOp {
    Not,
    Invert,
    UAdd,
    USub,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
    MatMult,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(compact_str::CompactString),
    Str(compact_str::CompactString),
    Bytes(Vec<u8>),
    Bool(bool),
    None,
    Ellipsis,
}

/// A function or lambda parameter, per spec §3's `FunctionParameter`
/// (the `category` distinction is drawn in the type domain, not here --
/// here we only need the shape the binder declares into scope).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParamKind {
    Simple,
    VarArgList,
    VarArgDict,
    /// A bare `*` separator with no following name: introduces no binding,
    /// only shifts the positional/keyword-only cutoff (spec §4.6).
    BareStarSeparator,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Param {
    pub kind: ParamKind,
    pub name: Option<Name>,
    pub annotation: Option<NodeId>,
    pub default: Option<NodeId>,
    pub range: TextRange,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Alias {
    pub name: Name,
    pub asname: Option<Name>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExceptHandler {
    pub type_: Option<NodeId>,
    pub name: Option<Name>,
    pub body: NodeIdVec,
    pub range: TextRange,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithItem {
    pub context_expr: NodeId,
    pub optional_vars: Option<NodeId>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comprehension {
    pub target: NodeId,
    pub iter: NodeId,
    pub ifs: NodeIdVec,
    pub is_async: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    // --- module ---
    Module {
        body: NodeIdVec,
    },

    // --- statements ---
    FunctionDef {
        name: Name,
        params: Vec<Param>,
        returns: Option<NodeId>,
        body: NodeIdVec,
        decorators: NodeIdVec,
        is_async: bool,
    },
    ClassDef {
        name: Name,
        bases: NodeIdVec,
        body: NodeIdVec,
        decorators: NodeIdVec,
    },
    Return {
        value: Option<NodeId>,
    },
    Delete {
        targets: NodeIdVec,
    },
    Assign {
        targets: NodeIdVec,
        value: NodeId,
    },
    AnnAssign {
        target: NodeId,
        annotation: NodeId,
        value: Option<NodeId>,
    },
    AugAssign {
        target: NodeId,
        op: BinOp,
        value: NodeId,
    },
    For {
        target: NodeId,
        iter: NodeId,
        body: NodeIdVec,
        or_else: NodeIdVec,
        is_async: bool,
    },
    While {
        test: NodeId,
        body: NodeIdVec,
        or_else: NodeIdVec,
    },
    If {
        test: NodeId,
        body: NodeIdVec,
        or_else: NodeIdVec,
    },
    With {
        items: Vec<WithItem>,
        body: NodeIdVec,
        is_async: bool,
    },
    Raise {
        exc: Option<NodeId>,
        cause: Option<NodeId>,
    },
    Try {
        body: NodeIdVec,
        handlers: Vec<ExceptHandler>,
        or_else: NodeIdVec,
        finally_body: NodeIdVec,
    },
    Assert {
        test: NodeId,
        msg: Option<NodeId>,
    },
    Import {
        names: Vec<Alias>,
    },
    ImportFrom {
        module: Option<Name>,
        names: Vec<Alias>,
        level: u32,
    },
    Global {
        names: Vec<Name>,
    },
    Nonlocal {
        names: Vec<Name>,
    },
    ExprStmt {
        value: NodeId,
    },
    Pass,
    Break,
    Continue,

    // --- expressions ---
    BoolOp {
        op: BoolOp,
        values: NodeIdVec,
    },
    NamedExpr {
        target: NodeId,
        value: NodeId,
    },
    BinOp {
        left: NodeId,
        op: BinOp,
        right: NodeId,
    },
    UnaryOp {
        op: UnaryOp,
        operand: NodeId,
    },
    Lambda {
        params: Vec<Param>,
        body: NodeId,
    },
    IfExp {
        test: NodeId,
        body: NodeId,
        or_else: NodeId,
    },
    Dict {
        keys: Vec<Option<NodeId>>,
        values: NodeIdVec,
    },
    Set {
        elements: NodeIdVec,
    },
    ListComp {
        element: NodeId,
        generators: Vec<Comprehension>,
    },
    SetComp {
        element: NodeId,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: NodeId,
        value: NodeId,
        generators: Vec<Comprehension>,
    },
    GeneratorExp {
        element: NodeId,
        generators: Vec<Comprehension>,
    },
    Await {
        value: NodeId,
    },
    Yield {
        value: Option<NodeId>,
    },
    YieldFrom {
        value: NodeId,
    },
    Compare {
        left: NodeId,
        ops: Vec<CmpOp>,
        comparators: NodeIdVec,
    },
    Call {
        func: NodeId,
        args: NodeIdVec,
        keywords: Vec<(Option<Name>, NodeId)>,
    },
    Constant(Constant),
    Attribute {
        value: NodeId,
        attr: Name,
    },
    Subscript {
        value: NodeId,
        slice: NodeId,
    },
    Starred {
        value: NodeId,
    },
    Name {
        id: Name,
    },
    List {
        elements: NodeIdVec,
    },
    Tuple {
        elements: NodeIdVec,
    },
    Slice {
        lower: Option<NodeId>,
        upper: Option<NodeId>,
        step: Option<NodeId>,
    },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub range: TextRange,
    pub parent: Option<NodeId>,
}

/// A per-node side table, indexed by [`NodeId`] instead of a hashmap keyed by
/// pointer identity -- the arena design spec §9 calls for.
pub type NodeMap<T> = IndexVec<NodeId, Option<T>>;

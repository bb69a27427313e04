//! The syntax tree shape the binder and analyzer consume.
//!
//! Per spec §1 the real lexer/parser is out of scope; this crate plays the
//! role the teacher's `ruff_python_ast` does (the node type definitions a
//! parser populates), minus the parser itself. `pipit_parser` is a small,
//! separate "glue" crate (spec §2's "parser glue" budget line) that builds
//! an [`arena::AstArena`] from source text for the CLI to use; tests build
//! arenas directly via [`builder`].

pub mod arena;
pub mod builder;
pub mod name;
pub mod node;

pub use arena::AstArena;
pub use name::Name;
pub use node::{
    Alias, BinOp, BoolOp, CmpOp, Comprehension, Constant, ExceptHandler, Node, NodeId, NodeKind,
    NodeMap, Param, ParamKind, UnaryOp, WithItem,
};

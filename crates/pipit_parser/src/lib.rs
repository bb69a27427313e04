//! Turns source text into a [`pipit_python_ast::arena::AstArena`].
//!
//! This crate plays no role in the checker core itself (spec §1 treats the
//! lexer/parser as an external collaborator); it exists so the CLI has
//! something to hand real files to. Keep it small: a tokenizer and a
//! recursive-descent parser, nothing the binder or evaluator depend on.

pub mod error;
pub mod parser;
pub mod tokenizer;

pub use error::ParseError;
pub use parser::parse_module;
pub use tokenizer::{tokenize, Token, TokenKind, TokenizeError};

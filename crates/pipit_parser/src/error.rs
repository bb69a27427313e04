//! Errors the tokenizer and parser can report.

use crate::tokenizer::{TokenKind, TokenizeError};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error("unexpected token {found:?} at offset {offset}, expected {expected}")]
    Unexpected {
        found: TokenKind,
        offset: u32,
        expected: &'static str,
    },
}

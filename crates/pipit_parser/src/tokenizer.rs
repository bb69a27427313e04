//! An indentation-aware tokenizer, grounded on the teacher's own
//! `ruff_python_parser::lexer`: a flat token stream with explicit
//! `Indent`/`Dedent` markers synthesized from each logical line's leading
//! whitespace, bracket depth suppressing newlines/indentation the way a
//! real Python tokenizer does inside `(...)`/`[...]`/`{...}`.

use compact_str::CompactString;
use pipit_db::{TextRange, TextSize};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenKind {
    Name(CompactString),
    Int(i64),
    Float(CompactString),
    Str(CompactString),
    Newline,
    Indent,
    Dedent,
    EndMarker,

    // keywords
    And,
    Or,
    Not,
    Is,
    In,
    If,
    Elif,
    Else,
    While,
    For,
    Def,
    Class,
    Return,
    Pass,
    Break,
    Continue,
    Import,
    From,
    As,
    Global,
    Nonlocal,
    Raise,
    Try,
    Except,
    Finally,
    With,
    Assert,
    Lambda,
    Del,
    True,
    False,
    None_,
    Async,
    Await,
    Yield,

    // operators / punctuation
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    Amper,
    Pipe,
    Caret,
    Tilde,
    LShift,
    RShift,
    Lt,
    LtE,
    Gt,
    GtE,
    EqEq,
    NotEq,
    Eq,
    Colon,
    ColonEq,
    Comma,
    Dot,
    Arrow,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Semi,
    At,

    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    DoubleSlashEq,
    PercentEq,
    AmperEq,
    PipeEq,
    CaretEq,
    LShiftEq,
    RShiftEq,
    DoubleStarEq,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenizeError {
    #[error("unterminated string literal at offset {0}")]
    UnterminatedString(u32),
    #[error("inconsistent indentation at offset {0}")]
    InconsistentIndent(u32),
    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, u32),
}

fn keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "and" => And,
        "or" => Or,
        "not" => Not,
        "is" => Is,
        "in" => In,
        "if" => If,
        "elif" => Elif,
        "else" => Else,
        "while" => While,
        "for" => For,
        "def" => Def,
        "class" => Class,
        "return" => Return,
        "pass" => Pass,
        "break" => Break,
        "continue" => Continue,
        "import" => Import,
        "from" => From,
        "as" => As,
        "global" => Global,
        "nonlocal" => Nonlocal,
        "raise" => Raise,
        "try" => Try,
        "except" => Except,
        "finally" => Finally,
        "with" => With,
        "assert" => Assert,
        "lambda" => Lambda,
        "del" => Del,
        "True" => True,
        "False" => False,
        "None" => None_,
        "async" => Async,
        "await" => Await,
        "yield" => Yield,
        _ => return Option::None,
    })
}

pub struct Tokenizer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    offset: u32,
    bracket_depth: u32,
    indents: Vec<u32>,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            offset: 0,
            bracket_depth: 0,
            indents: vec![0],
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, TokenizeError> {
        while self.offset() < self.bytes.len() {
            if self.at_line_start && self.bracket_depth == 0 {
                self.consume_indentation()?;
                if self.offset() >= self.bytes.len() {
                    break;
                }
            }
            self.at_line_start = false;
            self.skip_intra_line_whitespace();
            let Some(c) = self.peek_char() else { break };
            if c == '#' {
                self.skip_to_eol();
                continue;
            }
            if c == '\n' {
                let start = self.offset;
                self.advance_byte();
                if self.bracket_depth == 0 {
                    self.push(TokenKind::Newline, start, self.offset);
                    self.at_line_start = true;
                }
                continue;
            }
            if c == '\\' && self.bytes.get(self.offset()).copied() == Some(b'\n') {
                self.advance_byte();
                continue;
            }
            if c.is_ascii_digit() {
                self.lex_number()?;
                continue;
            }
            if c == '_' || c.is_alphabetic() {
                self.lex_name_or_keyword();
                continue;
            }
            if c == '"' || c == '\'' {
                self.lex_string(c)?;
                continue;
            }
            self.lex_operator(c)?;
        }

        while self.indents.len() > 1 {
            self.indents.pop();
            self.push_zero(TokenKind::Dedent);
        }
        self.push_zero(TokenKind::EndMarker);
        Ok(self.tokens)
    }

    fn offset(&self) -> usize {
        self.offset as usize
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.offset()..].chars().next()
    }

    fn advance_byte(&mut self) {
        if let Some(c) = self.peek_char() {
            self.offset += c.len_utf8() as u32;
        }
    }

    fn push(&mut self, kind: TokenKind, start: u32, end: u32) {
        self.tokens.push(Token {
            kind,
            range: TextRange::new(TextSize::new(start), TextSize::new(end)),
        });
    }

    fn push_zero(&mut self, kind: TokenKind) {
        self.push(kind, self.offset, self.offset);
    }

    fn consume_indentation(&mut self) -> Result<(), TokenizeError> {
        loop {
            let line_start = self.offset;
            let mut width = 0u32;
            loop {
                match self.bytes.get(self.offset()) {
                    Some(b' ') => {
                        width += 1;
                        self.offset += 1;
                    }
                    Some(b'\t') => {
                        width += 8 - (width % 8);
                        self.offset += 1;
                    }
                    _ => break,
                }
            }
            match self.bytes.get(self.offset()) {
                None => return Ok(()),
                Some(b'\n') => {
                    // blank line: skip and retry from the next line.
                    self.offset += 1;
                    continue;
                }
                Some(b'#') => {
                    self.skip_to_eol();
                    if self.bytes.get(self.offset()) == Some(&b'\n') {
                        self.offset += 1;
                    }
                    continue;
                }
                _ => {
                    let current = *self.indents.last().unwrap();
                    if width > current {
                        self.indents.push(width);
                        self.push(TokenKind::Indent, line_start, self.offset);
                    } else {
                        while width < *self.indents.last().unwrap() {
                            self.indents.pop();
                            self.push(TokenKind::Dedent, line_start, self.offset);
                        }
                        if width != *self.indents.last().unwrap() {
                            return Err(TokenizeError::InconsistentIndent(self.offset));
                        }
                    }
                    return Ok(());
                }
            }
        }
    }

    fn skip_intra_line_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == ' ' || c == '\t' || c == '\r' {
                self.advance_byte();
            } else {
                break;
            }
        }
    }

    fn skip_to_eol(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.advance_byte();
        }
    }

    fn lex_number(&mut self) -> Result<(), TokenizeError> {
        let start = self.offset;
        let mut is_float = false;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '_' {
                self.advance_byte();
            } else if c == '.' && !is_float {
                is_float = true;
                self.advance_byte();
            } else {
                break;
            }
        }
        let text = &self.source[start as usize..self.offset()];
        let cleaned: CompactString = text.chars().filter(|c| *c != '_').collect();
        if is_float {
            self.push(TokenKind::Float(cleaned), start, self.offset);
        } else {
            let value: i64 = cleaned.parse().unwrap_or(0);
            self.push(TokenKind::Int(value), start, self.offset);
        }
        Ok(())
    }

    fn lex_name_or_keyword(&mut self) {
        let start = self.offset;
        while let Some(c) = self.peek_char() {
            if c == '_' || c.is_alphanumeric() {
                self.advance_byte();
            } else {
                break;
            }
        }
        let text = &self.source[start as usize..self.offset()];
        let kind = keyword(text).unwrap_or_else(|| TokenKind::Name(CompactString::from(text)));
        self.push(kind, start, self.offset);
    }

    fn lex_string(&mut self, quote: char) -> Result<(), TokenizeError> {
        let start = self.offset;
        self.advance_byte();
        let mut value = CompactString::new("");
        loop {
            match self.peek_char() {
                None => return Err(TokenizeError::UnterminatedString(start)),
                Some(c) if c == quote => {
                    self.advance_byte();
                    break;
                }
                Some('\\') => {
                    self.advance_byte();
                    match self.peek_char() {
                        Some('n') => {
                            value.push('\n');
                            self.advance_byte();
                        }
                        Some('t') => {
                            value.push('\t');
                            self.advance_byte();
                        }
                        Some(other) => {
                            value.push(other);
                            self.advance_byte();
                        }
                        None => return Err(TokenizeError::UnterminatedString(start)),
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance_byte();
                }
            }
        }
        self.push(TokenKind::Str(value), start, self.offset);
        Ok(())
    }

    fn lex_operator(&mut self, c: char) -> Result<(), TokenizeError> {
        use TokenKind::*;
        let start = self.offset;
        let rest = &self.source[self.offset()..];
        macro_rules! take {
            ($len:expr, $kind:expr) => {{
                self.offset += $len;
                self.push($kind, start, self.offset);
                return Ok(());
            }};
        }
        match c {
            '(' => {
                self.bracket_depth += 1;
                take!(1, LParen)
            }
            ')' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                take!(1, RParen)
            }
            '[' => {
                self.bracket_depth += 1;
                take!(1, LBracket)
            }
            ']' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                take!(1, RBracket)
            }
            '{' => {
                self.bracket_depth += 1;
                take!(1, LBrace)
            }
            '}' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                take!(1, RBrace)
            }
            ',' => take!(1, Comma),
            ':' => {
                if rest.starts_with(":=") {
                    take!(2, ColonEq)
                }
                take!(1, Colon)
            }
            ';' => take!(1, Semi),
            '@' => take!(1, At),
            '.' => take!(1, Dot),
            '~' => take!(1, Tilde),
            '+' => {
                if rest.starts_with("+=") {
                    take!(2, PlusEq)
                }
                take!(1, Plus)
            }
            '-' => {
                if rest.starts_with("->") {
                    take!(2, Arrow)
                }
                if rest.starts_with("-=") {
                    take!(2, MinusEq)
                }
                take!(1, Minus)
            }
            '*' => {
                if rest.starts_with("**=") {
                    take!(3, DoubleStarEq)
                }
                if rest.starts_with("**") {
                    take!(2, DoubleStar)
                }
                if rest.starts_with("*=") {
                    take!(2, StarEq)
                }
                take!(1, Star)
            }
            '/' => {
                if rest.starts_with("//=") {
                    take!(3, DoubleSlashEq)
                }
                if rest.starts_with("//") {
                    take!(2, DoubleSlash)
                }
                if rest.starts_with("/=") {
                    take!(2, SlashEq)
                }
                take!(1, Slash)
            }
            '%' => {
                if rest.starts_with("%=") {
                    take!(2, PercentEq)
                }
                take!(1, Percent)
            }
            '&' => {
                if rest.starts_with("&=") {
                    take!(2, AmperEq)
                }
                take!(1, Amper)
            }
            '|' => {
                if rest.starts_with("|=") {
                    take!(2, PipeEq)
                }
                take!(1, Pipe)
            }
            '^' => {
                if rest.starts_with("^=") {
                    take!(2, CaretEq)
                }
                take!(1, Caret)
            }
            '<' => {
                if rest.starts_with("<<=") {
                    take!(3, LShiftEq)
                }
                if rest.starts_with("<<") {
                    take!(2, LShift)
                }
                if rest.starts_with("<=") {
                    take!(2, LtE)
                }
                take!(1, Lt)
            }
            '>' => {
                if rest.starts_with(">>=") {
                    take!(3, RShiftEq)
                }
                if rest.starts_with(">>") {
                    take!(2, RShift)
                }
                if rest.starts_with(">=") {
                    take!(2, GtE)
                }
                take!(1, Gt)
            }
            '=' => {
                if rest.starts_with("==") {
                    take!(2, EqEq)
                }
                take!(1, Eq)
            }
            '!' => {
                if rest.starts_with("!=") {
                    take!(2, NotEq)
                }
                Err(TokenizeError::UnexpectedChar(c, start))
            }
            other => Err(TokenizeError::UnexpectedChar(other, start)),
        }
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, TokenizeError> {
    Tokenizer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation_produces_matching_indent_and_dedent() {
        let tokens = tokenize("if x:\n    y\nz\n").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| &t.kind).collect();
        assert!(kinds.contains(&&TokenKind::Indent));
        assert!(kinds.contains(&&TokenKind::Dedent));
    }

    #[test]
    fn brackets_suppress_newlines() {
        let tokens = tokenize("x = (\n    1\n)\n").unwrap();
        let newline_count = tokens.iter().filter(|t| t.kind == TokenKind::Newline).count();
        assert_eq!(newline_count, 1);
    }

    #[test]
    fn keywords_are_recognized() {
        let tokens = tokenize("if else while").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::If);
        assert_eq!(tokens[1].kind, TokenKind::Else);
        assert_eq!(tokens[2].kind, TokenKind::While);
    }
}

//! A recursive-descent parser turning a token stream into a
//! [`pipit_python_ast::arena::AstArena`], grounded on the teacher's
//! `ruff_python_parser`: statement parsing dispatches on the leading
//! keyword, expression parsing is precedence-climbing over the binary/bool
//! operators the tokenizer reports.

use camino::Utf8Path;
use pipit_db::TextRange;
use pipit_python_ast::arena::AstArena;
use pipit_python_ast::name::Name;
use pipit_python_ast::node::{
    Alias, BinOp, BoolOp, Comprehension, CmpOp, Constant, ExceptHandler, NodeId, NodeKind, Param,
    ParamKind, UnaryOp, WithItem,
};

use crate::error::ParseError;
use crate::tokenizer::{tokenize, Token, TokenKind};

pub fn parse_module(source: &str, _path: &Utf8Path) -> Result<(AstArena, NodeId), ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        arena: AstArena::new(),
        tokens,
        pos: 0,
    };
    let module = parser.parse_module()?;
    Ok((parser.arena, module))
}

struct Parser {
    arena: AstArena,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn current(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn current_range(&self) -> TextRange {
        self.tokens[self.pos].range
    }

    fn at_eof(&self) -> bool {
        matches!(self.current(), TokenKind::EndMarker)
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.current() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &'static str) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(ParseError::Unexpected {
                found: self.current().clone(),
                offset: self.current_range().start().to_u32(),
                expected,
            })
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.current(), TokenKind::Newline) {
            self.bump();
        }
    }

    fn expect_name(&mut self) -> Result<Name, ParseError> {
        match self.current().clone() {
            TokenKind::Name(name) => {
                self.bump();
                Ok(Name::new(name))
            }
            other => Err(ParseError::Unexpected {
                found: other,
                offset: self.current_range().start().to_u32(),
                expected: "identifier",
            }),
        }
    }

    // --- module / block structure ---

    fn parse_module(&mut self) -> Result<NodeId, ParseError> {
        let mut body = Vec::new();
        self.skip_newlines();
        while !self.at_eof() {
            body.extend(self.parse_statement()?);
            self.skip_newlines();
        }
        Ok(self.arena.push(NodeKind::Module { body: body.clone() }, self.current_range(), &body))
    }

    /// A `:` followed by either a single simple-statement line or an
    /// indented block.
    fn parse_block(&mut self) -> Result<Vec<NodeId>, ParseError> {
        self.expect(&TokenKind::Colon, "':'")?;
        if self.eat(&TokenKind::Newline) {
            self.expect(&TokenKind::Indent, "indented block")?;
            let mut body = Vec::new();
            while !matches!(self.current(), TokenKind::Dedent | TokenKind::EndMarker) {
                body.extend(self.parse_statement()?);
                self.skip_newlines();
            }
            self.eat(&TokenKind::Dedent);
            Ok(body)
        } else {
            let statements = self.parse_simple_statement_line()?;
            Ok(statements)
        }
    }

    fn parse_simple_statement_line(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let mut statements = vec![self.parse_simple_statement()?];
        while self.eat(&TokenKind::Semi) {
            if matches!(self.current(), TokenKind::Newline | TokenKind::EndMarker) {
                break;
            }
            statements.push(self.parse_simple_statement()?);
        }
        self.eat(&TokenKind::Newline);
        Ok(statements)
    }

    // --- statements ---

    fn parse_statement(&mut self) -> Result<Vec<NodeId>, ParseError> {
        match self.current().clone() {
            TokenKind::If => Ok(vec![self.parse_if()?]),
            TokenKind::While => Ok(vec![self.parse_while()?]),
            TokenKind::For => Ok(vec![self.parse_for(false)?]),
            TokenKind::Async => {
                self.bump();
                match self.current().clone() {
                    TokenKind::For => Ok(vec![self.parse_for(true)?]),
                    TokenKind::Def => Ok(vec![self.parse_function_def(true)?]),
                    TokenKind::With => Ok(vec![self.parse_with(true)?]),
                    other => Err(ParseError::Unexpected {
                        found: other,
                        offset: self.current_range().start().to_u32(),
                        expected: "'for', 'def', or 'with' after 'async'",
                    }),
                }
            }
            TokenKind::Def => Ok(vec![self.parse_function_def(false)?]),
            TokenKind::Class => Ok(vec![self.parse_class_def()?]),
            TokenKind::Try => Ok(vec![self.parse_try()?]),
            TokenKind::With => Ok(vec![self.parse_with(false)?]),
            _ => self.parse_simple_statement_line(),
        }
    }

    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        let test = self.parse_expression()?;
        let body = self.parse_block()?;
        self.skip_newlines();
        let or_else = if self.eat(&TokenKind::Elif) {
            self.pos -= 1;
            self.tokens[self.pos].kind = TokenKind::If;
            vec![self.parse_if()?]
        } else if self.eat(&TokenKind::Else) {
            self.parse_block()?
        } else {
            Vec::new()
        };
        let mut children = vec![test];
        children.extend(body.iter().copied());
        children.extend(or_else.iter().copied());
        Ok(self.arena.push(NodeKind::If { test, body, or_else }, start, &children))
    }

    fn parse_while(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        let test = self.parse_expression()?;
        let body = self.parse_block()?;
        self.skip_newlines();
        let or_else = if self.eat(&TokenKind::Else) { self.parse_block()? } else { Vec::new() };
        let mut children = vec![test];
        children.extend(body.iter().copied());
        children.extend(or_else.iter().copied());
        Ok(self.arena.push(NodeKind::While { test, body, or_else }, start, &children))
    }

    fn parse_for(&mut self, is_async: bool) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        let target = self.parse_target_list()?;
        self.expect(&TokenKind::In, "'in'")?;
        let iter = self.parse_expression()?;
        let body = self.parse_block()?;
        self.skip_newlines();
        let or_else = if self.eat(&TokenKind::Else) { self.parse_block()? } else { Vec::new() };
        let mut children = vec![target, iter];
        children.extend(body.iter().copied());
        children.extend(or_else.iter().copied());
        Ok(self.arena.push(
            NodeKind::For { target, iter, body, or_else, is_async },
            start,
            &children,
        ))
    }

    fn parse_with(&mut self, is_async: bool) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        let mut items = Vec::new();
        let mut children = Vec::new();
        loop {
            let context_expr = self.parse_expression()?;
            children.push(context_expr);
            let optional_vars = if self.eat(&TokenKind::As) {
                let target = self.parse_target()?;
                children.push(target);
                Some(target)
            } else {
                None
            };
            items.push(WithItem { context_expr, optional_vars });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let body = self.parse_block()?;
        children.extend(body.iter().copied());
        Ok(self.arena.push(NodeKind::With { items, body, is_async }, start, &children))
    }

    fn parse_try(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        let body = self.parse_block()?;
        self.skip_newlines();
        let mut handlers = Vec::new();
        let mut children = body.clone();
        while matches!(self.current(), TokenKind::Except) {
            let handler_start = self.current_range();
            self.bump();
            let type_ = if !matches!(self.current(), TokenKind::Colon) {
                let ty = self.parse_expression()?;
                children.push(ty);
                Some(ty)
            } else {
                None
            };
            let name = if self.eat(&TokenKind::As) { Some(self.expect_name()?) } else { None };
            let handler_body = self.parse_block()?;
            children.extend(handler_body.iter().copied());
            self.skip_newlines();
            handlers.push(ExceptHandler {
                type_,
                name,
                body: handler_body,
                range: handler_start,
            });
        }
        let or_else = if self.eat(&TokenKind::Else) { self.parse_block()? } else { Vec::new() };
        self.skip_newlines();
        let finally_body = if self.eat(&TokenKind::Finally) { self.parse_block()? } else { Vec::new() };
        children.extend(or_else.iter().copied());
        children.extend(finally_body.iter().copied());
        Ok(self.arena.push(
            NodeKind::Try { body, handlers, or_else, finally_body },
            start,
            &children,
        ))
    }

    fn parse_function_def(&mut self, is_async: bool) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        let name = self.expect_name()?;
        self.expect(&TokenKind::LParen, "'('")?;
        let params = self.parse_param_list()?;
        self.expect(&TokenKind::RParen, "')'")?;
        let returns = if self.eat(&TokenKind::Arrow) { Some(self.parse_expression()?) } else { None };
        let body = self.parse_block()?;
        let mut children: Vec<NodeId> = params.iter().filter_map(|p| p.annotation).collect();
        children.extend(params.iter().filter_map(|p| p.default));
        children.extend(returns);
        children.extend(body.iter().copied());
        Ok(self.arena.push(
            NodeKind::FunctionDef { name, params, returns, body, decorators: Vec::new(), is_async },
            start,
            &children,
        ))
    }

    fn parse_param_list(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();
        while !matches!(self.current(), TokenKind::RParen) {
            let range = self.current_range();
            let kind = if self.eat(&TokenKind::DoubleStar) {
                ParamKind::VarArgDict
            } else if self.eat(&TokenKind::Star) {
                if matches!(self.current(), TokenKind::Comma | TokenKind::RParen) {
                    params.push(Param { kind: ParamKind::BareStarSeparator, name: None, annotation: None, default: None, range });
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                    continue;
                }
                ParamKind::VarArgList
            } else {
                ParamKind::Simple
            };
            let name = Some(self.expect_name()?);
            let annotation = if self.eat(&TokenKind::Colon) { Some(self.parse_expression()?) } else { None };
            let default = if self.eat(&TokenKind::Eq) { Some(self.parse_expression()?) } else { None };
            params.push(Param { kind, name, annotation, default, range });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_class_def(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        let name = self.expect_name()?;
        let bases = if self.eat(&TokenKind::LParen) {
            let mut bases = Vec::new();
            while !matches!(self.current(), TokenKind::RParen) {
                bases.push(self.parse_expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen, "')'")?;
            bases
        } else {
            Vec::new()
        };
        let body = self.parse_block()?;
        let mut children = bases.clone();
        children.extend(body.iter().copied());
        Ok(self.arena.push(NodeKind::ClassDef { name, bases, body, decorators: Vec::new() }, start, &children))
    }

    fn parse_simple_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        match self.current().clone() {
            TokenKind::Pass => {
                self.bump();
                Ok(self.arena.push(NodeKind::Pass, start, &[]))
            }
            TokenKind::Break => {
                self.bump();
                Ok(self.arena.push(NodeKind::Break, start, &[]))
            }
            TokenKind::Continue => {
                self.bump();
                Ok(self.arena.push(NodeKind::Continue, start, &[]))
            }
            TokenKind::Return => {
                self.bump();
                let value = if matches!(self.current(), TokenKind::Newline | TokenKind::Semi | TokenKind::EndMarker) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                let children: Vec<NodeId> = value.into_iter().collect();
                Ok(self.arena.push(NodeKind::Return { value }, start, &children))
            }
            TokenKind::Raise => {
                self.bump();
                let exc = if matches!(self.current(), TokenKind::Newline | TokenKind::Semi | TokenKind::EndMarker) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                let cause = if self.eat(&TokenKind::From) { Some(self.parse_expression()?) } else { None };
                let mut children: Vec<NodeId> = exc.into_iter().collect();
                children.extend(cause);
                Ok(self.arena.push(NodeKind::Raise { exc, cause }, start, &children))
            }
            TokenKind::Assert => {
                self.bump();
                let test = self.parse_expression()?;
                let msg = if self.eat(&TokenKind::Comma) { Some(self.parse_expression()?) } else { None };
                let mut children = vec![test];
                children.extend(msg);
                Ok(self.arena.push(NodeKind::Assert { test, msg }, start, &children))
            }
            TokenKind::Del => {
                self.bump();
                let targets = self.parse_target_comma_list()?;
                Ok(self.arena.push(NodeKind::Delete { targets: targets.clone() }, start, &targets))
            }
            TokenKind::Global => {
                self.bump();
                let names = self.parse_name_comma_list()?;
                Ok(self.arena.push(NodeKind::Global { names }, start, &[]))
            }
            TokenKind::Nonlocal => {
                self.bump();
                let names = self.parse_name_comma_list()?;
                Ok(self.arena.push(NodeKind::Nonlocal { names }, start, &[]))
            }
            TokenKind::Import => self.parse_import(),
            TokenKind::From => self.parse_import_from(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_name_comma_list(&mut self) -> Result<Vec<Name>, ParseError> {
        let mut names = vec![self.expect_name()?];
        while self.eat(&TokenKind::Comma) {
            names.push(self.expect_name()?);
        }
        Ok(names)
    }

    fn parse_target_comma_list(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let mut targets = vec![self.parse_target()?];
        while self.eat(&TokenKind::Comma) {
            targets.push(self.parse_target()?);
        }
        Ok(targets)
    }

    fn parse_import(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        let mut names = Vec::new();
        loop {
            let mut dotted = self.expect_name()?.as_str().to_string();
            while self.eat(&TokenKind::Dot) {
                dotted.push('.');
                dotted.push_str(self.expect_name()?.as_str());
            }
            let asname = if self.eat(&TokenKind::As) { Some(self.expect_name()?) } else { None };
            names.push(Alias { name: Name::new(dotted), asname });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(self.arena.push(NodeKind::Import { names }, start, &[]))
    }

    fn parse_import_from(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        let mut level = 0u32;
        while self.eat(&TokenKind::Dot) {
            level += 1;
        }
        let module = if matches!(self.current(), TokenKind::Import) {
            None
        } else {
            let mut dotted = self.expect_name()?.as_str().to_string();
            while self.eat(&TokenKind::Dot) {
                dotted.push('.');
                dotted.push_str(self.expect_name()?.as_str());
            }
            Some(Name::new(dotted))
        };
        self.expect(&TokenKind::Import, "'import'")?;
        let mut names = Vec::new();
        let parenthesized = self.eat(&TokenKind::LParen);
        if self.eat(&TokenKind::Star) {
            names.push(Alias { name: Name::new("*"), asname: None });
        } else {
            loop {
                let name = self.expect_name()?;
                let asname = if self.eat(&TokenKind::As) { Some(self.expect_name()?) } else { None };
                names.push(Alias { name, asname });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        if parenthesized {
            self.expect(&TokenKind::RParen, "')'")?;
        }
        Ok(self.arena.push(NodeKind::ImportFrom { module, names, level }, start, &[]))
    }

    fn parse_expression_statement(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let first = self.parse_expression()?;
        if self.eat(&TokenKind::Eq) {
            let mut targets = vec![first];
            let mut value = self.parse_expression()?;
            while self.eat(&TokenKind::Eq) {
                targets.push(value);
                value = self.parse_expression()?;
            }
            let mut children = targets.clone();
            children.push(value);
            return Ok(self.arena.push(NodeKind::Assign { targets, value }, start, &children));
        }
        if self.eat(&TokenKind::Colon) {
            let annotation = self.parse_expression()?;
            let value = if self.eat(&TokenKind::Eq) { Some(self.parse_expression()?) } else { None };
            let mut children = vec![first, annotation];
            children.extend(value);
            return Ok(self.arena.push(
                NodeKind::AnnAssign { target: first, annotation, value },
                start,
                &children,
            ));
        }
        if let Some(op) = aug_assign_op(self.current()) {
            self.bump();
            let value = self.parse_expression()?;
            return Ok(self.arena.push(
                NodeKind::AugAssign { target: first, op, value },
                start,
                &[first, value],
            ));
        }
        Ok(self.arena.push(NodeKind::ExprStmt { value: first }, start, &[first]))
    }

    // --- targets (assignment LHS reuses expression parsing; no validation
    // that the result is a valid target, mirroring the spec's binder which
    // tolerates any node shape there). ---

    fn parse_target(&mut self) -> Result<NodeId, ParseError> {
        self.parse_or_expr()
    }

    fn parse_target_list(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let first = self.parse_target()?;
        if !matches!(self.current(), TokenKind::Comma) {
            return Ok(first);
        }
        let mut elements = vec![first];
        while self.eat(&TokenKind::Comma) {
            if matches!(self.current(), TokenKind::In) {
                break;
            }
            elements.push(self.parse_target()?);
        }
        let children = elements.clone();
        Ok(self.arena.push(NodeKind::Tuple { elements }, start, &children))
    }

    // --- expressions ---

    fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let body = self.parse_or_bool()?;
        if self.eat(&TokenKind::If) {
            let test = self.parse_or_bool()?;
            self.expect(&TokenKind::Else, "'else'")?;
            let or_else = self.parse_expression()?;
            return Ok(self.arena.push(
                NodeKind::IfExp { test, body, or_else },
                start,
                &[test, body, or_else],
            ));
        }
        if self.eat(&TokenKind::ColonEq) {
            let value = self.parse_expression()?;
            return Ok(self.arena.push(NodeKind::NamedExpr { target: body, value }, start, &[body, value]));
        }
        Ok(body)
    }

    fn parse_or_bool(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let mut values = vec![self.parse_and_bool()?];
        while self.eat(&TokenKind::Or) {
            values.push(self.parse_and_bool()?);
        }
        if values.len() == 1 {
            return Ok(values.pop().unwrap());
        }
        let children = values.clone();
        Ok(self.arena.push(NodeKind::BoolOp { op: BoolOp::Or, values }, start, &children))
    }

    fn parse_and_bool(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let mut values = vec![self.parse_not()?];
        while self.eat(&TokenKind::And) {
            values.push(self.parse_not()?);
        }
        if values.len() == 1 {
            return Ok(values.pop().unwrap());
        }
        let children = values.clone();
        Ok(self.arena.push(NodeKind::BoolOp { op: BoolOp::And, values }, start, &children))
    }

    fn parse_not(&mut self) -> Result<NodeId, ParseError> {
        if matches!(self.current(), TokenKind::Not) {
            let start = self.current_range();
            self.bump();
            let operand = self.parse_not()?;
            return Ok(self.arena.push(NodeKind::UnaryOp { op: UnaryOp::Not, operand }, start, &[operand]));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let left = self.parse_or_expr()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        loop {
            let op = match self.current().clone() {
                TokenKind::EqEq => CmpOp::Eq,
                TokenKind::NotEq => CmpOp::NotEq,
                TokenKind::Lt => CmpOp::Lt,
                TokenKind::LtE => CmpOp::LtE,
                TokenKind::Gt => CmpOp::Gt,
                TokenKind::GtE => CmpOp::GtE,
                TokenKind::Is => {
                    self.bump();
                    if self.eat(&TokenKind::Not) {
                        comparators.push(self.parse_or_expr()?);
                        ops.push(CmpOp::IsNot);
                        continue;
                    }
                    comparators.push(self.parse_or_expr()?);
                    ops.push(CmpOp::Is);
                    continue;
                }
                TokenKind::Not => {
                    self.bump();
                    self.expect(&TokenKind::In, "'in' after 'not'")?;
                    comparators.push(self.parse_or_expr()?);
                    ops.push(CmpOp::NotIn);
                    continue;
                }
                TokenKind::In => {
                    self.bump();
                    comparators.push(self.parse_or_expr()?);
                    ops.push(CmpOp::In);
                    continue;
                }
                _ => break,
            };
            self.bump();
            comparators.push(self.parse_or_expr()?);
            ops.push(op);
        }
        if ops.is_empty() {
            return Ok(left);
        }
        let mut children = vec![left];
        children.extend(comparators.iter().copied());
        Ok(self.arena.push(NodeKind::Compare { left, ops, comparators }, start, &children))
    }

    /// Binary operators in ascending precedence, lowest first: bitwise `|`,
    /// `^`, `&`, shifts, then `+`/`-`, then `*`/`/`/`//`/`%`/`@`. Each level
    /// is left-associative and falls through to the next-tighter level for
    /// its operands, bottoming out at unary/power in [`Self::parse_unary`].
    fn parse_or_expr(&mut self) -> Result<NodeId, ParseError> {
        self.parse_bit_or()
    }

    fn parse_bit_or(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let mut left = self.parse_bit_xor()?;
        while matches!(self.current(), TokenKind::Pipe) {
            self.bump();
            let right = self.parse_bit_xor()?;
            left = self.arena.push(NodeKind::BinOp { left, op: BinOp::BitOr, right }, start, &[left, right]);
        }
        Ok(left)
    }

    fn parse_bit_xor(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let mut left = self.parse_bit_and()?;
        while matches!(self.current(), TokenKind::Caret) {
            self.bump();
            let right = self.parse_bit_and()?;
            left = self.arena.push(NodeKind::BinOp { left, op: BinOp::BitXor, right }, start, &[left, right]);
        }
        Ok(left)
    }

    fn parse_bit_and(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let mut left = self.parse_shift()?;
        while matches!(self.current(), TokenKind::Amper) {
            self.bump();
            let right = self.parse_shift()?;
            left = self.arena.push(NodeKind::BinOp { left, op: BinOp::BitAnd, right }, start, &[left, right]);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current() {
                TokenKind::LShift => BinOp::LShift,
                TokenKind::RShift => BinOp::RShift,
                _ => break,
            };
            self.bump();
            let right = self.parse_additive()?;
            left = self.arena.push(NodeKind::BinOp { left, op, right }, start, &[left, right]);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_multiplicative()?;
            left = self.arena.push(NodeKind::BinOp { left, op, right }, start, &[left, right]);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current() {
                TokenKind::Star => BinOp::Mult,
                TokenKind::Slash => BinOp::Div,
                TokenKind::DoubleSlash => BinOp::FloorDiv,
                TokenKind::Percent => BinOp::Mod,
                TokenKind::At => BinOp::MatMult,
                _ => break,
            };
            self.bump();
            let right = self.parse_unary()?;
            left = self.arena.push(NodeKind::BinOp { left, op, right }, start, &[left, right]);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let op = match self.current() {
            TokenKind::Minus => Some(UnaryOp::USub),
            TokenKind::Plus => Some(UnaryOp::UAdd),
            TokenKind::Tilde => Some(UnaryOp::Invert),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.parse_unary()?;
            return Ok(self.arena.push(NodeKind::UnaryOp { op, operand }, start, &[operand]));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let base = self.parse_postfix()?;
        if self.eat(&TokenKind::DoubleStar) {
            let exponent = self.parse_unary()?;
            return Ok(self.arena.push(
                NodeKind::BinOp { left: base, op: BinOp::Pow, right: exponent },
                start,
                &[base, exponent],
            ));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let mut expr = self.parse_atom()?;
        loop {
            if self.eat(&TokenKind::Dot) {
                let attr = self.expect_name()?;
                expr = self.arena.push(NodeKind::Attribute { value: expr, attr }, start, &[expr]);
            } else if matches!(self.current(), TokenKind::LParen) {
                expr = self.parse_call(expr, start)?;
            } else if self.eat(&TokenKind::LBracket) {
                let slice = self.parse_subscript_slice()?;
                self.expect(&TokenKind::RBracket, "']'")?;
                expr = self.arena.push(NodeKind::Subscript { value: expr, slice }, start, &[expr, slice]);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_subscript_slice(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        let lower = if matches!(self.current(), TokenKind::Colon) { None } else { Some(self.parse_expression()?) };
        if !matches!(self.current(), TokenKind::Colon) {
            return Ok(lower.unwrap());
        }
        self.bump();
        let upper = if matches!(self.current(), TokenKind::Colon | TokenKind::RBracket) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let step = if self.eat(&TokenKind::Colon) {
            if matches!(self.current(), TokenKind::RBracket) { None } else { Some(self.parse_expression()?) }
        } else {
            None
        };
        let mut children: Vec<NodeId> = lower.into_iter().collect();
        children.extend(upper);
        children.extend(step);
        Ok(self.arena.push(NodeKind::Slice { lower, upper, step }, start, &children))
    }

    fn parse_call(&mut self, func: NodeId, start: TextRange) -> Result<NodeId, ParseError> {
        self.bump();
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        while !matches!(self.current(), TokenKind::RParen) {
            if matches!(self.current(), TokenKind::Star) {
                self.bump();
                args.push(self.parse_expression()?);
            } else if matches!(self.current(), TokenKind::DoubleStar) {
                self.bump();
                let value = self.parse_expression()?;
                keywords.push((None, value));
            } else if let (TokenKind::Name(name), true) = (
                self.current().clone(),
                matches!(self.tokens.get(self.pos + 1).map(|t| &t.kind), Some(TokenKind::Eq)),
            ) {
                self.bump();
                self.bump();
                let value = self.parse_expression()?;
                keywords.push((Some(Name::new(name)), value));
            } else {
                args.push(self.parse_expression()?);
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        let mut children = args.clone();
        children.extend(keywords.iter().map(|(_, v)| *v));
        children.push(func);
        Ok(self.arena.push(NodeKind::Call { func, args, keywords }, start, &children))
    }

    fn parse_atom(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        match self.current().clone() {
            TokenKind::Int(value) => {
                self.bump();
                Ok(self.arena.push(NodeKind::Constant(Constant::Int(value)), start, &[]))
            }
            TokenKind::Float(text) => {
                self.bump();
                Ok(self.arena.push(NodeKind::Constant(Constant::Float(text)), start, &[]))
            }
            TokenKind::Str(text) => {
                self.bump();
                let mut value = text;
                while let TokenKind::Str(more) = self.current().clone() {
                    self.bump();
                    value.push_str(&more);
                }
                Ok(self.arena.push(NodeKind::Constant(Constant::Str(value)), start, &[]))
            }
            TokenKind::True => {
                self.bump();
                Ok(self.arena.push(NodeKind::Constant(Constant::Bool(true)), start, &[]))
            }
            TokenKind::False => {
                self.bump();
                Ok(self.arena.push(NodeKind::Constant(Constant::Bool(false)), start, &[]))
            }
            TokenKind::None_ => {
                self.bump();
                Ok(self.arena.push(NodeKind::Constant(Constant::None), start, &[]))
            }
            TokenKind::Name(name) => {
                self.bump();
                Ok(self.arena.push(NodeKind::Name { id: Name::new(name) }, start, &[]))
            }
            TokenKind::Lambda => self.parse_lambda(),
            TokenKind::LParen => self.parse_paren_expr(),
            TokenKind::LBracket => self.parse_list_or_comp(),
            TokenKind::LBrace => self.parse_dict_or_set(),
            TokenKind::Yield => self.parse_yield(),
            TokenKind::Await => {
                self.bump();
                let value = self.parse_unary()?;
                Ok(self.arena.push(NodeKind::Await { value }, start, &[value]))
            }
            other => Err(ParseError::Unexpected {
                found: other,
                offset: start.start().to_u32(),
                expected: "an expression",
            }),
        }
    }

    fn parse_yield(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        if self.eat(&TokenKind::From) {
            let value = self.parse_expression()?;
            return Ok(self.arena.push(NodeKind::YieldFrom { value }, start, &[value]));
        }
        let value = if matches!(self.current(), TokenKind::Newline | TokenKind::RParen | TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let children: Vec<NodeId> = value.into_iter().collect();
        Ok(self.arena.push(NodeKind::Yield { value }, start, &children))
    }

    fn parse_lambda(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        let mut params = Vec::new();
        while !matches!(self.current(), TokenKind::Colon) {
            let range = self.current_range();
            let name = Some(self.expect_name()?);
            let default = if self.eat(&TokenKind::Eq) { Some(self.parse_expression()?) } else { None };
            params.push(Param { kind: ParamKind::Simple, name, annotation: None, default, range });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Colon, "':'")?;
        let body = self.parse_expression()?;
        let mut children: Vec<NodeId> = params.iter().filter_map(|p| p.default).collect();
        children.push(body);
        Ok(self.arena.push(NodeKind::Lambda { params, body }, start, &children))
    }

    fn parse_paren_expr(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        if self.eat(&TokenKind::RParen) {
            return Ok(self.arena.push(NodeKind::Tuple { elements: Vec::new() }, start, &[]));
        }
        let first = self.parse_expression()?;
        if let Some(generators) = self.try_parse_comprehension()? {
            self.expect(&TokenKind::RParen, "')'")?;
            let mut children: Vec<NodeId> = vec![first];
            children.extend(generators.iter().map(|g| g.iter));
            return Ok(self.arena.push(NodeKind::GeneratorExp { element: first, generators }, start, &children));
        }
        if matches!(self.current(), TokenKind::Comma) {
            let mut elements = vec![first];
            while self.eat(&TokenKind::Comma) {
                if matches!(self.current(), TokenKind::RParen) {
                    break;
                }
                elements.push(self.parse_expression()?);
            }
            self.expect(&TokenKind::RParen, "')'")?;
            let children = elements.clone();
            return Ok(self.arena.push(NodeKind::Tuple { elements }, start, &children));
        }
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(first)
    }

    fn try_parse_comprehension(&mut self) -> Result<Option<Vec<Comprehension>>, ParseError> {
        if !matches!(self.current(), TokenKind::For) {
            return Ok(None);
        }
        let mut generators = Vec::new();
        while self.eat(&TokenKind::For) {
            let target = self.parse_target_list()?;
            self.expect(&TokenKind::In, "'in'")?;
            let iter = self.parse_or_bool()?;
            let mut ifs = Vec::new();
            while self.eat(&TokenKind::If) {
                ifs.push(self.parse_or_bool()?);
            }
            generators.push(Comprehension { target, iter, ifs, is_async: false });
        }
        Ok(Some(generators))
    }

    fn parse_list_or_comp(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        if self.eat(&TokenKind::RBracket) {
            return Ok(self.arena.push(NodeKind::List { elements: Vec::new() }, start, &[]));
        }
        let first = self.parse_expression()?;
        if let Some(generators) = self.try_parse_comprehension()? {
            self.expect(&TokenKind::RBracket, "']'")?;
            let mut children = vec![first];
            children.extend(generators.iter().map(|g| g.iter));
            return Ok(self.arena.push(NodeKind::ListComp { element: first, generators }, start, &children));
        }
        let mut elements = vec![first];
        while self.eat(&TokenKind::Comma) {
            if matches!(self.current(), TokenKind::RBracket) {
                break;
            }
            elements.push(self.parse_expression()?);
        }
        self.expect(&TokenKind::RBracket, "']'")?;
        let children = elements.clone();
        Ok(self.arena.push(NodeKind::List { elements }, start, &children))
    }

    fn parse_dict_or_set(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_range();
        self.bump();
        if self.eat(&TokenKind::RBrace) {
            return Ok(self.arena.push(NodeKind::Dict { keys: Vec::new(), values: Vec::new() }, start, &[]));
        }
        let first_key = self.parse_expression()?;
        if self.eat(&TokenKind::Colon) {
            let first_value = self.parse_expression()?;
            if let Some(generators) = self.try_parse_comprehension()? {
                self.expect(&TokenKind::RBrace, "'}'")?;
                let mut children = vec![first_key, first_value];
                children.extend(generators.iter().map(|g| g.iter));
                return Ok(self.arena.push(
                    NodeKind::DictComp { key: first_key, value: first_value, generators },
                    start,
                    &children,
                ));
            }
            let mut keys = vec![Some(first_key)];
            let mut values = vec![first_value];
            while self.eat(&TokenKind::Comma) {
                if matches!(self.current(), TokenKind::RBrace) {
                    break;
                }
                if self.eat(&TokenKind::DoubleStar) {
                    keys.push(None);
                    values.push(self.parse_expression()?);
                    continue;
                }
                let key = self.parse_expression()?;
                self.expect(&TokenKind::Colon, "':'")?;
                let value = self.parse_expression()?;
                keys.push(Some(key));
                values.push(value);
            }
            self.expect(&TokenKind::RBrace, "'}'")?;
            let mut children: Vec<NodeId> = keys.iter().filter_map(|k| *k).collect();
            children.extend(values.iter().copied());
            return Ok(self.arena.push(NodeKind::Dict { keys, values }, start, &children));
        }
        if let Some(generators) = self.try_parse_comprehension()? {
            self.expect(&TokenKind::RBrace, "'}'")?;
            let mut children = vec![first_key];
            children.extend(generators.iter().map(|g| g.iter));
            return Ok(self.arena.push(NodeKind::SetComp { element: first_key, generators }, start, &children));
        }
        let mut elements = vec![first_key];
        while self.eat(&TokenKind::Comma) {
            if matches!(self.current(), TokenKind::RBrace) {
                break;
            }
            elements.push(self.parse_expression()?);
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        let children = elements.clone();
        Ok(self.arena.push(NodeKind::Set { elements }, start, &children))
    }
}

fn aug_assign_op(kind: &TokenKind) -> Option<BinOp> {
    Some(match kind {
        TokenKind::PlusEq => BinOp::Add,
        TokenKind::MinusEq => BinOp::Sub,
        TokenKind::StarEq => BinOp::Mult,
        TokenKind::SlashEq => BinOp::Div,
        TokenKind::DoubleSlashEq => BinOp::FloorDiv,
        TokenKind::PercentEq => BinOp::Mod,
        TokenKind::DoubleStarEq => BinOp::Pow,
        TokenKind::AmperEq => BinOp::BitAnd,
        TokenKind::PipeEq => BinOp::BitOr,
        TokenKind::CaretEq => BinOp::BitXor,
        TokenKind::LShiftEq => BinOp::LShift,
        TokenKind::RShiftEq => BinOp::RShift,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use camino::Utf8Path;
    use pipit_python_ast::{Constant, NodeKind};

    use super::parse_module;

    fn parse(source: &str) -> (pipit_python_ast::AstArena, pipit_python_ast::NodeId) {
        parse_module(source, Utf8Path::new("test.py")).expect("parse should succeed")
    }

    #[test]
    fn parses_a_simple_assignment() {
        let (arena, module) = parse("x = 1\n");
        let NodeKind::Module { body } = arena.kind(module) else { panic!("expected module") };
        assert_eq!(body.len(), 1);
        let NodeKind::Assign { targets, value } = arena.kind(body[0]) else { panic!("expected assign") };
        assert_eq!(targets.len(), 1);
        assert!(matches!(arena.kind(*value), NodeKind::Constant(Constant::Int(1))));
    }

    #[test]
    fn parses_if_elif_else() {
        let (arena, module) = parse("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
        let NodeKind::Module { body } = arena.kind(module) else { panic!("expected module") };
        assert_eq!(body.len(), 1);
        let NodeKind::If { or_else, .. } = arena.kind(body[0]) else { panic!("expected if") };
        assert_eq!(or_else.len(), 1);
        assert!(matches!(arena.kind(or_else[0]), NodeKind::If { .. }));
    }

    #[test]
    fn parses_function_def_with_params_and_return() {
        let (arena, module) = parse("def f(a, b=1):\n    return a + b\n");
        let NodeKind::Module { body } = arena.kind(module) else { panic!("expected module") };
        let NodeKind::FunctionDef { params, body: fn_body, .. } = arena.kind(body[0]) else {
            panic!("expected function def")
        };
        assert_eq!(params.len(), 2);
        assert_eq!(fn_body.len(), 1);
        assert!(matches!(arena.kind(fn_body[0]), NodeKind::Return { value: Some(_) }));
    }

    #[test]
    fn respects_binary_operator_precedence() {
        let (arena, module) = parse("x = 1 + 2 * 3\n");
        let NodeKind::Module { body } = arena.kind(module) else { panic!("expected module") };
        let NodeKind::Assign { value, .. } = arena.kind(body[0]) else { panic!("expected assign") };
        let NodeKind::BinOp { left, op, .. } = arena.kind(*value) else { panic!("expected binop") };
        assert_eq!(*op, pipit_python_ast::BinOp::Add);
        assert!(matches!(arena.kind(*left), NodeKind::Constant(Constant::Int(1))));
    }

    #[test]
    fn parses_a_for_loop_over_a_call() {
        let (arena, module) = parse("for item in items():\n    pass\n");
        let NodeKind::Module { body } = arena.kind(module) else { panic!("expected module") };
        assert!(matches!(arena.kind(body[0]), NodeKind::For { .. }));
    }
}

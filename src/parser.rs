//! Recursive-descent parser producing the parse tree consumed by the AST
//! builder. Expression productions keep the grammar's nesting (`sum` →
//! `product` → `atomic`, lists right-recursive) rather than flattening;
//! collapsing is the builder's job.

use crate::errors::{CompilerError, ErrorKind};
use crate::lexer::Token;
use crate::parse_tree::{NodeKind, ParseNode};
use crate::types;

pub struct Parser {
    tokens: Vec<(Token, usize, usize)>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<(Token, usize, usize)>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _, _)| t)
    }

    fn peek_at(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(t, _, _)| t)
    }

    fn advance(&mut self) -> Option<(Token, usize, usize)> {
        let next = self.tokens.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn error(&self, expected: &str) -> CompilerError {
        let (line, column) = self
            .tokens
            .get(self.pos)
            .map(|&(_, l, c)| (l, c))
            .or_else(|| self.tokens.last().map(|&(_, l, c)| (l, c)))
            .unwrap_or((1, 1));
        let found = match self.tokens.get(self.pos) {
            Some((token, _, _)) => format!(", found {}", token),
            None => ", found end of input".to_string(),
        };
        CompilerError::new(
            ErrorKind::UnexpectedToken(format!("{}{}", expected, found)),
            line,
            column,
        )
    }

    fn expect(&mut self, expected: &Token, description: &str) -> Result<(usize, usize), CompilerError> {
        if let Some((token, line, column)) = self.tokens.get(self.pos).cloned() {
            if &token == expected {
                self.pos += 1;
                return Ok((line, column));
            }
        }
        Err(self.error(description))
    }

    fn expect_ident(&mut self, description: &str) -> Result<(String, usize, usize), CompilerError> {
        if let Some((Token::Ident(name), line, column)) = self.tokens.get(self.pos).cloned() {
            self.pos += 1;
            return Ok((name, line, column));
        }
        Err(self.error(description))
    }

    pub fn parse_program(&mut self) -> Result<ParseNode, CompilerError> {
        let mut node = ParseNode::new(NodeKind::Program, 1, 1);
        while let Some(token) = self.peek() {
            match token {
                Token::KwFn => node.children.push(self.parse_function_def()?),
                Token::KwRegion => node.children.push(self.parse_region()?),
                _ => return Err(self.error("'fn', 'region'")),
            }
        }
        Ok(node)
    }

    fn parse_function_def(&mut self) -> Result<ParseNode, CompilerError> {
        let (line, column) = self.expect(&Token::KwFn, "'fn'")?;
        let (name, l, c) = self.expect_ident("a function name")?;
        let mut children = vec![ParseNode::leaf(NodeKind::FIdent, name, l, c)];
        self.expect(&Token::ParenOpen, "'('")?;
        if self.peek() != Some(&Token::ParenClose) {
            children.push(self.parse_arg_list()?);
        }
        self.expect(&Token::ParenClose, "')'")?;
        children.push(self.parse_block()?);
        Ok(ParseNode::with_children(
            NodeKind::FunctionDef,
            children,
            line,
            column,
        ))
    }

    fn parse_arg_list(&mut self) -> Result<ParseNode, CompilerError> {
        let arg = self.parse_arg()?;
        let (line, column) = (arg.line, arg.column);
        let mut children = vec![arg];
        if self.peek() == Some(&Token::Comma) {
            self.advance();
            children.push(self.parse_arg_list()?);
        }
        Ok(ParseNode::with_children(
            NodeKind::ArgList,
            children,
            line,
            column,
        ))
    }

    fn parse_arg(&mut self) -> Result<ParseNode, CompilerError> {
        let ty = self.parse_type()?;
        let (line, column) = (ty.line, ty.column);
        let (name, l, c) = self.expect_ident("an argument name")?;
        Ok(ParseNode::with_children(
            NodeKind::Arg,
            vec![ty, ParseNode::leaf(NodeKind::VIdent, name, l, c)],
            line,
            column,
        ))
    }

    fn parse_type(&mut self) -> Result<ParseNode, CompilerError> {
        match self.tokens.get(self.pos).cloned() {
            Some((Token::RegTypeName(name), line, column))
            | Some((Token::Ident(name), line, column)) => {
                self.pos += 1;
                Ok(ParseNode::leaf(NodeKind::Type, name, line, column))
            }
            _ => Err(self.error("a type name")),
        }
    }

    fn parse_region(&mut self) -> Result<ParseNode, CompilerError> {
        let (line, column) = self.expect(&Token::KwRegion, "'region'")?;
        let (name, l, c) = self.expect_ident("a region name")?;
        let r_ident = ParseNode::leaf(NodeKind::RIdent, name, l, c);
        self.expect(&Token::OpLt, "'<'")?;
        let cap = self.parse_uint()?;
        self.expect(&Token::OpGt, "'>'")?;
        let block = self.parse_block()?;
        Ok(ParseNode::with_children(
            NodeKind::Region,
            vec![r_ident, cap, block],
            line,
            column,
        ))
    }

    fn parse_uint(&mut self) -> Result<ParseNode, CompilerError> {
        if let Some((Token::UIntLiteral(value), line, column)) = self.tokens.get(self.pos).cloned()
        {
            self.pos += 1;
            return Ok(ParseNode::leaf(NodeKind::UInt, value.to_string(), line, column));
        }
        Err(self.error("an unsigned integer"))
    }

    fn parse_block(&mut self) -> Result<ParseNode, CompilerError> {
        let (line, column) = self.expect(&Token::BraceOpen, "'{'")?;
        let mut children = Vec::new();
        while self.peek() != Some(&Token::BraceClose) {
            if self.peek().is_none() {
                return Err(self.error("'}'"));
            }
            children.push(self.parse_statement()?);
        }
        self.expect(&Token::BraceClose, "'}'")?;
        Ok(ParseNode::with_children(
            NodeKind::Block,
            children,
            line,
            column,
        ))
    }

    fn parse_statement(&mut self) -> Result<ParseNode, CompilerError> {
        match self.peek() {
            Some(Token::KwIf) => self.parse_if(),
            Some(Token::KwMeasure) => {
                let stmt = self.parse_measurement()?;
                self.expect(&Token::Semicolon, "';'")?;
                Ok(stmt)
            }
            Some(Token::RegTypeName(_)) => {
                let stmt = self.parse_declaration()?;
                self.expect(&Token::Semicolon, "';'")?;
                Ok(stmt)
            }
            Some(Token::Ident(_)) => {
                let stmt = if self.peek_at(1) == Some(&Token::ParenOpen) {
                    self.parse_function_call()?
                } else {
                    self.parse_declaration()?
                };
                self.expect(&Token::Semicolon, "';'")?;
                Ok(stmt)
            }
            _ => Err(self.error("a statement")),
        }
    }

    fn parse_declaration(&mut self) -> Result<ParseNode, CompilerError> {
        let ty = self.parse_type()?;
        let typename = ty.value.clone().unwrap_or_default();
        let (line, column) = (ty.line, ty.column);
        let (name, l, c) = self.expect_ident("a variable name")?;
        let name_node = ParseNode::leaf(NodeKind::VIdent, name, l, c);
        self.expect(&Token::OpAssign, "'='")?;

        // Both declaration forms share the `^bits^` literal syntax, so the
        // declared type picks the production.
        if types::is_quantum(&typename) {
            let literal = self.parse_bit_literal(NodeKind::QLit)?;
            Ok(ParseNode::with_children(
                NodeKind::QDeclaration,
                vec![ty, name_node, literal],
                line,
                column,
            ))
        } else {
            let expr = if matches!(self.peek(), Some(Token::BitString(_))) {
                self.parse_bit_literal(NodeKind::CLit)?
            } else {
                self.parse_sum()?
            };
            Ok(ParseNode::with_children(
                NodeKind::Declaration,
                vec![ty, name_node, expr],
                line,
                column,
            ))
        }
    }

    fn parse_bit_literal(&mut self, kind: NodeKind) -> Result<ParseNode, CompilerError> {
        if let Some((Token::BitString(bits), line, column)) = self.tokens.get(self.pos).cloned() {
            self.pos += 1;
            let children = bits
                .chars()
                .enumerate()
                .map(|(i, bit)| ParseNode::leaf(NodeKind::Bit, bit.to_string(), line, column + 1 + i))
                .collect();
            return Ok(ParseNode::with_children(kind, children, line, column));
        }
        Err(self.error("a bit literal"))
    }

    fn parse_function_call(&mut self) -> Result<ParseNode, CompilerError> {
        let (name, line, column) = self.expect_ident("a function name")?;
        let mut children = vec![ParseNode::leaf(NodeKind::FIdent, name, line, column)];
        self.expect(&Token::ParenOpen, "'('")?;
        if self.peek() != Some(&Token::ParenClose) {
            children.push(self.parse_call_list()?);
        }
        self.expect(&Token::ParenClose, "')'")?;
        Ok(ParseNode::with_children(
            NodeKind::FunctionCall,
            children,
            line,
            column,
        ))
    }

    fn parse_call_list(&mut self) -> Result<ParseNode, CompilerError> {
        let item = self.parse_call_arg()?;
        let (line, column) = (item.line, item.column);
        let mut children = vec![item];
        if self.peek() == Some(&Token::Comma) {
            self.advance();
            children.push(self.parse_call_list()?);
        }
        Ok(ParseNode::with_children(
            NodeKind::CallList,
            children,
            line,
            column,
        ))
    }

    fn parse_call_arg(&mut self) -> Result<ParseNode, CompilerError> {
        if matches!(self.peek(), Some(Token::Ident(_)))
            && self.peek_at(1) == Some(&Token::BracketOpen)
        {
            return self.parse_quantum_access();
        }
        self.parse_sum()
    }

    /// `name[i]` or `name[a:b]`.
    fn parse_quantum_access(&mut self) -> Result<ParseNode, CompilerError> {
        let (name, line, column) = self.expect_ident("a variable name")?;
        let v_ident = ParseNode::leaf(NodeKind::VIdent, name, line, column);
        self.expect(&Token::BracketOpen, "'['")?;
        let first = self.parse_uint()?;
        if self.peek() == Some(&Token::Colon) {
            self.advance();
            let second = self.parse_uint()?;
            self.expect(&Token::BracketClose, "']'")?;
            return Ok(ParseNode::with_children(
                NodeKind::QSlice,
                vec![v_ident, first, second],
                line,
                column,
            ));
        }
        self.expect(&Token::BracketClose, "']'")?;
        Ok(ParseNode::with_children(
            NodeKind::QIndex,
            vec![v_ident, first],
            line,
            column,
        ))
    }

    fn parse_if(&mut self) -> Result<ParseNode, CompilerError> {
        let (line, column) = self.expect(&Token::KwIf, "'if'")?;
        self.expect(&Token::ParenOpen, "'('")?;
        let condition = self.parse_b_expr()?;
        self.expect(&Token::ParenClose, "')'")?;
        let block = self.parse_block()?;
        Ok(ParseNode::with_children(
            NodeKind::If,
            vec![condition, block],
            line,
            column,
        ))
    }

    fn parse_b_expr(&mut self) -> Result<ParseNode, CompilerError> {
        let left = self.parse_sum()?;
        let (line, column) = (left.line, left.column);
        let kind = match self.peek() {
            Some(Token::OpEq) => NodeKind::Eq,
            Some(Token::OpNeq) => NodeKind::Neq,
            Some(Token::OpGt) => NodeKind::Greater,
            Some(Token::OpLt) => NodeKind::Lesser,
            _ => return Err(self.error("'==', '!=', '>', '<'")),
        };
        self.advance();
        let right = self.parse_sum()?;
        let comparison = ParseNode::with_children(kind, vec![left, right], line, column);
        Ok(ParseNode::with_children(
            NodeKind::BExpr,
            vec![comparison],
            line,
            column,
        ))
    }

    fn parse_sum(&mut self) -> Result<ParseNode, CompilerError> {
        let first = self.parse_product()?;
        let (line, column) = (first.line, first.column);
        let mut node = ParseNode::with_children(NodeKind::Sum, vec![first], line, column);
        loop {
            let kind = match self.peek() {
                Some(Token::OpAdd) => NodeKind::Add,
                Some(Token::OpSub) => NodeKind::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_product()?;
            let op = ParseNode::with_children(kind, vec![node, right], line, column);
            node = ParseNode::with_children(NodeKind::Sum, vec![op], line, column);
        }
        Ok(node)
    }

    fn parse_product(&mut self) -> Result<ParseNode, CompilerError> {
        let first = self.parse_atomic()?;
        let (line, column) = (first.line, first.column);
        let mut node = ParseNode::with_children(NodeKind::Product, vec![first], line, column);
        loop {
            let kind = match self.peek() {
                Some(Token::OpMul) => NodeKind::Mul,
                Some(Token::OpDiv) => NodeKind::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_atomic()?;
            let op = ParseNode::with_children(kind, vec![node, right], line, column);
            node = ParseNode::with_children(NodeKind::Product, vec![op], line, column);
        }
        Ok(node)
    }

    fn parse_atomic(&mut self) -> Result<ParseNode, CompilerError> {
        match self.tokens.get(self.pos).cloned() {
            Some((Token::UIntLiteral(value), line, column)) => {
                self.pos += 1;
                let leaf = ParseNode::leaf(NodeKind::UInt, value.to_string(), line, column);
                Ok(ParseNode::with_children(
                    NodeKind::Atomic,
                    vec![leaf],
                    line,
                    column,
                ))
            }
            Some((Token::Ident(name), line, column)) => {
                self.pos += 1;
                let leaf = ParseNode::leaf(NodeKind::VIdent, name, line, column);
                Ok(ParseNode::with_children(
                    NodeKind::Atomic,
                    vec![leaf],
                    line,
                    column,
                ))
            }
            Some((Token::ParenOpen, line, column)) => {
                self.pos += 1;
                let inner = self.parse_sum()?;
                self.expect(&Token::ParenClose, "')'")?;
                let paren = ParseNode::with_children(NodeKind::Paren, vec![inner], line, column);
                Ok(ParseNode::with_children(
                    NodeKind::Atomic,
                    vec![paren],
                    line,
                    column,
                ))
            }
            _ => Err(self.error("an expression")),
        }
    }

    fn parse_measurement(&mut self) -> Result<ParseNode, CompilerError> {
        let (line, column) = self.expect(&Token::KwMeasure, "'measure'")?;
        let q_expr = if matches!(self.peek(), Some(Token::Ident(_)))
            && self.peek_at(1) == Some(&Token::BracketOpen)
        {
            self.parse_quantum_access()?
        } else {
            let (name, l, c) = self.expect_ident("a quantum variable")?;
            ParseNode::leaf(NodeKind::VIdent, name, l, c)
        };
        self.expect(&Token::Arrow, "'->'")?;
        let (r_name, l, c) = self.expect_ident("a classical register")?;
        let r_node = ParseNode::leaf(NodeKind::VIdent, r_name, l, c);
        self.expect(&Token::BracketOpen, "'['")?;
        let start = self.parse_uint()?;
        self.expect(&Token::BracketClose, "']'")?;
        Ok(ParseNode::with_children(
            NodeKind::Measurement,
            vec![q_expr, r_node, start],
            line,
            column,
        ))
    }
}

//! Recursive-descent parser for the script language.
//!
//! Grammar, lowest to highest precedence:
//!
//! ```text
//! program     -> declaration* EOF
//! declaration -> function | var_decl | statement
//! statement   -> if | while | for | return | block | expr ";"
//! assignment  -> IDENT "=" assignment | logic_or
//! logic_or    -> logic_and ( "or" logic_and )*
//! logic_and   -> equality ( "and" equality )*
//! equality    -> comparison ( ( "==" | "!=" ) comparison )*
//! comparison  -> term ( ( ">" | ">=" | "<" | "<=" ) term )*
//! term        -> factor ( ( "+" | "-" ) factor )*
//! factor      -> unary ( ( "*" | "/" ) unary )*
//! unary       -> ( "!" | "-" ) unary | call
//! call        -> primary ( "(" args? ")" | "." IDENT )*
//! primary     -> literal | IDENT | "(" expression ")"
//! ```
use std::ops::Range;
use std::sync::Arc;

use thiserror::Error;

use crate::script::ast::{Expr, FunctionDecl, Literal, LogicalOp, Program, Stmt};
use crate::script::lexer::{tokenize, Token};
use crate::value::{BinaryOp, UnaryOp};

/// Syntax error with the byte offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at offset {offset}: {message}")]
pub struct ParseError {
    message: String,
    offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Parses a complete script.
pub fn parse(source: &str) -> ParseResult<Program> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(tokens, source.len());
    let mut statements = Vec::new();
    while !parser.at_end() {
        statements.push(parser.declaration()?);
    }
    Ok(Program::new(statements))
}

struct Parser {
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
    eof: usize,
}

impl Parser {
    fn new(tokens: Vec<(Token, Range<usize>)>, eof: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            eof,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.eof)
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek() == Some(expected)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, context: &str) -> ParseResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}' {}", expected, context)))
        }
    }

    fn expect_ident(&mut self, context: &str) -> ParseResult<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(&format!("identifier {}", context))),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let found = match self.peek() {
            Some(token) => format!("'{}'", token),
            None => "end of input".to_owned(),
        };
        ParseError::new(format!("expected {}, found {}", expected, found), self.offset())
    }

    fn declaration(&mut self) -> ParseResult<Stmt> {
        if self.eat(&Token::Function) {
            return self.function();
        }
        if self.eat(&Token::Var) {
            return self.var_declaration();
        }
        self.statement()
    }

    fn function(&mut self) -> ParseResult<Stmt> {
        let name = self.expect_ident("after 'function'")?;
        self.expect(&Token::LParen, "after function name")?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                params.push(self.expect_ident("in parameter list")?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "after parameters")?;
        self.expect(&Token::LBrace, "before function body")?;
        let body = self.block()?;
        Ok(Stmt::Function(Arc::new(FunctionDecl { name, params, body })))
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.expect_ident("after 'var'")?;
        let init = if self.eat(&Token::Eq) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(&Token::Semicolon, "after variable declaration")?;
        Ok(Stmt::Var { name, init })
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.peek() {
            Some(Token::If) => {
                self.pos += 1;
                self.if_statement()
            }
            Some(Token::While) => {
                self.pos += 1;
                self.expect(&Token::LParen, "after 'while'")?;
                let condition = self.expression()?;
                self.expect(&Token::RParen, "after condition")?;
                let body = Box::new(self.statement()?);
                Ok(Stmt::While { condition, body })
            }
            Some(Token::For) => {
                self.pos += 1;
                self.for_statement()
            }
            Some(Token::Return) => {
                self.pos += 1;
                let value = if self.check(&Token::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(&Token::Semicolon, "after return value")?;
                Ok(Stmt::Return(value))
            }
            Some(Token::LBrace) => {
                self.pos += 1;
                Ok(Stmt::Block(self.block()?))
            }
            _ => {
                let expr = self.expression()?;
                self.expect(&Token::Semicolon, "after expression")?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(&Token::LParen, "after 'if'")?;
        let condition = self.expression()?;
        self.expect(&Token::RParen, "after condition")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.eat(&Token::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// `for` is lowered to a `while` inside a block.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(&Token::LParen, "after 'for'")?;
        let init = if self.eat(&Token::Semicolon) {
            None
        } else if self.eat(&Token::Var) {
            Some(self.var_declaration()?)
        } else {
            let expr = self.expression()?;
            self.expect(&Token::Semicolon, "after loop initializer")?;
            Some(Stmt::Expression(expr))
        };
        let condition = if self.check(&Token::Semicolon) {
            Expr::Literal(Literal::Boolean(true))
        } else {
            self.expression()?
        };
        self.expect(&Token::Semicolon, "after loop condition")?;
        let increment = if self.check(&Token::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(&Token::RParen, "after for clauses")?;

        let mut body = self.statement()?;
        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }
        let mut lowered = Vec::with_capacity(2);
        lowered.extend(init);
        lowered.push(Stmt::While {
            condition,
            body: Box::new(body),
        });
        Ok(Stmt::Block(lowered))
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(&Token::RBrace) && !self.at_end() {
            statements.push(self.declaration()?);
        }
        self.expect(&Token::RBrace, "after block")?;
        Ok(statements)
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let offset = self.offset();
        let target = self.logic_or()?;
        if !self.eat(&Token::Eq) {
            return Ok(target);
        }
        let value = self.assignment()?;
        match target {
            Expr::Variable(name) => Ok(Expr::Assign {
                name,
                value: Box::new(value),
            }),
            _ => Err(ParseError::new("invalid assignment target", offset)),
        }
    }

    fn logic_or(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.logic_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.logic_and()?;
            lhs = Expr::Logical {
                op: LogicalOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn logic_and(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.binary_level(0)?;
        while self.eat(&Token::And) {
            let rhs = self.binary_level(0)?;
            lhs = Expr::Logical {
                op: LogicalOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    /// Left-associative binary operator levels.
    fn binary_level(&mut self, level: usize) -> ParseResult<Expr> {
        if level == BINARY_LEVELS {
            return self.unary();
        }
        let mut lhs = self.binary_level(level + 1)?;
        while let Some(op) = self.peek().and_then(|t| binary_op(level, t)) {
            self.pos += 1;
            let rhs = self.binary_level(level + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            _ => return self.call(),
        };
        self.pos += 1;
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::LParen) {
                let mut args = Vec::new();
                if !self.check(&Token::RParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&Token::RParen, "after arguments")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else if self.eat(&Token::Dot) {
                let name = self.expect_ident("after '.'")?;
                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let expr = match self.peek() {
            Some(Token::True) => Expr::Literal(Literal::Boolean(true)),
            Some(Token::False) => Expr::Literal(Literal::Boolean(false)),
            Some(Token::Null) => Expr::Literal(Literal::Null),
            Some(Token::Integer(v)) => Expr::Literal(Literal::Integer(*v)),
            Some(Token::Float(v)) => Expr::Literal(Literal::Float(*v)),
            Some(Token::Str(s)) => Expr::Literal(Literal::String(s.clone())),
            Some(Token::Ident(name)) => Expr::Variable(name.clone()),
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.expression()?;
                self.expect(&Token::RParen, "after expression")?;
                return Ok(inner);
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.pos += 1;
        Ok(expr)
    }
}

/// Equality, comparison, term, factor.
const BINARY_LEVELS: usize = 4;

fn binary_op(level: usize, token: &Token) -> Option<BinaryOp> {
    let op = match (level, token) {
        (0, Token::EqEq) => BinaryOp::Eq,
        (0, Token::BangEq) => BinaryOp::Ne,
        (1, Token::Gt) => BinaryOp::Gt,
        (1, Token::Ge) => BinaryOp::Ge,
        (1, Token::Lt) => BinaryOp::Lt,
        (1, Token::Le) => BinaryOp::Le,
        (2, Token::Plus) => BinaryOp::Add,
        (2, Token::Minus) => BinaryOp::Sub,
        (3, Token::Star) => BinaryOp::Mul,
        (3, Token::Slash) => BinaryOp::Div,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_expr(source: &str) -> Expr {
        let program = parse(source).expect("parses");
        match program.statements() {
            [Stmt::Expression(e)] => e.clone(),
            other => panic!("expected one expression statement, got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let e = single_expr("1 + 2 * 3;");
        match e {
            Expr::Binary {
                op: BinaryOp::Add,
                rhs,
                ..
            } => assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Mul, .. })),
            other => panic!("unexpected tree {other:?}"),
        }
    }

    #[test]
    fn subtraction_is_left_associative() {
        let e = single_expr("5 - 2 - 1;");
        match e {
            Expr::Binary {
                op: BinaryOp::Sub,
                lhs,
                rhs,
            } => {
                assert!(matches!(*lhs, Expr::Binary { op: BinaryOp::Sub, .. }));
                assert_eq!(*rhs, Expr::Literal(Literal::Integer(1)));
            }
            other => panic!("unexpected tree {other:?}"),
        }
    }

    #[test]
    fn dotted_member_chain() {
        let e = single_expr("a.b.c;");
        assert_eq!(e.dotted_path().as_deref(), Some("a.b.c"));
    }

    #[test]
    fn assignment_is_right_associative() {
        let e = single_expr("a = b = 1;");
        match e {
            Expr::Assign { name, value } => {
                assert_eq!(name, "a");
                assert!(matches!(*value, Expr::Assign { .. }));
            }
            other => panic!("unexpected tree {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_assignment_target() {
        let err = parse("1 = 2;").expect_err("literal is not assignable");
        assert!(err.message().contains("assignment"));
        assert_eq!(err.offset(), 0);
    }

    #[test]
    fn for_loop_is_lowered_to_while() {
        let program = parse("for (var i = 0; i < 3; i = i + 1) { print(i); }").expect("parses");
        match program.statements() {
            [Stmt::Block(inner)] => {
                assert!(matches!(inner[0], Stmt::Var { .. }));
                assert!(matches!(inner[1], Stmt::While { .. }));
            }
            other => panic!("unexpected lowering {other:?}"),
        }
    }

    #[test]
    fn function_declaration_with_params() {
        let program = parse("function add(a, b) { return a + b; }").expect("parses");
        match program.statements() {
            [Stmt::Function(decl)] => {
                assert_eq!(decl.name, "add");
                assert_eq!(decl.params, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(decl.body.len(), 1);
            }
            other => panic!("unexpected program {other:?}"),
        }
    }

    #[test]
    fn missing_semicolon_reports_end_of_input() {
        let err = parse("1 + 2").expect_err("needs ';'");
        assert!(err.message().contains("end of input"));
        assert_eq!(err.offset(), 5);
    }

    #[test]
    fn logical_keywords() {
        let e = single_expr("a or b and c;");
        match e {
            Expr::Logical {
                op: LogicalOp::Or,
                rhs,
                ..
            } => assert!(matches!(*rhs, Expr::Logical { op: LogicalOp::And, .. })),
            other => panic!("unexpected tree {other:?}"),
        }
    }
}

//! Syntax tree produced by the parser. Nodes are immutable once built.
use std::sync::Arc;

use crate::value::{BinaryOp, UnaryOp};

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f32),
    String(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Variable(String),
    Assign {
        name: String,
        value: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Get {
        object: Box<Expr>,
        name: String,
    },
}

impl Expr {
    /// Returns `a.b.c` when the expression is a member chain rooted at a variable.
    pub fn dotted_path(&self) -> Option<String> {
        match self {
            Expr::Variable(name) => Some(name.clone()),
            Expr::Get { object, name } => object.dotted_path().map(|p| format!("{}.{}", p, name)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expression(Expr),
    Var {
        name: String,
        init: Option<Expr>,
    },
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    Function(Arc<FunctionDecl>),
    Return(Option<Expr>),
}

/// A parsed script. Cheap to clone.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    statements: Arc<[Stmt]>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self {
            statements: statements.into(),
        }
    }

    pub fn statements(&self) -> &[Stmt] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

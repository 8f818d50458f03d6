//! Operator dispatch for [`Value`].
//!
//! Every operator is resolved by matching on `(operator, lhs kind, rhs kind)`.
//! Pairs that are not listed fail with [`Error::UndefinedOperator`] naming both
//! types; the interpreter surfaces those errors unchanged.
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

fn undefined(op: BinaryOp, lhs: &Value, rhs: &Value) -> Error {
    Error::UndefinedOperator {
        operator: op.symbol(),
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}

/// Applies a binary operator.
pub fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    use Value::*;

    match op {
        BinaryOp::Add => match (lhs, rhs) {
            (Integer(a), Integer(b)) => Ok(Integer(a.wrapping_add(*b))),
            (Integer(a), Float(b)) => Ok(Float(*a as f32 + b)),
            (Float(a), Integer(b)) => Ok(Float(a + *b as f32)),
            (Float(a), Float(b)) => Ok(Float(a + b)),
            (Vector3(a), Vector3(b)) => Ok(Vector3(*a + *b)),
            (String(a), b) => Ok(String(format!("{}{}", a, b))),
            (a, String(b)) => Ok(String(format!("{}{}", a, b))),
            _ => Err(undefined(op, lhs, rhs)),
        },
        BinaryOp::Sub => match (lhs, rhs) {
            (Integer(a), Integer(b)) => Ok(Integer(a.wrapping_sub(*b))),
            (Integer(a), Float(b)) => Ok(Float(*a as f32 - b)),
            (Float(a), Integer(b)) => Ok(Float(a - *b as f32)),
            (Float(a), Float(b)) => Ok(Float(a - b)),
            (Vector3(a), Vector3(b)) => Ok(Vector3(*a - *b)),
            _ => Err(undefined(op, lhs, rhs)),
        },
        BinaryOp::Mul => match (lhs, rhs) {
            (Integer(a), Integer(b)) => Ok(Integer(a.wrapping_mul(*b))),
            (Integer(a), Float(b)) => Ok(Float(*a as f32 * b)),
            (Float(a), Integer(b)) => Ok(Float(a * *b as f32)),
            (Float(a), Float(b)) => Ok(Float(a * b)),
            (Integer(n), String(s)) | (String(s), Integer(n)) => {
                Ok(String(s.repeat(usize::try_from(*n).unwrap_or(0))))
            }
            (Vector3(v), Float(s)) | (Float(s), Vector3(v)) => Ok(Vector3(*v * *s)),
            (Vector3(v), Integer(s)) | (Integer(s), Vector3(v)) => Ok(Vector3(*v * *s as f32)),
            _ => Err(undefined(op, lhs, rhs)),
        },
        BinaryOp::Div => match (lhs, rhs) {
            (Integer(_), Integer(0)) => Err(Error::Evaluation("integer division by zero".into())),
            (Integer(a), Integer(b)) => Ok(Integer(a.wrapping_div(*b))),
            (Integer(a), Float(b)) => Ok(Float(*a as f32 / b)),
            (Float(a), Integer(b)) => Ok(Float(a / *b as f32)),
            (Float(a), Float(b)) => Ok(Float(a / b)),
            (Vector3(v), Float(s)) => Ok(Vector3(*v / *s)),
            (Vector3(v), Integer(s)) => Ok(Vector3(*v / *s as f32)),
            _ => Err(undefined(op, lhs, rhs)),
        },
        BinaryOp::Eq => equals(op, lhs, rhs).map(Boolean),
        BinaryOp::Ne => equals(op, lhs, rhs).map(|eq| Boolean(!eq)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(op, lhs, rhs)?;
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Boolean(result))
        }
        BinaryOp::And => match (lhs, rhs) {
            (Boolean(a), Boolean(b)) => Ok(Boolean(*a && *b)),
            _ => Err(undefined(op, lhs, rhs)),
        },
        BinaryOp::Or => match (lhs, rhs) {
            (Boolean(a), Boolean(b)) => Ok(Boolean(*a || *b)),
            _ => Err(undefined(op, lhs, rhs)),
        },
    }
}

fn equals(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<bool> {
    use Value::*;

    match (lhs, rhs) {
        (Integer(a), Float(b)) => Ok(*a as f32 == *b),
        (Float(a), Integer(b)) => Ok(*a == *b as f32),
        (Null, _) | (_, Null) => Ok(lhs == rhs),
        (a, b) if a.kind() == b.kind() => Ok(a == b),
        _ => Err(undefined(op, lhs, rhs)),
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Ordering> {
    use Value::*;

    let ordering = match (lhs, rhs) {
        (Integer(a), Integer(b)) => Some(a.cmp(b)),
        (Integer(a), Float(b)) => (*a as f32).partial_cmp(b),
        (Float(a), Integer(b)) => a.partial_cmp(&(*b as f32)),
        (Float(a), Float(b)) => a.partial_cmp(b),
        (String(a), String(b)) => Some(a.cmp(b)),
        _ => return Err(undefined(op, lhs, rhs)),
    };
    ordering.ok_or_else(|| Error::Evaluation(format!("cannot order {} and {}", lhs, rhs)))
}

/// Applies a unary operator.
pub fn unary(op: UnaryOp, operand: &Value) -> Result<Value> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Integer(i)) => Ok(Value::Integer(i.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Neg, Value::Vector3(v)) => Ok(Value::Vector3(-*v)),
        (UnaryOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        _ => Err(Error::UndefinedUnaryOperator {
            operator: op.symbol(),
            operand: operand.type_name(),
        }),
    }
}

//! Dynamically typed values used by node parameters and the script interpreter.
//!
//! [`Value`] is a closed set of kinds. Every kind has a process-wide
//! [`TypeInfo`] descriptor used for operator dispatch and diagnostics.
//! Operators live in [`ops`], callables in [`callable`].
use std::fmt;

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::objects::ObjectId;

pub mod callable;
pub mod ops;

pub use callable::{CallEnv, Callable, NativeFn, ScriptFunction};
pub use ops::{BinaryOp, UnaryOp};

/// Discriminant of a [`Value`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Vector3,
    Plane,
    Callable,
    Object,
}

/// Runtime type descriptor. One static instance exists per [`ValueKind`].
#[derive(Debug, PartialEq, Eq)]
pub struct TypeInfo {
    name: &'static str,
    kind: ValueKind,
}

impl TypeInfo {
    const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self { name, kind }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub static NULL_TYPE: TypeInfo = TypeInfo::new("Null", ValueKind::Null);
pub static BOOLEAN_TYPE: TypeInfo = TypeInfo::new("Boolean", ValueKind::Boolean);
pub static INTEGER_TYPE: TypeInfo = TypeInfo::new("Integer", ValueKind::Integer);
pub static FLOAT_TYPE: TypeInfo = TypeInfo::new("Float", ValueKind::Float);
pub static STRING_TYPE: TypeInfo = TypeInfo::new("String", ValueKind::String);
pub static VECTOR3_TYPE: TypeInfo = TypeInfo::new("Vector3", ValueKind::Vector3);
pub static PLANE_TYPE: TypeInfo = TypeInfo::new("Plane", ValueKind::Plane);
pub static CALLABLE_TYPE: TypeInfo = TypeInfo::new("Callable", ValueKind::Callable);
pub static OBJECT_TYPE: TypeInfo = TypeInfo::new("Object", ValueKind::Object);

impl ValueKind {
    pub fn type_info(self) -> &'static TypeInfo {
        match self {
            ValueKind::Null => &NULL_TYPE,
            ValueKind::Boolean => &BOOLEAN_TYPE,
            ValueKind::Integer => &INTEGER_TYPE,
            ValueKind::Float => &FLOAT_TYPE,
            ValueKind::String => &STRING_TYPE,
            ValueKind::Vector3 => &VECTOR3_TYPE,
            ValueKind::Plane => &PLANE_TYPE,
            ValueKind::Callable => &CALLABLE_TYPE,
            ValueKind::Object => &OBJECT_TYPE,
        }
    }

    pub fn name(self) -> &'static str {
        self.type_info().name()
    }
}

/// A plane in Hessian normal form: `dot(normal, p) == distance`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    normal: Vec3,
    distance: f32,
}

impl Plane {
    /// Creates a plane from a normal and its signed distance to the origin.
    /// The normal is normalized; a zero normal falls back to +Z.
    pub fn new(normal: impl Into<mint::Vector3<f32>>, distance: f32) -> Self {
        let normal = Vec3::from(normal.into()).try_normalize().unwrap_or(Vec3::Z);
        Self { normal, distance }
    }

    /// Creates the plane through `point` with the given `normal`.
    pub fn from_point_normal(
        point: impl Into<mint::Vector3<f32>>,
        normal: impl Into<mint::Vector3<f32>>,
    ) -> Self {
        let normal = Vec3::from(normal.into()).try_normalize().unwrap_or(Vec3::Z);
        let point = Vec3::from(point.into());
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn distance_to_origin(&self) -> f32 {
        self.distance
    }

    /// Point on the plane closest to the origin.
    pub fn point(&self) -> Vec3 {
        self.normal * self.distance
    }

    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.distance
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            normal: Vec3::Z,
            distance: 0.0,
        }
    }
}

/// A dynamically typed value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f32),
    String(String),
    Vector3(Vec3),
    Plane(Plane),
    Callable(Callable),
    Object(ObjectId),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Vector3(_) => ValueKind::Vector3,
            Value::Plane(_) => ValueKind::Plane,
            Value::Callable(_) => ValueKind::Callable,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn type_info(&self) -> &'static TypeInfo {
        self.kind().type_info()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_info().name()
    }

    /// Truthiness used by conditions and logical operators.
    pub fn is_true(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Vector3(_) | Value::Plane(_) | Value::Callable(_) | Value::Object(_) => true,
        }
    }

    pub fn as_float(&self) -> Result<f32> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Integer(i) => Ok(*i as f32),
            other => Err(mismatch(ValueKind::Float, other)),
        }
    }

    pub fn as_integer(&self) -> Result<i64> {
        match self {
            Value::Integer(i) => Ok(*i),
            Value::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            other => Err(mismatch(ValueKind::Integer, other)),
        }
    }

    pub fn as_boolean(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(mismatch(ValueKind::Boolean, other)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(mismatch(ValueKind::String, other)),
        }
    }

    pub fn as_vector3(&self) -> Result<Vec3> {
        match self {
            Value::Vector3(v) => Ok(*v),
            other => Err(mismatch(ValueKind::Vector3, other)),
        }
    }

    pub fn as_plane(&self) -> Result<Plane> {
        match self {
            Value::Plane(p) => Ok(*p),
            other => Err(mismatch(ValueKind::Plane, other)),
        }
    }

    /// Converts to another kind the way the `Integer`, `Float`, `String` and
    /// `Boolean` builtins do.
    pub fn convert_to(&self, kind: ValueKind) -> Result<Value> {
        if self.kind() == kind {
            return Ok(self.clone());
        }
        let converted = match (kind, self) {
            (ValueKind::String, v) => Some(Value::String(v.to_string())),
            (ValueKind::Float, Value::Integer(i)) => Some(Value::Float(*i as f32)),
            (ValueKind::Float, Value::Boolean(b)) => Some(Value::Float(f32::from(u8::from(*b)))),
            (ValueKind::Float, Value::String(s)) => s.trim().parse::<f32>().ok().map(Value::Float),
            (ValueKind::Integer, Value::Float(f)) => Some(Value::Integer(f.trunc() as i64)),
            (ValueKind::Integer, Value::Boolean(b)) => Some(Value::Integer(i64::from(*b))),
            (ValueKind::Integer, Value::String(s)) => {
                s.trim().parse::<i64>().ok().map(Value::Integer)
            }
            (ValueKind::Boolean, Value::String(s)) => match s.trim() {
                "true" => Some(Value::Boolean(true)),
                "false" => Some(Value::Boolean(false)),
                _ => None,
            },
            (ValueKind::Boolean, v @ (Value::Integer(_) | Value::Float(_) | Value::Null)) => {
                Some(Value::Boolean(v.is_true()))
            }
            _ => None,
        };
        converted.ok_or_else(|| {
            Error::Evaluation(format!(
                "cannot convert {} '{}' to {}",
                self.type_name(),
                self,
                kind.name()
            ))
        })
    }

    /// Looks up a member. Plane members are bound callables sharing the
    /// regular invocation contract.
    pub fn member(&self, name: &str) -> Result<Value> {
        match (self, name) {
            (Value::Vector3(v), "x") => Ok(Value::Float(v.x)),
            (Value::Vector3(v), "y") => Ok(Value::Float(v.y)),
            (Value::Vector3(v), "z") => Ok(Value::Float(v.z)),
            (Value::String(s), "length") => Ok(Value::Integer(s.chars().count() as i64)),
            (Value::Plane(p), "normal") => {
                let normal = p.normal();
                Ok(Value::Callable(Callable::native("normal", Some(0), move |_, _| {
                    Ok(Value::Vector3(normal))
                })))
            }
            (Value::Plane(p), "point") => {
                let point = p.point();
                Ok(Value::Callable(Callable::native("point", Some(0), move |_, _| {
                    Ok(Value::Vector3(point))
                })))
            }
            (Value::Plane(p), "distance") => {
                let distance = p.distance_to_origin();
                Ok(Value::Callable(Callable::native("distance", Some(0), move |_, _| {
                    Ok(Value::Float(distance))
                })))
            }
            _ => Err(Error::not_found(
                "member",
                format!("{}.{}", self.type_name(), name),
            )),
        }
    }
}

fn mismatch(expected: ValueKind, found: &Value) -> Error {
    Error::TypeMismatch {
        expected: expected.name(),
        found: found.type_name(),
    }
}

fn fmt_vec3(v: Vec3, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({:.6}, {:.6}, {:.6})", v.x, v.y, v.z)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:.6}", x),
            Value::String(s) => f.write_str(s),
            Value::Vector3(v) => fmt_vec3(*v, f),
            Value::Plane(p) => {
                f.write_str("Plane(normal: ")?;
                fmt_vec3(p.normal(), f)?;
                write!(f, ", distance: {:.6})", p.distance_to_origin())
            }
            Value::Callable(c) => write!(f, "<Callable {}>", c.name()),
            Value::Object(id) => write!(f, "<Object {}>", id),
        }
    }
}

/// Structural equality; callables compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Vector3(a), Value::Vector3(b)) => a == b,
            (Value::Plane(a), Value::Plane(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

/// Narrows to `f32`, the only float width values carry.
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value as f32)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec3> for Value {
    fn from(value: Vec3) -> Self {
        Value::Vector3(value)
    }
}

impl From<Plane> for Value {
    fn from(value: Plane) -> Self {
        Value::Plane(value)
    }
}

impl From<Callable> for Value {
    fn from(value: Callable) -> Self {
        Value::Callable(value)
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Value::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_info_identity_is_stable() {
        let a = Value::Float(1.0).type_info();
        let b = Value::Float(2.0).type_info();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.name(), "Float");
        assert!(!std::ptr::eq(a, Value::Integer(1).type_info()));
    }

    #[test]
    fn to_string_uses_canonical_forms() {
        assert_eq!(Value::Float(1.5).to_string(), "1.500000");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Boolean(false).to_string(), "false");
        assert_eq!(Value::Integer(-3).to_string(), "-3");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(
            Value::Vector3(Vec3::new(1.0, 0.0, 2.0)).to_string(),
            "(1.000000, 0.000000, 2.000000)"
        );
    }

    #[test]
    fn conversions_follow_builtin_rules() {
        let v = Value::from("42").convert_to(ValueKind::Integer).expect("parses");
        assert_eq!(v, Value::Integer(42));
        let v = Value::Float(2.9).convert_to(ValueKind::Integer).expect("truncates");
        assert_eq!(v, Value::Integer(2));
        let v = Value::Integer(0).convert_to(ValueKind::Boolean).expect("truthiness");
        assert_eq!(v, Value::Boolean(false));

        let err = Value::from("abc")
            .convert_to(ValueKind::Float)
            .expect_err("not a number");
        assert!(matches!(err, Error::Evaluation(_)));
    }

    #[test]
    fn accessors_report_type_mismatch() {
        assert_eq!(Value::Integer(2).as_float().expect("promotes"), 2.0);
        let err = Value::from("x").as_float().expect_err("string is not a float");
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: "Float",
                found: "String"
            }
        ));
    }

    #[test]
    fn plane_from_point_normal_computes_distance() {
        let plane = Plane::from_point_normal(Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(plane.normal(), Vec3::Z);
        assert!((plane.distance_to_origin() - 3.0).abs() < 1e-6);
        assert!(plane.signed_distance(Vec3::new(5.0, 5.0, 3.0)).abs() < 1e-6);
    }

    #[test]
    fn unknown_member_is_not_found() {
        let err = Value::Boolean(true)
            .member("x")
            .expect_err("booleans have no members");
        assert!(matches!(err, Error::NotFound { what: "member", .. }));
    }

    #[test]
    fn vector_members_are_floats() {
        let v = Value::Vector3(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(v.member("y").expect("y exists"), Value::Float(2.0));
    }
}

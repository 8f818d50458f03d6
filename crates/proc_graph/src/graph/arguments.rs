//! Named construction and execution arguments handed to nodes.
//!
//! Nodes read their arguments through [`ArgumentCallback`], whose typed
//! getters take a name, a human-readable label and an optional default.
use std::collections::BTreeMap;

use crate::context::Parameter;
use crate::error::{Error, Result};
use crate::expression::Expression;
use crate::value::{Plane, Value, ValueKind};

pub trait ArgumentCallback {
    /// Name of the node the arguments are for, used in diagnostics.
    fn owner(&self) -> &str;

    fn get(&self, name: &str) -> Option<&Parameter>;

    /// Argument names, sorted.
    fn names(&self) -> Vec<&str>;

    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn string_argument(&self, name: &str, label: &str, default: Option<&str>) -> Result<Parameter> {
        typed_argument(self, name, label, ValueKind::String, default.map(Value::from))
    }

    fn float_argument(&self, name: &str, label: &str, default: Option<f32>) -> Result<Parameter> {
        typed_argument(self, name, label, ValueKind::Float, default.map(Value::from))
    }

    fn integer_argument(&self, name: &str, label: &str, default: Option<i64>) -> Result<Parameter> {
        typed_argument(self, name, label, ValueKind::Integer, default.map(Value::from))
    }

    fn boolean_argument(&self, name: &str, label: &str, default: Option<bool>) -> Result<Parameter> {
        typed_argument(self, name, label, ValueKind::Boolean, default.map(Value::from))
    }

    fn plane_argument(&self, name: &str, label: &str, default: Option<Plane>) -> Result<Parameter> {
        typed_argument(self, name, label, ValueKind::Plane, default.map(Value::from))
    }

    /// Reads an argument of the same kind as `default`, falling back to it.
    fn argument_like(&self, name: &str, label: &str, default: &Value) -> Result<Parameter> {
        typed_argument(self, name, label, default.kind(), Some(default.clone()))
    }

    /// A required string given as a literal, as construction arguments are.
    fn literal_string(&self, name: &str, label: &str) -> Result<String> {
        match self.string_argument(name, label, None)? {
            Parameter::Value(Value::String(s)) => Ok(s),
            _ => Err(Error::InvalidArgument {
                argument: name.to_owned(),
                message: format!("{} of '{}' must be a literal string", label, self.owner()),
            }),
        }
    }
}

fn typed_argument<C: ArgumentCallback + ?Sized>(
    callback: &C,
    name: &str,
    label: &str,
    kind: ValueKind,
    default: Option<Value>,
) -> Result<Parameter> {
    match callback.get(name) {
        Some(Parameter::Expression(e)) => Ok(Parameter::Expression(e.clone())),
        Some(Parameter::Value(v)) if v.kind() == kind => Ok(Parameter::Value(v.clone())),
        Some(Parameter::Value(v)) => v.convert_to(kind).map(Parameter::Value).map_err(|_| {
            Error::InvalidArgument {
                argument: name.to_owned(),
                message: format!(
                    "{} of '{}' expects {} but got {}",
                    label,
                    callback.owner(),
                    kind.name(),
                    v.type_name()
                ),
            }
        }),
        None => default.map(Parameter::Value).ok_or_else(|| Error::MissingArgument {
            node: callback.owner().to_owned(),
            argument: name.to_owned(),
        }),
    }
}

/// Map-backed [`ArgumentCallback`].
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    owner: String,
    values: BTreeMap<String, Parameter>,
}

impl Arguments {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, parameter: impl Into<Parameter>) -> Self {
        self.insert(name, parameter);
        self
    }

    pub fn with_value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(name, Parameter::Value(value.into()))
    }

    pub fn with_expression(self, name: impl Into<String>, source: &str) -> Result<Self> {
        Ok(self.with(name, Expression::parse(source)?))
    }

    pub fn insert(&mut self, name: impl Into<String>, parameter: impl Into<Parameter>) {
        self.values.insert(name.into(), parameter.into());
    }

    pub fn set_owner(&mut self, owner: impl Into<String>) {
        self.owner = owner.into();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl ArgumentCallback for Arguments {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn get(&self, name: &str) -> Option<&Parameter> {
        self.values.get(name)
    }

    fn names(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_argument_uses_default_or_fails() {
        let args = Arguments::new("op");
        let p = args
            .float_argument("width", "Width", Some(1.0))
            .expect("default");
        assert_eq!(p, Parameter::Value(Value::Float(1.0)));

        let err = args
            .string_argument("operation", "Operation", None)
            .expect_err("required");
        assert!(matches!(
            err,
            Error::MissingArgument { ref node, ref argument } if node == "op" && argument == "operation"
        ));
    }

    #[test]
    fn values_are_converted_to_the_requested_kind() {
        let args = Arguments::new("op").with_value("width", 2);
        let p = args.float_argument("width", "Width", None).expect("converts");
        assert_eq!(p, Parameter::Value(Value::Float(2.0)));

        let args = Arguments::new("op").with_value("plane", 1.5);
        let err = args
            .plane_argument("plane", "Plane", None)
            .expect_err("float is not a plane");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn expressions_pass_through_untyped() {
        let args = Arguments::new("op")
            .with_expression("width", "base * 2.0")
            .expect("parses");
        let p = args.float_argument("width", "Width", Some(1.0)).expect("kept");
        assert!(p.is_expression());
    }

    #[test]
    fn literal_string_rejects_expressions() {
        let args = Arguments::new("op")
            .with_expression("operation", "\"CreateRect\"")
            .expect("parses");
        let err = args
            .literal_string("operation", "Operation")
            .expect_err("expression");
        assert!(matches!(err, Error::InvalidArgument { .. }));
        let args = Arguments::new("op").with_value("operation", "CreateRect");
        assert_eq!(
            args.literal_string("operation", "Operation").expect("literal"),
            "CreateRect"
        );
    }
}

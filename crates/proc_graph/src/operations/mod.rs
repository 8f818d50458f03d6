//! Pluggable operations executed by operation nodes.
//!
//! An [`Operation`] declares its parameters and named interfaces and does its
//! work through a [`Job`], which streams input objects one at a time and
//! re-evaluates parameters on every read.
use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;

use crate::context::{ContextArena, ContextId};
use crate::error::{Error, Result};
use crate::expression::ParameterResolver;
use crate::graph::NodeId;
use crate::objects::{Direction, InterfaceTable, ObjectArena, ObjectId, ProceduralObject};
use crate::script::Interpreter;
use crate::value::{Plane, Value};

pub mod create_box;
pub mod create_rect;
pub mod scale;
pub mod translate;

pub use create_box::CreateBox;
pub use create_rect::CreateRect;
pub use scale::{PivotalPoint, Scale};
pub use translate::Translate;

/// Declared parameter of an operation. The default's kind is the
/// parameter's kind.
#[derive(Debug, Clone)]
pub struct ParameterDecl {
    pub name: &'static str,
    pub label: &'static str,
    pub default: Value,
}

impl ParameterDecl {
    pub fn new(name: &'static str, label: &'static str, default: impl Into<Value>) -> Self {
        Self {
            name,
            label,
            default: default.into(),
        }
    }
}

pub trait Operation: Send + Sync {
    /// Registry name, e.g. `"CreateRect"`.
    fn name(&self) -> &'static str;

    fn parameters(&self) -> Vec<ParameterDecl> {
        Vec::new()
    }

    fn input_interfaces(&self) -> &'static [&'static str] {
        &[]
    }

    fn output_interfaces(&self) -> &'static [&'static str] {
        &[]
    }

    fn execute(&self, job: &mut Job<'_>) -> Result<()>;
}

/// One visit of an operation node.
pub struct Job<'a> {
    node: NodeId,
    node_name: &'a str,
    context: ContextId,
    defaults: Vec<ParameterDecl>,
    contexts: &'a ContextArena,
    objects: &'a mut ObjectArena,
    interfaces: &'a mut InterfaceTable,
    resolver: ParameterResolver<'a>,
    produced: usize,
}

impl<'a> Job<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        node: NodeId,
        node_name: &'a str,
        context: ContextId,
        operation: &dyn Operation,
        contexts: &'a ContextArena,
        objects: &'a mut ObjectArena,
        interfaces: &'a mut InterfaceTable,
        interpreter: &'a mut Interpreter,
        max_depth: usize,
    ) -> Self {
        Self {
            node,
            node_name,
            context,
            defaults: operation.parameters(),
            contexts,
            objects,
            interfaces,
            resolver: ParameterResolver::new(contexts, interpreter, max_depth),
            produced: 0,
        }
    }

    pub fn node_name(&self) -> &str {
        self.node_name
    }

    pub fn has_input(&self, interface: &str) -> bool {
        !self.interfaces.is_empty(self.node, Direction::Input, interface)
    }

    /// Takes the next queued object from an input interface.
    pub fn next_input(&mut self, interface: &str) -> Option<ProceduralObject> {
        while let Some(id) = self.interfaces.pop(self.node, Direction::Input, interface) {
            if let Some(object) = self.objects.remove(id) {
                return Some(object);
            }
        }
        None
    }

    /// Queues a new object on an output interface.
    pub fn emit(&mut self, interface: &str, object: ProceduralObject) -> Result<ObjectId> {
        if !self.interfaces.contains(self.node, Direction::Output, interface) {
            return Err(Error::not_found(
                "interface",
                format!("{} output '{}'", self.node_name, interface),
            ));
        }
        let id = self.objects.insert(object);
        self.interfaces
            .push(self.node, Direction::Output, interface, id)?;
        self.produced += 1;
        Ok(id)
    }

    /// Objects emitted so far during this visit.
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Current value of a parameter. Expressions are evaluated on every call;
    /// parameters absent from the node's context take their declared default.
    pub fn value(&mut self, name: &str) -> Result<Value> {
        if self.contexts.has_parameter(self.context, name) {
            return self.resolver.value_of(self.context, name);
        }
        self.defaults
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.default.clone())
            .ok_or_else(|| Error::not_found("parameter", format!("{}.{}", self.node_name, name)))
    }

    pub fn float(&mut self, name: &str) -> Result<f32> {
        self.value(name)?.as_float()
    }

    pub fn integer(&mut self, name: &str) -> Result<i64> {
        self.value(name)?.as_integer()
    }

    pub fn boolean(&mut self, name: &str) -> Result<bool> {
        self.value(name)?.as_boolean()
    }

    pub fn string(&mut self, name: &str) -> Result<String> {
        match self.value(name)? {
            Value::String(s) => Ok(s),
            other => Err(Error::TypeMismatch {
                expected: "String",
                found: other.type_name(),
            }),
        }
    }

    pub fn plane(&mut self, name: &str) -> Result<Plane> {
        self.value(name)?.as_plane()
    }

    pub fn vector3(&mut self, name: &str) -> Result<Vec3> {
        self.value(name)?.as_vector3()
    }
}

type OperationConstructor = Arc<dyn Fn() -> Arc<dyn Operation> + Send + Sync>;

/// String-keyed registry of operation constructors.
#[derive(Clone, Default)]
pub struct OperationFactory {
    constructors: HashMap<String, OperationConstructor>,
}

impl OperationFactory {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with `CreateRect`, `CreateBox`, `Translate` and `Scale`.
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory.register("CreateRect", || Arc::new(CreateRect));
        factory.register("CreateBox", || Arc::new(CreateBox));
        factory.register("Translate", || Arc::new(Translate));
        factory.register("Scale", || Arc::new(Scale));
        factory
    }

    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Arc<dyn Operation> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.constructors.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Instantiates a registered operation.
    pub fn create(&self, name: &str) -> Option<Arc<dyn Operation>> {
        self.constructors.get(name).map(|c| c())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

//! Graph nodes and the four built-in node kinds.
//!
//! A [`Node`] wraps a [`NodeBehavior`] trait object plus its id, name,
//! layout position, [`ContextId`] and per-visit [`NodeState`]. The built-in
//! behaviors are:
//! - [`OperationNode`]: runs an [`Operation`] over its queued inputs.
//! - [`InputInterfaceNode`] / [`OutputInterfaceNode`]: named pass-through
//!   boundaries between sub-graphs.
//! - [`ParameterNode`]: copies its parameters onto downstream contexts.
use std::fmt;
use std::sync::Arc;

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::context::{ContextArena, ContextId};
use crate::error::{Error, Result};
use crate::graph::arguments::ArgumentCallback;
use crate::objects::{Direction, InterfaceTable, ObjectArena};
use crate::operations::{Job, Operation, OperationFactory};
use crate::script::Interpreter;
use crate::value::Value;

/// Unique node identifier. Ids are never reused within a graph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-visit execution state.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeState {
    #[default]
    Idle,
    Executing,
    Done,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    Operation,
    InputInterface,
    OutputInterface,
    Parameter,
}

impl NodeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeCategory::Operation => "Operation",
            NodeCategory::InputInterface => "InputInterface",
            NodeCategory::OutputInterface => "OutputInterface",
            NodeCategory::Parameter => "Parameter",
        }
    }
}

/// A neighbor as seen from the node being executed, with the interface
/// names the connecting edge resolved to.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRef {
    pub id: NodeId,
    pub name: String,
    pub category: NodeCategory,
    pub context: ContextId,
    /// The neighbor's own interface name, for interface nodes.
    pub interface: Option<String>,
    /// Output interface on the edge's source.
    pub out_interface: Option<String>,
    /// Input interface on the edge's target.
    pub in_interface: Option<String>,
}

/// Ordered neighbors passed to [`NodeBehavior::execute`].
pub type NodeSet = Vec<NodeRef>;

/// What a node may touch while it runs.
pub struct ExecutionContext<'a> {
    pub node: NodeId,
    pub name: &'a str,
    pub context: ContextId,
    pub objects: &'a mut ObjectArena,
    pub interfaces: &'a mut InterfaceTable,
    pub contexts: &'a mut ContextArena,
    pub interpreter: &'a mut Interpreter,
    pub max_depth: usize,
    pub warnings: Vec<String>,
}

impl ExecutionContext<'_> {
    pub fn warn(&mut self, message: String) {
        warn!("Node '{}': {}", self.name, message);
        self.warnings.push(message);
    }

    /// Moves everything queued on one of this node's interfaces to `targets`.
    /// With several targets every object but the last copy is duplicated.
    /// Targets lacking the interface are skipped with a warning; when no
    /// target accepts, the objects stay where they are.
    pub fn forward(
        &mut self,
        direction: Direction,
        interface: &str,
        targets: &[(NodeId, Direction, String)],
    ) -> Result<usize> {
        if self.interfaces.is_empty(self.node, direction, interface) {
            return Ok(0);
        }
        let mut accepted = Vec::with_capacity(targets.len());
        for (node, dir, name) in targets {
            if self.interfaces.contains(*node, *dir, name) {
                accepted.push((*node, *dir, name.as_str()));
            } else {
                self.warn(format!(
                    "target {} has no {} interface '{}'; skipping it",
                    node, dir, name
                ));
            }
        }
        if accepted.is_empty() {
            return Ok(0);
        }
        let ids = self.interfaces.drain(self.node, direction, interface);
        let moved = ids.len();
        for id in ids {
            let last = accepted.len() - 1;
            for (i, (node, dir, name)) in accepted.iter().enumerate() {
                let target_id = if i == last {
                    Some(id)
                } else {
                    self.objects.duplicate(id)
                };
                if let Some(target_id) = target_id {
                    self.interfaces.push(*node, *dir, name, target_id)?;
                }
            }
        }
        Ok(moved)
    }

    /// Drops whatever is still queued on an interface, warning if non-empty.
    pub fn discard(&mut self, direction: Direction, interface: &str) -> usize {
        let ids = self.interfaces.drain(self.node, direction, interface);
        let dropped = self.objects.discard(ids);
        if dropped > 0 {
            self.warn(format!(
                "dropping {} undrained object(s) on {} interface '{}'",
                dropped, direction, interface
            ));
        }
        dropped
    }
}

/// Polymorphic node kind.
pub trait NodeBehavior: Send {
    fn type_name(&self) -> &'static str;

    fn category(&self) -> NodeCategory;

    fn set_construction_arguments(&mut self, args: &dyn ArgumentCallback) -> Result<()>;

    /// Construction arguments, for writing the node back out.
    fn construction_arguments(&self) -> Vec<(String, Value)>;

    /// Stores execution arguments as parameters of the node's context.
    fn set_execution_arguments(
        &self,
        args: &dyn ArgumentCallback,
        contexts: &mut ContextArena,
        context: ContextId,
    ) -> Result<()>;

    fn input_interfaces(&self) -> Vec<String> {
        Vec::new()
    }

    fn output_interfaces(&self) -> Vec<String> {
        Vec::new()
    }

    /// The boundary name of interface nodes.
    fn interface_name(&self) -> Option<&str> {
        None
    }

    fn execute(
        &self,
        cx: &mut ExecutionContext<'_>,
        inputs: &NodeSet,
        outputs: &NodeSet,
    ) -> Result<()>;
}

pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) position: Vec2,
    pub(crate) behavior: Box<dyn NodeBehavior>,
    pub(crate) context: ContextId,
    pub(crate) state: NodeState,
    pub(crate) constructed: bool,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: impl Into<mint::Vector2<f32>>) {
        self.position = Vec2::from(position.into());
    }

    pub fn type_name(&self) -> &'static str {
        self.behavior.type_name()
    }

    pub fn category(&self) -> NodeCategory {
        self.behavior.category()
    }

    pub fn behavior(&self) -> &dyn NodeBehavior {
        self.behavior.as_ref()
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &self.behavior.type_name())
            .field("state", &self.state)
            .finish()
    }
}

/// Runs a registered operation over its queued inputs.
pub struct OperationNode {
    factory: Arc<OperationFactory>,
    operation: Option<Arc<dyn Operation>>,
}

impl OperationNode {
    pub const TYPE_NAME: &'static str = "Operation";

    pub fn new(factory: Arc<OperationFactory>) -> Self {
        Self {
            factory,
            operation: None,
        }
    }

    pub fn operation(&self) -> Option<&Arc<dyn Operation>> {
        self.operation.as_ref()
    }

    fn require_operation(&self) -> Result<&Arc<dyn Operation>> {
        self.operation.as_ref().ok_or_else(|| Error::MissingArgument {
            node: Self::TYPE_NAME.to_owned(),
            argument: "operation".into(),
        })
    }
}

impl NodeBehavior for OperationNode {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn category(&self) -> NodeCategory {
        NodeCategory::Operation
    }

    fn set_construction_arguments(&mut self, args: &dyn ArgumentCallback) -> Result<()> {
        let name = args.literal_string("operation", "Operation")?;
        let operation = self
            .factory
            .create(&name)
            .ok_or(Error::UnknownOperation { name })?;
        self.operation = Some(operation);
        Ok(())
    }

    fn construction_arguments(&self) -> Vec<(String, Value)> {
        self.operation
            .iter()
            .map(|op| ("operation".to_owned(), Value::from(op.name())))
            .collect()
    }

    fn set_execution_arguments(
        &self,
        args: &dyn ArgumentCallback,
        contexts: &mut ContextArena,
        context: ContextId,
    ) -> Result<()> {
        let operation = self.require_operation()?;
        let declared = operation.parameters();
        for name in args.names() {
            if !declared.iter().any(|d| d.name == name) {
                warn!(
                    "Operation '{}' of node '{}' has no parameter '{}'; ignoring it.",
                    operation.name(),
                    args.owner(),
                    name
                );
            }
        }
        for decl in &declared {
            let parameter = args.argument_like(decl.name, decl.label, &decl.default)?;
            contexts.create_parameter(context, decl.name, parameter)?;
        }
        Ok(())
    }

    fn input_interfaces(&self) -> Vec<String> {
        self.operation
            .iter()
            .flat_map(|op| op.input_interfaces().iter().map(|s| s.to_string()))
            .collect()
    }

    fn output_interfaces(&self) -> Vec<String> {
        self.operation
            .iter()
            .flat_map(|op| op.output_interfaces().iter().map(|s| s.to_string()))
            .collect()
    }

    fn execute(
        &self,
        cx: &mut ExecutionContext<'_>,
        _inputs: &NodeSet,
        outputs: &NodeSet,
    ) -> Result<()> {
        let operation = self.require_operation()?;
        {
            let mut job = Job::new(
                cx.node,
                cx.name,
                cx.context,
                operation.as_ref(),
                cx.contexts,
                cx.objects,
                cx.interfaces,
                cx.interpreter,
                cx.max_depth,
            );
            operation.execute(&mut job)?;
        }

        for interface in operation.input_interfaces() {
            cx.discard(Direction::Input, interface);
        }

        for interface in operation.output_interfaces() {
            let targets: Vec<_> = outputs
                .iter()
                .filter(|o| o.category == NodeCategory::OutputInterface)
                .filter(|o| o.out_interface.as_deref() == Some(*interface))
                .filter_map(|o| {
                    o.in_interface
                        .clone()
                        .map(|name| (o.id, Direction::Input, name))
                })
                .collect();
            cx.forward(Direction::Output, interface, &targets)?;
        }
        Ok(())
    }
}

fn interface_argument(args: &dyn ArgumentCallback, label: &str) -> Result<String> {
    let name = args.literal_string("interface", label)?;
    if name.is_empty() {
        return Err(Error::InvalidArgument {
            argument: "interface".into(),
            message: format!("{} of '{}' must not be empty", label, args.owner()),
        });
    }
    Ok(name)
}

/// Entry boundary of a graph. Holds injected objects on one output queue
/// named after its interface and hands them to downstream operations.
#[derive(Debug, Default)]
pub struct InputInterfaceNode {
    interface: String,
}

impl InputInterfaceNode {
    pub const TYPE_NAME: &'static str = "InputInterface";

    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeBehavior for InputInterfaceNode {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn category(&self) -> NodeCategory {
        NodeCategory::InputInterface
    }

    fn set_construction_arguments(&mut self, args: &dyn ArgumentCallback) -> Result<()> {
        self.interface = interface_argument(args, "Interface Name")?;
        Ok(())
    }

    fn construction_arguments(&self) -> Vec<(String, Value)> {
        vec![("interface".into(), Value::from(self.interface.as_str()))]
    }

    fn set_execution_arguments(
        &self,
        _args: &dyn ArgumentCallback,
        _contexts: &mut ContextArena,
        _context: ContextId,
    ) -> Result<()> {
        Ok(())
    }

    fn output_interfaces(&self) -> Vec<String> {
        vec![self.interface.clone()]
    }

    fn interface_name(&self) -> Option<&str> {
        Some(&self.interface).filter(|s| !s.is_empty()).map(String::as_str)
    }

    fn execute(
        &self,
        cx: &mut ExecutionContext<'_>,
        _inputs: &NodeSet,
        outputs: &NodeSet,
    ) -> Result<()> {
        let targets: Vec<_> = outputs
            .iter()
            .filter(|o| o.category == NodeCategory::Operation)
            .filter_map(|o| {
                o.in_interface
                    .clone()
                    .map(|name| (o.id, Direction::Input, name))
            })
            .collect();
        cx.forward(Direction::Output, &self.interface, &targets)?;
        Ok(())
    }
}

/// Exit boundary of a graph. Collects objects on one input queue; when
/// linked to input interfaces of another sub-graph it forwards them.
#[derive(Debug, Default)]
pub struct OutputInterfaceNode {
    interface: String,
}

impl OutputInterfaceNode {
    pub const TYPE_NAME: &'static str = "OutputInterface";

    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeBehavior for OutputInterfaceNode {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn category(&self) -> NodeCategory {
        NodeCategory::OutputInterface
    }

    fn set_construction_arguments(&mut self, args: &dyn ArgumentCallback) -> Result<()> {
        self.interface = interface_argument(args, "Output Interface")?;
        Ok(())
    }

    fn construction_arguments(&self) -> Vec<(String, Value)> {
        vec![("interface".into(), Value::from(self.interface.as_str()))]
    }

    fn set_execution_arguments(
        &self,
        _args: &dyn ArgumentCallback,
        _contexts: &mut ContextArena,
        _context: ContextId,
    ) -> Result<()> {
        Ok(())
    }

    fn input_interfaces(&self) -> Vec<String> {
        vec![self.interface.clone()]
    }

    fn interface_name(&self) -> Option<&str> {
        Some(&self.interface).filter(|s| !s.is_empty()).map(String::as_str)
    }

    fn execute(
        &self,
        cx: &mut ExecutionContext<'_>,
        _inputs: &NodeSet,
        outputs: &NodeSet,
    ) -> Result<()> {
        let targets: Vec<_> = outputs
            .iter()
            .filter(|o| o.category == NodeCategory::InputInterface)
            .filter_map(|o| {
                o.interface
                    .clone()
                    .map(|name| (o.id, Direction::Output, name))
            })
            .collect();
        cx.forward(Direction::Input, &self.interface, &targets)?;
        Ok(())
    }
}

/// Holds parameters and writes them onto every downstream node's context
/// when executed. Among parameter nodes feeding the same node, the one
/// visited last wins.
#[derive(Debug, Default)]
pub struct ParameterNode;

impl ParameterNode {
    pub const TYPE_NAME: &'static str = "Parameter";
}

impl NodeBehavior for ParameterNode {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn category(&self) -> NodeCategory {
        NodeCategory::Parameter
    }

    fn set_construction_arguments(&mut self, _args: &dyn ArgumentCallback) -> Result<()> {
        Ok(())
    }

    fn construction_arguments(&self) -> Vec<(String, Value)> {
        Vec::new()
    }

    fn set_execution_arguments(
        &self,
        args: &dyn ArgumentCallback,
        contexts: &mut ContextArena,
        context: ContextId,
    ) -> Result<()> {
        for name in args.names() {
            if let Some(parameter) = args.get(name) {
                contexts.create_parameter(context, name, parameter.clone())?;
            }
        }
        Ok(())
    }

    fn execute(
        &self,
        cx: &mut ExecutionContext<'_>,
        _inputs: &NodeSet,
        outputs: &NodeSet,
    ) -> Result<()> {
        let parameters: Vec<_> = cx
            .contexts
            .parameters(cx.context)
            .map(|(k, v)| (k.to_owned(), v.clone()))
            .collect();
        for target in outputs {
            for (name, parameter) in &parameters {
                cx.contexts
                    .create_parameter(target.context, name.as_str(), parameter.clone())?;
            }
        }
        Ok(())
    }
}

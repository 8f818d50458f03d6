//! Graph model: nodes, edges, contexts and the objects flowing between them.
//!
//! A [`Graph`] owns every piece of per-graph state in arenas: nodes by
//! [`NodeId`], contexts in a [`ContextArena`], objects in an
//! [`ObjectArena`] and their queues in an [`InterfaceTable`]. Node contexts
//! are children of a root context named `graph`, so graph-level parameters
//! are visible to every node expression.
//!
//! Link rules by node kind:
//! - Operation -> OutputInterface
//! - InputInterface -> Operation
//! - OutputInterface -> InputInterface
//! - Parameter -> any node
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use tracing::warn;

use crate::context::{ContextArena, ContextId, Parameter};
use crate::error::{Error, Result};
use crate::objects::{Direction, InterfaceTable, ObjectArena, ObjectId, ProceduralObject};
use crate::operations::OperationFactory;
use crate::script::Interpreter;

pub mod arguments;
pub mod events;
pub mod execution_queue;
pub mod factory;
pub mod io;
pub mod node;
pub mod runner;

pub use arguments::{ArgumentCallback, Arguments};
pub use execution_queue::ExecutionQueue;
pub use factory::NodeFactory;
pub use node::{
    ExecutionContext, InputInterfaceNode, Node, NodeBehavior, NodeCategory, NodeId, NodeRef,
    NodeSet, NodeState, OperationNode, OutputInterfaceNode, ParameterNode,
};

/// Name of the root context every node context hangs off.
pub const ROOT_CONTEXT: &str = "graph";

/// Directed link between two nodes.
///
/// `out_interface` and `in_interface` hold the names given when the edge was
/// created; defaults are resolved against the endpoint kinds and kept
/// separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub out_interface: Option<String>,
    pub in_interface: Option<String>,
    resolved_out: Option<String>,
    resolved_in: Option<String>,
}

impl Edge {
    /// Output interface the edge reads from, after defaulting.
    pub fn resolved_out(&self) -> Option<&str> {
        self.resolved_out.as_deref()
    }

    /// Input interface the edge writes to, after defaulting.
    pub fn resolved_in(&self) -> Option<&str> {
        self.resolved_in.as_deref()
    }
}

/// What a visit left behind.
#[derive(Debug, Clone, Default)]
pub(crate) struct Visit {
    pub produced: usize,
    pub warnings: Vec<String>,
}

pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    names: HashMap<String, NodeId>,
    edges: Vec<Edge>,
    next_id: u32,
    node_factory: NodeFactory,
    operation_factory: Arc<OperationFactory>,
    contexts: ContextArena,
    root_context: ContextId,
    objects: ObjectArena,
    interfaces: InterfaceTable,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.values().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .field("objects", &self.objects.len())
            .finish()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// A graph with the default node kinds and operations.
    pub fn new() -> Self {
        let operations = Arc::new(OperationFactory::with_defaults());
        let nodes = NodeFactory::with_defaults(Arc::clone(&operations));
        Self::with_factories(nodes, operations)
    }

    pub fn with_factories(node_factory: NodeFactory, operation_factory: Arc<OperationFactory>) -> Self {
        let mut contexts = ContextArena::new();
        let root_context = contexts.create(ROOT_CONTEXT);
        Self {
            nodes: BTreeMap::new(),
            names: HashMap::new(),
            edges: Vec::new(),
            next_id: 0,
            node_factory,
            operation_factory,
            contexts,
            root_context,
            objects: ObjectArena::new(),
            interfaces: InterfaceTable::new(),
        }
    }

    pub fn node_factory(&self) -> &NodeFactory {
        &self.node_factory
    }

    pub fn operation_factory(&self) -> &OperationFactory {
        &self.operation_factory
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.names.contains_key(base) {
            return base.to_owned();
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{}{}", base, n);
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Instantiates a node of a registered kind. Without a name the node is
    /// named after its kind; names already taken get a numeric suffix.
    pub fn create_node(&mut self, type_name: &str, name: Option<&str>) -> Result<NodeId> {
        let behavior = self
            .node_factory
            .create(type_name)
            .ok_or_else(|| Error::UnknownNodeType {
                type_name: type_name.to_owned(),
            })?;
        let base = name.filter(|n| !n.is_empty()).unwrap_or(type_name);
        let unique = self.unique_name(base);
        if unique != base {
            warn!("Node name '{}' is taken; using '{}'.", base, unique);
        }

        let context = self.contexts.create(unique.as_str());
        self.contexts.set_parent(context, Some(self.root_context))?;

        let id = NodeId::from_raw(self.next_id);
        self.next_id += 1;
        self.names.insert(unique.clone(), id);
        self.nodes.insert(
            id,
            Node {
                id,
                name: unique,
                position: Vec2::ZERO,
                behavior,
                context,
                state: Default::default(),
                constructed: false,
            },
        );
        Ok(id)
    }

    /// Applies construction arguments and declares the node's interfaces.
    /// Reconstructing a node drops whatever its old queues held.
    pub fn construct_node(&mut self, id: NodeId, args: &dyn ArgumentCallback) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("node", id.to_string()))?;
        node.behavior.set_construction_arguments(args)?;
        let held = self.interfaces.remove_node(id);
        let dropped = self.objects.discard(held);
        if dropped > 0 {
            warn!(
                "Reconstructing node '{}' dropped {} queued object(s).",
                node.name, dropped
            );
        }
        for name in node.behavior.input_interfaces() {
            self.interfaces.declare(id, Direction::Input, &name);
        }
        for name in node.behavior.output_interfaces() {
            self.interfaces.declare(id, Direction::Output, &name);
        }
        node.constructed = true;
        Ok(())
    }

    /// Stores execution arguments as parameters of the node's context.
    pub fn set_execution_arguments(&mut self, id: NodeId, args: &dyn ArgumentCallback) -> Result<()> {
        let node = self
            .nodes
            .get(&id)
            .ok_or_else(|| Error::not_found("node", id.to_string()))?;
        node.behavior
            .set_execution_arguments(args, &mut self.contexts, node.context)
    }

    /// Creates and constructs an operation node.
    pub fn add_operation(&mut self, name: &str, operation: &str) -> Result<NodeId> {
        let id = self.create_node(OperationNode::TYPE_NAME, Some(name))?;
        let args = Arguments::new(self.node_name(id)).with_value("operation", operation);
        self.construct_or_destroy(id, &args)
    }

    /// Creates and constructs an input interface node.
    pub fn add_input_interface(&mut self, name: &str, interface: &str) -> Result<NodeId> {
        let id = self.create_node(InputInterfaceNode::TYPE_NAME, Some(name))?;
        let args = Arguments::new(self.node_name(id)).with_value("interface", interface);
        self.construct_or_destroy(id, &args)
    }

    /// Creates and constructs an output interface node.
    pub fn add_output_interface(&mut self, name: &str, interface: &str) -> Result<NodeId> {
        let id = self.create_node(OutputInterfaceNode::TYPE_NAME, Some(name))?;
        let args = Arguments::new(self.node_name(id)).with_value("interface", interface);
        self.construct_or_destroy(id, &args)
    }

    /// Creates a parameter node holding `parameters`.
    pub fn add_parameter_node(&mut self, name: &str, parameters: &Arguments) -> Result<NodeId> {
        let id = self.create_node(ParameterNode::TYPE_NAME, Some(name))?;
        let id = self.construct_or_destroy(id, &Arguments::new(self.node_name(id)))?;
        self.set_execution_arguments(id, parameters)?;
        Ok(id)
    }

    fn node_name(&self, id: NodeId) -> String {
        self.nodes
            .get(&id)
            .map(|n| n.name.clone())
            .unwrap_or_default()
    }

    fn construct_or_destroy(&mut self, id: NodeId, args: &dyn ArgumentCallback) -> Result<NodeId> {
        match self.construct_node(id, args) {
            Ok(()) => Ok(id),
            Err(e) => {
                self.destroy_node(id)?;
                Err(e)
            }
        }
    }

    /// Sets a graph-level parameter, visible to every node expression.
    pub fn set_parameter(&mut self, name: impl Into<String>, parameter: impl Into<Parameter>) -> Result<()> {
        self.contexts
            .create_parameter(self.root_context, name, parameter.into())
    }

    /// Sets a parameter directly on a node's context.
    pub fn set_node_parameter(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        parameter: impl Into<Parameter>,
    ) -> Result<()> {
        let context = self
            .nodes
            .get(&id)
            .map(|n| n.context)
            .ok_or_else(|| Error::not_found("node", id.to_string()))?;
        self.contexts.create_parameter(context, name, parameter.into())
    }

    pub fn node_parameter(&self, id: NodeId, name: &str) -> Result<&Parameter> {
        let node = self
            .nodes
            .get(&id)
            .ok_or_else(|| Error::not_found("node", id.to_string()))?;
        self.contexts.get_parameter(node.context, name)
    }

    pub fn contexts(&self) -> &ContextArena {
        &self.contexts
    }

    pub fn contexts_mut(&mut self) -> &mut ContextArena {
        &mut self.contexts
    }

    pub fn root_context(&self) -> ContextId {
        self.root_context
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.names.get(name).and_then(|id| self.nodes.get(id))
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    /// Ids of the nodes matching `predicate`, in creation order.
    pub fn find_nodes<P>(&self, mut predicate: P) -> Vec<NodeId>
    where
        P: FnMut(&Node) -> bool,
    {
        self.nodes
            .values()
            .filter(|n| predicate(n))
            .map(|n| n.id)
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Removes a node with its edges, context and queued objects.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<()> {
        let node = self
            .nodes
            .remove(&id)
            .ok_or_else(|| Error::not_found("node", id.to_string()))?;
        self.names.remove(&node.name);
        self.edges.retain(|e| e.source != id && e.target != id);
        let held = self.interfaces.remove_node(id);
        self.objects.discard(held);
        self.contexts.remove(node.context)
    }

    fn endpoint(&self, id: NodeId, argument: &str) -> Result<&Node> {
        self.nodes.get(&id).ok_or_else(|| Error::MissingArgument {
            node: id.to_string(),
            argument: argument.to_owned(),
        })
    }

    /// Links `source` to `target`. Interface names left out default to the
    /// interface node's own name; see the module docs for allowed pairs.
    pub fn create_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        out_interface: Option<&str>,
        in_interface: Option<&str>,
    ) -> Result<()> {
        let src = self.endpoint(source, "source node")?;
        let dst = self.endpoint(target, "target node")?;
        let (resolved_out, resolved_in) = resolve_link(src, dst, out_interface, in_interface)?;

        if self.edges.iter().any(|e| {
            e.source == source
                && e.target == target
                && e.resolved_out == resolved_out
                && e.resolved_in == resolved_in
        }) {
            return Err(Error::EdgeExists {
                source_node: src.name.clone(),
                target_node: dst.name.clone(),
            });
        }

        self.edges.push(Edge {
            source,
            target,
            out_interface: out_interface.map(str::to_owned),
            in_interface: in_interface.map(str::to_owned),
            resolved_out,
            resolved_in,
        });
        Ok(())
    }

    /// Removes every edge from `source` to `target`, returning how many.
    pub fn destroy_edge(&mut self, source: NodeId, target: NodeId) -> usize {
        let before = self.edges.len();
        self.edges
            .retain(|e| !(e.source == source && e.target == target));
        before - self.edges.len()
    }

    /// Edges in creation order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Distinct predecessors of `id`, in edge order.
    pub fn input_nodes(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for e in self.edges.iter().filter(|e| e.target == id) {
            if !out.contains(&e.source) {
                out.push(e.source);
            }
        }
        out
    }

    /// Distinct successors of `id`, in edge order.
    pub fn output_nodes(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for e in self.edges.iter().filter(|e| e.source == id) {
            if !out.contains(&e.target) {
                out.push(e.target);
            }
        }
        out
    }

    /// Predecessors followed by successors, without repeats.
    pub fn adjacent_nodes(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = self.input_nodes(id);
        for n in self.output_nodes(id) {
            if !out.contains(&n) {
                out.push(n);
            }
        }
        out
    }

    /// Nodes without incoming edges.
    pub fn graph_input_nodes(&self) -> Vec<NodeId> {
        self.find_nodes(|n| !self.edges.iter().any(|e| e.target == n.id))
    }

    /// Nodes without outgoing edges.
    pub fn graph_output_nodes(&self) -> Vec<NodeId> {
        self.find_nodes(|n| !self.edges.iter().any(|e| e.source == n.id))
    }

    fn node_ref(&self, id: NodeId, edge: &Edge) -> Option<NodeRef> {
        let node = self.nodes.get(&id)?;
        Some(NodeRef {
            id,
            name: node.name.clone(),
            category: node.category(),
            context: node.context,
            interface: node.behavior.interface_name().map(str::to_owned),
            out_interface: edge.resolved_out.clone(),
            in_interface: edge.resolved_in.clone(),
        })
    }

    /// Immediate neighbors of `id` as (inputs, outputs), one entry per edge.
    pub fn node_sets(&self, id: NodeId) -> (NodeSet, NodeSet) {
        let inputs = self
            .edges
            .iter()
            .filter(|e| e.target == id)
            .filter_map(|e| self.node_ref(e.source, e))
            .collect();
        let outputs = self
            .edges
            .iter()
            .filter(|e| e.source == id)
            .filter_map(|e| self.node_ref(e.target, e))
            .collect();
        (inputs, outputs)
    }

    /// Schedule for the current structure.
    pub fn execution_queue(&self) -> Result<ExecutionQueue> {
        ExecutionQueue::build(
            self.nodes.keys().copied(),
            self.edges.iter().map(|e| (e.source, e.target)),
        )
    }

    fn boundary_queue(&self, id: NodeId) -> Result<(Direction, String)> {
        let node = self
            .nodes
            .get(&id)
            .ok_or_else(|| Error::not_found("node", id.to_string()))?;
        let direction = match node.category() {
            NodeCategory::InputInterface => Direction::Output,
            NodeCategory::OutputInterface => Direction::Input,
            other => {
                return Err(Error::InvalidArgument {
                    argument: "node".into(),
                    message: format!(
                        "'{}' is a {} node; objects live on interface nodes",
                        node.name,
                        other.as_str()
                    ),
                })
            }
        };
        let interface = node
            .behavior
            .interface_name()
            .ok_or_else(|| Error::MissingArgument {
                node: node.name.clone(),
                argument: "interface".into(),
            })?;
        Ok((direction, interface.to_owned()))
    }

    /// Queues a user object on an interface node.
    pub fn push_object(&mut self, id: NodeId, object: ProceduralObject) -> Result<ObjectId> {
        let (direction, interface) = self.boundary_queue(id)?;
        let object = self.objects.insert(object);
        self.interfaces.push(id, direction, &interface, object)?;
        Ok(object)
    }

    /// Objects currently queued on a node, in queue order.
    pub fn objects_at(&self, id: NodeId) -> Vec<&ProceduralObject> {
        self.interfaces
            .objects_of(id)
            .into_iter()
            .filter_map(|o| self.objects.get(o))
            .collect()
    }

    /// Removes and returns everything queued on a node.
    pub fn take_objects(&mut self, id: NodeId) -> Vec<ProceduralObject> {
        self.interfaces
            .clear_node(id)
            .into_iter()
            .filter_map(|o| self.objects.remove(o))
            .collect()
    }

    pub fn objects(&self) -> &ObjectArena {
        &self.objects
    }

    fn is_root_input(&self, node: &Node) -> bool {
        node.category() == NodeCategory::InputInterface
            && !self.edges.iter().any(|e| e.target == node.id)
    }

    /// Discards objects queued anywhere but on root input interfaces.
    pub(crate) fn clear_transient_queues(&mut self) -> usize {
        let transient = self.find_nodes(|n| !self.is_root_input(n));
        let mut dropped = 0;
        for id in transient {
            let held = self.interfaces.clear_node(id);
            dropped += self.objects.discard(held);
        }
        dropped
    }

    pub(crate) fn reset_states(&mut self) {
        for node in self.nodes.values_mut() {
            node.state = NodeState::Idle;
        }
    }

    /// Runs one visit of `id`.
    pub(crate) fn visit(
        &mut self,
        id: NodeId,
        interpreter: &mut Interpreter,
        max_depth: usize,
    ) -> Result<Visit> {
        let (inputs, outputs) = self.node_sets(id);
        let created_before = self.objects.created();

        let Graph {
            nodes,
            contexts,
            objects,
            interfaces,
            ..
        } = &mut *self;
        let node = nodes
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("node", id.to_string()))?;
        if !node.constructed {
            node.state = NodeState::Failed;
            return Err(Error::MissingArgument {
                node: node.name.clone(),
                argument: "construction arguments".into(),
            });
        }
        node.state = NodeState::Executing;

        let mut cx = ExecutionContext {
            node: id,
            name: &node.name,
            context: node.context,
            objects,
            interfaces,
            contexts,
            interpreter,
            max_depth,
            warnings: Vec::new(),
        };
        let outcome = node.behavior.execute(&mut cx, &inputs, &outputs);
        let warnings = std::mem::take(&mut cx.warnings);
        drop(cx);

        node.state = if outcome.is_ok() {
            NodeState::Done
        } else {
            NodeState::Failed
        };
        outcome?;
        Ok(Visit {
            produced: (self.objects.created() - created_before) as usize,
            warnings,
        })
    }
}

/// Resolves the (out, in) interface names of a link and checks it is allowed.
fn resolve_link(
    src: &Node,
    dst: &Node,
    out_interface: Option<&str>,
    in_interface: Option<&str>,
) -> Result<(Option<String>, Option<String>)> {
    let unsupported = |node: &Node, direction: &'static str, interface: &str| Error::UnsupportedNodeLink {
        node: node.name.clone(),
        node_type: node.type_name().to_owned(),
        direction,
        interface: interface.to_owned(),
    };

    // Boundary nodes expose exactly their own interface name.
    let boundary = |node: &Node, direction: &'static str, given: Option<&str>| -> Result<String> {
        let own = node.behavior.interface_name().ok_or_else(|| Error::MissingArgument {
            node: node.name.clone(),
            argument: "interface".into(),
        })?;
        match given {
            Some(name) if name != own => Err(unsupported(node, direction, name)),
            _ => Ok(own.to_owned()),
        }
    };

    // Operation side: an explicit name must be declared; otherwise prefer the
    // peer's name, then a sole interface.
    let operation_side = |node: &Node,
                          direction: &'static str,
                          declared: Vec<String>,
                          given: Option<&str>,
                          peer: &str|
     -> Result<Option<String>> {
        if let Some(name) = given {
            return if declared.iter().any(|d| d == name) {
                Ok(Some(name.to_owned()))
            } else {
                Err(unsupported(node, direction, name))
            };
        }
        if declared.iter().any(|d| d == peer) {
            return Ok(Some(peer.to_owned()));
        }
        match declared.as_slice() {
            [] if direction == "input" => Ok(None),
            [only] => Ok(Some(only.clone())),
            _ => Err(unsupported(node, direction, peer)),
        }
    };

    match (src.category(), dst.category()) {
        (NodeCategory::Operation, NodeCategory::OutputInterface) => {
            let input = boundary(dst, "input", in_interface)?;
            let output = operation_side(
                src,
                "output",
                src.behavior.output_interfaces(),
                out_interface,
                &input,
            )?;
            Ok((output, Some(input)))
        }
        (NodeCategory::InputInterface, NodeCategory::Operation) => {
            let output = boundary(src, "output", out_interface)?;
            let input = operation_side(
                dst,
                "input",
                dst.behavior.input_interfaces(),
                in_interface,
                &output,
            )?;
            Ok((Some(output), input))
        }
        (NodeCategory::OutputInterface, NodeCategory::InputInterface) => {
            let output = boundary(src, "output", out_interface)?;
            let input = boundary(dst, "input", in_interface)?;
            Ok((Some(output), Some(input)))
        }
        (NodeCategory::Parameter, _) => match (out_interface, in_interface) {
            (Some(name), _) => Err(unsupported(src, "output", name)),
            (None, Some(name)) => Err(unsupported(dst, "input", name)),
            (None, None) => Ok((None, None)),
        },
        _ => Err(unsupported(
            dst,
            "input",
            in_interface.unwrap_or(src.type_name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn rect_graph() -> (Graph, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new();
        let input = graph.add_input_interface("in", "in").expect("in");
        let op = graph.add_operation("op", "CreateRect").expect("op");
        let out = graph.add_output_interface("out", "out").expect("out");
        graph.create_edge(input, op, None, None).expect("in -> op");
        graph.create_edge(op, out, None, None).expect("op -> out");
        (graph, input, op, out)
    }

    #[test]
    fn unknown_node_type_is_rejected() {
        let mut graph = Graph::new();
        let err = graph.create_node("Subgraph", Some("x")).expect_err("unknown");
        assert!(matches!(err, Error::UnknownNodeType { ref type_name } if type_name == "Subgraph"));
    }

    #[test]
    fn duplicate_names_get_a_suffix() {
        let mut graph = Graph::new();
        let a = graph.create_node("Parameter", Some("op")).expect("a");
        let b = graph.create_node("Parameter", Some("op")).expect("b");
        let c = graph.create_node("Parameter", Some("op")).expect("c");
        assert_eq!(graph.node(a).map(Node::name), Some("op"));
        assert_eq!(graph.node(b).map(Node::name), Some("op1"));
        assert_eq!(graph.node(c).map(Node::name), Some("op2"));
        assert_eq!(graph.node_id("op1"), Some(b));
    }

    #[test]
    fn unregistered_operation_is_rejected_and_rolled_back() {
        let mut graph = Graph::new();
        let err = graph.add_operation("op", "Extrude").expect_err("unknown");
        assert!(matches!(err, Error::UnknownOperation { ref name } if name == "Extrude"));
        assert!(graph.is_empty());
        assert!(graph.node_by_name("op").is_none());
    }

    #[test]
    fn missing_operation_argument_is_reported() {
        let mut graph = Graph::new();
        let id = graph.create_node("Operation", Some("op")).expect("created");
        let err = graph
            .construct_node(id, &Arguments::new("op"))
            .expect_err("missing");
        assert!(matches!(err, Error::MissingArgument { ref argument, .. } if argument == "operation"));
    }

    #[test]
    fn edges_resolve_default_interfaces() {
        let (graph, input, op, out) = rect_graph();
        let edges = graph.edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].source, input);
        assert_eq!(edges[0].resolved_out(), Some("in"));
        // CreateRect has no inputs: the link only orders the nodes.
        assert_eq!(edges[0].resolved_in(), None);
        assert_eq!(edges[1].target, out);
        assert_eq!(edges[1].resolved_out(), Some("out"));
        assert_eq!(edges[1].resolved_in(), Some("out"));
        assert_eq!(graph.output_nodes(op), vec![out]);
    }

    #[test]
    fn operation_output_falls_back_to_its_sole_interface() {
        let mut graph = Graph::new();
        let op = graph.add_operation("op", "CreateBox").expect("op");
        let out = graph.add_output_interface("result", "geometry").expect("out");
        graph.create_edge(op, out, None, None).expect("linked");
        assert_eq!(graph.edges()[0].resolved_out(), Some("out"));
        assert_eq!(graph.edges()[0].resolved_in(), Some("geometry"));
    }

    #[test]
    fn debug_lists_nodes_and_edges() {
        let mut graph = Graph::new();
        let op = graph.add_operation("box", "CreateBox").expect("op");
        let out = graph.add_output_interface("out", "out").expect("out");
        graph.create_edge(op, out, None, None).expect("edge");
        let text = format!("{graph:?}");
        assert!(text.starts_with("Graph {"));
        assert!(text.contains("\"box\""));
        assert!(text.contains("objects: 0"));
    }

    #[test]
    fn link_rules_are_enforced() {
        let mut graph = Graph::new();
        let a = graph.add_operation("a", "CreateRect").expect("a");
        let b = graph.add_operation("b", "Translate").expect("b");
        let err = graph.create_edge(a, b, None, None).expect_err("op -> op");
        assert!(matches!(err, Error::UnsupportedNodeLink { .. }));

        let input = graph.add_input_interface("in", "in").expect("in");
        let err = graph
            .create_edge(input, b, None, Some("missing"))
            .expect_err("no such interface");
        assert!(matches!(
            err,
            Error::UnsupportedNodeLink { ref interface, direction: "input", .. } if interface == "missing"
        ));

        let p = graph
            .add_parameter_node("p", &Arguments::new("p"))
            .expect("p");
        graph.create_edge(p, a, None, None).expect("parameter -> any");
    }

    #[test]
    fn duplicate_edges_and_missing_endpoints_fail() {
        let (mut graph, input, op, _) = rect_graph();
        let err = graph.create_edge(input, op, None, None).expect_err("dup");
        assert!(matches!(err, Error::EdgeExists { .. }));

        let err = graph
            .create_edge(input, NodeId::from_raw(99), None, None)
            .expect_err("missing");
        assert!(matches!(err, Error::MissingArgument { ref argument, .. } if argument == "target node"));
    }

    #[test]
    fn queries_follow_edges() {
        let (graph, input, op, out) = rect_graph();
        assert_eq!(graph.input_nodes(op), vec![input]);
        assert_eq!(graph.adjacent_nodes(op), vec![input, out]);
        assert_eq!(graph.graph_input_nodes(), vec![input]);
        assert_eq!(graph.graph_output_nodes(), vec![out]);
        let interfaces = graph.find_nodes(|n| n.category() != NodeCategory::Operation);
        assert_eq!(interfaces, vec![input, out]);
    }

    #[test]
    fn destroy_node_drops_edges_context_and_objects() {
        let (mut graph, input, op, _) = rect_graph();
        graph
            .push_object(input, ProceduralObject::new())
            .expect("queued");
        let context = graph.node(input).map(Node::context).expect("live");
        graph.destroy_node(input).expect("destroyed");
        assert!(graph.node(input).is_none());
        assert!(!graph.contexts().contains(context));
        assert!(graph.objects().is_empty());
        assert_eq!(graph.input_nodes(op), Vec::<NodeId>::new());
        assert_eq!(graph.destroy_edge(op, NodeId::from_raw(2)), 1);
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn objects_live_on_interface_nodes_only() {
        let (mut graph, input, op, _) = rect_graph();
        let err = graph
            .push_object(op, ProceduralObject::new())
            .expect_err("operation");
        assert!(matches!(err, Error::InvalidArgument { .. }));
        graph
            .push_object(input, ProceduralObject::new())
            .expect("queued");
        assert_eq!(graph.objects_at(input).len(), 1);
        assert_eq!(graph.take_objects(input).len(), 1);
        assert!(graph.objects_at(input).is_empty());
    }

    #[test]
    fn execution_arguments_fill_declared_defaults() {
        let mut graph = Graph::new();
        let op = graph.add_operation("op", "CreateRect").expect("op");
        graph
            .set_execution_arguments(op, &Arguments::new("op").with_value("width", 2))
            .expect("set");
        assert_eq!(
            graph.node_parameter(op, "width").ok().and_then(Parameter::as_value),
            Some(&Value::Float(2.0))
        );
        assert_eq!(
            graph.node_parameter(op, "plane").ok().and_then(Parameter::as_value),
            Some(&Value::from("z"))
        );
    }
}

#![forbid(unsafe_code)]
//! proc_graph: Procedural content generation from operation graphs.
//!
//! Modules:
//! - value: dynamically typed values, operator dispatch and callables
//! - script: lexer, parser and tree-walking interpreter of the expression language
//! - context: hierarchical parameter namespaces
//! - expression: parameter expressions resolved through the context tree
//! - objects: procedural objects, geometry and interface queues
//! - operations: the pluggable operation contract and built-in operations
//! - graph: nodes, edges, scheduling, the runner, events and the text format
//!
//! For examples, see the `proc_graph_examples` crate.
pub mod context;
pub mod error;
pub mod expression;
pub mod graph;
pub mod objects;
pub mod operations;
pub mod script;
pub mod value;

/// Convenient re-exports for common types. Import with `use proc_graph::prelude::*;`.
pub mod prelude {
    pub use crate::context::{ContextArena, ContextId, Parameter};
    pub use crate::error::{Error, Result};
    pub use crate::expression::{Expression, ParameterResolver};
    pub use crate::graph::events::{
        EventSink, ExecutionEvent, ExecutionEventKind, FnSink, MultiSink, VecSink,
    };
    pub use crate::graph::io::{read_graph, read_into, write_graph};
    pub use crate::graph::runner::{run_graph, GraphRunner, RunConfig, RunResult};
    pub use crate::graph::{
        ArgumentCallback, Arguments, Edge, ExecutionQueue, Graph, Node, NodeBehavior,
        NodeCategory, NodeFactory, NodeId, NodeState,
    };
    pub use crate::objects::{Geometry, ObjectArena, ObjectId, ProceduralObject};
    pub use crate::operations::{Job, Operation, OperationFactory, ParameterDecl};
    pub use crate::script::{
        BufferSink, FnOutputSink, Interpreter, InterpreterConfig, OutputSink, TracingSink,
    };
    pub use crate::value::{Callable, Plane, TypeInfo, Value, ValueKind};
}

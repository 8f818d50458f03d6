//! Drives a [`Graph`] through one pass.
//!
//! A pass builds the [`ExecutionQueue`](crate::graph::ExecutionQueue),
//! reseeds the interpreter, clears queues left over from an earlier pass
//! (root input interfaces keep injected objects) and visits every node once
//! in depth order. The first failing visit aborts the pass; objects still in
//! flight are discarded.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::graph::events::{EventSink, ExecutionEvent, ExecutionEventKind};
use crate::graph::node::NodeCategory;
use crate::graph::Graph;
use crate::script::{Interpreter, InterpreterConfig, OutputSink};

/// Configuration for running a graph.
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Seed for the `random` builtin, applied at the start of every pass.
    pub seed: u64,
    /// Bound on nested parameter-expression resolution and script calls.
    pub max_evaluation_depth: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_evaluation_depth: 64,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the evaluation depth bound.
    pub fn with_max_evaluation_depth(mut self, depth: usize) -> Self {
        self.max_evaluation_depth = depth;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_evaluation_depth == 0 {
            return Err(Error::InvalidConfig(
                "max_evaluation_depth must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Summary of one pass.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    /// Node visits performed.
    pub visits: usize,
    /// Objects created during the pass, copies included.
    pub objects_created: usize,
    /// Objects left over from an earlier pass and discarded at its start.
    pub objects_discarded: usize,
    /// Objects waiting on each terminal output interface, by node name.
    pub outputs: Vec<(String, usize)>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Objects waiting on the named output node, if it is terminal.
    pub fn output(&self, name: &str) -> Option<usize> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, count)| *count)
    }
}

pub struct GraphRunner {
    /// Run configuration applied to this runner.
    pub config: RunConfig,
    interpreter: Interpreter,
}

impl GraphRunner {
    pub fn try_new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn new(config: RunConfig) -> Self {
        debug_assert!(
            config.max_evaluation_depth > 0,
            "max_evaluation_depth must be > 0"
        );
        let interpreter = Interpreter::with_config(
            InterpreterConfig::new()
                .with_seed(config.seed)
                .with_max_call_depth(config.max_evaluation_depth),
        );
        Self {
            config,
            interpreter,
        }
    }

    /// Routes script `print` output to `sink`.
    pub fn with_output_sink(mut self, sink: impl OutputSink + 'static) -> Self {
        self.interpreter.set_sink(Box::new(sink));
        self
    }

    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Runs one pass over `graph`.
    pub fn run(&mut self, graph: &mut Graph) -> Result<RunResult> {
        self.run_with_events(graph, &mut ())
    }

    pub fn run_with_events(
        &mut self,
        graph: &mut Graph,
        sink: &mut dyn EventSink,
    ) -> Result<RunResult> {
        let mut queue = graph.execution_queue()?;
        let node_count = queue.node_count();
        info!(
            "Running graph with {} node visit(s) over {} depth level(s).",
            node_count,
            queue.max_depth().map_or(0, |d| d + 1)
        );
        if sink.wants(ExecutionEventKind::RunStarted) {
            sink.send(ExecutionEvent::RunStarted {
                config: self.config.clone(),
                node_count,
            });
        }

        self.interpreter.reseed(self.config.seed);
        self.interpreter
            .set_max_call_depth(self.config.max_evaluation_depth);
        graph.reset_states();

        let mut result = RunResult::new();
        result.objects_discarded = graph.clear_transient_queues();
        if result.objects_discarded > 0 {
            warn!(
                "Discarded {} object(s) left over from a previous pass.",
                result.objects_discarded
            );
            if sink.wants(ExecutionEventKind::Warning) {
                sink.send(ExecutionEvent::Warning {
                    context: "graph".into(),
                    message: format!(
                        "Discarded {} object(s) left over from a previous pass",
                        result.objects_discarded
                    ),
                });
            }
        }
        let created_before = graph.objects().created();

        while let Some((id, depth)) = queue.next_node() {
            let name = graph
                .node(id)
                .map(|n| n.name().to_owned())
                .unwrap_or_default();
            debug!("Visiting node '{}' ({}) at depth {}.", name, id, depth);
            if sink.wants(ExecutionEventKind::NodeStarted) {
                sink.send(ExecutionEvent::NodeStarted {
                    node: id,
                    name: name.clone(),
                    depth,
                });
            }

            result.visits += 1;
            match graph.visit(id, &mut self.interpreter, self.config.max_evaluation_depth) {
                Ok(visit) => {
                    if sink.wants(ExecutionEventKind::Warning) {
                        for message in visit.warnings {
                            sink.send(ExecutionEvent::Warning {
                                context: name.clone(),
                                message,
                            });
                        }
                    }
                    if sink.wants(ExecutionEventKind::NodeFinished) {
                        sink.send(ExecutionEvent::NodeFinished {
                            node: id,
                            name,
                            produced: visit.produced,
                        });
                    }
                }
                Err(e) => {
                    warn!("Node '{}' failed: {}.", name, e);
                    if sink.wants(ExecutionEventKind::NodeFailed) {
                        sink.send(ExecutionEvent::NodeFailed {
                            node: id,
                            name: name.clone(),
                            message: e.to_string(),
                        });
                    }
                    let dropped = graph.clear_transient_queues();
                    if dropped > 0 {
                        warn!(
                            "Discarded {} in-flight object(s) after '{}' failed.",
                            dropped, name
                        );
                    }
                    return Err(Error::NodeFailed {
                        node: name,
                        source: Box::new(e),
                    });
                }
            }
        }

        result.objects_created = (graph.objects().created() - created_before) as usize;
        result.outputs = graph
            .graph_output_nodes()
            .into_iter()
            .filter_map(|id| graph.node(id))
            .filter(|n| n.category() == NodeCategory::OutputInterface)
            .map(|n| (n.name().to_owned(), graph.objects_at(n.id()).len()))
            .collect();

        info!(
            "Graph run finished: {} visit(s), {} object(s) created.",
            result.visits, result.objects_created
        );
        if sink.wants(ExecutionEventKind::RunFinished) {
            sink.send(ExecutionEvent::RunFinished {
                result: result.clone(),
            });
        }
        Ok(result)
    }
}

impl Default for GraphRunner {
    fn default() -> Self {
        Self::new(RunConfig::default())
    }
}

/// Runs one pass with a fresh runner.
pub fn run_graph(graph: &mut Graph, config: &RunConfig) -> Result<RunResult> {
    GraphRunner::try_new(config.clone())?.run(graph)
}

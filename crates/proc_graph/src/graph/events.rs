//! Event types and sinks for observing graph runs.
//!
//! [`crate::graph::runner::GraphRunner::run_with_events`] reports the
//! progress of a pass as [`ExecutionEvent`]s. Sinks may declare interest in
//! a subset of event kinds with [`EventSink::wants`] so the runner can skip
//! building events nobody listens to.
use crate::graph::node::NodeId;
use crate::graph::runner::{RunConfig, RunResult};

/// Describes events emitted while a graph executes.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    /// Emitted once the schedule is built, before any node runs.
    RunStarted {
        /// The run configuration used.
        config: RunConfig,
        /// Number of scheduled visits.
        node_count: usize,
    },

    /// Emitted before a node is visited.
    NodeStarted {
        node: NodeId,
        name: String,
        /// Depth of the node in the schedule.
        depth: usize,
    },

    /// Emitted after a node finished its visit.
    NodeFinished {
        node: NodeId,
        name: String,
        /// Objects created in the arena during the visit.
        produced: usize,
    },

    /// Emitted when a visit fails. The pass is aborted afterwards.
    NodeFailed {
        node: NodeId,
        name: String,
        message: String,
    },

    /// Emitted when the entire pass finishes.
    RunFinished {
        /// Aggregated result of the pass.
        result: RunResult,
    },

    /// Non-fatal warning generated during execution.
    Warning {
        /// Context string (usually the node name).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`ExecutionEvent`], for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionEventKind {
    RunStarted,
    NodeStarted,
    NodeFinished,
    NodeFailed,
    RunFinished,
    Warning,
}

impl ExecutionEvent {
    pub fn kind(&self) -> ExecutionEventKind {
        match self {
            ExecutionEvent::RunStarted { .. } => ExecutionEventKind::RunStarted,
            ExecutionEvent::NodeStarted { .. } => ExecutionEventKind::NodeStarted,
            ExecutionEvent::NodeFinished { .. } => ExecutionEventKind::NodeFinished,
            ExecutionEvent::NodeFailed { .. } => ExecutionEventKind::NodeFailed,
            ExecutionEvent::RunFinished { .. } => ExecutionEventKind::RunFinished,
            ExecutionEvent::Warning { .. } => ExecutionEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`ExecutionEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: ExecutionEvent);

    /// Whether events of `kind` should be built and sent at all.
    fn wants(&self, _kind: ExecutionEventKind) -> bool {
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = ExecutionEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: ExecutionEvent) {}

    #[inline]
    fn wants(&self, _kind: ExecutionEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(ExecutionEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(ExecutionEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(ExecutionEvent),
{
    #[inline]
    fn send(&mut self, event: ExecutionEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally only some kinds.
#[derive(Default)]
pub struct VecSink {
    events: Vec<ExecutionEvent>,
    only: Option<Vec<ExecutionEventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
            only: None,
        }
    }

    /// Keeps only events of the given kinds.
    pub fn only(kinds: impl IntoIterator<Item = ExecutionEventKind>) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.into_iter().collect()),
        }
    }

    pub fn into_inner(self) -> Vec<ExecutionEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[ExecutionEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: ExecutionEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    fn wants(&self, kind: ExecutionEventKind) -> bool {
        self.only.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn into_inner(self) -> Vec<S> {
        self.sinks
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: ExecutionEvent) {
        let kind = event.kind();
        let interested: Vec<usize> = (0..self.sinks.len())
            .filter(|&i| self.sinks[i].wants(kind))
            .collect();
        let Some((&last, rest)) = interested.split_last() else {
            return;
        };
        for &i in rest {
            self.sinks[i].send(event.clone());
        }
        self.sinks[last].send(event);
    }

    fn wants(&self, kind: ExecutionEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}

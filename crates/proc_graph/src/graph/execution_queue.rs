//! Depth-ordered visit schedule.
//!
//! Depths are longest-path levels from the roots (nodes with no incoming
//! edges): `depth(n) = 1 + max(depth(p))` over predecessors `p`. The queue
//! yields every node once, sorted by `(depth, id)`, so all producers at depth
//! `d` run before any consumer at `d + 1` and ties follow creation order.
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::graph::node::NodeId;

#[derive(Debug, Clone, Default)]
pub struct ExecutionQueue {
    order: Vec<(NodeId, usize)>,
    depths: BTreeMap<NodeId, usize>,
    cursor: usize,
}

impl ExecutionQueue {
    /// Schedules `nodes` connected by `edges` (source, target). Edges naming
    /// unknown nodes and cycles are both reported as scheduling errors.
    pub fn build<N, E>(nodes: N, edges: E) -> Result<Self>
    where
        N: IntoIterator<Item = NodeId>,
        E: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let mut indeg: BTreeMap<NodeId, usize> = nodes.into_iter().map(|n| (n, 0)).collect();
        let mut dependents: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();

        for (source, target) in edges {
            if !indeg.contains_key(&source) || !indeg.contains_key(&target) {
                return Err(Error::Schedule(format!(
                    "Edge {} -> {} references a node outside the graph",
                    source, target
                )));
            }
            if dependents.entry(source).or_default().insert(target) {
                if let Some(d) = indeg.get_mut(&target) {
                    *d += 1;
                }
            }
        }

        let mut depths: BTreeMap<NodeId, usize> = BTreeMap::new();
        let mut ready: Vec<NodeId> = indeg
            .iter()
            .filter_map(|(k, &v)| if v == 0 { Some(*k) } else { None })
            .collect();
        for root in &ready {
            depths.insert(*root, 0);
        }

        let mut visited = 0usize;
        while let Some(n) = ready.pop() {
            visited += 1;
            let depth = depths.get(&n).copied().unwrap_or(0);
            if let Some(children) = dependents.get(&n) {
                for child in children {
                    let entry = depths.entry(*child).or_insert(0);
                    *entry = (*entry).max(depth + 1);
                    if let Some(e) = indeg.get_mut(child) {
                        *e -= 1;
                        if *e == 0 {
                            ready.push(*child);
                        }
                    }
                }
            }
        }

        if visited != indeg.len() {
            let stuck: Vec<String> = indeg
                .iter()
                .filter(|(_, v)| **v > 0)
                .map(|(k, _)| k.to_string())
                .collect();
            return Err(Error::Schedule(format!(
                "Cycle detected or missing nodes: {}",
                stuck.join(", ")
            )));
        }

        let mut order: Vec<(NodeId, usize)> = depths.iter().map(|(n, d)| (*n, *d)).collect();
        order.sort_by_key(|&(n, d)| (d, n));
        Ok(Self {
            order,
            depths,
            cursor: 0,
        })
    }

    /// Next node to visit with its depth.
    pub fn next_node(&mut self) -> Option<(NodeId, usize)> {
        let next = self.order.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(next)
    }

    /// Rewinds to the first node.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Total scheduled visits per pass.
    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn depth_of(&self, node: NodeId) -> Option<usize> {
        self.depths.get(&node).copied()
    }

    pub fn order(&self) -> &[(NodeId, usize)] {
        &self.order
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.order.last().map(|&(_, d)| d)
    }
}

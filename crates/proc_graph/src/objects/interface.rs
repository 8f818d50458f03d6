//! Named FIFO queues of objects attached to graph nodes.
//!
//! All queues of a graph live in one [`InterfaceTable`], keyed by node,
//! direction and interface name. An [`ObjectId`] sits in at most one queue.
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::error::{Error, Result};
use crate::graph::NodeId;
use crate::objects::ObjectId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Key = (NodeId, Direction, String);

#[derive(Debug, Clone, Default)]
pub struct InterfaceTable {
    queues: BTreeMap<Key, VecDeque<ObjectId>>,
}

impl InterfaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an empty queue. Existing queues are left untouched.
    pub fn declare(&mut self, node: NodeId, direction: Direction, name: &str) {
        self.queues
            .entry((node, direction, name.to_owned()))
            .or_default();
    }

    pub fn contains(&self, node: NodeId, direction: Direction, name: &str) -> bool {
        self.queues
            .contains_key(&(node, direction, name.to_owned()))
    }

    /// Interface names declared on `node` in `direction`.
    pub fn names(&self, node: NodeId, direction: Direction) -> Vec<&str> {
        self.queues
            .keys()
            .filter(|(n, d, _)| *n == node && *d == direction)
            .map(|(_, _, name)| name.as_str())
            .collect()
    }

    pub fn push(&mut self, node: NodeId, direction: Direction, name: &str, object: ObjectId) -> Result<()> {
        self.queues
            .get_mut(&(node, direction, name.to_owned()))
            .ok_or_else(|| {
                Error::not_found("interface", format!("{} {} '{}'", node, direction, name))
            })?
            .push_back(object);
        Ok(())
    }

    pub fn pop(&mut self, node: NodeId, direction: Direction, name: &str) -> Option<ObjectId> {
        self.queues
            .get_mut(&(node, direction, name.to_owned()))?
            .pop_front()
    }

    pub fn len(&self, node: NodeId, direction: Direction, name: &str) -> usize {
        self.queues
            .get(&(node, direction, name.to_owned()))
            .map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, node: NodeId, direction: Direction, name: &str) -> bool {
        self.len(node, direction, name) == 0
    }

    /// Removes and returns everything queued on one interface.
    pub fn drain(&mut self, node: NodeId, direction: Direction, name: &str) -> Vec<ObjectId> {
        self.queues
            .get_mut(&(node, direction, name.to_owned()))
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }

    /// Objects queued on any interface of `node`, inputs first.
    pub fn objects_of(&self, node: NodeId) -> Vec<ObjectId> {
        self.queues
            .iter()
            .filter(|((n, _, _), _)| *n == node)
            .flat_map(|(_, q)| q.iter().copied())
            .collect()
    }

    /// Empties every queue of `node`, keeping the declarations.
    pub fn clear_node(&mut self, node: NodeId) -> Vec<ObjectId> {
        self.queues
            .iter_mut()
            .filter(|((n, _, _), _)| *n == node)
            .flat_map(|(_, q)| q.drain(..))
            .collect()
    }

    /// Drops every queue of `node`, returning the objects they held.
    pub fn remove_node(&mut self, node: NodeId) -> Vec<ObjectId> {
        let held = self.clear_node(node);
        self.queues.retain(|(n, _, _), _| *n != node);
        held
    }

    /// Total number of queued objects.
    pub fn total(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{ObjectArena, ProceduralObject};

    #[test]
    fn queues_are_fifo_and_keyed_by_direction() {
        let mut objects = ObjectArena::new();
        let a = objects.insert(ProceduralObject::new());
        let b = objects.insert(ProceduralObject::new());
        let node = NodeId::from_raw(1);

        let mut table = InterfaceTable::new();
        table.declare(node, Direction::Input, "in");
        table.declare(node, Direction::Output, "in");
        table.push(node, Direction::Input, "in", a).expect("declared");
        table.push(node, Direction::Input, "in", b).expect("declared");

        assert_eq!(table.len(node, Direction::Input, "in"), 2);
        assert!(table.is_empty(node, Direction::Output, "in"));
        assert_eq!(table.pop(node, Direction::Input, "in"), Some(a));
        assert_eq!(table.pop(node, Direction::Input, "in"), Some(b));
        assert_eq!(table.pop(node, Direction::Input, "in"), None);
    }

    #[test]
    fn push_to_undeclared_interface_fails() {
        let mut objects = ObjectArena::new();
        let a = objects.insert(ProceduralObject::new());
        let mut table = InterfaceTable::new();
        let err = table
            .push(NodeId::from_raw(0), Direction::Output, "out", a)
            .expect_err("undeclared");
        assert!(matches!(err, Error::NotFound { what: "interface", .. }));
    }

    #[test]
    fn remove_node_returns_held_objects() {
        let mut objects = ObjectArena::new();
        let a = objects.insert(ProceduralObject::new());
        let node = NodeId::from_raw(3);
        let mut table = InterfaceTable::new();
        table.declare(node, Direction::Output, "out");
        table.push(node, Direction::Output, "out", a).expect("declared");
        assert_eq!(table.remove_node(node), vec![a]);
        assert!(!table.contains(node, Direction::Output, "out"));
        assert_eq!(table.total(), 0);
    }
}

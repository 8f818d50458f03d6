//! Hierarchical parameter namespaces.
//!
//! Contexts live in a [`ContextArena`] and are addressed by [`ContextId`].
//! Each context owns a map of named [`Parameter`]s and a map of named child
//! contexts; the parent link is a plain index. The parent/child relation is
//! always a tree.
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::expression::Expression;
use crate::value::Value;

/// Index of a context inside its [`ContextArena`]. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u32);

impl ContextId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// A parameter is either a literal value or an expression re-evaluated on
/// every read.
#[derive(Clone, Debug, PartialEq)]
pub enum Parameter {
    Value(Value),
    Expression(Expression),
}

impl Parameter {
    pub fn value(value: impl Into<Value>) -> Self {
        Parameter::Value(value.into())
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Parameter::Value(v) => Some(v),
            Parameter::Expression(_) => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Parameter::Expression(e) => Some(e),
            Parameter::Value(_) => None,
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, Parameter::Expression(_))
    }
}

impl From<Value> for Parameter {
    fn from(value: Value) -> Self {
        Parameter::Value(value)
    }
}

impl From<Expression> for Parameter {
    fn from(expression: Expression) -> Self {
        Parameter::Expression(expression)
    }
}

#[derive(Debug, Clone)]
struct ContextEntry {
    name: String,
    parent: Option<ContextId>,
    children: BTreeMap<String, ContextId>,
    parameters: BTreeMap<String, Parameter>,
}

/// Owns every context of a graph.
#[derive(Debug, Clone, Default)]
pub struct ContextArena {
    entries: Vec<Option<ContextEntry>>,
}

impl ContextArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached context.
    pub fn create(&mut self, name: impl Into<String>) -> ContextId {
        let id = ContextId(self.entries.len() as u32);
        self.entries.push(Some(ContextEntry {
            name: name.into(),
            parent: None,
            children: BTreeMap::new(),
            parameters: BTreeMap::new(),
        }));
        id
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: ContextId) -> bool {
        self.entry(id).is_ok()
    }

    fn entry(&self, id: ContextId) -> Result<&ContextEntry> {
        self.entries
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::not_found("context", id.to_string()))
    }

    fn entry_mut(&mut self, id: ContextId) -> Result<&mut ContextEntry> {
        self.entries
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::not_found("context", id.to_string()))
    }

    pub fn name(&self, id: ContextId) -> Result<&str> {
        Ok(&self.entry(id)?.name)
    }

    pub fn parent(&self, id: ContextId) -> Option<ContextId> {
        self.entry(id).ok().and_then(|e| e.parent)
    }

    /// Child contexts keyed by name.
    pub fn children(&self, id: ContextId) -> impl Iterator<Item = (&str, ContextId)> + '_ {
        self.entry(id)
            .ok()
            .into_iter()
            .flat_map(|e| e.children.iter().map(|(k, v)| (k.as_str(), *v)))
    }

    pub fn sub_context(&self, id: ContextId, name: &str) -> Option<ContextId> {
        self.entry(id).ok()?.children.get(name).copied()
    }

    /// The context followed by its ancestors, nearest first.
    pub fn ancestry(&self, id: ContextId) -> impl Iterator<Item = ContextId> + '_ {
        std::iter::successors(Some(id), move |c| self.parent(*c))
    }

    /// Moves `child` under `parent`, or detaches it when `parent` is `None`.
    ///
    /// Fails without touching either context when `parent` already holds a
    /// different child with the same name, or when the move would make the
    /// tree cyclic.
    pub fn set_parent(&mut self, child: ContextId, parent: Option<ContextId>) -> Result<()> {
        let name = self.entry(child)?.name.clone();
        if let Some(parent) = parent {
            let parent_entry = self.entry(parent)?;
            if let Some(existing) = parent_entry.children.get(&name) {
                if *existing == child {
                    return Ok(());
                }
                return Err(Error::ContextCollision {
                    parent: parent_entry.name.clone(),
                    name,
                });
            }
            if self.ancestry(parent).any(|c| c == child) {
                return Err(Error::InvalidArgument {
                    argument: "parent".into(),
                    message: format!(
                        "context '{}' cannot become a descendant of itself",
                        name
                    ),
                });
            }
        }

        if let Some(old) = self.entry(child)?.parent {
            let old_entry = self.entry_mut(old)?;
            if old_entry.children.get(&name) == Some(&child) {
                old_entry.children.remove(&name);
            }
        }
        if let Some(parent) = parent {
            self.entry_mut(parent)?.children.insert(name, child);
        }
        self.entry_mut(child)?.parent = parent;
        Ok(())
    }

    /// Creates or overwrites a parameter at this level.
    pub fn create_parameter(
        &mut self,
        id: ContextId,
        name: impl Into<String>,
        parameter: impl Into<Parameter>,
    ) -> Result<()> {
        self.entry_mut(id)?
            .parameters
            .insert(name.into(), parameter.into());
        Ok(())
    }

    /// Reads a parameter at this level only.
    pub fn get_parameter(&self, id: ContextId, name: &str) -> Result<&Parameter> {
        self.entry(id)?
            .parameters
            .get(name)
            .ok_or_else(|| Error::not_found("parameter", name))
    }

    pub fn has_parameter(&self, id: ContextId, name: &str) -> bool {
        self.entry(id)
            .map(|e| e.parameters.contains_key(name))
            .unwrap_or(false)
    }

    pub fn remove_parameter(&mut self, id: ContextId, name: &str) -> Option<Parameter> {
        self.entry_mut(id).ok()?.parameters.remove(name)
    }

    /// Parameters at this level, sorted by name.
    pub fn parameters(&self, id: ContextId) -> impl Iterator<Item = (&str, &Parameter)> + '_ {
        self.entry(id)
            .ok()
            .into_iter()
            .flat_map(|e| e.parameters.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Resolves a dotted path such as `a.b.c`: `a` and `b` name nested child
    /// contexts and `c` is read as a parameter of the last one.
    pub fn resolve_variable(&self, id: ContextId, path: &str) -> Result<&Parameter> {
        let mut segments = path.split('.').peekable();
        let mut current = id;
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                return self.get_parameter(current, segment);
            }
            current = self
                .sub_context(current, segment)
                .ok_or_else(|| Error::not_found("context", segment))?;
        }
        Err(Error::not_found("parameter", path))
    }

    /// Removes a context and its whole subtree.
    pub fn remove(&mut self, id: ContextId) -> Result<()> {
        self.set_parent(id, None)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.entries.get_mut(current.index()).and_then(Option::take) {
                stack.extend(entry.children.into_values());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reparenting_moves_the_child() {
        let mut arena = ContextArena::new();
        let a = arena.create("a");
        let b = arena.create("b");
        let child = arena.create("child");

        arena.set_parent(child, Some(a)).expect("attach to a");
        assert_eq!(arena.sub_context(a, "child"), Some(child));

        arena.set_parent(child, Some(b)).expect("move to b");
        assert_eq!(arena.sub_context(a, "child"), None);
        assert_eq!(arena.sub_context(b, "child"), Some(child));
        assert_eq!(arena.parent(child), Some(b));
    }

    #[test]
    fn name_collision_fails_without_mutation() {
        let mut arena = ContextArena::new();
        let a = arena.create("a");
        let b = arena.create("b");
        let first = arena.create("child");
        let second = arena.create("child");
        arena.set_parent(first, Some(a)).expect("attach first");
        arena.set_parent(second, Some(b)).expect("attach second");

        let err = arena.set_parent(second, Some(a)).expect_err("collides");
        assert!(matches!(err, Error::ContextCollision { .. }));
        assert_eq!(arena.sub_context(a, "child"), Some(first));
        assert_eq!(arena.sub_context(b, "child"), Some(second));
        assert_eq!(arena.parent(second), Some(b));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut arena = ContextArena::new();
        let root = arena.create("root");
        let leaf = arena.create("leaf");
        arena.set_parent(leaf, Some(root)).expect("attach");
        let err = arena.set_parent(root, Some(leaf)).expect_err("cycle");
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert_eq!(arena.parent(root), None);
    }

    #[test]
    fn parameters_overwrite_and_are_level_local() {
        let mut arena = ContextArena::new();
        let parent = arena.create("p");
        let child = arena.create("c");
        arena.set_parent(child, Some(parent)).expect("attach");
        arena
            .create_parameter(parent, "w", Value::Float(1.0))
            .expect("create");
        arena
            .create_parameter(parent, "w", Value::Float(2.0))
            .expect("overwrite");
        assert_eq!(
            arena.get_parameter(parent, "w").expect("exists").as_value(),
            Some(&Value::Float(2.0))
        );
        let err = arena.get_parameter(child, "w").expect_err("not at child level");
        assert!(matches!(err, Error::NotFound { what: "parameter", .. }));
    }

    #[test]
    fn resolve_variable_walks_children() {
        let mut arena = ContextArena::new();
        let root = arena.create("root");
        let a = arena.create("a");
        let b = arena.create("b");
        arena.set_parent(a, Some(root)).expect("attach a");
        arena.set_parent(b, Some(a)).expect("attach b");
        arena
            .create_parameter(b, "c", Value::Integer(7))
            .expect("create");

        let p = arena.resolve_variable(root, "a.b.c").expect("resolves");
        assert_eq!(p.as_value(), Some(&Value::Integer(7)));

        let err = arena.resolve_variable(root, "a.x.c").expect_err("x missing");
        match err {
            Error::NotFound { what, name } => {
                assert_eq!(what, "context");
                assert_eq!(name, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn remove_drops_the_subtree() {
        let mut arena = ContextArena::new();
        let root = arena.create("root");
        let a = arena.create("a");
        let b = arena.create("b");
        arena.set_parent(a, Some(root)).expect("attach a");
        arena.set_parent(b, Some(a)).expect("attach b");
        arena.remove(a).expect("remove");
        assert!(!arena.contains(a));
        assert!(!arena.contains(b));
        assert_eq!(arena.children(root).count(), 0);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn ancestry_is_nearest_first() {
        let mut arena = ContextArena::new();
        let root = arena.create("root");
        let mid = arena.create("mid");
        let leaf = arena.create("leaf");
        arena.set_parent(mid, Some(root)).expect("attach");
        arena.set_parent(leaf, Some(mid)).expect("attach");
        let chain: Vec<_> = arena.ancestry(leaf).collect();
        assert_eq!(chain, vec![leaf, mid, root]);
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::node::{
    InputInterfaceNode, NodeBehavior, OperationNode, OutputInterfaceNode, ParameterNode,
};
use crate::operations::OperationFactory;

type NodeConstructor = Arc<dyn Fn() -> Box<dyn NodeBehavior> + Send + Sync>;

/// String-keyed registry of node kinds.
#[derive(Clone, Default)]
pub struct NodeFactory {
    constructors: HashMap<String, NodeConstructor>,
}

impl NodeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `Operation`, `InputInterface`, `OutputInterface` and
    /// `Parameter`. Operation nodes look their operation up in `operations`.
    pub fn with_defaults(operations: Arc<OperationFactory>) -> Self {
        let mut factory = Self::new();
        factory.register(OperationNode::TYPE_NAME, move || {
            Box::new(OperationNode::new(Arc::clone(&operations)))
        });
        factory.register(InputInterfaceNode::TYPE_NAME, || {
            Box::new(InputInterfaceNode::new())
        });
        factory.register(OutputInterfaceNode::TYPE_NAME, || {
            Box::new(OutputInterfaceNode::new())
        });
        factory.register(ParameterNode::TYPE_NAME, || Box::new(ParameterNode));
        factory
    }

    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn NodeBehavior> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.constructors.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn NodeBehavior>> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::NodeCategory;

    #[test]
    fn defaults_cover_the_four_kinds() {
        let factory = NodeFactory::with_defaults(Arc::new(OperationFactory::with_defaults()));
        assert_eq!(
            factory.names(),
            vec!["InputInterface", "Operation", "OutputInterface", "Parameter"]
        );
        let node = factory.create("Parameter").expect("registered");
        assert_eq!(node.category(), NodeCategory::Parameter);
        assert!(factory.create("Subgraph").is_none());
    }

    #[test]
    fn unregister_removes_a_kind() {
        let mut factory = NodeFactory::with_defaults(Arc::new(OperationFactory::new()));
        assert!(factory.unregister("Parameter"));
        assert!(!factory.contains("Parameter"));
        assert!(!factory.unregister("Parameter"));
        assert_eq!(factory.len(), 3);
    }
}

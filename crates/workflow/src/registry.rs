use {
    super::node::{Node, TriggerNode},
    std::collections::HashMap,
    tracing::debug,
};

/// Registry of all loaded nodes, keyed by node type name.
pub struct NodeRegistry {
    nodes: HashMap<String, Box<dyn Node>>,
    triggers: HashMap<String, Box<dyn TriggerNode>>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            triggers: HashMap::new(),
        }
    }

    pub fn register(&mut self, node: Box<dyn Node>) {
        let name = node.description().name.to_string();
        debug!(node = %name, "registered node");
        self.nodes.insert(name, node);
    }

    pub fn register_trigger(&mut self, trigger: Box<dyn TriggerNode>) {
        let name = trigger.description().name.to_string();
        debug!(node = %name, "registered trigger node");
        self.triggers.insert(name, trigger);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Node> {
        self.nodes.get(name).map(|n| n.as_ref())
    }

    pub fn trigger(&self, name: &str) -> Option<&dyn TriggerNode> {
        self.triggers.get(name).map(|t| t.as_ref())
    }

    /// Names of all registered nodes and triggers, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .nodes
            .keys()
            .chain(self.triggers.keys())
            .map(|s| s.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

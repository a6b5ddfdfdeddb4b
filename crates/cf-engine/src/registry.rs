//! Container registry
//!
//! Managed containers are content regions under independent filter
//! tracking. Top-level ones are kept as roots; nested ones only remember
//! the container they were registered under.

use cf_dom::{DomTree, NodeId};

use crate::config::FilterConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    container: NodeId,
    parent: Option<NodeId>,
}

/// Registered containers in registration order
#[derive(Debug, Default)]
pub struct ContainerRegistry {
    entries: Vec<Entry>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a container; only containers without a parent become roots
    pub fn register(&mut self, container: NodeId, parent: Option<NodeId>) {
        if !self.is_registered(container) {
            self.entries.push(Entry { container, parent });
        }
    }

    pub fn is_registered(&self, container: NodeId) -> bool {
        self.entries.iter().any(|e| e.container == container)
    }

    /// Parent container recorded at registration
    pub fn parent_of(&self, container: NodeId) -> Option<NodeId> {
        self.entries
            .iter()
            .find(|e| e.container == container)
            .and_then(|e| e.parent)
    }

    /// Forget a container, returning whether it was known
    pub fn release(&mut self, container: NodeId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.container != container);
        before != self.entries.len()
    }

    /// Root containers
    pub fn roots(&self) -> Vec<NodeId> {
        self.entries
            .iter()
            .filter(|e| e.parent.is_none())
            .map(|e| e.container)
            .collect()
    }

    /// Every container, nested ones included
    pub fn all(&self) -> Vec<NodeId> {
        self.entries.iter().map(|e| e.container).collect()
    }

    /// Drop containers that left the document or lost their container marker
    ///
    /// Returns the live roots.
    pub fn sweep(&mut self, tree: &DomTree, config: &FilterConfig) -> Vec<NodeId> {
        self.entries.retain(|e| {
            let live = tree.is_connected(e.container)
                && tree.has_class(e.container, &config.container_class);
            if !live {
                tracing::debug!(container = %e.container, "Dropping stale container");
            }
            live
        });
        self.roots()
    }
}

/// Nearest managed container strictly above `node`
pub fn parent_container(tree: &DomTree, config: &FilterConfig, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node)
        .find(|&a| tree.has_class(a, &config.container_class))
}

/// Nearest managed container at or above `node`
pub fn container_of(tree: &DomTree, config: &FilterConfig, node: NodeId) -> Option<NodeId> {
    tree.closest(node, |n| tree.has_class(n, &config.container_class))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn managed(tree: &mut DomTree, parent: NodeId) -> NodeId {
        let div = tree.create_element("div");
        tree.add_class(div, "cf-container");
        tree.append_child(parent, div).unwrap();
        div
    }

    #[test]
    fn test_roots_and_nested() {
        let mut tree = DomTree::new();
        let config = FilterConfig::default();
        let outer = managed(&mut tree, NodeId::ROOT);
        let inner = managed(&mut tree, outer);
        let leaf = tree.create_element("p");
        tree.append_child(inner, leaf).unwrap();

        assert_eq!(parent_container(&tree, &config, inner), Some(outer));
        assert_eq!(parent_container(&tree, &config, outer), None);
        assert_eq!(container_of(&tree, &config, leaf), Some(inner));
        assert_eq!(container_of(&tree, &config, inner), Some(inner));

        let mut registry = ContainerRegistry::new();
        registry.register(outer, None);
        registry.register(inner, Some(outer));
        registry.register(outer, None);
        assert_eq!(registry.roots(), vec![outer]);
        assert_eq!(registry.all(), vec![outer, inner]);
        assert_eq!(registry.parent_of(inner), Some(outer));
        assert!(registry.is_registered(inner));
    }

    #[test]
    fn test_sweep_and_release() {
        let mut tree = DomTree::new();
        let config = FilterConfig::default();
        let a = managed(&mut tree, NodeId::ROOT);
        let b = managed(&mut tree, NodeId::ROOT);
        let c = managed(&mut tree, NodeId::ROOT);

        let mut registry = ContainerRegistry::new();
        for container in [a, b, c] {
            registry.register(container, None);
        }

        tree.detach(a).unwrap();
        tree.remove_class(b, "cf-container");
        assert_eq!(registry.sweep(&tree, &config), vec![c]);
        assert!(!registry.is_registered(a));

        assert!(registry.release(c));
        assert!(!registry.release(c));
        assert!(registry.roots().is_empty());
    }
}

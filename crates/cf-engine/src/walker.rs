//! Sibling walker
//!
//! Finds meaningful neighbours of a node while skipping "ghost" nodes:
//! comments, blank text, skip-marked elements and plain span/div wrappers
//! holding nothing but ghosts. When a node has no meaningful sibling the
//! walk climbs out of ghost containers and reports where it stopped.

use cf_dom::{DomTree, NodeData, NodeId};

use crate::config::FilterConfig;

/// Outcome of a significant-sibling search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sibling {
    Found(NodeId),
    /// No sibling; `parent` is the non-ghost element the search stopped at
    NotFound { parent: Option<NodeId> },
}

impl Sibling {
    pub fn found(self) -> Option<NodeId> {
        match self {
            Sibling::Found(node) => Some(node),
            Sibling::NotFound { .. } => None,
        }
    }

    pub fn stopped_at(self) -> Option<NodeId> {
        match self {
            Sibling::Found(_) => None,
            Sibling::NotFound { parent } => parent,
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Backward,
    Forward,
}

/// Ghost-aware traversal over a tree
#[derive(Clone, Copy)]
pub struct Walker<'a> {
    tree: &'a DomTree,
    config: &'a FilterConfig,
}

impl<'a> Walker<'a> {
    pub fn new(tree: &'a DomTree, config: &'a FilterConfig) -> Self {
        Self { tree, config }
    }

    /// Comments, blank text and doctypes
    pub fn is_empty_node(&self, node: NodeId) -> bool {
        match self.tree.get(node).map(|n| &n.data) {
            Some(NodeData::Comment(_) | NodeData::Doctype { .. }) => true,
            Some(NodeData::Text(text)) => text.content.trim().is_empty(),
            _ => false,
        }
    }

    /// A span or div that is not a managed container
    pub fn is_ghost_container(&self, node: NodeId) -> bool {
        matches!(self.tree.tag_name(node), Some("span" | "div"))
            && !self.tree.has_class(node, &self.config.container_class)
    }

    pub fn is_ghost_node(&self, node: NodeId) -> bool {
        if self.is_empty_node(node) {
            return true;
        }
        let Some(element) = self.tree.element(node) else {
            return false;
        };
        // A tag is content even when it renders as an empty icon
        if element.has_class(&self.config.tag_class) {
            return false;
        }
        if element.has_class(&self.config.skip_class)
            || self.config.ghost_classes.iter().any(|c| element.has_class(c))
        {
            return true;
        }
        if !self.is_ghost_container(node) {
            return false;
        }
        self.tree
            .children(node)
            .all(|(child, _)| self.is_ghost_node(child))
    }

    fn is_content_end(&self, node: NodeId) -> bool {
        self.tree.has_class(node, &self.config.content_end_class)
    }

    /// Previous significant sibling, climbing out of ghost containers
    ///
    /// The climb stops at `boundary`, at a non-ghost parent, or at the top.
    pub fn previous_significant(&self, node: NodeId, boundary: Option<NodeId>) -> Sibling {
        self.search(node, boundary, Direction::Backward)
    }

    /// Next significant sibling, climbing out of ghost containers
    pub fn next_significant(&self, node: NodeId, boundary: Option<NodeId>) -> Sibling {
        self.search(node, boundary, Direction::Forward)
    }

    fn search(&self, node: NodeId, boundary: Option<NodeId>, direction: Direction) -> Sibling {
        let step = |n: NodeId| match direction {
            Direction::Backward => self.tree.prev_sibling(n),
            Direction::Forward => self.tree.next_sibling(n),
        };

        let mut node = node;
        loop {
            let mut sibling = step(node);
            while let Some(s) = sibling {
                if self.is_content_end(s) {
                    sibling = None;
                    break;
                }
                if !self.is_ghost_node(s) {
                    break;
                }
                sibling = step(s);
            }
            if let Some(s) = sibling {
                return Sibling::Found(s);
            }

            let parent = self.tree.parent_element(node);
            match parent {
                Some(p) if Some(p) != boundary && self.is_ghost_container(p) => node = p,
                _ => return Sibling::NotFound { parent },
            }
        }
    }

    /// The parent of `node` when `node` is its only non-empty direct child
    pub fn wrapper(&self, node: NodeId) -> Option<NodeId> {
        let lonely = |mut sibling: Option<NodeId>, forward: bool| {
            while let Some(s) = sibling {
                if !self.is_empty_node(s) {
                    return false;
                }
                sibling = if forward {
                    self.tree.next_sibling(s)
                } else {
                    self.tree.prev_sibling(s)
                };
            }
            true
        };
        if lonely(self.tree.prev_sibling(node), false) && lonely(self.tree.next_sibling(node), true) {
            self.tree.parent_element(node)
        } else {
            None
        }
    }

    /// Nearest ancestor element that is not a ghost container
    pub fn significant_parent(&self, node: NodeId) -> Option<NodeId> {
        let mut parent = self.tree.parent_element(node);
        while let Some(p) = parent {
            if !self.is_ghost_container(p) {
                return Some(p);
            }
            parent = self.tree.parent_element(p);
        }
        None
    }
}

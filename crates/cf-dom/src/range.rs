//! Range
//!
//! A run of sibling nodes delimited by two boundary points. Only the
//! element-level subset of the DOM Range is provided: boundaries sit
//! between children, never inside text, which is all that wrapping needs.

use crate::operations::{DomError, DomResult};
use crate::tree::DomTree;
use crate::NodeId;

/// Range boundary point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    /// The container node
    pub node: NodeId,
    /// Child index within the container
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Point just before `node`
    pub fn before(tree: &DomTree, node: NodeId) -> DomResult<Self> {
        let parent = tree.parent(node).ok_or(DomError::NotAChild {
            parent: NodeId::NONE,
            node,
        })?;
        Ok(Self::new(parent, tree.index_in_parent(node)))
    }

    /// Point just after `node`
    pub fn after(tree: &DomTree, node: NodeId) -> DomResult<Self> {
        let point = Self::before(tree, node)?;
        Ok(Self::new(point.node, point.offset + 1))
    }
}

/// Range - a contiguous part of the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    start: BoundaryPoint,
    end: BoundaryPoint,
}

impl Range {
    /// Create a collapsed range
    pub fn new(container: NodeId, offset: usize) -> Self {
        let point = BoundaryPoint::new(container, offset);
        Self {
            start: point,
            end: point,
        }
    }

    /// Range covering all children of `node`
    pub fn select_node_contents(tree: &DomTree, node: NodeId) -> Self {
        Self {
            start: BoundaryPoint::new(node, 0),
            end: BoundaryPoint::new(node, tree.children(node).count()),
        }
    }

    pub fn start(&self) -> BoundaryPoint {
        self.start
    }

    pub fn end(&self) -> BoundaryPoint {
        self.end
    }

    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn set_start_before(&mut self, tree: &DomTree, node: NodeId) -> DomResult<()> {
        self.start = BoundaryPoint::before(tree, node)?;
        Ok(())
    }

    pub fn set_start_after(&mut self, tree: &DomTree, node: NodeId) -> DomResult<()> {
        self.start = BoundaryPoint::after(tree, node)?;
        Ok(())
    }

    pub fn set_end_before(&mut self, tree: &DomTree, node: NodeId) -> DomResult<()> {
        self.end = BoundaryPoint::before(tree, node)?;
        Ok(())
    }

    pub fn set_end_after(&mut self, tree: &DomTree, node: NodeId) -> DomResult<()> {
        self.end = BoundaryPoint::after(tree, node)?;
        Ok(())
    }

    /// Nodes between the boundaries, in order
    pub fn nodes(&self, tree: &DomTree) -> DomResult<Vec<NodeId>> {
        if self.start.node != self.end.node {
            return Err(DomError::InvalidState("boundaries in different containers"));
        }
        if self.end.offset < self.start.offset {
            return Err(DomError::InvalidState("end precedes start"));
        }
        Ok(tree
            .children(self.start.node)
            .skip(self.start.offset)
            .take(self.end.offset - self.start.offset)
            .map(|(id, _)| id)
            .collect())
    }

    /// Move the selected nodes into `wrapper` and put `wrapper` in their place
    ///
    /// `wrapper` must be detached; after the call the range selects it.
    pub fn surround_contents(&mut self, tree: &mut DomTree, wrapper: NodeId) -> DomResult<()> {
        let contents = self.nodes(tree)?;
        let container = self.start.node;
        let reference = tree.child_at(container, self.end.offset);

        tree.insert_before(container, wrapper, reference)?;
        for node in contents {
            tree.append_child(wrapper, node)?;
        }

        self.start = BoundaryPoint::before(tree, wrapper)?;
        self.end = BoundaryPoint::after(tree, wrapper)?;
        tracing::trace!(%wrapper, %container, "surrounded range contents");
        Ok(())
    }
}

//! Tree traversal
//!
//! Borrowing iterators over children, ancestors and descendants, plus the
//! `compareDocumentPosition` bit flags.

use crate::node::Node;
use crate::tree::DomTree;
use crate::NodeId;

/// Result of [`DomTree::compare_document_position`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentPosition(u8);

impl DocumentPosition {
    pub const DISCONNECTED: DocumentPosition = DocumentPosition(0x01);
    pub const PRECEDING: DocumentPosition = DocumentPosition(0x02);
    pub const FOLLOWING: DocumentPosition = DocumentPosition(0x04);
    pub const CONTAINS: DocumentPosition = DocumentPosition(0x08);
    pub const CONTAINED_BY: DocumentPosition = DocumentPosition(0x10);

    /// Check if a flag is set
    pub fn includes(self, flag: DocumentPosition) -> bool {
        (self.0 & flag.0) != 0
    }

    /// Union of two positions
    pub fn or(self, other: DocumentPosition) -> DocumentPosition {
        DocumentPosition(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

/// Iterator over a node's children
pub struct Children<'a> {
    pub(crate) tree: &'a DomTree,
    pub(crate) current: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current;
        let node = self.tree.get(id)?;
        self.current = node.next_sibling;
        Some((id, node))
    }
}

/// Iterator over a node's ancestors, nearest first, excluding the node
pub struct Ancestors<'a> {
    pub(crate) tree: &'a DomTree,
    pub(crate) current: NodeId,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let parent = self.tree.get(self.current)?.parent;
        if !parent.is_valid() {
            return None;
        }
        self.current = parent;
        Some(parent)
    }
}

/// Pre-order iterator over the descendants of `root`, excluding `root`
pub struct Descendants<'a> {
    pub(crate) tree: &'a DomTree,
    pub(crate) root: NodeId,
    pub(crate) next: NodeId,
}

impl Descendants<'_> {
    /// Skip the subtree of the node returned last
    pub fn skip_subtree(&mut self, last: NodeId) {
        self.next = self.following(last);
    }

    fn following(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while current != self.root {
            let Some(n) = self.tree.get(current) else {
                return NodeId::NONE;
            };
            if n.next_sibling.is_valid() {
                return n.next_sibling;
            }
            current = n.parent;
        }
        NodeId::NONE
    }
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            self.following(id)
        };
        Some(id)
    }
}

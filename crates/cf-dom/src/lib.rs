//! Content filter DOM
//!
//! Arena-based DOM tree holding already-rendered wiki content. Nodes are
//! addressed by [`NodeId`] and linked through parent/child/sibling ids, so
//! structural queries and in-place wrapping stay cheap and borrow-friendly.

mod classlist;
mod dataset;
mod document;
mod node;
mod operations;
mod range;
mod traversal;
mod tree;

pub use classlist::DOMTokenList;
pub use dataset::DOMStringMap;
pub use document::Document;
pub use node::{Attribute, ElementData, Node, NodeData, NodeType, TextData};
pub use operations::{DomError, DomResult};
pub use range::{BoundaryPoint, Range};
pub use traversal::{Ancestors, Children, Descendants, DocumentPosition};
pub use tree::DomTree;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for a missing link
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Whether this id points at a node rather than the sentinel
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            write!(f, "#none")
        }
    }
}

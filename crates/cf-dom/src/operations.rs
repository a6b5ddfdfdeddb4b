//! Tree mutation errors

use crate::NodeId;

/// Error raised by a structural DOM mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0} does not exist")]
    NotFound(NodeId),
    #[error("node {0} cannot have children")]
    InvalidNodeType(NodeId),
    #[error("inserting {child} under {parent} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    #[error("node {node} is not a child of {parent}")]
    NotAChild { parent: NodeId, node: NodeId },
    #[error("range partially selects a node: {0}")]
    InvalidState(&'static str),
}

pub type DomResult<T> = Result<T, DomError>;

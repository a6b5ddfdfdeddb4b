//! Engine errors
//!
//! Only failures that abort an operation live here. Expected outcomes such
//! as a tag without context or a skipped registration are ordinary values.

use cf_dom::{DomError, NodeId};

/// A DOM relationship the engine relies on does not hold
///
/// Raised when unrelated code mutated the tree in a way the engine cannot
/// reason about; the current operation is aborted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("node {0} has no parent element")]
    MissingParent(NodeId),

    #[error("line break {br} shares no ancestor level with tag {tag}")]
    DetachedLine { br: NodeId, tag: NodeId },

    #[error("table cell {0} is missing from its table layout")]
    CellOutsideLayout(NodeId),

    #[error("table of contents link for headline {0} is not inside a list item")]
    TocEntryOutsideList(NodeId),
}

/// Engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("DOM invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("filter index {index} is out of range (filter count {count})")]
    InvalidFilterIndex { index: usize, count: u32 },

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("invalid filter configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

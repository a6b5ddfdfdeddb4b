//! Engine notifications
//!
//! Consumers (filter buttons, previews, hover highlighting) learn about
//! engine progress from a queue of records drained with `take_records`.

use cf_dom::NodeId;

/// Something the engine did that consumers may react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Content is about to be registered; views inside it are still stale
    BeforeRegistered { container: NodeId },
    /// Content became a managed container
    Registered {
        container: NodeId,
        parent: Option<NodeId>,
    },
    /// Page-wide bitmask computed from the main content
    PageFilter(u32),
    /// A tag's context was inferred and recorded under `id`
    ContextInferred {
        tag: NodeId,
        id: u64,
        context: Vec<NodeId>,
    },
    /// A view was composed for a container
    ViewComputed {
        container: NodeId,
        index: usize,
        fragments: Vec<NodeId>,
    },
    /// The active view changed; `None` shows every version
    ViewUpdated(Option<usize>),
}

/// Pending notifications in emission order
#[derive(Debug, Default)]
pub struct NotificationQueue {
    records: Vec<Notification>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Notification) {
        tracing::trace!(?record, "Queued notification");
        self.records.push(record);
    }

    pub fn take_records(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

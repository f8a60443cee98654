//! Change feed events emitted by collections
//!
//! Every successful write is published on a tokio broadcast channel after it
//! has been applied (for `LibsqlCollection`, after the transaction committed).
//! Live queries and background workers subscribe to this feed instead of
//! polling the collection.

/// Broadcast channel capacity for change events.
///
/// Subscribers that fall further behind than this observe a lag and are
/// expected to re-read the collection (see `LiveQuery`).
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A single document-level change.
#[derive(Debug, Clone)]
pub enum CollectionEvent<D> {
    /// A new document was inserted
    Inserted(D),

    /// An existing document was updated; carries the document after the patch
    Updated(D),

    /// A document was removed
    Removed { id: String },
}

impl<D> CollectionEvent<D> {
    /// Short name of the event, used in log lines.
    pub fn event_type(&self) -> &str {
        match self {
            CollectionEvent::Inserted(_) => "document:inserted",
            CollectionEvent::Updated(_) => "document:updated",
            CollectionEvent::Removed { .. } => "document:removed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        assert_eq!(
            CollectionEvent::Inserted(()).event_type(),
            "document:inserted"
        );
        assert_eq!(CollectionEvent::Updated(()).event_type(), "document:updated");
        assert_eq!(
            CollectionEvent::<()>::Removed {
                id: "x".to_string()
            }
            .event_type(),
            "document:removed"
        );
    }
}

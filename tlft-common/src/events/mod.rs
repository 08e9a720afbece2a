//! Event types for the TLFT event system
//!
//! Provides shared event definitions and the EventBus used by the Tracker
//! service to fan mutations out to SSE subscribers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::db::models::{AssignmentRole, Comment, Tracker};

/// Typed change notification broadcast after a mutation commits
///
/// Delivery is best-effort and fire-and-forget: the bus never blocks or
/// fails the originating mutation. Serialized form carries the event name in
/// the `type` field for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// Item + tracker pair created
    TrackerCreated {
        tracker: Tracker,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Tracker status/priority/due-date fields changed
    TrackerUpdated {
        tracker: Tracker,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Tracker destroyed (cascade from item deletion)
    TrackerDeleted {
        tracker_guid: Uuid,
        item_guid: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Programmer assigned or unassigned for one role slot
    TrackerAssignmentUpdated {
        tracker: Tracker,
        role: AssignmentRole,
        /// Assigned user, None after an unassignment
        user_guid: Option<Uuid>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// New comment posted (top-level or reply)
    TrackerCommentCreated {
        comment: Comment,
        /// Counter value after the creation committed
        unresolved_comment_count: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Comment edited, resolved, or unresolved
    TrackerCommentUpdated {
        comment: Comment,
        unresolved_comment_count: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Comment soft-deleted
    TrackerCommentDeleted {
        comment_guid: Uuid,
        tracker_guid: Uuid,
        unresolved_comment_count: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Full-state snapshot sent once to each subscriber on connect
    InitialState {
        trackers: Vec<Tracker>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl TrackerEvent {
    /// Event name as transmitted in the SSE `event:` field
    ///
    /// Matches the serde `type` tag spelling exactly.
    pub fn event_type(&self) -> &'static str {
        match self {
            TrackerEvent::TrackerCreated { .. } => "tracker_created",
            TrackerEvent::TrackerUpdated { .. } => "tracker_updated",
            TrackerEvent::TrackerDeleted { .. } => "tracker_deleted",
            TrackerEvent::TrackerAssignmentUpdated { .. } => "tracker_assignment_updated",
            TrackerEvent::TrackerCommentCreated { .. } => "tracker_comment_created",
            TrackerEvent::TrackerCommentUpdated { .. } => "tracker_comment_updated",
            TrackerEvent::TrackerCommentDeleted { .. } => "tracker_comment_deleted",
            TrackerEvent::InitialState { .. } => "initial_state",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for tracker change notifications
///
/// Wraps tokio::broadcast, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// The bus IS the subscriber registry: entries live from subscribe() until
/// the receiver drops (disconnect or failed write), process start to process
/// shutdown. There is no replay; a reconnecting subscriber gets a fresh
/// InitialState snapshot instead.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TrackerEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Events beyond `capacity` overwrite the oldest buffered event; slow
    /// subscribers observe a `Lagged` error and should resubscribe.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers, best-effort
    ///
    /// Returns the number of subscribers reached. Zero subscribers is not an
    /// error; the event is simply dropped. Callers never treat emission as
    /// part of the mutation's outcome.
    pub fn emit(&self, event: TrackerEvent) -> usize {
        match self.tx.send(event) {
            Ok(receiver_count) => receiver_count,
            Err(_) => {
                tracing::debug!("EventBus: no subscribers, event dropped");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ProductionStatus, QcStatus, Tracker};

    fn sample_tracker() -> Tracker {
        Tracker {
            guid: Uuid::new_v4(),
            item_guid: Uuid::new_v4(),
            production_programmer_guid: None,
            qc_programmer_guid: None,
            production_status: ProductionStatus::NotStarted,
            qc_status: QcStatus::NotStarted,
            priority: 3,
            qc_level: 1,
            due_date: None,
            qc_completed_at: None,
            unresolved_comment_count: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_event_type_matches_serde_tag() {
        let event = TrackerEvent::TrackerCreated {
            tracker: sample_tracker(),
            timestamp: chrono::Utc::now(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
    }

    #[tokio::test]
    async fn test_emit_reaches_all_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let reached = bus.emit(TrackerEvent::TrackerDeleted {
            tracker_guid: Uuid::new_v4(),
            item_guid: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
        });
        assert_eq!(reached, 2);
        assert!(matches!(
            rx1.recv().await.unwrap(),
            TrackerEvent::TrackerDeleted { .. }
        ));
        assert!(matches!(
            rx2.recv().await.unwrap(),
            TrackerEvent::TrackerDeleted { .. }
        ));
    }

    #[test]
    fn test_emit_without_subscribers_is_not_an_error() {
        let bus = EventBus::new(16);
        let reached = bus.emit(TrackerEvent::TrackerDeleted {
            tracker_guid: Uuid::new_v4(),
            item_guid: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
        });
        assert_eq!(reached, 0);
    }
}

//! Change notifications for realtime game updates
//!
//! Writers publish a notification after every game or game-event mutation.
//! Subscribers never read the payload of a change: they re-fetch the affected
//! entity through the repository read path.

use tokio::sync::broadcast;

/// Table a change happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeTable {
    Games,
    GameEvents,
}

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Row-level change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotification {
    pub table: ChangeTable,
    pub kind: ChangeKind,
    /// Primary id of the changed row
    pub record_id: String,
    /// Game the row belongs to
    pub game_id: Option<String>,
}

impl ChangeNotification {
    /// A game row changed
    pub fn game(game_id: &str, kind: ChangeKind) -> Self {
        Self {
            table: ChangeTable::Games,
            kind,
            record_id: game_id.to_string(),
            game_id: Some(game_id.to_string()),
        }
    }

    /// An event was appended to a game
    pub fn game_event(event_id: &str, game_id: &str) -> Self {
        Self {
            table: ChangeTable::GameEvents,
            kind: ChangeKind::Insert,
            record_id: event_id.to_string(),
            game_id: Some(game_id.to_string()),
        }
    }
}

/// Publishing side of the change feed, used by repositories after writes
pub trait ChangePublisher: Send + Sync {
    fn publish(&self, notification: ChangeNotification);
}

/// Subscribing side of the change feed
///
/// Each call opens a fresh connection. A receiver reporting `Closed` means the
/// connection dropped and the caller should reconnect.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self) -> anyhow::Result<broadcast::Receiver<ChangeNotification>>;
}

/// No-op publisher for stores without a change feed
pub struct NoOpChangePublisher;

impl ChangePublisher for NoOpChangePublisher {
    fn publish(&self, _notification: ChangeNotification) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_event_notification_carries_game() {
        let notification = ChangeNotification::game_event("e1", "g1");
        assert_eq!(notification.table, ChangeTable::GameEvents);
        assert_eq!(notification.record_id, "e1");
        assert_eq!(notification.game_id.as_deref(), Some("g1"));
    }

    #[test]
    fn test_noop_publisher_accepts_notifications() {
        NoOpChangePublisher.publish(ChangeNotification::game("g1", ChangeKind::Update));
    }
}

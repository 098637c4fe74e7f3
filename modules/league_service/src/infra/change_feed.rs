//! Change feeds for realtime subscribers
//!
//! [`LocalChangeFeed`] relays what repositories in this process publish.
//! [`StoreChangeFeed`] follows Postgres `NOTIFY` messages raised by triggers on
//! `games` and `game_events`, so writes from any process reach subscribers.

use crate::domain::events::{
    ChangeFeed, ChangeKind, ChangeNotification, ChangePublisher, ChangeTable,
};
use anyhow::{anyhow, bail, Context, Result};
use parking_lot::Mutex;
use sea_orm::sqlx::postgres::{PgListener, PgPool};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Postgres channel the change triggers notify on
pub const CHANGE_CHANNEL: &str = "league_changes";

/// Broadcast-backed change feed
///
/// Repositories publish after their writes commit; realtime subscribers
/// receive every notification published after they subscribed.
#[derive(Debug, Clone)]
pub struct LocalChangeFeed {
    tx: broadcast::Sender<ChangeNotification>,
}

impl LocalChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Number of currently connected subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LocalChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ChangePublisher for LocalChangeFeed {
    fn publish(&self, notification: ChangeNotification) {
        // No subscribers is not an error
        if self.tx.send(notification).is_err() {
            tracing::trace!("change notification dropped: no subscribers");
        }
    }
}

impl ChangeFeed for LocalChangeFeed {
    fn subscribe(&self) -> anyhow::Result<broadcast::Receiver<ChangeNotification>> {
        Ok(self.tx.subscribe())
    }
}

/// Row change as serialized by the notify trigger
#[derive(Debug, Deserialize)]
struct StoreChange {
    table: String,
    op: String,
    id: String,
    game_id: Option<String>,
}

fn decode_change(payload: &str) -> Result<ChangeNotification> {
    let change: StoreChange =
        serde_json::from_str(payload).context("malformed change notification")?;
    let table = match change.table.as_str() {
        "games" => ChangeTable::Games,
        "game_events" => ChangeTable::GameEvents,
        other => bail!("change notification for unknown table {other}"),
    };
    let kind = match change.op.as_str() {
        "INSERT" => ChangeKind::Insert,
        "UPDATE" => ChangeKind::Update,
        "DELETE" => ChangeKind::Delete,
        other => bail!("change notification with unknown operation {other}"),
    };
    Ok(ChangeNotification {
        table,
        kind,
        record_id: change.id,
        game_id: change.game_id,
    })
}

type LiveSender = Arc<Mutex<Option<broadcast::Sender<ChangeNotification>>>>;

/// Change feed backed by Postgres `LISTEN`
///
/// One listener connection is shared by every subscriber. When it drops the
/// sender is released, every receiver observes `Closed`, and the next
/// `subscribe` opens a fresh listener.
pub struct StoreChangeFeed {
    pool: PgPool,
    capacity: usize,
    live: LiveSender,
}

impl StoreChangeFeed {
    pub fn new(pool: PgPool, capacity: usize) -> Self {
        Self {
            pool,
            capacity: capacity.max(1),
            live: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether a listener connection is currently relaying
    pub fn is_listening(&self) -> bool {
        self.live.lock().is_some()
    }
}

impl ChangeFeed for StoreChangeFeed {
    fn subscribe(&self) -> Result<broadcast::Receiver<ChangeNotification>> {
        let mut live = self.live.lock();
        if let Some(tx) = live.as_ref() {
            return Ok(tx.subscribe());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| anyhow!("store change feed needs a tokio runtime: {err}"))?;
        let (tx, rx) = broadcast::channel(self.capacity);
        *live = Some(tx);
        runtime.spawn(listen(self.pool.clone(), self.live.clone()));
        Ok(rx)
    }
}

async fn listen(pool: PgPool, live: LiveSender) {
    match relay(&pool, &live).await {
        Ok(()) => tracing::debug!("store change listener idle, closing"),
        Err(err) => tracing::warn!(error = %err, "store change listener dropped"),
    }
    live.lock().take();
}

async fn relay(pool: &PgPool, live: &LiveSender) -> Result<()> {
    let mut listener = PgListener::connect_with(pool)
        .await
        .context("failed to open change listener")?;
    listener
        .listen(CHANGE_CHANNEL)
        .await
        .context("failed to listen for changes")?;
    tracing::info!(channel = CHANGE_CHANNEL, "listening for store changes");

    loop {
        let Some(message) = listener.try_recv().await? else {
            bail!("change listener connection lost");
        };
        let notification = match decode_change(message.payload()) {
            Ok(notification) => notification,
            Err(err) => {
                tracing::warn!(error = %err, "skipping change notification");
                continue;
            }
        };

        let delivered = match live.lock().as_ref() {
            Some(tx) if tx.receiver_count() > 0 => tx.send(notification).is_ok(),
            _ => false,
        };
        if !delivered {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sqlx::postgres::PgPoolOptions;
    use std::time::Duration;

    #[tokio::test]
    async fn test_subscriber_receives_published_notification() {
        let feed = LocalChangeFeed::new(8);
        let mut rx = feed.subscribe().unwrap();
        assert_eq!(feed.subscriber_count(), 1);

        feed.publish(ChangeNotification::game("g1", ChangeKind::Update));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.record_id, "g1");
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let feed = LocalChangeFeed::default();
        feed.publish(ChangeNotification::game("g1", ChangeKind::Insert));
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn test_decode_game_update() {
        let notification =
            decode_change(r#"{"table":"games","op":"UPDATE","id":"g1","game_id":"g1"}"#).unwrap();
        assert_eq!(notification, ChangeNotification::game("g1", ChangeKind::Update));
    }

    #[test]
    fn test_decode_event_insert_and_delete() {
        let inserted = decode_change(
            r#"{"table":"game_events","op":"INSERT","id":"e1","game_id":"g1"}"#,
        )
        .unwrap();
        assert_eq!(inserted, ChangeNotification::game_event("e1", "g1"));

        let deleted = decode_change(
            r#"{"table":"game_events","op":"DELETE","id":"e1","game_id":null}"#,
        )
        .unwrap();
        assert_eq!(deleted.kind, ChangeKind::Delete);
        assert!(deleted.game_id.is_none());
    }

    #[test]
    fn test_decode_rejects_unknown_payloads() {
        assert!(decode_change("not json").is_err());
        assert!(decode_change(r#"{"table":"teams","op":"INSERT","id":"t1"}"#).is_err());
        assert!(decode_change(r#"{"table":"games","op":"TRUNCATE","id":"g1"}"#).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_store_closes_subscribers() {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://league@127.0.0.1:1/league")
            .unwrap();
        let feed = StoreChangeFeed::new(pool, 8);

        let mut rx = feed.subscribe().unwrap();
        assert!(feed.is_listening());
        let closed = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap();
        assert_eq!(closed, Err(broadcast::error::RecvError::Closed));
        assert!(!feed.is_listening());

        // A later subscribe opens a new listener
        let _rx = feed.subscribe().unwrap();
        assert!(feed.is_listening());
    }
}

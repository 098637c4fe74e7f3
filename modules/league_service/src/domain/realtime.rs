//! Live game updates
//!
//! A subscription watches the change feed on a background task. Each matching
//! notification triggers a fresh read through the game repository and the
//! result is delivered on the subscription channel, so delivery is
//! at-least-once and applying the same update twice is harmless. A closed feed
//! is reopened with exponential backoff; a lagged feed triggers a re-read.

use super::events::{ChangeFeed, ChangeNotification, ChangeTable};
use super::repository::GameRepository;
use crate::config::RealtimeConfig;
use crate::contract::Game;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Reconnect delays for a dropped change feed
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
    /// Fraction of each delay randomized, 0.0..=1.0
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&RealtimeConfig::default())
    }
}

impl ReconnectPolicy {
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self {
            initial_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier.max(1.0),
            jitter: config.jitter.clamp(0.0, 1.0),
        }
    }

    /// Delay before reconnect attempt `attempt` (0-based), without jitter
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = scaled.min(self.max_backoff.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_backoff)
    }

    /// Delay with up to `jitter` of it added or removed at random
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt);
        if self.jitter <= 0.0 {
            return base;
        }
        let factor = 1.0 + rand::rng().random_range(-self.jitter..=self.jitter);
        base.mul_f64(factor.max(0.0))
    }
}

/// What a subscription watches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveTopic {
    /// One game and its play-by-play
    Game(String),
    /// The set of games currently in progress
    LiveGames,
}

impl LiveTopic {
    fn matches(&self, notification: &ChangeNotification) -> bool {
        match self {
            LiveTopic::Game(id) => notification.game_id.as_deref() == Some(id.as_str()),
            LiveTopic::LiveGames => matches!(
                notification.table,
                ChangeTable::Games | ChangeTable::GameEvents
            ),
        }
    }
}

/// Fresh state delivered to a subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum LiveUpdate {
    Game(Game),
    /// The watched game no longer exists
    GameRemoved(String),
    LiveGames(Vec<Game>),
}

/// Handle to a running subscription; dropping it stops the watcher
pub struct LiveSubscription {
    topic: LiveTopic,
    rx: mpsc::Receiver<LiveUpdate>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LiveSubscription {
    pub fn topic(&self) -> &LiveTopic {
        &self.topic
    }

    /// Next update, `None` once the subscription has ended
    pub async fn recv(&mut self) -> Option<LiveUpdate> {
        self.rx.recv().await
    }

    /// Stop watching and wait for the background task to finish
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::debug!(error = %err, "live subscription task ended abnormally");
            }
        }
    }
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Subscription hub over the change feed
#[derive(Clone)]
pub struct LiveUpdates {
    games: Arc<dyn GameRepository>,
    feed: Arc<dyn ChangeFeed>,
    policy: ReconnectPolicy,
    capacity: usize,
}

impl LiveUpdates {
    pub fn new(
        games: Arc<dyn GameRepository>,
        feed: Arc<dyn ChangeFeed>,
        policy: ReconnectPolicy,
        capacity: usize,
    ) -> Self {
        Self {
            games,
            feed,
            policy,
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe_game(&self, game_id: &str) -> LiveSubscription {
        self.subscribe(LiveTopic::Game(game_id.to_string()))
    }

    pub fn subscribe_live_games(&self) -> LiveSubscription {
        self.subscribe(LiveTopic::LiveGames)
    }

    pub fn subscribe(&self, topic: LiveTopic) -> LiveSubscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        let cancel = CancellationToken::new();
        let watcher = Watcher {
            topic: topic.clone(),
            games: self.games.clone(),
            feed: self.feed.clone(),
            policy: self.policy.clone(),
            tx,
            cancel: cancel.clone(),
        };
        // Open the first connection before returning so no change published
        // after subscribe() is missed
        let first = watcher.connect();
        let task = tokio::spawn(watcher.run(first));

        tracing::debug!(?topic, "live subscription started");
        LiveSubscription {
            topic,
            rx,
            cancel,
            task: Some(task),
        }
    }
}

struct Watcher {
    topic: LiveTopic,
    games: Arc<dyn GameRepository>,
    feed: Arc<dyn ChangeFeed>,
    policy: ReconnectPolicy,
    tx: mpsc::Sender<LiveUpdate>,
    cancel: CancellationToken,
}

impl Watcher {
    fn connect(&self) -> Option<broadcast::Receiver<ChangeNotification>> {
        match self.feed.subscribe() {
            Ok(rx) => Some(rx),
            Err(err) => {
                tracing::warn!(topic = ?self.topic, error = %err, "change feed connection failed");
                None
            }
        }
    }

    async fn run(self, first: Option<broadcast::Receiver<ChangeNotification>>) {
        let mut connection = first;
        let mut attempt: u32 = 0;
        let mut reconnected = false;

        loop {
            let Some(mut rx) = connection.take() else {
                if !self.backoff(attempt).await {
                    return;
                }
                attempt = attempt.saturating_add(1);
                connection = self.connect();
                reconnected = true;
                continue;
            };
            attempt = 0;

            // Changes may have been missed while disconnected
            if reconnected && !self.refresh().await {
                return;
            }

            loop {
                tokio::select! {
                    _ = self.cancel.cancelled() => return,
                    received = rx.recv() => match received {
                        Ok(notification) => {
                            if self.topic.matches(&notification) && !self.refresh().await {
                                return;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!(topic = ?self.topic, skipped, "change feed lagged");
                            if !self.refresh().await {
                                return;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::debug!(topic = ?self.topic, "change feed closed");
                            break;
                        }
                    }
                }
            }
            reconnected = true;
        }
    }

    /// Wait before the next reconnect; `false` when cancelled meanwhile
    async fn backoff(&self, attempt: u32) -> bool {
        let delay = self.policy.jittered_delay(attempt);
        tracing::debug!(topic = ?self.topic, attempt, ?delay, "reconnecting change feed");
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    /// Re-read the topic and deliver it; `false` once the subscriber is gone
    async fn refresh(&self) -> bool {
        let update = match &self.topic {
            LiveTopic::Game(id) => self.games.find_by_id(id).await.map(|game| match game {
                Some(game) => LiveUpdate::Game(game),
                None => LiveUpdate::GameRemoved(id.clone()),
            }),
            LiveTopic::LiveGames => self.games.find_live().await.map(LiveUpdate::LiveGames),
        };

        match update {
            Ok(update) => self.tx.send(update).await.is_ok(),
            Err(err) => {
                tracing::warn!(topic = ?self.topic, error = %err, "live refetch failed");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(jitter: f64) -> ReconnectPolicy {
        ReconnectPolicy {
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(1),
            multiplier: 2.0,
            jitter,
        }
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = policy(0.0);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = policy(0.5);
        for _ in 0..100 {
            let delay = policy.jittered_delay(1);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(300));
        }
    }

    #[test]
    fn test_topic_matching() {
        let game = LiveTopic::Game("g1".to_string());
        assert!(game.matches(&ChangeNotification::game_event("e1", "g1")));
        assert!(!game.matches(&ChangeNotification::game_event("e2", "g2")));
        assert!(LiveTopic::LiveGames.matches(&ChangeNotification::game_event("e2", "g2")));
    }
}

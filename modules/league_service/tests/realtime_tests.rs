//! Live game subscriptions over the change feed

use anyhow::bail;
use async_trait::async_trait;
use chrono::NaiveDate;
use league_service::contract::*;
use league_service::domain::events::ChangeKind;
use league_service::domain::repository::GameRepository;
use league_service::domain::{
    ChangeFeed, ChangeNotification, ChangePublisher, LiveSubscription, LiveTopic, LiveUpdate,
    LiveUpdates, ReconnectPolicy,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

mod common;
use common::{date, relational_module, seed_league, team_with_roster};

pub mod mocks {
    use super::*;

    /// In-memory games keyed by id
    #[derive(Default)]
    pub struct MockGameRepo {
        data: RwLock<HashMap<String, Game>>,
        reads: AtomicUsize,
    }

    impl MockGameRepo {
        pub fn put(&self, game: Game) {
            self.data.write().insert(game.id.clone(), game);
        }

        pub fn remove(&self, id: &str) {
            self.data.write().remove(id);
        }

        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GameRepository for MockGameRepo {
        async fn find_all(&self) -> anyhow::Result<Vec<Game>> {
            Ok(self.data.read().values().cloned().collect())
        }

        async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Game>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.data.read().get(id).cloned())
        }

        async fn find_by_season(&self, _season_id: &str) -> anyhow::Result<Vec<Game>> {
            Ok(Vec::new())
        }

        async fn find_by_team(&self, _team_id: &str) -> anyhow::Result<Vec<Game>> {
            Ok(Vec::new())
        }

        async fn search(&self, _term: &str) -> anyhow::Result<Vec<Game>> {
            Ok(Vec::new())
        }

        async fn find_upcoming(&self, _from: NaiveDate, _limit: u64) -> anyhow::Result<Vec<Game>> {
            Ok(Vec::new())
        }

        async fn find_completed(&self, _limit: u64) -> anyhow::Result<Vec<Game>> {
            Ok(Vec::new())
        }

        async fn find_by_date_range(
            &self,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> anyhow::Result<Vec<Game>> {
            Ok(Vec::new())
        }

        async fn find_live(&self) -> anyhow::Result<Vec<Game>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let mut live: Vec<Game> = self
                .data
                .read()
                .values()
                .filter(|g| g.status == GameStatus::Live)
                .cloned()
                .collect();
            live.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(live)
        }

        async fn create(&self, _game: &NewGame) -> anyhow::Result<Game> {
            bail!("not supported")
        }

        async fn update(&self, _id: &str, _update: &GameUpdate) -> anyhow::Result<Option<Game>> {
            bail!("not supported")
        }
    }

    /// Change feed whose connection can be dropped and refused on demand
    #[derive(Default)]
    pub struct FlakyFeed {
        sender: Mutex<Option<broadcast::Sender<ChangeNotification>>>,
        connects: AtomicUsize,
        refusals_left: AtomicUsize,
    }

    impl FlakyFeed {
        pub fn connects(&self) -> usize {
            self.connects.load(Ordering::SeqCst)
        }

        /// Close the current connection; subscribers see `Closed`
        pub fn drop_connection(&self) {
            self.sender.lock().take();
        }

        pub fn refuse_next(&self, count: usize) {
            self.refusals_left.store(count, Ordering::SeqCst);
        }
    }

    impl ChangePublisher for FlakyFeed {
        fn publish(&self, notification: ChangeNotification) {
            if let Some(tx) = self.sender.lock().as_ref() {
                let _ = tx.send(notification);
            }
        }
    }

    impl ChangeFeed for FlakyFeed {
        fn subscribe(&self) -> anyhow::Result<broadcast::Receiver<ChangeNotification>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let refused = self
                .refusals_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if refused {
                bail!("connection refused");
            }
            let (tx, rx) = broadcast::channel(16);
            *self.sender.lock() = Some(tx);
            Ok(rx)
        }
    }
}

use mocks::{FlakyFeed, MockGameRepo};

fn game(id: &str, status: GameStatus, home_score: Option<i32>) -> Game {
    let home = TeamRef {
        id: "t-home".to_string(),
        name: "Eastside Eagles".to_string(),
        ..Default::default()
    };
    let away = TeamRef {
        id: "t-away".to_string(),
        name: "Westside Wolves".to_string(),
        ..Default::default()
    };
    Game {
        id: id.to_string(),
        title: game_title(&home, &away),
        date: Some(date(2025, 10, 4)),
        time: None,
        venue: Venue::tbd(),
        home_team: home,
        away_team: away,
        home_roster_id: None,
        away_roster_id: None,
        division: DivisionRef::unknown(),
        season: SeasonRef::default(),
        session_id: None,
        status,
        home_score,
        away_score: None,
    }
}

fn fast_policy() -> ReconnectPolicy {
    ReconnectPolicy {
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_secs(2),
        multiplier: 2.0,
        jitter: 0.0,
    }
}

async fn next(subscription: &mut LiveSubscription) -> LiveUpdate {
    tokio::time::timeout(Duration::from_secs(5), subscription.recv())
        .await
        .expect("update in time")
        .expect("subscription open")
}

#[tokio::test]
async fn test_game_subscription_follows_score_changes() {
    let (module, db, _feed) = relational_module().await;
    let league = seed_league(&module, &db).await;
    let service = module.service();
    let (home_team, home) = team_with_roster(&module, &league, "Eastside Eagles").await;
    let (_away_team, away) = team_with_roster(&module, &league, "Westside Wolves").await;
    let game = service
        .create_game(NewGame {
            date: date(2025, 10, 4),
            time: None,
            venue_id: None,
            home_roster_id: home.id.clone(),
            away_roster_id: away.id.clone(),
            session_id: None,
            status: GameStatus::Scheduled,
        })
        .await
        .unwrap();

    let mut subscription = module.live_updates().subscribe_game(&game.id);
    assert_eq!(subscription.topic(), &LiveTopic::Game(game.id.clone()));

    service
        .update_game(
            &game.id,
            GameUpdate {
                status: Some(GameStatus::Live),
                home_score: Some(2),
                away_score: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    match next(&mut subscription).await {
        LiveUpdate::Game(updated) => {
            assert_eq!(updated.status, GameStatus::Live);
            assert_eq!(updated.home_score, Some(2));
            assert_eq!(updated.venue.name, "TBD");
        }
        other => panic!("unexpected update {other:?}"),
    }

    service
        .record_game_event(NewGameEvent {
            game_id: game.id.clone(),
            team_id: home_team.id.clone(),
            player_id: None,
            event_type: "foul".to_string(),
            quarter: 1,
            game_time: "05:10".to_string(),
            points: 0,
        })
        .await
        .unwrap();
    assert!(matches!(next(&mut subscription).await, LiveUpdate::Game(_)));

    subscription.unsubscribe().await;
}

#[tokio::test]
async fn test_repeated_notifications_deliver_identical_state() {
    let games = Arc::new(MockGameRepo::default());
    games.put(game("g1", GameStatus::Live, Some(10)));
    let feed = Arc::new(league_service::infra::change_feed::LocalChangeFeed::new(16));
    let live = LiveUpdates::new(games.clone(), feed.clone(), fast_policy(), 8);

    let mut subscription = live.subscribe_game("g1");
    feed.publish(ChangeNotification::game("g1", ChangeKind::Update));
    feed.publish(ChangeNotification::game("g1", ChangeKind::Update));
    // Other games are not delivered
    feed.publish(ChangeNotification::game("g2", ChangeKind::Update));

    let first = next(&mut subscription).await;
    let second = next(&mut subscription).await;
    assert_eq!(first, second);
    assert_eq!(first, LiveUpdate::Game(game("g1", GameStatus::Live, Some(10))));

    games.remove("g1");
    feed.publish(ChangeNotification::game("g1", ChangeKind::Delete));
    assert_eq!(
        next(&mut subscription).await,
        LiveUpdate::GameRemoved("g1".to_string())
    );
    assert_eq!(games.reads(), 3);
}

#[tokio::test]
async fn test_unsubscribe_releases_the_connection() {
    let games = Arc::new(MockGameRepo::default());
    let feed = Arc::new(league_service::infra::change_feed::LocalChangeFeed::new(16));
    let live = LiveUpdates::new(games, feed.clone(), fast_policy(), 8);

    let first = live.subscribe_live_games();
    let second = live.subscribe_game("g1");
    assert_eq!(feed.subscriber_count(), 2);

    first.unsubscribe().await;
    assert_eq!(feed.subscriber_count(), 1);

    drop(second);
    tokio::time::timeout(Duration::from_secs(5), async {
        while feed.subscriber_count() > 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("dropped subscription stops its watcher");
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_and_refetches_after_connection_loss() {
    let games = Arc::new(MockGameRepo::default());
    games.put(game("g1", GameStatus::Live, Some(4)));
    games.put(game("g2", GameStatus::Scheduled, None));
    let feed = Arc::new(FlakyFeed::default());
    let live = LiveUpdates::new(games.clone(), feed.clone(), fast_policy(), 8);

    let mut subscription = live.subscribe_live_games();
    assert_eq!(feed.connects(), 1);

    // Connection drops and the first two reconnects are refused
    feed.refuse_next(2);
    games.put(game("g2", GameStatus::Live, Some(0)));
    feed.drop_connection();

    match next(&mut subscription).await {
        LiveUpdate::LiveGames(live_games) => {
            let ids: Vec<&str> = live_games.iter().map(|g| g.id.as_str()).collect();
            assert_eq!(ids, ["g1", "g2"]);
        }
        other => panic!("unexpected update {other:?}"),
    }
    assert_eq!(feed.connects(), 4);

    // The new connection keeps delivering
    games.put(game("g1", GameStatus::Completed, Some(40)));
    feed.publish(ChangeNotification::game("g1", ChangeKind::Update));
    match next(&mut subscription).await {
        LiveUpdate::LiveGames(live_games) => assert_eq!(live_games.len(), 1),
        other => panic!("unexpected update {other:?}"),
    }

    subscription.unsubscribe().await;
}

use crate::contract::{Game, GameStatus, GameUpdate, NewGame};
use crate::domain::events::{ChangeKind, ChangeNotification, ChangePublisher};
use crate::domain::repository::GameRepository;
use crate::infra::storage::entity::{game, roster, team, venue};
use crate::infra::storage::loader::game_records;
use crate::infra::storage::mapper::to_game;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};
use std::sync::Arc;

pub struct SeaOrmGameRepository {
    db: Arc<DatabaseConnection>,
    publisher: Arc<dyn ChangePublisher>,
}

impl SeaOrmGameRepository {
    pub fn new(db: Arc<DatabaseConnection>, publisher: Arc<dyn ChangePublisher>) -> Self {
        Self { db, publisher }
    }

    /// Run a game query and push the rows through the relation loader
    async fn load(&self, query: Select<game::Entity>) -> Result<Vec<Game>> {
        let rows = query.all(&*self.db).await?;
        game_records(&self.db, rows)
            .await?
            .into_iter()
            .map(to_game)
            .collect()
    }

    fn chronological() -> Select<game::Entity> {
        game::Entity::find()
            .order_by_asc(game::Column::GameDate)
            .order_by_asc(game::Column::GameTime)
            .order_by_asc(game::Column::Id)
    }

    fn involving(roster_ids: Vec<String>) -> Condition {
        Condition::any()
            .add(game::Column::HomeRosterId.is_in(roster_ids.clone()))
            .add(game::Column::AwayRosterId.is_in(roster_ids))
    }
}

#[async_trait]
impl GameRepository for SeaOrmGameRepository {
    async fn find_all(&self) -> Result<Vec<Game>> {
        self.load(Self::chronological()).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Game>> {
        let games = self
            .load(game::Entity::find().filter(game::Column::Id.eq(id)))
            .await?;
        Ok(games.into_iter().next())
    }

    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Game>> {
        let roster_ids = super::season_roster_ids(&self.db, season_id).await?;
        if roster_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.load(Self::chronological().filter(Self::involving(roster_ids)))
            .await
    }

    async fn find_by_team(&self, team_id: &str) -> Result<Vec<Game>> {
        let roster_ids = super::team_roster_ids(&self.db, team_id).await?;
        if roster_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.load(Self::chronological().filter(Self::involving(roster_ids)))
            .await
    }

    async fn search(&self, term: &str) -> Result<Vec<Game>> {
        let team_ids: Vec<String> = team::Entity::find()
            .filter(super::name_contains(team::Column::Name, term))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        let roster_ids: Vec<String> = if team_ids.is_empty() {
            Vec::new()
        } else {
            roster::Entity::find()
                .filter(roster::Column::TeamId.is_in(team_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|r| r.id)
                .collect()
        };
        let venue_ids: Vec<String> = venue::Entity::find()
            .filter(super::name_contains(venue::Column::Name, term))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|v| v.id)
            .collect();

        if roster_ids.is_empty() && venue_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches = Condition::any();
        if !roster_ids.is_empty() {
            matches = matches.add(Self::involving(roster_ids));
        }
        if !venue_ids.is_empty() {
            matches = matches.add(game::Column::VenueId.is_in(venue_ids));
        }
        self.load(Self::chronological().filter(matches)).await
    }

    async fn find_upcoming(&self, from: NaiveDate, limit: u64) -> Result<Vec<Game>> {
        self.load(
            Self::chronological()
                .filter(game::Column::Status.eq(GameStatus::Scheduled.as_str()))
                .filter(game::Column::GameDate.gte(from))
                .limit(limit),
        )
        .await
    }

    async fn find_completed(&self, limit: u64) -> Result<Vec<Game>> {
        self.load(
            game::Entity::find()
                .filter(game::Column::Status.eq(GameStatus::Completed.as_str()))
                .order_by_desc(game::Column::GameDate)
                .order_by_desc(game::Column::GameTime)
                .order_by_asc(game::Column::Id)
                .limit(limit),
        )
        .await
    }

    async fn find_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Game>> {
        self.load(
            Self::chronological()
                .filter(game::Column::GameDate.gte(from))
                .filter(game::Column::GameDate.lte(to)),
        )
        .await
    }

    async fn find_live(&self) -> Result<Vec<Game>> {
        self.load(Self::chronological().filter(game::Column::Status.eq(GameStatus::Live.as_str())))
            .await
    }

    async fn create(&self, new_game: &NewGame) -> Result<Game> {
        let now = chrono::Utc::now();
        let row = game::ActiveModel {
            id: Set(super::new_id()),
            game_date: Set(new_game.date),
            game_time: Set(new_game.time),
            venue_id: Set(new_game.venue_id.clone()),
            home_roster_id: Set(new_game.home_roster_id.clone()),
            away_roster_id: Set(new_game.away_roster_id.clone()),
            session_id: Set(new_game.session_id.clone()),
            status: Set(new_game.status.as_str().to_string()),
            home_score: Set(None),
            away_score: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.publisher
            .publish(ChangeNotification::game(&row.id, ChangeKind::Insert));
        self.find_by_id(&row.id)
            .await?
            .context("game vanished after insert")
    }

    async fn update(&self, id: &str, update: &GameUpdate) -> Result<Option<Game>> {
        let Some(existing) = game::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };

        let mut active: game::ActiveModel = existing.into();
        if let Some(date) = update.date {
            active.game_date = Set(date);
        }
        if let Some(time) = update.time {
            active.game_time = Set(Some(time));
        }
        if let Some(venue_id) = &update.venue_id {
            active.venue_id = Set(Some(venue_id.clone()));
        }
        if let Some(status) = update.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(score) = update.home_score {
            active.home_score = Set(Some(score));
        }
        if let Some(score) = update.away_score {
            active.away_score = Set(Some(score));
        }
        active.updated_at = Set(chrono::Utc::now());
        active.update(&*self.db).await?;

        self.publisher
            .publish(ChangeNotification::game(id, ChangeKind::Update));
        self.find_by_id(id).await
    }
}

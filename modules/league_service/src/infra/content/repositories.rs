//! Content store repository implementations
//!
//! Writes are issued as mutations and then re-read through the same
//! projection the read path uses.

use super::client::ContentClient;
use super::documents::{DivisionDoc, GameDoc, PlayerDoc, SeasonDoc, TeamDoc};
use super::queries::{
    by_id, game_projection, list, match_pattern, player_projection, DIVISION_PROJECTION,
    SEASON_PROJECTION, TEAM_PROJECTION,
};
use super::transform::{
    decode_list, decode_one, to_division, to_game, to_player, to_season, to_team,
};
use crate::contract::{
    Division, Game, GameStatus, GameUpdate, NewDivision, NewGame, NewPlayer, NewSeason, NewTeam,
    Player, Season, StatCategory, StatLeaders, Team, TeamStatus, TeamUpdate,
};
use crate::domain::events::{ChangeKind, ChangeNotification, ChangePublisher};
use crate::domain::repository::{
    rank_by_category, select_current_season, stat_leaders, DivisionRepository, GameRepository,
    PlayerRepository, SeasonRepository, TeamRepository,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use std::sync::Arc;

// ===== Mutation helpers =====

fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn reference(id: &str) -> Value {
    json!({ "_type": "reference", "_ref": id })
}

fn create_mutation(document: Map<String, Value>) -> Value {
    json!({ "create": Value::Object(document) })
}

fn patch_mutation(id: &str, set: Map<String, Value>) -> Value {
    json!({ "patch": { "id": id, "set": Value::Object(set) } })
}

fn delete_mutation(id: &str) -> Value {
    json!({ "delete": { "id": id } })
}

/// Insert `key` only when a value is present
fn put<V: Into<Value>>(document: &mut Map<String, Value>, key: &str, value: Option<V>) {
    if let Some(value) = value {
        document.insert(key.to_string(), value.into());
    }
}

fn document(doc_type: &str, id: &str) -> Map<String, Value> {
    let mut document = Map::new();
    document.insert("_id".to_string(), Value::from(id));
    document.insert("_type".to_string(), Value::from(doc_type));
    document
}

fn date_value(date: NaiveDate) -> Value {
    Value::from(date.format("%Y-%m-%d").to_string())
}

// ===== Season Repository =====

pub struct ContentSeasonRepository {
    client: Arc<dyn ContentClient>,
}

impl ContentSeasonRepository {
    pub fn new(client: Arc<dyn ContentClient>) -> Self {
        Self { client }
    }

    async fn fetch(&self, filter: &str, params: Value) -> Result<Vec<Season>> {
        let query = list(filter, "year desc, name asc", SEASON_PROJECTION, None);
        decode_list::<SeasonDoc>(self.client.query(&query, params).await?)?
            .into_iter()
            .map(to_season)
            .collect()
    }
}

#[async_trait]
impl SeasonRepository for ContentSeasonRepository {
    async fn find_all(&self) -> Result<Vec<Season>> {
        self.fetch("_type == \"season\"", Value::Null).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Season>> {
        let value = self
            .client
            .query(&by_id("season", SEASON_PROJECTION), json!({ "id": id }))
            .await?;
        decode_one::<SeasonDoc>(value)?.map(to_season).transpose()
    }

    async fn find_current(&self) -> Result<Option<Season>> {
        let active = self
            .fetch("_type == \"season\" && isActive == true", Value::Null)
            .await?;
        Ok(select_current_season(active))
    }

    async fn create(&self, season: &NewSeason) -> Result<Season> {
        let id = new_document_id();
        let mut doc = document("season", &id);
        put(&mut doc, "name", Some(season.name.clone()));
        put(&mut doc, "year", Some(season.year));
        put(&mut doc, "status", Some(season.status.as_str()));
        put(&mut doc, "isActive", Some(season.is_active));
        put(&mut doc, "startDate", season.start_date.map(date_value));
        put(&mut doc, "endDate", season.end_date.map(date_value));

        self.client.mutate(vec![create_mutation(doc)]).await?;
        self.find_by_id(&id)
            .await?
            .context("season not readable after create")
    }
}

// ===== Division Repository =====

pub struct ContentDivisionRepository {
    client: Arc<dyn ContentClient>,
}

impl ContentDivisionRepository {
    pub fn new(client: Arc<dyn ContentClient>) -> Self {
        Self { client }
    }

    async fn fetch(&self, filter: &str, params: Value) -> Result<Vec<Division>> {
        let query = list(filter, "name asc", DIVISION_PROJECTION, None);
        decode_list::<DivisionDoc>(self.client.query(&query, params).await?)?
            .into_iter()
            .map(to_division)
            .collect()
    }
}

#[async_trait]
impl DivisionRepository for ContentDivisionRepository {
    async fn find_all(&self) -> Result<Vec<Division>> {
        self.fetch("_type == \"division\"", Value::Null).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Division>> {
        let value = self
            .client
            .query(&by_id("division", DIVISION_PROJECTION), json!({ "id": id }))
            .await?;
        decode_one::<DivisionDoc>(value)?
            .map(to_division)
            .transpose()
    }

    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Division>> {
        self.fetch(
            "_type == \"division\" && conference->season._ref == $seasonId",
            json!({ "seasonId": season_id }),
        )
        .await
    }

    async fn search(&self, term: &str) -> Result<Vec<Division>> {
        self.fetch(
            "_type == \"division\" && name match $term",
            json!({ "term": match_pattern(term) }),
        )
        .await
    }

    async fn create(&self, division: &NewDivision) -> Result<Division> {
        let id = new_document_id();
        let mut doc = document("division", &id);
        put(&mut doc, "name", Some(division.name.clone()));
        put(&mut doc, "ageGroup", Some(division.age_group.as_str()));
        put(
            &mut doc,
            "conference",
            division.conference_id.as_deref().map(reference),
        );

        self.client.mutate(vec![create_mutation(doc)]).await?;
        self.find_by_id(&id)
            .await?
            .context("division not readable after create")
    }
}

// ===== Team Repository =====

pub struct ContentTeamRepository {
    client: Arc<dyn ContentClient>,
}

impl ContentTeamRepository {
    pub fn new(client: Arc<dyn ContentClient>) -> Self {
        Self { client }
    }

    async fn fetch(&self, filter: &str, params: Value) -> Result<Vec<Team>> {
        let query = list(filter, "name asc", TEAM_PROJECTION, None);
        decode_list::<TeamDoc>(self.client.query(&query, params).await?)?
            .into_iter()
            .map(to_team)
            .collect()
    }
}

#[async_trait]
impl TeamRepository for ContentTeamRepository {
    async fn find_all(&self) -> Result<Vec<Team>> {
        self.fetch("_type == \"team\"", Value::Null).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Team>> {
        let value = self
            .client
            .query(&by_id("team", TEAM_PROJECTION), json!({ "id": id }))
            .await?;
        decode_one::<TeamDoc>(value)?.map(to_team).transpose()
    }

    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Team>> {
        self.fetch(
            "_type == \"team\" && _id in *[_type == \"roster\" && season._ref == $seasonId].team._ref",
            json!({ "seasonId": season_id }),
        )
        .await
    }

    async fn search(&self, term: &str) -> Result<Vec<Team>> {
        self.fetch(
            "_type == \"team\" && name match $term",
            json!({ "term": match_pattern(term) }),
        )
        .await
    }

    async fn create(&self, team: &NewTeam) -> Result<Team> {
        let id = new_document_id();
        let colors = team.colors.clone().unwrap_or_default();
        let mut doc = document("team", &id);
        put(&mut doc, "name", Some(team.name.clone()));
        put(
            &mut doc,
            "shortName",
            Some(team.short_name.clone().unwrap_or_else(|| team.name.clone())),
        );
        put(&mut doc, "logoUrl", team.logo.clone());
        put(&mut doc, "location", team.location.clone());
        put(
            &mut doc,
            "colors",
            Some(json!({ "primary": colors.primary, "secondary": colors.secondary })),
        );
        put(
            &mut doc,
            "status",
            Some(team.status.unwrap_or(TeamStatus::Active).as_str()),
        );

        self.client.mutate(vec![create_mutation(doc)]).await?;
        self.find_by_id(&id)
            .await?
            .context("team not readable after create")
    }

    async fn update(&self, id: &str, update: &TeamUpdate) -> Result<Option<Team>> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let mut set = Map::new();
        put(&mut set, "name", update.name.clone());
        put(&mut set, "shortName", update.short_name.clone());
        put(&mut set, "logoUrl", update.logo.clone());
        put(&mut set, "location", update.location.clone());
        put(
            &mut set,
            "colors",
            update
                .colors
                .as_ref()
                .map(|c| json!({ "primary": c.primary, "secondary": c.secondary })),
        );
        put(&mut set, "status", update.status.map(|s| s.as_str()));

        if !set.is_empty() {
            self.client.mutate(vec![patch_mutation(id, set)]).await?;
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(false);
        }
        self.client.mutate(vec![delete_mutation(id)]).await?;
        Ok(true)
    }
}

// ===== Game Repository =====

pub struct ContentGameRepository {
    client: Arc<dyn ContentClient>,
    publisher: Arc<dyn ChangePublisher>,
}

const GAME_ORDER: &str = "date asc, time asc, _id asc";

impl ContentGameRepository {
    pub fn new(client: Arc<dyn ContentClient>, publisher: Arc<dyn ChangePublisher>) -> Self {
        Self { client, publisher }
    }

    async fn fetch(
        &self,
        filter: &str,
        order: &str,
        limit: Option<u64>,
        params: Value,
    ) -> Result<Vec<Game>> {
        let query = list(filter, order, &game_projection(), limit);
        decode_list::<GameDoc>(self.client.query(&query, params).await?)?
            .into_iter()
            .map(to_game)
            .collect()
    }
}

#[async_trait]
impl GameRepository for ContentGameRepository {
    async fn find_all(&self) -> Result<Vec<Game>> {
        self.fetch("_type == \"game\"", GAME_ORDER, None, Value::Null)
            .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Game>> {
        let value = self
            .client
            .query(&by_id("game", &game_projection()), json!({ "id": id }))
            .await?;
        decode_one::<GameDoc>(value)?.map(to_game).transpose()
    }

    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Game>> {
        self.fetch(
            "_type == \"game\" && (homeRoster->season._ref == $seasonId || awayRoster->season._ref == $seasonId)",
            GAME_ORDER,
            None,
            json!({ "seasonId": season_id }),
        )
        .await
    }

    async fn find_by_team(&self, team_id: &str) -> Result<Vec<Game>> {
        self.fetch(
            "_type == \"game\" && (homeRoster->team._ref == $teamId || awayRoster->team._ref == $teamId)",
            GAME_ORDER,
            None,
            json!({ "teamId": team_id }),
        )
        .await
    }

    async fn search(&self, term: &str) -> Result<Vec<Game>> {
        self.fetch(
            "_type == \"game\" && (homeRoster->team->name match $term \
             || awayRoster->team->name match $term || venue->name match $term)",
            GAME_ORDER,
            None,
            json!({ "term": match_pattern(term) }),
        )
        .await
    }

    async fn find_upcoming(&self, from: NaiveDate, limit: u64) -> Result<Vec<Game>> {
        self.fetch(
            "_type == \"game\" && status == \"scheduled\" && date >= $from",
            GAME_ORDER,
            Some(limit),
            json!({ "from": date_value(from) }),
        )
        .await
    }

    async fn find_completed(&self, limit: u64) -> Result<Vec<Game>> {
        self.fetch(
            "_type == \"game\" && status == \"completed\"",
            "date desc, time desc, _id asc",
            Some(limit),
            Value::Null,
        )
        .await
    }

    async fn find_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Game>> {
        self.fetch(
            "_type == \"game\" && date >= $from && date <= $to",
            GAME_ORDER,
            None,
            json!({ "from": date_value(from), "to": date_value(to) }),
        )
        .await
    }

    async fn find_live(&self) -> Result<Vec<Game>> {
        self.fetch(
            &format!("_type == \"game\" && status == \"{}\"", GameStatus::Live),
            GAME_ORDER,
            None,
            Value::Null,
        )
        .await
    }

    async fn create(&self, game: &NewGame) -> Result<Game> {
        let id = new_document_id();
        let mut doc = document("game", &id);
        put(&mut doc, "date", Some(date_value(game.date)));
        put(
            &mut doc,
            "time",
            game.time.map(|t| t.format("%H:%M").to_string()),
        );
        put(&mut doc, "venue", game.venue_id.as_deref().map(reference));
        put(&mut doc, "homeRoster", Some(reference(&game.home_roster_id)));
        put(&mut doc, "awayRoster", Some(reference(&game.away_roster_id)));
        put(&mut doc, "session", game.session_id.as_deref().map(reference));
        put(&mut doc, "status", Some(game.status.as_str()));

        self.client.mutate(vec![create_mutation(doc)]).await?;
        self.publisher
            .publish(ChangeNotification::game(&id, ChangeKind::Insert));
        self.find_by_id(&id)
            .await?
            .context("game not readable after create")
    }

    async fn update(&self, id: &str, update: &GameUpdate) -> Result<Option<Game>> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let mut set = Map::new();
        put(&mut set, "date", update.date.map(date_value));
        put(
            &mut set,
            "time",
            update.time.map(|t| t.format("%H:%M").to_string()),
        );
        put(&mut set, "venue", update.venue_id.as_deref().map(reference));
        put(&mut set, "status", update.status.map(|s| s.as_str()));
        put(&mut set, "homeScore", update.home_score);
        put(&mut set, "awayScore", update.away_score);

        if !set.is_empty() {
            self.client.mutate(vec![patch_mutation(id, set)]).await?;
            self.publisher
                .publish(ChangeNotification::game(id, ChangeKind::Update));
        }
        self.find_by_id(id).await
    }
}

// ===== Player Repository =====

pub struct ContentPlayerRepository {
    client: Arc<dyn ContentClient>,
}

impl ContentPlayerRepository {
    pub fn new(client: Arc<dyn ContentClient>) -> Self {
        Self { client }
    }

    async fn fetch(&self, filter: &str, params: Value) -> Result<Vec<Player>> {
        let query = list(filter, "name asc, _id asc", &player_projection(), None);
        decode_list::<PlayerDoc>(self.client.query(&query, params).await?)?
            .into_iter()
            .map(to_player)
            .collect()
    }
}

#[async_trait]
impl PlayerRepository for ContentPlayerRepository {
    async fn find_all(&self) -> Result<Vec<Player>> {
        self.fetch("_type == \"player\"", Value::Null).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Player>> {
        let value = self
            .client
            .query(&by_id("player", &player_projection()), json!({ "id": id }))
            .await?;
        decode_one::<PlayerDoc>(value)?.map(to_player).transpose()
    }

    async fn find_by_team(&self, team_id: &str) -> Result<Vec<Player>> {
        self.fetch(
            "_type == \"player\" && roster->team._ref == $teamId",
            json!({ "teamId": team_id }),
        )
        .await
    }

    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Player>> {
        self.fetch(
            "_type == \"player\" && roster->season._ref == $seasonId",
            json!({ "seasonId": season_id }),
        )
        .await
    }

    async fn search(&self, term: &str) -> Result<Vec<Player>> {
        self.fetch(
            "_type == \"player\" && name match $term",
            json!({ "term": match_pattern(term) }),
        )
        .await
    }

    async fn find_stat_leaders(&self, season_id: &str, limit: u64) -> Result<StatLeaders> {
        let players = self.find_by_season(season_id).await?;
        Ok(stat_leaders(players, limit))
    }

    async fn find_leaders_by_category(
        &self,
        category: StatCategory,
        season_id: &str,
        limit: u64,
    ) -> Result<Vec<Player>> {
        let players = self.find_by_season(season_id).await?;
        Ok(rank_by_category(players, category, limit))
    }

    async fn create(&self, player: &NewPlayer) -> Result<Player> {
        let id = new_document_id();
        let stats = player.stats;
        let mut doc = document("player", &id);
        put(&mut doc, "name", Some(player.name.clone()));
        put(&mut doc, "roster", Some(reference(&player.roster_id)));
        put(&mut doc, "jersey", player.jersey);
        put(&mut doc, "position", player.position.map(|p| p.as_str()));
        put(
            &mut doc,
            "stats",
            Some(json!({
                "gamesPlayed": stats.games_played,
                "ppg": stats.ppg,
                "rpg": stats.rpg,
                "apg": stats.apg,
                "spg": stats.spg,
                "bpg": stats.bpg,
                "mpg": stats.mpg,
                "fgPct": stats.fg_pct,
                "threePct": stats.three_pct,
                "ftPct": stats.ft_pct,
            })),
        );

        self.client.mutate(vec![create_mutation(doc)]).await?;
        self.find_by_id(&id)
            .await?
            .context("player not readable after create")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::TeamColors;
    use crate::domain::events::NoOpChangePublisher;
    use parking_lot::Mutex;

    /// Records every request and answers queries from a closure
    struct RecordingClient {
        respond: Box<dyn Fn(&str, &Value) -> Value + Send + Sync>,
        queries: Mutex<Vec<(String, Value)>>,
        mutations: Mutex<Vec<Value>>,
    }

    impl RecordingClient {
        fn new(respond: impl Fn(&str, &Value) -> Value + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                respond: Box::new(respond),
                queries: Mutex::new(Vec::new()),
                mutations: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ContentClient for RecordingClient {
        async fn query(&self, query: &str, params: Value) -> Result<Value> {
            let result = (self.respond)(query, &params);
            self.queries.lock().push((query.to_string(), params));
            Ok(result)
        }

        async fn mutate(&self, mutations: Vec<Value>) -> Result<()> {
            self.mutations.lock().extend(mutations);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_find_by_id_returns_none_for_null_result() {
        let client = RecordingClient::new(|_, _| Value::Null);
        let repo = ContentGameRepository::new(client.clone(), Arc::new(NoOpChangePublisher));

        assert!(repo.find_by_id("missing").await.unwrap().is_none());
        let queries = client.queries.lock();
        assert_eq!(queries[0].1, json!({ "id": "missing" }));
    }

    #[tokio::test]
    async fn test_upcoming_query_carries_limit_and_date() {
        let client = RecordingClient::new(|_, _| json!([]));
        let repo = ContentGameRepository::new(client.clone(), Arc::new(NoOpChangePublisher));

        let from = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert!(repo.find_upcoming(from, 3).await.unwrap().is_empty());

        let queries = client.queries.lock();
        assert!(queries[0].0.contains("[0...3]"));
        assert_eq!(queries[0].1, json!({ "from": "2025-03-01" }));
    }

    #[tokio::test]
    async fn test_team_create_defaults_and_refetches() {
        let client = RecordingClient::new(|_, params| {
            json!({
                "_id": params["id"],
                "name": "Hawks",
                "shortName": "Hawks",
                "location": "Springfield",
                "colors": { "primary": "#000", "secondary": "#fff" },
                "status": "active"
            })
        });
        let repo = ContentTeamRepository::new(client.clone());

        let team = repo
            .create(&NewTeam {
                name: "Hawks".to_string(),
                location: Some("Springfield".to_string()),
                colors: Some(TeamColors {
                    primary: "#000".to_string(),
                    secondary: "#fff".to_string(),
                }),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(team.short_name, "Hawks");
        assert_eq!(team.status, TeamStatus::Active);

        let mutations = client.mutations.lock();
        let created = &mutations[0]["create"];
        assert_eq!(created["_type"], "team");
        assert_eq!(created["shortName"], "Hawks");
        assert_eq!(created["status"], "active");
        assert_eq!(created["_id"], Value::from(team.id.as_str()));
    }

    #[tokio::test]
    async fn test_team_delete_skips_missing_documents() {
        let client = RecordingClient::new(|_, params| {
            if params["id"] == "t1" {
                json!({ "_id": "t1", "name": "Hawks", "status": "active" })
            } else {
                Value::Null
            }
        });
        let repo = ContentTeamRepository::new(client.clone());

        assert!(!repo.delete("missing").await.unwrap());
        assert!(client.mutations.lock().is_empty());

        assert!(repo.delete("t1").await.unwrap());
        let mutations = client.mutations.lock();
        assert_eq!(mutations[0], json!({ "delete": { "id": "t1" } }));
    }

    #[tokio::test]
    async fn test_current_season_is_selected_deterministically() {
        let client = RecordingClient::new(|_, _| {
            json!([
                { "_id": "b", "name": "B", "isActive": true, "startDate": "2025-01-10" },
                { "_id": "a", "name": "A", "isActive": true, "startDate": "2025-01-10" },
                { "_id": "c", "name": "C", "isActive": true }
            ])
        });
        let repo = ContentSeasonRepository::new(client);

        let current = repo.find_current().await.unwrap().unwrap();
        assert_eq!(current.id, "a");
    }
}

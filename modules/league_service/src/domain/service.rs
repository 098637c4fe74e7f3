//! Domain service - business logic orchestration
//!
//! Every repository call goes through [`Service::call`], which bounds it with
//! the configured store timeout and converts store failures into
//! [`LeagueError`]. Registration and payment flows live in their own modules
//! as further `impl Service` blocks.

use super::factory::Repositories;
use crate::config::PricingConfig;
use crate::contract::{
    Division, Game, GameEvent, GameStatus, GameUpdate, LeagueError, NewDivision, NewGame,
    NewGameEvent, NewOfficial, NewPlayer, NewSeason, NewSession, NewTeam, Official, Player,
    Roster, RosterSessionEnrollment, Season, Session, Standing, StatCategory, StatLeaders, Team,
    TeamRef, TeamUpdate,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

/// Domain service for the league
pub struct Service {
    pub(super) repos: Repositories,
    pub(super) store_timeout: Duration,
    pub(super) pricing: PricingConfig,
}

impl Service {
    pub fn new(repos: Repositories, store_timeout: Duration, pricing: PricingConfig) -> Self {
        Self {
            repos,
            store_timeout,
            pricing,
        }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Run one store call under the store timeout
    pub(super) async fn call<T, F>(&self, operation: &'static str, fut: F) -> Result<T, LeagueError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                tracing::error!(operation, error = %format!("{err:#}"), "store call failed");
                Err(LeagueError::Store {
                    message: format!("{err:#}"),
                })
            }
            Err(_) => {
                tracing::error!(operation, timeout = ?self.store_timeout, "store call timed out");
                Err(LeagueError::Timeout {
                    operation: operation.to_string(),
                    timeout: self.store_timeout,
                })
            }
        }
    }

    /// Like [`Service::call`] for by-id lookups that must find a row
    pub(super) async fn require<T, F>(
        &self,
        operation: &'static str,
        resource: &str,
        id: &str,
        fut: F,
    ) -> Result<T, LeagueError>
    where
        F: Future<Output = anyhow::Result<Option<T>>>,
    {
        self.call(operation, fut)
            .await?
            .ok_or_else(|| LeagueError::not_found(resource, id))
    }

    // ===== Seasons and divisions =====

    pub async fn list_seasons(&self) -> Result<Vec<Season>, LeagueError> {
        self.call("seasons.find_all", self.repos.seasons.find_all())
            .await
    }

    pub async fn get_season(&self, id: &str) -> Result<Season, LeagueError> {
        self.require("seasons.find_by_id", "season", id, self.repos.seasons.find_by_id(id))
            .await
    }

    pub async fn current_season(&self) -> Result<Option<Season>, LeagueError> {
        self.call("seasons.find_current", self.repos.seasons.find_current())
            .await
    }

    pub async fn create_season(&self, season: NewSeason) -> Result<Season, LeagueError> {
        if season.name.trim().is_empty() {
            return Err(LeagueError::validation("season name is required"));
        }
        self.call("seasons.create", self.repos.seasons.create(&season))
            .await
    }

    pub async fn list_divisions(&self) -> Result<Vec<Division>, LeagueError> {
        self.call("divisions.find_all", self.repos.divisions.find_all())
            .await
    }

    pub async fn get_division(&self, id: &str) -> Result<Division, LeagueError> {
        self.require(
            "divisions.find_by_id",
            "division",
            id,
            self.repos.divisions.find_by_id(id),
        )
        .await
    }

    pub async fn divisions_for_season(&self, season_id: &str) -> Result<Vec<Division>, LeagueError> {
        self.call(
            "divisions.find_by_season",
            self.repos.divisions.find_by_season(season_id),
        )
        .await
    }

    pub async fn search_divisions(&self, term: &str) -> Result<Vec<Division>, LeagueError> {
        self.call("divisions.search", self.repos.divisions.search(term))
            .await
    }

    pub async fn create_division(&self, division: NewDivision) -> Result<Division, LeagueError> {
        if division.name.trim().is_empty() {
            return Err(LeagueError::validation("division name is required"));
        }
        self.call("divisions.create", self.repos.divisions.create(&division))
            .await
    }

    pub async fn sessions_for_season(&self, season_id: &str) -> Result<Vec<Session>, LeagueError> {
        self.call(
            "sessions.find_by_season",
            self.repos.sessions.find_by_season(season_id),
        )
        .await
    }

    pub async fn create_session(&self, session: NewSession) -> Result<Session, LeagueError> {
        self.call("sessions.create", self.repos.sessions.create(&session))
            .await
    }

    // ===== Teams and rosters =====

    pub async fn list_teams(&self) -> Result<Vec<Team>, LeagueError> {
        self.call("teams.find_all", self.repos.teams.find_all()).await
    }

    pub async fn get_team(&self, id: &str) -> Result<Team, LeagueError> {
        self.require("teams.find_by_id", "team", id, self.repos.teams.find_by_id(id))
            .await
    }

    pub async fn teams_for_season(&self, season_id: &str) -> Result<Vec<Team>, LeagueError> {
        self.call(
            "teams.find_by_season",
            self.repos.teams.find_by_season(season_id),
        )
        .await
    }

    pub async fn search_teams(&self, term: &str) -> Result<Vec<Team>, LeagueError> {
        self.call("teams.search", self.repos.teams.search(term)).await
    }

    pub async fn create_team(&self, team: NewTeam) -> Result<Team, LeagueError> {
        if team.name.trim().is_empty() {
            return Err(LeagueError::validation("team name is required"));
        }
        self.call("teams.create", self.repos.teams.create(&team)).await
    }

    pub async fn update_team(&self, id: &str, update: TeamUpdate) -> Result<Team, LeagueError> {
        self.require(
            "teams.update",
            "team",
            id,
            self.repos.teams.update(id, &update),
        )
        .await
    }

    pub async fn rosters_for_team(&self, team_id: &str) -> Result<Vec<Roster>, LeagueError> {
        self.call(
            "rosters.find_by_team",
            self.repos.rosters.find_by_team(team_id),
        )
        .await
    }

    pub async fn roster_enrollments(
        &self,
        roster_id: &str,
    ) -> Result<Vec<RosterSessionEnrollment>, LeagueError> {
        self.call(
            "enrollments.find_by_roster",
            self.repos.enrollments.find_by_roster(roster_id),
        )
        .await
    }

    /// Manual enrollment of a roster in one session
    pub async fn enroll_roster(
        &self,
        roster_id: &str,
        session_id: &str,
    ) -> Result<RosterSessionEnrollment, LeagueError> {
        self.require(
            "rosters.find_by_id",
            "roster",
            roster_id,
            self.repos.rosters.find_by_id(roster_id),
        )
        .await?;
        self.require(
            "sessions.find_by_id",
            "session",
            session_id,
            self.repos.sessions.find_by_id(session_id),
        )
        .await?;

        self.call(
            "enrollments.enroll",
            self.repos.enrollments.enroll(roster_id, session_id, false),
        )
        .await
    }

    // ===== Games =====

    pub async fn list_games(&self) -> Result<Vec<Game>, LeagueError> {
        self.call("games.find_all", self.repos.games.find_all()).await
    }

    pub async fn get_game(&self, id: &str) -> Result<Game, LeagueError> {
        self.require("games.find_by_id", "game", id, self.repos.games.find_by_id(id))
            .await
    }

    pub async fn games_for_season(&self, season_id: &str) -> Result<Vec<Game>, LeagueError> {
        self.call(
            "games.find_by_season",
            self.repos.games.find_by_season(season_id),
        )
        .await
    }

    pub async fn games_for_team(&self, team_id: &str) -> Result<Vec<Game>, LeagueError> {
        self.call("games.find_by_team", self.repos.games.find_by_team(team_id))
            .await
    }

    pub async fn search_games(&self, term: &str) -> Result<Vec<Game>, LeagueError> {
        self.call("games.search", self.repos.games.search(term)).await
    }

    pub async fn upcoming_games(&self, from: NaiveDate, limit: u64) -> Result<Vec<Game>, LeagueError> {
        self.call(
            "games.find_upcoming",
            self.repos.games.find_upcoming(from, limit),
        )
        .await
    }

    pub async fn recent_results(&self, limit: u64) -> Result<Vec<Game>, LeagueError> {
        self.call("games.find_completed", self.repos.games.find_completed(limit))
            .await
    }

    pub async fn games_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Game>, LeagueError> {
        if from > to {
            return Err(LeagueError::validation("date range start is after its end"));
        }
        self.call(
            "games.find_by_date_range",
            self.repos.games.find_by_date_range(from, to),
        )
        .await
    }

    pub async fn live_games(&self) -> Result<Vec<Game>, LeagueError> {
        self.call("games.find_live", self.repos.games.find_live()).await
    }

    pub async fn create_game(&self, game: NewGame) -> Result<Game, LeagueError> {
        if game.home_roster_id == game.away_roster_id {
            return Err(LeagueError::validation(
                "home and away rosters must be different",
            ));
        }
        self.call("games.create", self.repos.games.create(&game)).await
    }

    /// Any status is accepted; game status transitions are not enforced
    pub async fn update_game(&self, id: &str, update: GameUpdate) -> Result<Game, LeagueError> {
        self.require(
            "games.update",
            "game",
            id,
            self.repos.games.update(id, &update),
        )
        .await
    }

    pub async fn game_events(&self, game_id: &str) -> Result<Vec<GameEvent>, LeagueError> {
        self.call(
            "game_events.find_by_game",
            self.repos.game_events.find_by_game(game_id),
        )
        .await
    }

    pub async fn record_game_event(&self, event: NewGameEvent) -> Result<GameEvent, LeagueError> {
        if event.event_type.trim().is_empty() {
            return Err(LeagueError::validation("event type is required"));
        }
        self.get_game(&event.game_id).await?;
        self.call("game_events.add_event", self.repos.game_events.add_event(&event))
            .await
    }

    // ===== Officials =====

    pub async fn list_officials(&self) -> Result<Vec<Official>, LeagueError> {
        self.call("officials.find_all", self.repos.officials.find_all())
            .await
    }

    pub async fn create_official(&self, official: NewOfficial) -> Result<Official, LeagueError> {
        if official.name.trim().is_empty() {
            return Err(LeagueError::validation("official name is required"));
        }
        self.call("officials.create", self.repos.officials.create(&official))
            .await
    }

    pub async fn game_officials(&self, game_id: &str) -> Result<Vec<Official>, LeagueError> {
        self.call(
            "officials.find_by_game",
            self.repos.officials.find_by_game(game_id),
        )
        .await
    }

    pub async fn assign_official(&self, official_id: &str, game_id: &str) -> Result<(), LeagueError> {
        self.require(
            "officials.find_by_id",
            "official",
            official_id,
            self.repos.officials.find_by_id(official_id),
        )
        .await?;
        self.get_game(game_id).await?;
        self.call(
            "officials.assign_to_game",
            self.repos.officials.assign_to_game(official_id, game_id),
        )
        .await
    }

    // ===== Players =====

    pub async fn list_players(&self) -> Result<Vec<Player>, LeagueError> {
        self.call("players.find_all", self.repos.players.find_all())
            .await
    }

    pub async fn get_player(&self, id: &str) -> Result<Player, LeagueError> {
        self.require(
            "players.find_by_id",
            "player",
            id,
            self.repos.players.find_by_id(id),
        )
        .await
    }

    pub async fn players_for_team(&self, team_id: &str) -> Result<Vec<Player>, LeagueError> {
        self.call(
            "players.find_by_team",
            self.repos.players.find_by_team(team_id),
        )
        .await
    }

    pub async fn players_for_season(&self, season_id: &str) -> Result<Vec<Player>, LeagueError> {
        self.call(
            "players.find_by_season",
            self.repos.players.find_by_season(season_id),
        )
        .await
    }

    pub async fn search_players(&self, term: &str) -> Result<Vec<Player>, LeagueError> {
        self.call("players.search", self.repos.players.search(term))
            .await
    }

    pub async fn create_player(&self, player: NewPlayer) -> Result<Player, LeagueError> {
        if player.name.trim().is_empty() {
            return Err(LeagueError::validation("player name is required"));
        }
        self.call("players.create", self.repos.players.create(&player))
            .await
    }

    pub async fn stat_leaders(&self, season_id: &str, limit: u64) -> Result<StatLeaders, LeagueError> {
        self.call(
            "players.find_stat_leaders",
            self.repos.players.find_stat_leaders(season_id, limit),
        )
        .await
    }

    pub async fn category_leaders(
        &self,
        category: StatCategory,
        season_id: &str,
        limit: u64,
    ) -> Result<Vec<Player>, LeagueError> {
        self.call(
            "players.find_leaders_by_category",
            self.repos
                .players
                .find_leaders_by_category(category, season_id, limit),
        )
        .await
    }

    // ===== Standings =====

    /// Standings of a season, optionally for one division
    pub async fn standings(
        &self,
        season_id: &str,
        division_id: Option<&str>,
    ) -> Result<Vec<Standing>, LeagueError> {
        let games = self.games_for_season(season_id).await?;
        let games = games
            .iter()
            .filter(|g| division_id.is_none_or(|d| g.division.id == d));
        Ok(compute_standings(games))
    }
}

/// Aggregate completed, fully scored games into a sorted standings table
pub fn compute_standings<'a>(games: impl IntoIterator<Item = &'a Game>) -> Vec<Standing> {
    let mut table: HashMap<String, Standing> = HashMap::new();
    let mut entry = |team: &TeamRef| -> Option<String> {
        if team.id.is_empty() {
            return None;
        }
        table.entry(team.id.clone()).or_insert_with(|| Standing {
            team: team.clone(),
            wins: 0,
            losses: 0,
            points_for: 0,
            points_against: 0,
            win_pct: 0.0,
        });
        Some(team.id.clone())
    };

    let mut results = Vec::new();
    for game in games {
        if game.status != GameStatus::Completed {
            continue;
        }
        let (Some(home_score), Some(away_score)) = (game.home_score, game.away_score) else {
            continue;
        };
        let (Some(home), Some(away)) = (entry(&game.home_team), entry(&game.away_team)) else {
            continue;
        };
        results.push((home, away, i64::from(home_score), i64::from(away_score)));
    }

    for (home, away, home_score, away_score) in results {
        if let Some(line) = table.get_mut(&home) {
            line.points_for += home_score;
            line.points_against += away_score;
            if home_score > away_score {
                line.wins += 1;
            } else if home_score < away_score {
                line.losses += 1;
            }
        }
        if let Some(line) = table.get_mut(&away) {
            line.points_for += away_score;
            line.points_against += home_score;
            if away_score > home_score {
                line.wins += 1;
            } else if away_score < home_score {
                line.losses += 1;
            }
        }
    }

    let mut standings: Vec<Standing> = table
        .into_values()
        .map(|mut line| {
            let decided = line.wins + line.losses;
            line.win_pct = if decided == 0 {
                0.0
            } else {
                f64::from(line.wins) / f64::from(decided)
            };
            line
        })
        .collect();

    standings.sort_by(|a, b| {
        b.win_pct
            .total_cmp(&a.win_pct)
            .then_with(|| b.point_differential().cmp(&a.point_differential()))
            .then_with(|| a.team.name.cmp(&b.team.name))
    });
    standings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{DivisionRef, SeasonRef, Venue};

    fn team(id: &str) -> TeamRef {
        TeamRef {
            id: id.to_string(),
            name: id.to_uppercase(),
            ..Default::default()
        }
    }

    fn game(home: &str, away: &str, scores: Option<(i32, i32)>, status: GameStatus) -> Game {
        Game {
            id: format!("{home}-{away}"),
            title: String::new(),
            date: None,
            time: None,
            venue: Venue::tbd(),
            home_team: team(home),
            away_team: team(away),
            home_roster_id: None,
            away_roster_id: None,
            division: DivisionRef::unknown(),
            season: SeasonRef::default(),
            session_id: None,
            status,
            home_score: scores.map(|s| s.0),
            away_score: scores.map(|s| s.1),
        }
    }

    #[test]
    fn test_standings_order_by_pct_then_differential_then_name() {
        let games = vec![
            game("a", "b", Some((50, 40)), GameStatus::Completed),
            game("c", "d", Some((60, 30)), GameStatus::Completed),
            game("b", "d", Some((45, 44)), GameStatus::Completed),
            game("a", "c", None, GameStatus::Completed),
            game("a", "c", Some((10, 90)), GameStatus::Live),
        ];

        let standings = compute_standings(&games);
        let order: Vec<_> = standings.iter().map(|s| s.team.id.as_str()).collect();
        // c: 1-0 (+30), a: 1-0 (+10), b: 1-1 (-9), d: 0-2 (-31)
        assert_eq!(order, vec!["c", "a", "b", "d"]);
        assert_eq!(standings[2].wins, 1);
        assert_eq!(standings[2].losses, 1);
        assert_eq!(standings[2].win_pct, 0.5);
    }

    #[test]
    fn test_unscored_games_are_ignored() {
        let games = vec![game("a", "b", None, GameStatus::Completed)];
        assert!(compute_standings(&games).is_empty());
    }
}

//! Repository traits for data access
//!
//! These traits define the interface for data access operations, independent
//! of the backing store. Implementations live in `infra/storage` (relational)
//! and `infra/content` (content store).
//!
//! Conventions shared by every implementation:
//! - list operations return a possibly empty `Vec`, never an error for "no rows"
//! - by-id lookups return `Ok(None)` when the row does not exist
//! - store and transport failures are `Err` carrying the store's message
//! - writes re-fetch through the read path before returning

use crate::contract::{
    Division, Game, GameEvent, GameUpdate, NewDivision, NewGame, NewGameEvent, NewOfficial,
    NewPlayer, NewSeason, NewSession, NewTeam, NewTeamPayment, NewTeamRegistration, Official,
    PaymentStatus, Player, RegistrationStatus, Roster, RosterSessionEnrollment, Season, Session,
    StatCategory, StatLeaders, Team, TeamPayment, TeamPaymentStatus, TeamRegistration, TeamUpdate,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Repository for seasons
#[async_trait]
pub trait SeasonRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Season>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Season>>;

    /// First active season, most recent start date first, then id
    async fn find_current(&self) -> Result<Option<Season>>;

    async fn create(&self, season: &NewSeason) -> Result<Season>;
}

/// Repository for divisions
#[async_trait]
pub trait DivisionRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Division>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Division>>;

    /// Divisions offered in a season
    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Division>>;

    /// Case-insensitive name search
    async fn search(&self, term: &str) -> Result<Vec<Division>>;

    async fn create(&self, division: &NewDivision) -> Result<Division>;
}

/// Repository for teams
#[async_trait]
pub trait TeamRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Team>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Team>>;

    /// Teams with a roster in the season
    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Team>>;

    async fn search(&self, term: &str) -> Result<Vec<Team>>;

    async fn create(&self, team: &NewTeam) -> Result<Team>;

    /// `Ok(None)` when the team does not exist
    async fn update(&self, id: &str, update: &TeamUpdate) -> Result<Option<Team>>;

    /// `false` when the team does not exist
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Repository for games
#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Game>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Game>>;

    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Game>>;

    /// Games where the team plays home or away
    async fn find_by_team(&self, team_id: &str) -> Result<Vec<Game>>;

    /// Search by team or venue name
    async fn search(&self, term: &str) -> Result<Vec<Game>>;

    /// Scheduled games from `from` onward, soonest first
    async fn find_upcoming(&self, from: NaiveDate, limit: u64) -> Result<Vec<Game>>;

    /// Completed games, most recent first
    async fn find_completed(&self, limit: u64) -> Result<Vec<Game>>;

    /// Games dated within `[from, to]`
    async fn find_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Game>>;

    /// Games currently in progress
    async fn find_live(&self) -> Result<Vec<Game>>;

    async fn create(&self, game: &NewGame) -> Result<Game>;

    /// Accepts any status; `Ok(None)` when the game does not exist
    async fn update(&self, id: &str, update: &GameUpdate) -> Result<Option<Game>>;
}

/// Repository for play-by-play events
#[async_trait]
pub trait GameEventRepository: Send + Sync {
    /// Events of a game in sequence order
    async fn find_by_game(&self, game_id: &str) -> Result<Vec<GameEvent>>;

    /// Insert with the next sequence number for the game, assigned atomically
    async fn add_event(&self, event: &NewGameEvent) -> Result<GameEvent>;
}

/// Repository for players
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Player>>;

    /// Player with their most recent roster membership
    async fn find_by_id(&self, id: &str) -> Result<Option<Player>>;

    async fn find_by_team(&self, team_id: &str) -> Result<Vec<Player>>;

    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Player>>;

    async fn search(&self, term: &str) -> Result<Vec<Player>>;

    /// Top `limit` players for every category in a season
    async fn find_stat_leaders(&self, season_id: &str, limit: u64) -> Result<StatLeaders>;

    async fn find_leaders_by_category(
        &self,
        category: StatCategory,
        season_id: &str,
        limit: u64,
    ) -> Result<Vec<Player>>;

    async fn create(&self, player: &NewPlayer) -> Result<Player>;
}

/// Repository for rosters and their season-division links
#[async_trait]
pub trait RosterRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Roster>>;

    async fn find_by_team(&self, team_id: &str) -> Result<Vec<Roster>>;

    async fn find_by_team_and_season(&self, team_id: &str, season_id: &str)
        -> Result<Option<Roster>>;

    /// Fails when the division is not offered in the season. A team holds at
    /// most one roster per season division; an existing one is returned.
    async fn create(&self, team_id: &str, season_id: &str, division_id: &str) -> Result<Roster>;
}

/// Repository for season sessions
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Sessions of a season in sequence order
    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Session>>;

    async fn create(&self, session: &NewSession) -> Result<Session>;
}

/// Repository for roster session enrollments
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find_by_roster(&self, roster_id: &str) -> Result<Vec<RosterSessionEnrollment>>;

    /// At most one enrollment per (roster, session); an existing one is returned unchanged
    async fn enroll(
        &self,
        roster_id: &str,
        session_id: &str,
        auto_enrolled: bool,
    ) -> Result<RosterSessionEnrollment>;
}

/// Repository for team registrations
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<TeamRegistration>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<TeamRegistration>>;

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<TeamRegistration>>;

    async fn find_by_status(&self, status: RegistrationStatus) -> Result<Vec<TeamRegistration>>;

    /// Search by team or contact name
    async fn search(&self, term: &str) -> Result<Vec<TeamRegistration>>;

    async fn create(&self, registration: &NewTeamRegistration) -> Result<TeamRegistration>;

    /// Compare-and-swap on status: writes only while the stored status equals
    /// `expected`, returns `Ok(None)` otherwise
    async fn update_status_if(
        &self,
        id: &str,
        expected: RegistrationStatus,
        new_status: RegistrationStatus,
    ) -> Result<Option<TeamRegistration>>;

    async fn update_payment(
        &self,
        id: &str,
        payment_status: PaymentStatus,
        payment_session_id: Option<&str>,
    ) -> Result<Option<TeamRegistration>>;

    /// Links `team_id` only while no team is linked. Returns the stored
    /// registration, whose `team_id` is the first writer's.
    async fn link_team(&self, id: &str, team_id: &str) -> Result<Option<TeamRegistration>>;
}

/// Repository for roster payments
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<TeamPayment>>;

    /// Installments of a roster ordered by due date
    async fn find_by_roster(&self, roster_id: &str) -> Result<Vec<TeamPayment>>;

    async fn find_by_status(&self, status: TeamPaymentStatus) -> Result<Vec<TeamPayment>>;

    /// A payment whose provider session is already stored is returned
    /// instead of recorded twice
    async fn create(&self, payment: &NewTeamPayment) -> Result<TeamPayment>;

    /// Sets `paid_at` when moving to paid
    async fn update_status(&self, id: &str, status: TeamPaymentStatus)
        -> Result<Option<TeamPayment>>;
}

/// Repository for game officials
#[async_trait]
pub trait OfficialRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Official>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Official>>;

    async fn find_by_game(&self, game_id: &str) -> Result<Vec<Official>>;

    async fn create(&self, official: &NewOfficial) -> Result<Official>;

    /// Idempotent assignment of an official to a game
    async fn assign_to_game(&self, official_id: &str, game_id: &str) -> Result<()>;
}

/// Deterministic "current season" rule shared by every family: among active
/// seasons, the most recent start date wins (undated last), ties by id.
pub fn select_current_season(candidates: Vec<Season>) -> Option<Season> {
    candidates
        .into_iter()
        .filter(|s| s.is_active)
        .min_by(|a, b| {
            b.start_date
                .cmp(&a.start_date)
                .then_with(|| a.id.cmp(&b.id))
        })
}

/// Top `limit` players of a category, highest first, ties by name
pub fn rank_by_category(mut players: Vec<Player>, category: StatCategory, limit: u64) -> Vec<Player> {
    players.sort_by(|a, b| {
        b.stats
            .value(category)
            .total_cmp(&a.stats.value(category))
            .then_with(|| a.name.cmp(&b.name))
    });
    players.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    players
}

/// Leader boards for every category from one season's players
pub fn stat_leaders(players: Vec<Player>, limit: u64) -> StatLeaders {
    StatLeaders {
        points: rank_by_category(players.clone(), StatCategory::Points, limit),
        rebounds: rank_by_category(players.clone(), StatCategory::Rebounds, limit),
        assists: rank_by_category(players.clone(), StatCategory::Assists, limit),
        steals: rank_by_category(players.clone(), StatCategory::Steals, limit),
        blocks: rank_by_category(players, StatCategory::Blocks, limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{DivisionRef, PlayerStats, SeasonRef, SeasonStatus, TeamRef};

    fn player(name: &str, ppg: f64, rpg: f64) -> Player {
        Player {
            id: name.to_lowercase(),
            name: name.to_string(),
            team: TeamRef::default(),
            jersey: None,
            position: None,
            stats: PlayerStats {
                ppg,
                rpg,
                ..Default::default()
            },
            division: DivisionRef::unknown(),
            season: SeasonRef::default(),
            roster_id: None,
        }
    }

    #[test]
    fn test_rank_orders_by_value_then_name() {
        let ranked = rank_by_category(
            vec![player("Cole", 12.0, 0.0), player("Blake", 20.0, 0.0), player("Avery", 20.0, 0.0)],
            StatCategory::Points,
            2,
        );
        let names: Vec<_> = ranked.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Avery", "Blake"]);
    }

    #[test]
    fn test_stat_leaders_rank_each_category_independently() {
        let leaders = stat_leaders(
            vec![player("Avery", 20.0, 3.0), player("Blake", 8.0, 11.0)],
            1,
        );
        assert_eq!(leaders.points[0].name, "Avery");
        assert_eq!(leaders.rebounds[0].name, "Blake");
        assert_eq!(leaders.assists.len(), 1);
    }

    fn season(id: &str, active: bool, start: Option<(i32, u32, u32)>) -> Season {
        Season {
            id: id.to_string(),
            name: id.to_string(),
            year: 2025,
            status: SeasonStatus::Active,
            is_active: active,
            start_date: start.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            end_date: None,
        }
    }

    #[test]
    fn test_current_season_prefers_latest_start() {
        let current = select_current_season(vec![
            season("spring", true, Some((2025, 3, 1))),
            season("fall", true, Some((2025, 9, 1))),
            season("winter", false, Some((2025, 12, 1))),
        ]);
        assert_eq!(current.unwrap().id, "fall");
    }

    #[test]
    fn test_current_season_undated_last_and_ties_by_id() {
        let current = select_current_season(vec![
            season("b", true, None),
            season("a", true, None),
        ]);
        assert_eq!(current.unwrap().id, "a");

        let current = select_current_season(vec![
            season("undated", true, None),
            season("dated", true, Some((2024, 1, 1))),
        ]);
        assert_eq!(current.unwrap().id, "dated");
    }

    #[test]
    fn test_no_active_season() {
        assert!(select_current_season(vec![season("old", false, None)]).is_none());
    }
}

//! Native client trait for in-process callers
//!
//! Route handlers and the payment webhook call the league through this trait.
//! NO HTTP - direct function calls.

use super::error::LeagueError;
use super::model::{
    CheckoutCompletion, Division, Game, GameEvent, GameUpdate, NewGameEvent, NewTeamPayment,
    PaymentSummary, Player, RegistrationRequest, RegistrationStatus, Season, Session, Standing,
    StatCategory, StatLeaders, Team, TeamPayment, TeamRegistration,
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// League API for in-process communication
#[async_trait]
pub trait LeagueApi: Send + Sync {
    // ===== Browsing =====

    async fn list_seasons(&self) -> Result<Vec<Season>, LeagueError>;

    async fn current_season(&self) -> Result<Option<Season>, LeagueError>;

    async fn list_divisions(&self) -> Result<Vec<Division>, LeagueError>;

    async fn list_sessions(&self, season_id: &str) -> Result<Vec<Session>, LeagueError>;

    async fn list_teams(&self) -> Result<Vec<Team>, LeagueError>;

    async fn get_team(&self, id: &str) -> Result<Team, LeagueError>;

    async fn get_game(&self, id: &str) -> Result<Game, LeagueError>;

    async fn upcoming_games(&self, from: NaiveDate, limit: u64) -> Result<Vec<Game>, LeagueError>;

    async fn recent_results(&self, limit: u64) -> Result<Vec<Game>, LeagueError>;

    async fn live_games(&self) -> Result<Vec<Game>, LeagueError>;

    async fn game_events(&self, game_id: &str) -> Result<Vec<GameEvent>, LeagueError>;

    async fn players_for_team(&self, team_id: &str) -> Result<Vec<Player>, LeagueError>;

    async fn stat_leaders(&self, season_id: &str, limit: u64) -> Result<StatLeaders, LeagueError>;

    async fn category_leaders(
        &self,
        category: StatCategory,
        season_id: &str,
        limit: u64,
    ) -> Result<Vec<Player>, LeagueError>;

    async fn standings(
        &self,
        season_id: &str,
        division_id: Option<&str>,
    ) -> Result<Vec<Standing>, LeagueError>;

    // ===== Scorekeeping =====

    async fn update_game(&self, id: &str, update: GameUpdate) -> Result<Game, LeagueError>;

    async fn record_game_event(&self, event: NewGameEvent) -> Result<GameEvent, LeagueError>;

    // ===== Registrations =====

    async fn create_registration(
        &self,
        request: RegistrationRequest,
    ) -> Result<TeamRegistration, LeagueError>;

    async fn get_registration(&self, id: &str) -> Result<TeamRegistration, LeagueError>;

    async fn registrations_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<TeamRegistration>, LeagueError>;

    async fn update_registration_status(
        &self,
        id: &str,
        status: RegistrationStatus,
    ) -> Result<TeamRegistration, LeagueError>;

    /// Called by the payment webhook once a checkout succeeded
    async fn complete_checkout(
        &self,
        completion: CheckoutCompletion,
    ) -> Result<TeamRegistration, LeagueError>;

    // ===== Payments =====

    async fn payment_summary(&self, roster_id: &str) -> Result<PaymentSummary, LeagueError>;

    async fn record_payment(&self, payment: NewTeamPayment) -> Result<TeamPayment, LeagueError>;

    async fn mark_payment_paid(&self, id: &str) -> Result<TeamPayment, LeagueError>;
}

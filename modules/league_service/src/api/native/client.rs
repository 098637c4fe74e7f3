//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{
    CheckoutCompletion, Division, Game, GameEvent, GameUpdate, LeagueApi, LeagueError,
    NewGameEvent, NewTeamPayment, PaymentSummary, Player, RegistrationRequest,
    RegistrationStatus, Season, Session, Standing, StatCategory, StatLeaders, Team, TeamPayment,
    TeamRegistration,
};
use crate::domain::Service;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

/// Native client that directly calls the domain service
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl LeagueApi for NativeClient {
    async fn list_seasons(&self) -> Result<Vec<Season>, LeagueError> {
        self.service.list_seasons().await
    }

    async fn current_season(&self) -> Result<Option<Season>, LeagueError> {
        self.service.current_season().await
    }

    async fn list_divisions(&self) -> Result<Vec<Division>, LeagueError> {
        self.service.list_divisions().await
    }

    async fn list_sessions(&self, season_id: &str) -> Result<Vec<Session>, LeagueError> {
        self.service.sessions_for_season(season_id).await
    }

    async fn list_teams(&self) -> Result<Vec<Team>, LeagueError> {
        self.service.list_teams().await
    }

    async fn get_team(&self, id: &str) -> Result<Team, LeagueError> {
        self.service.get_team(id).await
    }

    async fn get_game(&self, id: &str) -> Result<Game, LeagueError> {
        self.service.get_game(id).await
    }

    async fn upcoming_games(&self, from: NaiveDate, limit: u64) -> Result<Vec<Game>, LeagueError> {
        self.service.upcoming_games(from, limit).await
    }

    async fn recent_results(&self, limit: u64) -> Result<Vec<Game>, LeagueError> {
        self.service.recent_results(limit).await
    }

    async fn live_games(&self) -> Result<Vec<Game>, LeagueError> {
        self.service.live_games().await
    }

    async fn game_events(&self, game_id: &str) -> Result<Vec<GameEvent>, LeagueError> {
        self.service.game_events(game_id).await
    }

    async fn players_for_team(&self, team_id: &str) -> Result<Vec<Player>, LeagueError> {
        self.service.players_for_team(team_id).await
    }

    async fn stat_leaders(&self, season_id: &str, limit: u64) -> Result<StatLeaders, LeagueError> {
        self.service.stat_leaders(season_id, limit).await
    }

    async fn category_leaders(
        &self,
        category: StatCategory,
        season_id: &str,
        limit: u64,
    ) -> Result<Vec<Player>, LeagueError> {
        self.service
            .category_leaders(category, season_id, limit)
            .await
    }

    async fn standings(
        &self,
        season_id: &str,
        division_id: Option<&str>,
    ) -> Result<Vec<Standing>, LeagueError> {
        self.service.standings(season_id, division_id).await
    }

    async fn update_game(&self, id: &str, update: GameUpdate) -> Result<Game, LeagueError> {
        self.service.update_game(id, update).await
    }

    async fn record_game_event(&self, event: NewGameEvent) -> Result<GameEvent, LeagueError> {
        self.service.record_game_event(event).await
    }

    async fn create_registration(
        &self,
        request: RegistrationRequest,
    ) -> Result<TeamRegistration, LeagueError> {
        self.service.create_registration(request).await
    }

    async fn get_registration(&self, id: &str) -> Result<TeamRegistration, LeagueError> {
        self.service.get_registration(id).await
    }

    async fn registrations_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<TeamRegistration>, LeagueError> {
        self.service.registrations_for_user(user_id).await
    }

    async fn update_registration_status(
        &self,
        id: &str,
        status: RegistrationStatus,
    ) -> Result<TeamRegistration, LeagueError> {
        self.service.update_registration_status(id, status).await
    }

    async fn complete_checkout(
        &self,
        completion: CheckoutCompletion,
    ) -> Result<TeamRegistration, LeagueError> {
        self.service.complete_checkout(completion).await
    }

    async fn payment_summary(&self, roster_id: &str) -> Result<PaymentSummary, LeagueError> {
        self.service.payment_summary(roster_id).await
    }

    async fn record_payment(&self, payment: NewTeamPayment) -> Result<TeamPayment, LeagueError> {
        self.service.record_payment(payment).await
    }

    async fn mark_payment_paid(&self, id: &str) -> Result<TeamPayment, LeagueError> {
        self.service.mark_payment_paid(id).await
    }
}

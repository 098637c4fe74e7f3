//! Repository factory
//!
//! `Repositories` is the dependency container handed to the service. It is
//! built once at startup: content-capable entities follow the configured
//! [`DataBackend`], everything else is served by the relational store.

use super::events::ChangePublisher;
use super::repository::{
    DivisionRepository, EnrollmentRepository, GameEventRepository, GameRepository,
    OfficialRepository, PaymentRepository, PlayerRepository, RegistrationRepository,
    RosterRepository, SeasonRepository, SessionRepository, TeamRepository,
};
use crate::infra::content::{
    ContentClient, ContentDivisionRepository, ContentGameRepository, ContentPlayerRepository,
    ContentSeasonRepository, ContentTeamRepository,
};
use crate::infra::storage::repositories::{
    SeaOrmDivisionRepository, SeaOrmEnrollmentRepository, SeaOrmGameEventRepository,
    SeaOrmGameRepository, SeaOrmOfficialRepository, SeaOrmPaymentRepository,
    SeaOrmPlayerRepository, SeaOrmRegistrationRepository, SeaOrmRosterRepository,
    SeaOrmSeasonRepository, SeaOrmSessionRepository, SeaOrmTeamRepository,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub use crate::config::DataBackend;

/// Entities served by the container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Season,
    Division,
    Team,
    Game,
    Player,
    GameEvent,
    Roster,
    Session,
    Enrollment,
    Registration,
    Payment,
    Official,
}

impl Entity {
    pub const ALL: &'static [Entity] = &[
        Entity::Season,
        Entity::Division,
        Entity::Team,
        Entity::Game,
        Entity::Player,
        Entity::GameEvent,
        Entity::Roster,
        Entity::Session,
        Entity::Enrollment,
        Entity::Registration,
        Entity::Payment,
        Entity::Official,
    ];

    /// Whether the content store implements this entity
    pub fn is_content_capable(&self) -> bool {
        matches!(
            self,
            Entity::Season | Entity::Division | Entity::Team | Entity::Game | Entity::Player
        )
    }

    /// Store family serving this entity under the selected backend
    pub fn family(&self, selected: DataBackend) -> DataBackend {
        if self.is_content_capable() {
            selected
        } else {
            DataBackend::Relational
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::Season => "season",
            Entity::Division => "division",
            Entity::Team => "team",
            Entity::Game => "game",
            Entity::Player => "player",
            Entity::GameEvent => "game event",
            Entity::Roster => "roster",
            Entity::Session => "session",
            Entity::Enrollment => "enrollment",
            Entity::Registration => "registration",
            Entity::Payment => "payment",
            Entity::Official => "official",
        };
        f.write_str(name)
    }
}

/// Factory errors, raised at build time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactoryError {
    #[error("no {backend} store is configured but the {entity} repository requires one")]
    MissingStore {
        entity: Entity,
        backend: DataBackend,
    },
}

/// Connected backing stores
#[derive(Clone)]
pub struct Stores {
    pub relational: Option<Arc<DatabaseConnection>>,
    pub content: Option<Arc<dyn ContentClient>>,
    /// Shared change feed that game writers publish into
    pub publisher: Arc<dyn ChangePublisher>,
}

impl Stores {
    fn relational(&self, entity: Entity) -> Result<Arc<DatabaseConnection>, FactoryError> {
        self.relational.clone().ok_or(FactoryError::MissingStore {
            entity,
            backend: DataBackend::Relational,
        })
    }

    fn content(&self, entity: Entity) -> Result<Arc<dyn ContentClient>, FactoryError> {
        self.content.clone().ok_or(FactoryError::MissingStore {
            entity,
            backend: DataBackend::Content,
        })
    }
}

/// One repository per entity
#[derive(Clone)]
pub struct Repositories {
    pub backend: DataBackend,
    pub seasons: Arc<dyn SeasonRepository>,
    pub divisions: Arc<dyn DivisionRepository>,
    pub teams: Arc<dyn TeamRepository>,
    pub games: Arc<dyn GameRepository>,
    pub players: Arc<dyn PlayerRepository>,
    pub game_events: Arc<dyn GameEventRepository>,
    pub rosters: Arc<dyn RosterRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub registrations: Arc<dyn RegistrationRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub officials: Arc<dyn OfficialRepository>,
}

impl Repositories {
    /// Build every repository, failing on the first entity whose store is missing
    pub fn build(backend: DataBackend, stores: &Stores) -> Result<Self, FactoryError> {
        let seasons: Arc<dyn SeasonRepository> = match Entity::Season.family(backend) {
            DataBackend::Content => Arc::new(ContentSeasonRepository::new(
                stores.content(Entity::Season)?,
            )),
            DataBackend::Relational => Arc::new(SeaOrmSeasonRepository::new(
                stores.relational(Entity::Season)?,
            )),
        };

        let divisions: Arc<dyn DivisionRepository> = match Entity::Division.family(backend) {
            DataBackend::Content => Arc::new(ContentDivisionRepository::new(
                stores.content(Entity::Division)?,
            )),
            DataBackend::Relational => Arc::new(SeaOrmDivisionRepository::new(
                stores.relational(Entity::Division)?,
            )),
        };

        let teams: Arc<dyn TeamRepository> = match Entity::Team.family(backend) {
            DataBackend::Content => {
                Arc::new(ContentTeamRepository::new(stores.content(Entity::Team)?))
            }
            DataBackend::Relational => {
                Arc::new(SeaOrmTeamRepository::new(stores.relational(Entity::Team)?))
            }
        };

        let games: Arc<dyn GameRepository> = match Entity::Game.family(backend) {
            DataBackend::Content => Arc::new(ContentGameRepository::new(
                stores.content(Entity::Game)?,
                stores.publisher.clone(),
            )),
            DataBackend::Relational => Arc::new(SeaOrmGameRepository::new(
                stores.relational(Entity::Game)?,
                stores.publisher.clone(),
            )),
        };

        let players: Arc<dyn PlayerRepository> = match Entity::Player.family(backend) {
            DataBackend::Content => Arc::new(ContentPlayerRepository::new(
                stores.content(Entity::Player)?,
            )),
            DataBackend::Relational => Arc::new(SeaOrmPlayerRepository::new(
                stores.relational(Entity::Player)?,
            )),
        };

        let repositories = Self {
            backend,
            seasons,
            divisions,
            teams,
            games,
            players,
            game_events: Arc::new(SeaOrmGameEventRepository::new(
                stores.relational(Entity::GameEvent)?,
                stores.publisher.clone(),
            )),
            rosters: Arc::new(SeaOrmRosterRepository::new(
                stores.relational(Entity::Roster)?,
            )),
            sessions: Arc::new(SeaOrmSessionRepository::new(
                stores.relational(Entity::Session)?,
            )),
            enrollments: Arc::new(SeaOrmEnrollmentRepository::new(
                stores.relational(Entity::Enrollment)?,
            )),
            registrations: Arc::new(SeaOrmRegistrationRepository::new(
                stores.relational(Entity::Registration)?,
            )),
            payments: Arc::new(SeaOrmPaymentRepository::new(
                stores.relational(Entity::Payment)?,
            )),
            officials: Arc::new(SeaOrmOfficialRepository::new(
                stores.relational(Entity::Official)?,
            )),
        };

        tracing::info!(backend = %backend, "repositories built");
        Ok(repositories)
    }

    /// Store family serving `entity`
    pub fn backend_for(&self, entity: Entity) -> DataBackend {
        entity.family(self.backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::NoOpChangePublisher;

    #[test]
    fn test_relational_only_entities_ignore_selection() {
        assert_eq!(Entity::Game.family(DataBackend::Content), DataBackend::Content);
        assert_eq!(
            Entity::Registration.family(DataBackend::Content),
            DataBackend::Relational
        );
        assert_eq!(
            Entity::ALL.iter().filter(|e| e.is_content_capable()).count(),
            5
        );
    }

    #[test]
    fn test_build_fails_fast_without_selected_store() {
        let stores = Stores {
            relational: None,
            content: None,
            publisher: Arc::new(NoOpChangePublisher),
        };

        let err = Repositories::build(DataBackend::Content, &stores)
            .err()
            .unwrap();
        assert_eq!(
            err,
            FactoryError::MissingStore {
                entity: Entity::Season,
                backend: DataBackend::Content,
            }
        );
    }
}

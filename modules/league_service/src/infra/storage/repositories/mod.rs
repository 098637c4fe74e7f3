//! SeaORM repository implementations

mod division;
mod enrollment;
mod game;
mod game_event;
mod official;
mod payment;
mod player;
mod registration;
mod roster;
mod season;
mod session;
mod team;

pub use division::SeaOrmDivisionRepository;
pub use enrollment::SeaOrmEnrollmentRepository;
pub use game::SeaOrmGameRepository;
pub use game_event::SeaOrmGameEventRepository;
pub use official::SeaOrmOfficialRepository;
pub use payment::SeaOrmPaymentRepository;
pub use player::SeaOrmPlayerRepository;
pub use registration::SeaOrmRegistrationRepository;
pub use roster::SeaOrmRosterRepository;
pub use season::SeaOrmSeasonRepository;
pub use session::SeaOrmSessionRepository;
pub use team::SeaOrmTeamRepository;

use super::entity::{roster as roster_row, season_division};
use anyhow::Result;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, SqlErr};

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

const LIKE_ESCAPE: char = '\\';

/// Escape `LIKE` wildcards so the term matches literally
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring match on a text column
pub(crate) fn name_contains<C: ColumnTrait>(column: C, term: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&term.trim().to_lowercase()));
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Lock contention another writer caused; the write may succeed when repeated
pub(crate) fn is_lock_contention(err: &DbErr) -> bool {
    let message = err.to_string();
    message.contains("database is locked") || message.contains("database table is locked")
}

/// Ids of the rosters registered in a season
pub(crate) async fn season_roster_ids(db: &DatabaseConnection, season_id: &str) -> Result<Vec<String>> {
    let link_ids: Vec<String> = season_division::Entity::find()
        .filter(season_division::Column::SeasonId.eq(season_id))
        .all(db)
        .await?
        .into_iter()
        .map(|l| l.id)
        .collect();
    if link_ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(roster_row::Entity::find()
        .filter(roster_row::Column::SeasonDivisionId.is_in(link_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect())
}

/// Ids of every roster a team has had
pub(crate) async fn team_roster_ids(db: &DatabaseConnection, team_id: &str) -> Result<Vec<String>> {
    Ok(roster_row::Entity::find()
        .filter(roster_row::Column::TeamId.eq(team_id))
        .all(db)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect())
}

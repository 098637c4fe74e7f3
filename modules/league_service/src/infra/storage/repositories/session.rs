use crate::contract::{NewSession, Session};
use crate::domain::repository::SessionRepository;
use crate::infra::storage::entity::session;
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;

pub struct SeaOrmSessionRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmSessionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionRepository for SeaOrmSessionRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Session>> {
        session::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(Session::try_from)
            .transpose()
    }

    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Session>> {
        session::Entity::find()
            .filter(session::Column::SeasonId.eq(season_id))
            .order_by_asc(session::Column::Sequence)
            .order_by_asc(session::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(Session::try_from)
            .collect()
    }

    async fn create(&self, new_session: &NewSession) -> Result<Session> {
        session::ActiveModel {
            id: Set(super::new_id()),
            season_id: Set(new_session.season_id.clone()),
            name: Set(new_session.name.clone()),
            sequence: Set(new_session.sequence),
            start_date: Set(new_session.start_date),
            end_date: Set(new_session.end_date),
        }
        .insert(&*self.db)
        .await?
        .try_into()
    }
}

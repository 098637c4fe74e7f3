use crate::contract::{NewSeason, Season};
use crate::domain::repository::{select_current_season, SeasonRepository};
use crate::infra::storage::entity::season;
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;

pub struct SeaOrmSeasonRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmSeasonRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SeasonRepository for SeaOrmSeasonRepository {
    async fn find_all(&self) -> Result<Vec<Season>> {
        season::Entity::find()
            .order_by_desc(season::Column::Year)
            .order_by_asc(season::Column::Name)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(Season::try_from)
            .collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Season>> {
        season::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(Season::try_from)
            .transpose()
    }

    async fn find_current(&self) -> Result<Option<Season>> {
        let active = season::Entity::find()
            .filter(season::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(Season::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(select_current_season(active))
    }

    async fn create(&self, new_season: &NewSeason) -> Result<Season> {
        let active = season::ActiveModel {
            id: Set(super::new_id()),
            name: Set(new_season.name.clone()),
            year: Set(new_season.year),
            status: Set(new_season.status.as_str().to_string()),
            is_active: Set(new_season.is_active),
            start_date: Set(new_season.start_date),
            end_date: Set(new_season.end_date),
            created_at: Set(chrono::Utc::now()),
        };

        active.insert(&*self.db).await?.try_into()
    }
}

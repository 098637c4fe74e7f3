use crate::contract::{NewOfficial, Official};
use crate::domain::repository::OfficialRepository;
use crate::infra::storage::entity::{game_official, official};
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;

pub struct SeaOrmOfficialRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmOfficialRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OfficialRepository for SeaOrmOfficialRepository {
    async fn find_all(&self) -> Result<Vec<Official>> {
        official::Entity::find()
            .order_by_asc(official::Column::Name)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(Official::try_from)
            .collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Official>> {
        official::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(Official::try_from)
            .transpose()
    }

    async fn find_by_game(&self, game_id: &str) -> Result<Vec<Official>> {
        let official_ids: Vec<String> = game_official::Entity::find()
            .filter(game_official::Column::GameId.eq(game_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|a| a.official_id)
            .collect();
        if official_ids.is_empty() {
            return Ok(Vec::new());
        }

        official::Entity::find()
            .filter(official::Column::Id.is_in(official_ids))
            .order_by_asc(official::Column::Name)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(Official::try_from)
            .collect()
    }

    async fn create(&self, new_official: &NewOfficial) -> Result<Official> {
        official::ActiveModel {
            id: Set(super::new_id()),
            name: Set(new_official.name.clone()),
            email: Set(new_official.email.clone()),
            phone: Set(new_official.phone.clone()),
            certification_level: Set(new_official.certification_level.clone()),
        }
        .insert(&*self.db)
        .await?
        .try_into()
    }

    async fn assign_to_game(&self, official_id: &str, game_id: &str) -> Result<()> {
        let assignment = game_official::ActiveModel {
            game_id: Set(game_id.to_string()),
            official_id: Set(official_id.to_string()),
        };

        game_official::Entity::insert(assignment)
            .on_conflict(
                OnConflict::columns([
                    game_official::Column::GameId,
                    game_official::Column::OfficialId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .do_nothing()
            .exec_without_returning(&*self.db)
            .await?;
        Ok(())
    }
}

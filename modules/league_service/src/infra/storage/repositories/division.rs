use crate::contract::{Division, NewDivision};
use crate::domain::repository::DivisionRepository;
use crate::infra::storage::entity::{division, season_division};
use crate::infra::storage::loader::division_records;
use crate::infra::storage::mapper::to_division;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;

pub struct SeaOrmDivisionRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmDivisionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn transform(&self, rows: Vec<division::Model>) -> Result<Vec<Division>> {
        division_records(&self.db, rows)
            .await?
            .into_iter()
            .map(to_division)
            .collect()
    }
}

#[async_trait]
impl DivisionRepository for SeaOrmDivisionRepository {
    async fn find_all(&self) -> Result<Vec<Division>> {
        let rows = division::Entity::find()
            .order_by_asc(division::Column::Name)
            .all(&*self.db)
            .await?;
        self.transform(rows).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Division>> {
        let Some(row) = division::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };
        Ok(self.transform(vec![row]).await?.into_iter().next())
    }

    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Division>> {
        let division_ids: Vec<String> = season_division::Entity::find()
            .filter(season_division::Column::SeasonId.eq(season_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|link| link.division_id)
            .collect();
        if division_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = division::Entity::find()
            .filter(division::Column::Id.is_in(division_ids))
            .order_by_asc(division::Column::Name)
            .all(&*self.db)
            .await?;
        self.transform(rows).await
    }

    async fn search(&self, term: &str) -> Result<Vec<Division>> {
        let rows = division::Entity::find()
            .filter(super::name_contains(division::Column::Name, term))
            .order_by_asc(division::Column::Name)
            .all(&*self.db)
            .await?;
        self.transform(rows).await
    }

    async fn create(&self, new_division: &NewDivision) -> Result<Division> {
        let row = division::ActiveModel {
            id: Set(super::new_id()),
            name: Set(new_division.name.clone()),
            age_group: Set(new_division.age_group.as_str().to_string()),
            conference_id: Set(new_division.conference_id.clone()),
        }
        .insert(&*self.db)
        .await?;

        self.find_by_id(&row.id)
            .await?
            .context("division vanished after insert")
    }
}

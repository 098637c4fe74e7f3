use crate::contract::Roster;
use crate::domain::repository::RosterRepository;
use crate::infra::storage::entity::{roster, season_division};
use crate::infra::storage::mapper::to_roster;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::collections::HashMap;
use std::sync::Arc;

pub struct SeaOrmRosterRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmRosterRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn transform(&self, rows: Vec<roster::Model>) -> Result<Vec<Roster>> {
        let link_ids: Vec<String> = rows.iter().map(|r| r.season_division_id.clone()).collect();
        let links: HashMap<String, season_division::Model> = if link_ids.is_empty() {
            HashMap::new()
        } else {
            season_division::Entity::find()
                .filter(season_division::Column::Id.is_in(link_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|l| (l.id.clone(), l))
                .collect()
        };

        rows.into_iter()
            .map(|row| {
                let link = links.get(&row.season_division_id);
                to_roster(row, link)
            })
            .collect()
    }
}

#[async_trait]
impl RosterRepository for SeaOrmRosterRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Roster>> {
        let Some(row) = roster::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };
        Ok(self.transform(vec![row]).await?.into_iter().next())
    }

    async fn find_by_team(&self, team_id: &str) -> Result<Vec<Roster>> {
        let rows = roster::Entity::find()
            .filter(roster::Column::TeamId.eq(team_id))
            .order_by_desc(roster::Column::CreatedAt)
            .order_by_desc(roster::Column::Id)
            .all(&*self.db)
            .await?;
        self.transform(rows).await
    }

    async fn find_by_team_and_season(
        &self,
        team_id: &str,
        season_id: &str,
    ) -> Result<Option<Roster>> {
        let link_ids: Vec<String> = season_division::Entity::find()
            .filter(season_division::Column::SeasonId.eq(season_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|l| l.id)
            .collect();
        if link_ids.is_empty() {
            return Ok(None);
        }

        let row = roster::Entity::find()
            .filter(roster::Column::TeamId.eq(team_id))
            .filter(roster::Column::SeasonDivisionId.is_in(link_ids))
            .order_by_desc(roster::Column::CreatedAt)
            .one(&*self.db)
            .await?;
        match row {
            Some(row) => Ok(self.transform(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn create(&self, team_id: &str, season_id: &str, division_id: &str) -> Result<Roster> {
        let link = season_division::Entity::find()
            .filter(season_division::Column::SeasonId.eq(season_id))
            .filter(season_division::Column::DivisionId.eq(division_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                anyhow!("division {division_id} is not offered in season {season_id}")
            })?;

        let inserted = roster::ActiveModel {
            id: Set(super::new_id()),
            team_id: Set(team_id.to_string()),
            season_division_id: Set(link.id.clone()),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(&*self.db)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(err) if super::is_unique_violation(&err) => roster::Entity::find()
                .filter(roster::Column::TeamId.eq(team_id))
                .filter(roster::Column::SeasonDivisionId.eq(link.id.as_str()))
                .one(&*self.db)
                .await?
                .ok_or_else(|| anyhow!("roster of team {team_id} vanished after conflict"))?,
            Err(err) => return Err(err.into()),
        };

        to_roster(row, Some(&link))
    }
}

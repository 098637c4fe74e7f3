use crate::contract::{NewTeam, Team, TeamStatus, TeamUpdate};
use crate::domain::repository::TeamRepository;
use crate::infra::storage::entity::{roster, team};
use crate::infra::storage::loader::team_records;
use crate::infra::storage::mapper::to_team;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;

pub struct SeaOrmTeamRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmTeamRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn transform(&self, rows: Vec<team::Model>) -> Result<Vec<Team>> {
        team_records(&self.db, rows)
            .await?
            .into_iter()
            .map(to_team)
            .collect()
    }
}

#[async_trait]
impl TeamRepository for SeaOrmTeamRepository {
    async fn find_all(&self) -> Result<Vec<Team>> {
        let rows = team::Entity::find()
            .order_by_asc(team::Column::Name)
            .all(&*self.db)
            .await?;
        self.transform(rows).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Team>> {
        let Some(row) = team::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };
        Ok(self.transform(vec![row]).await?.into_iter().next())
    }

    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Team>> {
        let roster_ids = super::season_roster_ids(&self.db, season_id).await?;
        if roster_ids.is_empty() {
            return Ok(Vec::new());
        }

        let team_ids: Vec<String> = roster::Entity::find()
            .filter(roster::Column::Id.is_in(roster_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|r| r.team_id)
            .collect();

        let rows = team::Entity::find()
            .filter(team::Column::Id.is_in(team_ids))
            .order_by_asc(team::Column::Name)
            .all(&*self.db)
            .await?;
        self.transform(rows).await
    }

    async fn search(&self, term: &str) -> Result<Vec<Team>> {
        let rows = team::Entity::find()
            .filter(super::name_contains(team::Column::Name, term))
            .order_by_asc(team::Column::Name)
            .all(&*self.db)
            .await?;
        self.transform(rows).await
    }

    async fn create(&self, new_team: &NewTeam) -> Result<Team> {
        let now = chrono::Utc::now();
        let colors = new_team.colors.clone().unwrap_or_default();
        let row = team::ActiveModel {
            id: Set(super::new_id()),
            name: Set(new_team.name.clone()),
            short_name: Set(Some(
                new_team
                    .short_name
                    .clone()
                    .unwrap_or_else(|| new_team.name.clone()),
            )),
            logo_url: Set(new_team.logo.clone()),
            location: Set(new_team.location.clone()),
            primary_color: Set(Some(colors.primary).filter(|c| !c.is_empty())),
            secondary_color: Set(Some(colors.secondary).filter(|c| !c.is_empty())),
            status: Set(new_team
                .status
                .unwrap_or(TeamStatus::Active)
                .as_str()
                .to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.find_by_id(&row.id)
            .await?
            .context("team vanished after insert")
    }

    async fn update(&self, id: &str, update: &TeamUpdate) -> Result<Option<Team>> {
        let Some(existing) = team::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };

        let mut active: team::ActiveModel = existing.into();
        if let Some(name) = &update.name {
            active.name = Set(name.clone());
        }
        if let Some(short_name) = &update.short_name {
            active.short_name = Set(Some(short_name.clone()));
        }
        if let Some(logo) = &update.logo {
            active.logo_url = Set(Some(logo.clone()));
        }
        if let Some(location) = &update.location {
            active.location = Set(Some(location.clone()));
        }
        if let Some(colors) = &update.colors {
            active.primary_color = Set(Some(colors.primary.clone()));
            active.secondary_color = Set(Some(colors.secondary.clone()));
        }
        if let Some(status) = update.status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(chrono::Utc::now());
        active.update(&*self.db).await?;

        self.find_by_id(id).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = team::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(result.rows_affected > 0)
    }
}

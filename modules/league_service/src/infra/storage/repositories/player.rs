use crate::contract::{NewPlayer, Player, StatCategory, StatLeaders};
use crate::domain::repository::{rank_by_category, stat_leaders, PlayerRepository};
use crate::infra::storage::entity::{player, roster_player};
use crate::infra::storage::loader::{player_records, roster_records};
use crate::infra::storage::mapper::{to_player, PlayerRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;

pub struct SeaOrmPlayerRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmPlayerRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// One entry per player, carrying their most recent membership if any
    async fn with_latest_membership(&self, players: Vec<player::Model>) -> Result<Vec<Player>> {
        if players.is_empty() {
            return Ok(Vec::new());
        }

        let player_ids: Vec<String> = players.iter().map(|p| p.id.clone()).collect();
        let memberships = roster_player::Entity::find()
            .filter(roster_player::Column::PlayerId.is_in(player_ids))
            .order_by_desc(roster_player::Column::CreatedAt)
            .order_by_desc(roster_player::Column::Id)
            .all(&*self.db)
            .await?;

        let mut latest: HashMap<String, roster_player::Model> = HashMap::new();
        for membership in memberships {
            latest
                .entry(membership.player_id.clone())
                .or_insert(membership);
        }

        let roster_ids: Vec<String> = latest.values().map(|m| m.roster_id.clone()).collect();
        let rosters = roster_records(&self.db, &roster_ids).await?;

        players
            .into_iter()
            .map(|player| {
                let membership = latest.remove(&player.id);
                let roster = membership
                    .as_ref()
                    .and_then(|m| rosters.get(&m.roster_id).cloned());
                to_player(PlayerRecord {
                    player,
                    membership,
                    roster,
                })
            })
            .collect()
    }

    /// Players as seen through memberships of the given rosters, sorted by name
    async fn on_rosters(&self, roster_ids: Vec<String>) -> Result<Vec<Player>> {
        if roster_ids.is_empty() {
            return Ok(Vec::new());
        }

        let memberships = roster_player::Entity::find()
            .filter(roster_player::Column::RosterId.is_in(roster_ids))
            .all(&*self.db)
            .await?;
        let mut players = player_records(&self.db, memberships)
            .await?
            .into_iter()
            .map(to_player)
            .collect::<Result<Vec<_>>>()?;
        players.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(players)
    }
}

#[async_trait]
impl PlayerRepository for SeaOrmPlayerRepository {
    async fn find_all(&self) -> Result<Vec<Player>> {
        let rows = player::Entity::find()
            .order_by_asc(player::Column::Name)
            .order_by_asc(player::Column::Id)
            .all(&*self.db)
            .await?;
        self.with_latest_membership(rows).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Player>> {
        let Some(row) = player::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };
        Ok(self.with_latest_membership(vec![row]).await?.into_iter().next())
    }

    async fn find_by_team(&self, team_id: &str) -> Result<Vec<Player>> {
        let roster_ids = super::team_roster_ids(&self.db, team_id).await?;
        self.on_rosters(roster_ids).await
    }

    async fn find_by_season(&self, season_id: &str) -> Result<Vec<Player>> {
        let roster_ids = super::season_roster_ids(&self.db, season_id).await?;
        self.on_rosters(roster_ids).await
    }

    async fn search(&self, term: &str) -> Result<Vec<Player>> {
        let rows = player::Entity::find()
            .filter(super::name_contains(player::Column::Name, term))
            .order_by_asc(player::Column::Name)
            .order_by_asc(player::Column::Id)
            .all(&*self.db)
            .await?;
        self.with_latest_membership(rows).await
    }

    async fn find_stat_leaders(&self, season_id: &str, limit: u64) -> Result<StatLeaders> {
        let players = self.find_by_season(season_id).await?;
        Ok(stat_leaders(players, limit))
    }

    async fn find_leaders_by_category(
        &self,
        category: StatCategory,
        season_id: &str,
        limit: u64,
    ) -> Result<Vec<Player>> {
        let players = self.find_by_season(season_id).await?;
        Ok(rank_by_category(players, category, limit))
    }

    async fn create(&self, new_player: &NewPlayer) -> Result<Player> {
        let now = chrono::Utc::now();
        let txn = self.db.begin().await?;

        let created = player::ActiveModel {
            id: Set(super::new_id()),
            name: Set(new_player.name.clone()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let stats = new_player.stats;
        let membership = roster_player::ActiveModel {
            id: Set(super::new_id()),
            roster_id: Set(new_player.roster_id.clone()),
            player_id: Set(created.id.clone()),
            jersey_number: Set(new_player.jersey),
            position: Set(new_player.position.map(|p| p.as_str().to_string())),
            games_played: Set(stats.games_played),
            ppg: Set(stats.ppg),
            rpg: Set(stats.rpg),
            apg: Set(stats.apg),
            spg: Set(stats.spg),
            bpg: Set(stats.bpg),
            mpg: Set(stats.mpg),
            fg_pct: Set(stats.fg_pct),
            three_pct: Set(stats.three_pct),
            ft_pct: Set(stats.ft_pct),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        player_records(&self.db, vec![membership])
            .await?
            .into_iter()
            .next()
            .map(to_player)
            .transpose()?
            .context("player vanished after insert")
    }
}

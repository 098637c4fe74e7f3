use sea_orm::entity::prelude::*;

/// Roster membership of a player with precomputed season averages
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "roster_players")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub roster_id: String,
    pub player_id: String,
    pub jersey_number: Option<i32>,
    pub position: Option<String>,
    pub games_played: i32,
    pub ppg: f64,
    pub rpg: f64,
    pub apg: f64,
    pub spg: f64,
    pub bpg: f64,
    pub mpg: f64,
    pub fg_pct: f64,
    pub three_pct: f64,
    pub ft_pct: f64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

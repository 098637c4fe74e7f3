use sea_orm::entity::prelude::*;

/// Games table entity. Teams are reached through the two rosters.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "games")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub game_date: Date,
    pub game_time: Option<Time>,
    pub venue_id: Option<String>,
    pub home_roster_id: String,
    pub away_roster_id: String,
    pub session_id: Option<String>,
    /// scheduled | live | completed | cancelled | postponed
    pub status: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;

/// Game events table entity; (game_id, sequence_number) is unique
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "game_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub game_id: String,
    pub team_id: String,
    pub player_id: Option<String>,
    pub event_type: String,
    pub quarter: i32,
    pub game_time: String,
    pub points: i32,
    pub sequence_number: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

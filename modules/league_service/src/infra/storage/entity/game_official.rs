use sea_orm::entity::prelude::*;

/// Official assignment to a game
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "game_officials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub game_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub official_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

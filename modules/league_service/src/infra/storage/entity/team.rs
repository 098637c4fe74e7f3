use sea_orm::entity::prelude::*;

/// Teams table entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub short_name: Option<String>,
    pub logo_url: Option<String>,
    pub location: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    /// active | inactive | pending | suspended
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

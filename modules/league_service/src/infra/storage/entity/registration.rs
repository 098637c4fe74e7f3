use sea_orm::entity::prelude::*;

/// Team registrations table entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "team_registrations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub team_name: String,
    pub city: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub division_preference: String,
    pub selected_package: String,
    /// JSON array of session ids
    pub selected_session_ids: Json,
    pub status: String,
    pub payment_status: String,
    pub team_id: Option<String>,
    pub payment_session_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;

/// Roster payments table entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "team_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub roster_id: String,
    pub amount_cents: i64,
    pub currency: String,
    /// pending | paid | overdue | cancelled
    pub status: String,
    pub due_date: Option<Date>,
    pub paid_at: Option<DateTimeUtc>,
    pub provider_session_id: Option<String>,
    pub provider_payment_id: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

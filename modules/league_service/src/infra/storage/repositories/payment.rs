use crate::contract::{NewTeamPayment, TeamPayment, TeamPaymentStatus};
use crate::domain::repository::PaymentRepository;
use crate::infra::storage::entity::team_payment;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;

pub struct SeaOrmPaymentRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmPaymentRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_by_provider_session(&self, session_id: &str) -> Result<Option<TeamPayment>> {
        team_payment::Entity::find()
            .filter(team_payment::Column::ProviderSessionId.eq(session_id))
            .one(&*self.db)
            .await?
            .map(TeamPayment::try_from)
            .transpose()
    }
}

#[async_trait]
impl PaymentRepository for SeaOrmPaymentRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<TeamPayment>> {
        team_payment::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(TeamPayment::try_from)
            .transpose()
    }

    async fn find_by_roster(&self, roster_id: &str) -> Result<Vec<TeamPayment>> {
        team_payment::Entity::find()
            .filter(team_payment::Column::RosterId.eq(roster_id))
            .order_by_asc(team_payment::Column::DueDate)
            .order_by_asc(team_payment::Column::CreatedAt)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(TeamPayment::try_from)
            .collect()
    }

    async fn find_by_status(&self, status: TeamPaymentStatus) -> Result<Vec<TeamPayment>> {
        team_payment::Entity::find()
            .filter(team_payment::Column::Status.eq(status.as_str()))
            .order_by_asc(team_payment::Column::DueDate)
            .order_by_asc(team_payment::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(TeamPayment::try_from)
            .collect()
    }

    async fn create(&self, payment: &NewTeamPayment) -> Result<TeamPayment> {
        let inserted = team_payment::ActiveModel {
            id: Set(super::new_id()),
            roster_id: Set(payment.roster_id.clone()),
            amount_cents: Set(payment.amount_cents),
            currency: Set(payment.currency.clone()),
            status: Set(payment.status.as_str().to_string()),
            due_date: Set(payment.due_date),
            paid_at: Set(payment.paid_at),
            provider_session_id: Set(payment.provider_session_id.clone()),
            provider_payment_id: Set(payment.provider_payment_id.clone()),
            description: Set(payment.description.clone()),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(&*self.db)
        .await;

        match (inserted, payment.provider_session_id.as_deref()) {
            (Ok(row), _) => row.try_into(),
            (Err(err), Some(session_id)) if super::is_unique_violation(&err) => {
                tracing::debug!(
                    provider_session_id = %session_id,
                    "payment already recorded for provider session"
                );
                self.find_by_provider_session(session_id)
                    .await?
                    .context("recorded payment vanished")
            }
            (Err(err), _) => Err(err.into()),
        }
    }

    async fn update_status(
        &self,
        id: &str,
        status: TeamPaymentStatus,
    ) -> Result<Option<TeamPayment>> {
        let Some(existing) = team_payment::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };

        let already_paid = existing.paid_at.is_some();
        let mut active: team_payment::ActiveModel = existing.into();
        active.status = Set(status.as_str().to_string());
        if status == TeamPaymentStatus::Paid && !already_paid {
            active.paid_at = Set(Some(chrono::Utc::now()));
        }
        active.update(&*self.db).await?.try_into().map(Some)
    }
}

use crate::contract::{NewTeamRegistration, PaymentStatus, RegistrationStatus, TeamRegistration};
use crate::domain::repository::RegistrationRepository;
use crate::infra::storage::entity::registration;
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use std::sync::Arc;

pub struct SeaOrmRegistrationRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmRegistrationRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn list(&self, filter: Condition) -> Result<Vec<TeamRegistration>> {
        registration::Entity::find()
            .filter(filter)
            .order_by_desc(registration::Column::CreatedAt)
            .order_by_asc(registration::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(TeamRegistration::try_from)
            .collect()
    }
}

#[async_trait]
impl RegistrationRepository for SeaOrmRegistrationRepository {
    async fn find_all(&self) -> Result<Vec<TeamRegistration>> {
        self.list(Condition::all()).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<TeamRegistration>> {
        registration::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(TeamRegistration::try_from)
            .transpose()
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<TeamRegistration>> {
        self.list(Condition::all().add(registration::Column::UserId.eq(user_id)))
            .await
    }

    async fn find_by_status(&self, status: RegistrationStatus) -> Result<Vec<TeamRegistration>> {
        self.list(Condition::all().add(registration::Column::Status.eq(status.as_str())))
            .await
    }

    async fn search(&self, term: &str) -> Result<Vec<TeamRegistration>> {
        self.list(
            Condition::any()
                .add(super::name_contains(registration::Column::TeamName, term))
                .add(super::name_contains(registration::Column::ContactName, term)),
        )
        .await
    }

    async fn create(&self, new_registration: &NewTeamRegistration) -> Result<TeamRegistration> {
        let now = chrono::Utc::now();
        registration::ActiveModel {
            id: Set(super::new_id()),
            user_id: Set(new_registration.user_id.clone()),
            team_name: Set(new_registration.team_name.clone()),
            city: Set(new_registration.city.clone()),
            contact_name: Set(new_registration.contact_name.clone()),
            contact_email: Set(new_registration.contact_email.clone()),
            contact_phone: Set(new_registration.contact_phone.clone()),
            division_preference: Set(new_registration.division_preference.clone()),
            selected_package: Set(new_registration.selected_package.as_str().to_string()),
            selected_session_ids: Set(serde_json::json!(new_registration.selected_session_ids)),
            status: Set(new_registration.status.as_str().to_string()),
            payment_status: Set(new_registration.payment_status.as_str().to_string()),
            team_id: Set(None),
            payment_session_id: Set(None),
            notes: Set(new_registration.notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?
        .try_into()
    }

    async fn update_status_if(
        &self,
        id: &str,
        expected: RegistrationStatus,
        new_status: RegistrationStatus,
    ) -> Result<Option<TeamRegistration>> {
        let result = registration::Entity::update_many()
            .col_expr(registration::Column::Status, Expr::value(new_status.as_str()))
            .col_expr(registration::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(registration::Column::Id.eq(id))
            .filter(registration::Column::Status.eq(expected.as_str()))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn update_payment(
        &self,
        id: &str,
        payment_status: PaymentStatus,
        payment_session_id: Option<&str>,
    ) -> Result<Option<TeamRegistration>> {
        let Some(existing) = registration::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };

        let mut active: registration::ActiveModel = existing.into();
        active.payment_status = Set(payment_status.as_str().to_string());
        if let Some(session_id) = payment_session_id {
            active.payment_session_id = Set(Some(session_id.to_string()));
        }
        active.updated_at = Set(chrono::Utc::now());
        active.update(&*self.db).await?.try_into().map(Some)
    }

    async fn link_team(&self, id: &str, team_id: &str) -> Result<Option<TeamRegistration>> {
        let result = registration::Entity::update_many()
            .col_expr(registration::Column::TeamId, Expr::value(team_id))
            .col_expr(registration::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(registration::Column::Id.eq(id))
            .filter(registration::Column::TeamId.is_null())
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            tracing::debug!(registration_id = %id, team_id, "team already linked");
        }
        self.find_by_id(id).await
    }
}

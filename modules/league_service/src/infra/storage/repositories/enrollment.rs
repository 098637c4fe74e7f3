use crate::contract::RosterSessionEnrollment;
use crate::domain::repository::EnrollmentRepository;
use crate::infra::storage::entity::enrollment;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;

pub struct SeaOrmEnrollmentRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmEnrollmentRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_pair(
        &self,
        roster_id: &str,
        session_id: &str,
    ) -> Result<Option<RosterSessionEnrollment>> {
        enrollment::Entity::find()
            .filter(enrollment::Column::RosterId.eq(roster_id))
            .filter(enrollment::Column::SessionId.eq(session_id))
            .one(&*self.db)
            .await?
            .map(RosterSessionEnrollment::try_from)
            .transpose()
    }
}

#[async_trait]
impl EnrollmentRepository for SeaOrmEnrollmentRepository {
    async fn find_by_roster(&self, roster_id: &str) -> Result<Vec<RosterSessionEnrollment>> {
        enrollment::Entity::find()
            .filter(enrollment::Column::RosterId.eq(roster_id))
            .order_by_asc(enrollment::Column::EnrolledAt)
            .order_by_asc(enrollment::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(RosterSessionEnrollment::try_from)
            .collect()
    }

    async fn enroll(
        &self,
        roster_id: &str,
        session_id: &str,
        auto_enrolled: bool,
    ) -> Result<RosterSessionEnrollment> {
        if let Some(existing) = self.find_pair(roster_id, session_id).await? {
            return Ok(existing);
        }

        let inserted = enrollment::ActiveModel {
            id: Set(super::new_id()),
            roster_id: Set(roster_id.to_string()),
            session_id: Set(session_id.to_string()),
            auto_enrolled: Set(auto_enrolled),
            enrolled_at: Set(chrono::Utc::now()),
        }
        .insert(&*self.db)
        .await;

        match inserted {
            Ok(row) => row.try_into(),
            // A concurrent writer won the unique (roster, session) slot
            Err(err) if super::is_unique_violation(&err) => self
                .find_pair(roster_id, session_id)
                .await?
                .context("enrollment missing after unique violation"),
            Err(err) => Err(err.into()),
        }
    }
}

use crate::contract::{GameEvent, NewGameEvent};
use crate::domain::events::{ChangeNotification, ChangePublisher};
use crate::domain::repository::GameEventRepository;
use crate::infra::storage::entity::game_event;
use anyhow::{bail, Result};
use async_trait::async_trait;
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use std::sync::Arc;
use std::time::Duration;

/// Attempts at claiming a sequence number before giving up
const MAX_SEQUENCE_ATTEMPTS: u32 = 64;

/// Upper bound on the randomized pause between two attempts
const MAX_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Random pause growing with the attempt, so colliding writers spread out
fn retry_delay(attempt: u32) -> Duration {
    let ceiling_ms = (2u64 << attempt.min(5)).min(MAX_RETRY_DELAY.as_millis() as u64);
    Duration::from_millis(rand::rng().random_range(1..=ceiling_ms))
}

pub struct SeaOrmGameEventRepository {
    db: Arc<DatabaseConnection>,
    publisher: Arc<dyn ChangePublisher>,
}

impl SeaOrmGameEventRepository {
    pub fn new(db: Arc<DatabaseConnection>, publisher: Arc<dyn ChangePublisher>) -> Self {
        Self { db, publisher }
    }

    async fn next_sequence(&self, game_id: &str) -> Result<i64> {
        let current: Option<Option<i64>> = game_event::Entity::find()
            .select_only()
            .column_as(Expr::col(game_event::Column::SequenceNumber).max(), "max_sequence")
            .filter(game_event::Column::GameId.eq(game_id))
            .into_tuple()
            .one(&*self.db)
            .await?;
        Ok(current.flatten().unwrap_or(0) + 1)
    }
}

#[async_trait]
impl GameEventRepository for SeaOrmGameEventRepository {
    async fn find_by_game(&self, game_id: &str) -> Result<Vec<GameEvent>> {
        game_event::Entity::find()
            .filter(game_event::Column::GameId.eq(game_id))
            .order_by_asc(game_event::Column::SequenceNumber)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(GameEvent::try_from)
            .collect()
    }

    async fn add_event(&self, event: &NewGameEvent) -> Result<GameEvent> {
        // The unique (game_id, sequence_number) index arbitrates concurrent
        // writers; the loser re-reads the maximum and tries the next slot.
        for attempt in 1..=MAX_SEQUENCE_ATTEMPTS {
            let sequence_number = match self.next_sequence(&event.game_id).await {
                Ok(next) => next,
                Err(err) if is_contention(&err) => {
                    tokio::time::sleep(retry_delay(attempt)).await;
                    continue;
                }
                Err(err) => return Err(err),
            };
            let inserted = game_event::ActiveModel {
                id: Set(super::new_id()),
                game_id: Set(event.game_id.clone()),
                team_id: Set(event.team_id.clone()),
                player_id: Set(event.player_id.clone()),
                event_type: Set(event.event_type.clone()),
                quarter: Set(event.quarter),
                game_time: Set(event.game_time.clone()),
                points: Set(event.points),
                sequence_number: Set(sequence_number),
                created_at: Set(chrono::Utc::now()),
            }
            .insert(&*self.db)
            .await;

            match inserted {
                Ok(row) => {
                    let created = GameEvent::try_from(row)?;
                    self.publisher.publish(ChangeNotification::game_event(
                        &created.id,
                        &created.game_id,
                    ));
                    return Ok(created);
                }
                Err(err)
                    if super::is_unique_violation(&err) || super::is_lock_contention(&err) =>
                {
                    tracing::debug!(
                        game_id = %event.game_id,
                        sequence_number,
                        attempt,
                        error = %err,
                        "sequence number not claimed, retrying"
                    );
                    tokio::time::sleep(retry_delay(attempt)).await;
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::warn!(game_id = %event.game_id, "sequence number claims exhausted");
        bail!(
            "could not assign a sequence number for game {} after {MAX_SEQUENCE_ATTEMPTS} attempts",
            event.game_id
        )
    }
}

fn is_contention(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sea_orm::DbErr>()
        .is_some_and(super::is_lock_contention)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_stays_within_bounds() {
        for attempt in 1..=MAX_SEQUENCE_ATTEMPTS {
            let delay = retry_delay(attempt);
            assert!(delay >= Duration::from_millis(1));
            assert!(delay <= MAX_RETRY_DELAY);
        }
    }

    #[test]
    fn early_retries_pause_briefly() {
        for _ in 0..32 {
            assert!(retry_delay(1) <= Duration::from_millis(4));
        }
    }
}

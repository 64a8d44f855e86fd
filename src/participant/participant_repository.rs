use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{error::Result, participant::participant_models::Participant};

/// Participant registry: membership checks, read-progress tracking, and the
/// batch insert used when a conversation is created. Every operation that
/// touches participant or message data authorizes through `is_participant`
/// here rather than relying on database-level policy.
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    async fn is_participant(&self, conversation_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn list_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Participant>>;

    /// Sets the participant's last-read timestamp. Returns false when no
    /// matching membership row exists; the service layer maps that to
    /// NotFound or Unauthorized.
    async fn mark_read(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Inserts the participant set in a single statement so it is atomic.
    /// Re-inserting an existing (conversation, user) pair is a no-op, which
    /// makes retries of conversation creation idempotent.
    async fn add_participants(&self, conversation_id: Uuid, user_ids: &[Uuid]) -> Result<()>;
}

#[derive(Clone)]
pub struct PgParticipantRepository {
    pool: PgPool,
}

impl PgParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for PgParticipantRepository {
    async fn is_participant(&self, conversation_id: Uuid, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM participants
                 WHERE conversation_id = $1 AND user_id = $2
             )",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Participant>> {
        let participants = sqlx::query_as::<_, Participant>(
            "SELECT * FROM participants
             WHERE conversation_id = $1
             ORDER BY created_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    async fn mark_read(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE participants
             SET last_read_at = $3
             WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_participants(&self, conversation_id: Uuid, user_ids: &[Uuid]) -> Result<()> {
        sqlx::query(
            "INSERT INTO participants (conversation_id, user_id)
             SELECT $1, unnest($2::uuid[])
             ON CONFLICT (conversation_id, user_id) DO NOTHING",
        )
        .bind(conversation_id)
        .bind(user_ids)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

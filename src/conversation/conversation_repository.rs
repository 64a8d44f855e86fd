use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{conversation::conversation_models::Conversation, error::Result};

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_by_id(&self, conversation_id: Uuid) -> Result<Option<Conversation>>;

    /// Idempotent-lookup query: a conversation on this offer whose
    /// participant set contains both users. If concurrent creation ever
    /// produced duplicates, the earliest-created one wins, so repeated
    /// resolves converge on the same conversation.
    async fn find_for_offer_pair(
        &self,
        offer_id: Uuid,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Option<Conversation>>;

    async fn create(&self, offer_id: Option<Uuid>) -> Result<Conversation>;

    /// Bumps `updated_at`; called after every message append.
    async fn touch(&self, conversation_id: Uuid, at: DateTime<Utc>) -> Result<()>;

    /// All conversations the user participates in, most recently active
    /// first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>>;
}

#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn find_by_id(&self, conversation_id: Uuid) -> Result<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations WHERE id = $1",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn find_for_offer_pair(
        &self,
        offer_id: Uuid,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT c.* FROM conversations c
             JOIN participants pa ON pa.conversation_id = c.id AND pa.user_id = $2
             JOIN participants pb ON pb.conversation_id = c.id AND pb.user_id = $3
             WHERE c.offer_id = $1
             ORDER BY c.created_at ASC
             LIMIT 1",
        )
        .bind(offer_id)
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn create(&self, offer_id: Option<Uuid>) -> Result<Conversation> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "INSERT INTO conversations (offer_id)
             VALUES ($1)
             RETURNING *",
        )
        .bind(offer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn touch(&self, conversation_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
            .bind(conversation_id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        let conversations = sqlx::query_as::<_, Conversation>(
            "SELECT c.* FROM conversations c
             JOIN participants p ON p.conversation_id = c.id
             WHERE p.user_id = $1
             ORDER BY c.updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(conversations)
    }
}

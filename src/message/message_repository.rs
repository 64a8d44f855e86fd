use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    message::message_models::{Message, MessageKind, MessageOrder},
};

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        kind: MessageKind,
        content: &str,
    ) -> Result<Message>;

    /// Full ordered fetch of a conversation. Restartable: repeated calls see
    /// the same order, guaranteed by the (created_at, seq) sort key.
    async fn list(&self, conversation_id: Uuid, order: MessageOrder) -> Result<Vec<Message>>;

    async fn last_message(&self, conversation_id: Uuid) -> Result<Option<Message>>;

    /// Messages from the other side created after the participant's
    /// last-read timestamp (null last-read counts everything). Computed per
    /// participant on every call, never cached on the conversation.
    async fn unread_count(&self, conversation_id: Uuid, user_id: Uuid) -> Result<i64>;
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        kind: MessageKind,
        content: &str,
    ) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (conversation_id, sender_id, kind, content)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(kind)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn list(&self, conversation_id: Uuid, order: MessageOrder) -> Result<Vec<Message>> {
        let query = match order {
            MessageOrder::Asc => {
                "SELECT * FROM messages
                 WHERE conversation_id = $1
                 ORDER BY created_at ASC, seq ASC"
            }
            MessageOrder::Desc => {
                "SELECT * FROM messages
                 WHERE conversation_id = $1
                 ORDER BY created_at DESC, seq DESC"
            }
        };

        let messages = sqlx::query_as::<_, Message>(query)
            .bind(conversation_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(messages)
    }

    async fn last_message(&self, conversation_id: Uuid) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages
             WHERE conversation_id = $1
             ORDER BY created_at DESC, seq DESC
             LIMIT 1",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    async fn unread_count(&self, conversation_id: Uuid, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages m
             JOIN participants p
               ON p.conversation_id = m.conversation_id AND p.user_id = $2
             WHERE m.conversation_id = $1
               AND m.sender_id <> $2
               AND m.created_at > COALESCE(p.last_read_at, 'epoch'::timestamptz)",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

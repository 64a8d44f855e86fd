use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    conversation::{conversation_dto::ConversationSummary, ConversationRepository},
    directory::OfferDirectory,
    error::{AppError, Result},
    message::{
        message_models::{Message, MessageKind, MessageOrder},
        message_repository::MessageRepository,
    },
    participant::ParticipantRepository,
};

/// Message ledger: gated append, ordered reads, and per-participant unread
/// counts. Authorization is an explicit participant check on every operation.
#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageRepository>,
    participants: Arc<dyn ParticipantRepository>,
    conversations: Arc<dyn ConversationRepository>,
    directory: Arc<dyn OfferDirectory>,
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        participants: Arc<dyn ParticipantRepository>,
        conversations: Arc<dyn ConversationRepository>,
        directory: Arc<dyn OfferDirectory>,
    ) -> Self {
        Self {
            messages,
            participants,
            conversations,
            directory,
        }
    }

    pub async fn send_message(
        &self,
        sender_id: Uuid,
        conversation_id: Uuid,
        kind: MessageKind,
        content: &str,
    ) -> Result<Message> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(AppError::NotFound("Conversation not found".to_string()))?;

        if !self
            .participants
            .is_participant(conversation_id, sender_id)
            .await?
        {
            return Err(AppError::Unauthorized(
                "You are not a participant of this conversation".to_string(),
            ));
        }

        // Reply gate is looser than the creation gate: a pending subscription
        // keeps existing conversations usable, only suspension or a lapsed
        // subscription blocks replies.
        if let Some(offer_id) = conversation.offer_id {
            if let Some(offer) = self.directory.find_offer(offer_id).await? {
                if !offer.accepts_replies() {
                    return Err(AppError::AgencyUnavailable(
                        "This agency is currently unavailable".to_string(),
                    ));
                }
            }
        }

        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::InvalidInput(
                "Message content cannot be empty".to_string(),
            ));
        }

        let message = self
            .messages
            .insert(conversation_id, sender_id, kind, content)
            .await?;

        // Bump failure is non-fatal: the message is already sent.
        if let Err(e) = self
            .conversations
            .touch(conversation_id, message.created_at)
            .await
        {
            tracing::warn!(
                "Failed to bump updated_at for conversation {}: {:?}",
                conversation_id,
                e
            );
        }

        Ok(message)
    }

    pub async fn list_messages(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        order: MessageOrder,
    ) -> Result<Vec<Message>> {
        self.conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(AppError::NotFound("Conversation not found".to_string()))?;

        if !self
            .participants
            .is_participant(conversation_id, user_id)
            .await?
        {
            return Err(AppError::Unauthorized(
                "You are not a participant of this conversation".to_string(),
            ));
        }

        self.messages.list(conversation_id, order).await
    }

    pub async fn unread_count(&self, user_id: Uuid, conversation_id: Uuid) -> Result<i64> {
        self.conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(AppError::NotFound("Conversation not found".to_string()))?;

        if !self
            .participants
            .is_participant(conversation_id, user_id)
            .await?
        {
            return Err(AppError::Unauthorized(
                "You are not a participant of this conversation".to_string(),
            ));
        }

        self.messages.unread_count(conversation_id, user_id).await
    }

    /// Inbox view: every conversation the user participates in, with the
    /// other participant, the latest message and the caller's unread count,
    /// most recently active first. Joined in application code so the
    /// in-memory fixture implements the identical contract.
    pub async fn conversation_summaries(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>> {
        let conversations = self.conversations.list_for_user(user_id).await?;

        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let participants = self
                .participants
                .list_for_conversation(conversation.id)
                .await?;

            let Some(other) = participants.iter().find(|p| p.user_id != user_id) else {
                tracing::warn!(
                    "Conversation {} has no counterpart for user {}",
                    conversation.id,
                    user_id
                );
                continue;
            };

            let last_message = self.messages.last_message(conversation.id).await?;
            let unread_count = self.messages.unread_count(conversation.id, user_id).await?;

            summaries.push(ConversationSummary {
                conversation_id: conversation.id,
                offer_id: conversation.offer_id,
                other_user_id: other.user_id,
                last_message: last_message.map(Into::into),
                unread_count,
                updated_at: conversation.updated_at,
            });
        }

        Ok(summaries)
    }

    pub async fn mark_read(&self, user_id: Uuid, conversation_id: Uuid) -> Result<()> {
        self.conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(AppError::NotFound("Conversation not found".to_string()))?;

        let updated = self
            .participants
            .mark_read(conversation_id, user_id, Utc::now())
            .await?;

        if !updated {
            return Err(AppError::Unauthorized(
                "You are not a participant of this conversation".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        directory::{AgencyStatus, SubscriptionStatus},
        store::memory::MemoryStore,
    };
    use chrono::{Duration, TimeZone};

    fn service(store: &Arc<MemoryStore>) -> MessageService {
        MessageService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        )
    }

    async fn seeded_conversation(store: &Arc<MemoryStore>, a: Uuid, b: Uuid) -> Uuid {
        let conversation = store.create(None).await.unwrap();
        store
            .add_participants(conversation.id, &[a, b])
            .await
            .unwrap();
        conversation.id
    }

    #[tokio::test]
    async fn non_participant_send_is_unauthorized_and_inserts_nothing() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let (alice, bob, mallory) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let conversation = seeded_conversation(&store, alice, bob).await;

        let err = service
            .send_message(mallory, conversation, MessageKind::Text, "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(store.message_count(conversation), 0);
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let conversation = seeded_conversation(&store, alice, bob).await;

        let err = service
            .send_message(alice, conversation, MessageKind::Text, "   \n ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(store.message_count(conversation), 0);
    }

    #[tokio::test]
    async fn send_bumps_conversation_updated_at() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let conversation = seeded_conversation(&store, alice, bob).await;
        let before = store.find_by_id(conversation).await.unwrap().unwrap();

        let message = service
            .send_message(alice, conversation, MessageKind::Text, "hello")
            .await
            .unwrap();

        let after = store.find_by_id(conversation).await.unwrap().unwrap();
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(after.updated_at, message.created_at);
    }

    #[tokio::test]
    async fn suspended_agency_blocks_replies() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let (alice, owner) = (Uuid::new_v4(), Uuid::new_v4());
        let offer = store.seed_offer(owner, AgencyStatus::Active, SubscriptionStatus::Active);
        let conversation = store.create(Some(offer)).await.unwrap();
        store
            .add_participants(conversation.id, &[alice, owner])
            .await
            .unwrap();

        store.set_agency(offer, AgencyStatus::Suspended, SubscriptionStatus::Active);

        let err = service
            .send_message(alice, conversation.id, MessageKind::Text, "anyone there?")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AgencyUnavailable(_)));
    }

    #[tokio::test]
    async fn pending_subscription_still_allows_replies() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let (alice, owner) = (Uuid::new_v4(), Uuid::new_v4());
        let offer = store.seed_offer(owner, AgencyStatus::Active, SubscriptionStatus::Active);
        let conversation = store.create(Some(offer)).await.unwrap();
        store
            .add_participants(conversation.id, &[alice, owner])
            .await
            .unwrap();

        store.set_agency(offer, AgencyStatus::Active, SubscriptionStatus::Pending);

        let message = service
            .send_message(alice, conversation.id, MessageKind::Text, "follow up")
            .await
            .unwrap();
        assert_eq!(message.content, "follow up");
    }

    #[tokio::test]
    async fn identical_timestamps_sort_deterministically() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let conversation = seeded_conversation(&store, alice, bob).await;

        let at = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        store.insert_message_at(conversation, alice, "first", at);
        store.insert_message_at(conversation, bob, "second", at);
        store.insert_message_at(conversation, alice, "third", at);

        let first = service
            .list_messages(alice, conversation, MessageOrder::Asc)
            .await
            .unwrap();
        let second = service
            .list_messages(alice, conversation, MessageOrder::Asc)
            .await
            .unwrap();

        let contents: Vec<&str> = first.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(
            first.iter().map(|m| m.seq).collect::<Vec<_>>(),
            second.iter().map(|m| m.seq).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn unread_counts_are_tracked_per_participant() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let conversation = seeded_conversation(&store, alice, bob).await;

        service
            .send_message(alice, conversation, MessageKind::Text, "one")
            .await
            .unwrap();
        service
            .send_message(alice, conversation, MessageKind::Text, "two")
            .await
            .unwrap();
        service
            .send_message(bob, conversation, MessageKind::Text, "reply")
            .await
            .unwrap();

        // Own messages never count as unread; the two sides diverge.
        assert_eq!(service.unread_count(bob, conversation).await.unwrap(), 2);
        assert_eq!(service.unread_count(alice, conversation).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mark_read_zeroes_unread_count() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let conversation = seeded_conversation(&store, alice, bob).await;

        for content in ["one", "two", "three"] {
            service
                .send_message(alice, conversation, MessageKind::Text, content)
                .await
                .unwrap();
        }
        assert_eq!(service.unread_count(bob, conversation).await.unwrap(), 3);

        service.mark_read(bob, conversation).await.unwrap();
        assert_eq!(service.unread_count(bob, conversation).await.unwrap(), 0);

        // New traffic counts again from the mark.
        let later = Utc::now() + Duration::seconds(1);
        store.insert_message_at(conversation, alice, "four", later);
        assert_eq!(service.unread_count(bob, conversation).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mark_read_rejects_non_participants_and_missing_conversations() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let (alice, bob, mallory) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let conversation = seeded_conversation(&store, alice, bob).await;

        let err = service.mark_read(mallory, conversation).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = service.mark_read(alice, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn summaries_are_ordered_by_recent_activity() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let (alice, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let with_bob = seeded_conversation(&store, alice, bob).await;
        let with_carol = seeded_conversation(&store, alice, carol).await;

        service
            .send_message(bob, with_bob, MessageKind::Text, "old")
            .await
            .unwrap();
        let later = Utc::now() + Duration::seconds(5);
        store.insert_message_at(with_carol, carol, "new", later);
        store.touch(with_carol, later).await.unwrap();

        let summaries = service.conversation_summaries(alice).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].conversation_id, with_carol);
        assert_eq!(summaries[0].other_user_id, carol);
        assert_eq!(summaries[0].unread_count, 1);
        assert_eq!(
            summaries[0].last_message.as_ref().unwrap().content,
            "new"
        );
        assert_eq!(summaries[1].conversation_id, with_bob);
        assert_eq!(summaries[1].unread_count, 1);
    }
}

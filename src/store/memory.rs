//! In-memory implementation of the storage traits.
//!
//! A test fixture for the repository contracts: the services are exercised
//! against this store in unit and integration tests without a database.
//! Not a production storage strategy.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    conversation::{Conversation, ConversationRepository},
    directory::{AgencyStatus, OfferContext, OfferDirectory, SubscriptionStatus},
    error::Result,
    message::{Message, MessageKind, MessageOrder, MessageRepository},
    participant::{Participant, ParticipantRepository},
};

#[derive(Default)]
struct Inner {
    offers: HashMap<Uuid, OfferContext>,
    conversations: HashMap<Uuid, Conversation>,
    participants: Vec<Participant>,
    messages: Vec<Message>,
    next_seq: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an offer owned by a fresh agency with the given state and
    /// returns the offer id.
    pub fn seed_offer(
        &self,
        owner_id: Uuid,
        status: AgencyStatus,
        subscription: SubscriptionStatus,
    ) -> Uuid {
        let offer_id = Uuid::new_v4();
        let mut inner = self.inner.lock().unwrap();
        inner.offers.insert(
            offer_id,
            OfferContext {
                offer_id,
                agency_id: Uuid::new_v4(),
                agency_owner_id: owner_id,
                agency_status: status,
                subscription_status: subscription,
            },
        );
        offer_id
    }

    /// Changes the state of the agency behind an offer.
    pub fn set_agency(
        &self,
        offer_id: Uuid,
        status: AgencyStatus,
        subscription: SubscriptionStatus,
    ) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(offer) = inner.offers.get_mut(&offer_id) {
            offer.agency_status = status;
            offer.subscription_status = subscription;
        }
    }

    /// Inserts a message with a caller-chosen timestamp, bypassing the
    /// service gates. Used to simulate timestamp collisions and backdated
    /// traffic.
    pub fn insert_message_at(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Message {
        let mut inner = self.inner.lock().unwrap();
        inner.next_seq += 1;
        let message = Message {
            id: Uuid::new_v4(),
            seq: inner.next_seq,
            conversation_id,
            sender_id,
            kind: MessageKind::Text,
            content: content.to_string(),
            created_at,
        };
        inner.messages.push(message.clone());
        message
    }

    pub fn message_count(&self, conversation_id: Uuid) -> usize {
        self.inner
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .count()
    }
}

#[async_trait]
impl OfferDirectory for MemoryStore {
    async fn find_offer(&self, offer_id: Uuid) -> Result<Option<OfferContext>> {
        Ok(self.inner.lock().unwrap().offers.get(&offer_id).cloned())
    }
}

#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn find_by_id(&self, conversation_id: Uuid) -> Result<Option<Conversation>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .conversations
            .get(&conversation_id)
            .cloned())
    }

    async fn find_for_offer_pair(
        &self,
        offer_id: Uuid,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Option<Conversation>> {
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<&Conversation> = inner
            .conversations
            .values()
            .filter(|c| c.offer_id == Some(offer_id))
            .filter(|c| {
                let is_member = |user: Uuid| {
                    inner
                        .participants
                        .iter()
                        .any(|p| p.conversation_id == c.id && p.user_id == user)
                };
                is_member(user_a) && is_member(user_b)
            })
            .collect();
        matches.sort_by_key(|c| (c.created_at, c.id));
        Ok(matches.first().map(|c| (*c).clone()))
    }

    async fn create(&self, offer_id: Option<Uuid>) -> Result<Conversation> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            offer_id,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .lock()
            .unwrap()
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn touch(&self, conversation_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(conversation) = inner.conversations.get_mut(&conversation_id) {
            conversation.updated_at = at;
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        let inner = self.inner.lock().unwrap();
        let mut conversations: Vec<Conversation> = inner
            .conversations
            .values()
            .filter(|c| {
                inner
                    .participants
                    .iter()
                    .any(|p| p.conversation_id == c.id && p.user_id == user_id)
            })
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(conversations)
    }
}

#[async_trait]
impl ParticipantRepository for MemoryStore {
    async fn is_participant(&self, conversation_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .participants
            .iter()
            .any(|p| p.conversation_id == conversation_id && p.user_id == user_id))
    }

    async fn list_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Participant>> {
        let mut participants: Vec<Participant> = self
            .inner
            .lock()
            .unwrap()
            .participants
            .iter()
            .filter(|p| p.conversation_id == conversation_id)
            .cloned()
            .collect();
        participants.sort_by_key(|p| p.created_at);
        Ok(participants)
    }

    async fn mark_read(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .participants
            .iter_mut()
            .find(|p| p.conversation_id == conversation_id && p.user_id == user_id)
        {
            Some(participant) => {
                participant.last_read_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_participants(&self, conversation_id: Uuid, user_ids: &[Uuid]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        for &user_id in user_ids {
            // Duplicate inserts are a no-op, as with ON CONFLICT DO NOTHING.
            let exists = inner
                .participants
                .iter()
                .any(|p| p.conversation_id == conversation_id && p.user_id == user_id);
            if !exists {
                inner.participants.push(Participant {
                    conversation_id,
                    user_id,
                    last_read_at: None,
                    created_at: now,
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn insert(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        kind: MessageKind,
        content: &str,
    ) -> Result<Message> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_seq += 1;
        let message = Message {
            id: Uuid::new_v4(),
            seq: inner.next_seq,
            conversation_id,
            sender_id,
            kind,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn list(&self, conversation_id: Uuid, order: MessageOrder) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .inner
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.seq));
        if order == MessageOrder::Desc {
            messages.reverse();
        }
        Ok(messages)
    }

    async fn last_message(&self, conversation_id: Uuid) -> Result<Option<Message>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .max_by_key(|m| (m.created_at, m.seq))
            .cloned())
    }

    async fn unread_count(&self, conversation_id: Uuid, user_id: Uuid) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        let Some(participant) = inner
            .participants
            .iter()
            .find(|p| p.conversation_id == conversation_id && p.user_id == user_id)
        else {
            return Ok(0);
        };

        let count = inner
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id && m.sender_id != user_id)
            .filter(|m| match participant.last_read_at {
                Some(last_read) => m.created_at > last_read,
                None => true,
            })
            .count();
        Ok(count as i64)
    }
}

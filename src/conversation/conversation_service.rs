use std::sync::Arc;

use uuid::Uuid;

use crate::{
    conversation::conversation_repository::ConversationRepository,
    directory::OfferDirectory,
    error::{AppError, Result},
    message::{MessageKind, MessageService},
    participant::ParticipantRepository,
};

/// Conversation resolver: finds or creates the conversation between a
/// traveler and the owner of the agency behind an offer.
#[derive(Clone)]
pub struct ConversationService {
    conversations: Arc<dyn ConversationRepository>,
    participants: Arc<dyn ParticipantRepository>,
    directory: Arc<dyn OfferDirectory>,
    ledger: MessageService,
}

impl ConversationService {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        participants: Arc<dyn ParticipantRepository>,
        directory: Arc<dyn OfferDirectory>,
        ledger: MessageService,
    ) -> Self {
        Self {
            conversations,
            participants,
            directory,
            ledger,
        }
    }

    /// Find-or-create the conversation for (requester, agency owner, offer)
    /// and optionally seed it with a first message.
    ///
    /// Creation requires a fully active, paying agency; this is stricter
    /// than the reply gate on purpose, so an agency whose subscription is
    /// pending keeps its existing conversations but gets no new ones.
    pub async fn start_conversation(
        &self,
        requester_id: Uuid,
        offer_id: Uuid,
        initial_message: Option<&str>,
    ) -> Result<Uuid> {
        let offer = self
            .directory
            .find_offer(offer_id)
            .await?
            .ok_or(AppError::NotFound("Offer not found".to_string()))?;

        let recipient_id = offer.agency_owner_id;
        if recipient_id == requester_id {
            return Err(AppError::InvalidInput(
                "You cannot message your own offer".to_string(),
            ));
        }

        if !offer.accepts_new_conversations() {
            return Err(AppError::AgencyUnavailable(
                "This agency is not currently accepting new conversations".to_string(),
            ));
        }

        // Known race: two simultaneous starts can both miss this lookup and
        // create duplicates. The lookup picks the earliest-created match, so
        // later resolves converge on one conversation either way.
        if let Some(existing) = self
            .conversations
            .find_for_offer_pair(offer_id, requester_id, recipient_id)
            .await?
        {
            return Ok(existing.id);
        }

        let conversation = self.conversations.create(Some(offer_id)).await?;
        self.participants
            .add_participants(conversation.id, &[requester_id, recipient_id])
            .await?;

        // Seeding the first message fails open: the conversation exists even
        // if the append does not land.
        if let Some(content) = initial_message.map(str::trim).filter(|c| !c.is_empty()) {
            if let Err(e) = self
                .ledger
                .send_message(requester_id, conversation.id, MessageKind::Text, content)
                .await
            {
                tracing::warn!(
                    "Failed to seed conversation {} with initial message: {:?}",
                    conversation.id,
                    e
                );
            }
        }

        Ok(conversation.id)
    }
}

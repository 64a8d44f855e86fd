use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::message::message_models::MessageResponse;

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct StartConversationRequest {
    pub offer_id: Uuid,
    /// Optional first message, sent as the traveler once the conversation
    /// exists.
    #[validate(length(max = 4000))]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartConversationResponse {
    pub conversation_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationSummary {
    pub conversation_id: Uuid,
    pub offer_id: Option<Uuid>,
    pub other_user_id: Uuid,
    pub last_message: Option<MessageResponse>,
    pub unread_count: i64,
    pub updated_at: DateTime<Utc>,
}

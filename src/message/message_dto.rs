use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::message::message_models::{MessageKind, MessageOrder};

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
    pub kind: Option<MessageKind>,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub order: Option<MessageOrder>,
}

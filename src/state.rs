use std::sync::Arc;

use crate::{conversation::ConversationService, message::MessageService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub conversation_service: ConversationService,
    pub message_service: MessageService,
}

#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub frontend_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            frontend_origin: std::env::var("FRONTEND_ORIGIN").ok(),
        }
    }
}

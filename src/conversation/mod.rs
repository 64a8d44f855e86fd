pub mod conversation_dto;
pub mod conversation_handlers;
pub mod conversation_models;
pub mod conversation_repository;
pub mod conversation_service;

pub use conversation_dto::{ConversationSummary, StartConversationRequest};
pub use conversation_models::Conversation;
pub use conversation_repository::{ConversationRepository, PgConversationRepository};
pub use conversation_service::ConversationService;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::Result,
    message::{
        message_dto::{ListMessagesQuery, SendMessageRequest},
        message_models::{MessageKind, MessageOrder, MessageResponse},
    },
    middleware::AuthUser,
    state::AppState,
};

/// Send a message in a conversation
#[utoipa::path(
    post,
    path = "/api/conversations/{id}/messages",
    tag = "messages",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent successfully", body = MessageResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not a participant"),
        (status = 403, description = "Agency unavailable"),
        (status = 404, description = "Conversation not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let message = state
        .message_service
        .send_message(
            user_id,
            conversation_id,
            payload.kind.unwrap_or(MessageKind::Text),
            &payload.content,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

/// Get all messages of a conversation
#[utoipa::path(
    get,
    path = "/api/conversations/{id}/messages",
    tag = "messages",
    params(
        ("id" = Uuid, Path, description = "Conversation ID"),
        ("order" = Option<String>, Query, description = "Sort order: asc (default) or desc")
    ),
    responses(
        (status = 200, description = "Conversation messages", body = Vec<MessageResponse>),
        (status = 401, description = "Not a participant"),
        (status = 404, description = "Conversation not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<impl IntoResponse> {
    let order = query.order.unwrap_or(MessageOrder::Asc);

    let messages = state
        .message_service
        .list_messages(user_id, conversation_id, order)
        .await?;

    // Opening a conversation marks it read; a failed mark never fails the read.
    if let Err(e) = state
        .message_service
        .mark_read(user_id, conversation_id)
        .await
    {
        tracing::warn!(
            "Failed to mark conversation {} read for {}: {:?}",
            conversation_id,
            user_id,
            e
        );
    }

    let responses: Vec<MessageResponse> = messages.into_iter().map(MessageResponse::from).collect();

    Ok((StatusCode::OK, Json(responses)))
}

/// Mark a conversation as read
#[utoipa::path(
    patch,
    path = "/api/conversations/{id}/read",
    tag = "messages",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Conversation marked as read"),
        (status = 401, description = "Not a participant"),
        (status = 404, description = "Conversation not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_conversation_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state
        .message_service
        .mark_read(user_id, conversation_id)
        .await?;

    Ok(StatusCode::OK)
}

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    conversation::conversation_dto::{
        ConversationSummary, StartConversationRequest, StartConversationResponse,
    },
    error::Result,
    middleware::AuthUser,
    state::AppState,
};

/// Start (or resume) a conversation about an offer
#[utoipa::path(
    post,
    path = "/api/conversations",
    tag = "conversations",
    request_body = StartConversationRequest,
    responses(
        (status = 201, description = "Conversation ready", body = StartConversationResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Agency unavailable"),
        (status = 404, description = "Offer not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn start_conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<StartConversationRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let conversation_id = state
        .conversation_service
        .start_conversation(user_id, payload.offer_id, payload.message.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StartConversationResponse { conversation_id }),
    ))
}

/// Get all conversations for the authenticated user
#[utoipa::path(
    get,
    path = "/api/conversations",
    tag = "conversations",
    responses(
        (status = 200, description = "Conversation summaries, most recently active first", body = Vec<ConversationSummary>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_conversations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let summaries = state.message_service.conversation_summaries(user_id).await?;

    Ok((StatusCode::OK, Json(summaries)))
}

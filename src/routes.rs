use crate::{
    conversation::{
        conversation_dto::{
            ConversationSummary, StartConversationRequest, StartConversationResponse,
        },
        conversation_handlers,
        conversation_models::Conversation,
    },
    message::{
        message_dto::SendMessageRequest,
        message_handlers,
        message_models::{Message, MessageKind, MessageResponse},
    },
    middleware::auth_middleware,
    state::AppState,
};
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::conversation::conversation_handlers::start_conversation,
        crate::conversation::conversation_handlers::get_conversations,
        crate::message::message_handlers::send_message,
        crate::message::message_handlers::get_messages,
        crate::message::message_handlers::mark_conversation_read,
    ),
    components(
        schemas(
            StartConversationRequest,
            StartConversationResponse,
            ConversationSummary,
            Conversation,
            SendMessageRequest,
            Message,
            MessageResponse,
            MessageKind,
        )
    ),
    tags(
        (name = "conversations", description = "Offer-scoped conversations between travelers and agencies"),
        (name = "messages", description = "Messages and read tracking")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let mut origins: Vec<HeaderValue> = vec![
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];
    if let Some(origin) = &state.config.frontend_origin {
        if let Ok(value) = origin.parse() {
            origins.push(value);
        }
    }

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    let conversation_routes = Router::new()
        .route(
            "/",
            post(conversation_handlers::start_conversation)
                .get(conversation_handlers::get_conversations),
        )
        .route(
            "/:id/messages",
            get(message_handlers::get_messages).post(message_handlers::send_message),
        )
        .route("/:id/read", patch(message_handlers::mark_conversation_read))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/conversations", conversation_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

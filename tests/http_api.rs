use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use safrgo_messaging::{
    auth::create_jwt,
    conversation::ConversationService,
    directory::{AgencyStatus, SubscriptionStatus},
    message::MessageService,
    routes::create_router,
    state::{AppState, Config},
    store::MemoryStore,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const JWT_SECRET: &str = "test-secret";

fn test_app(store: &Arc<MemoryStore>) -> Router {
    let message_service = MessageService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    let conversation_service = ConversationService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        message_service.clone(),
    );

    let state = AppState {
        config: Arc::new(Config {
            jwt_secret: JWT_SECRET.to_string(),
            frontend_origin: None,
        }),
        conversation_service,
        message_service,
    };

    create_router(state)
}

fn request(method: Method, uri: &str, user: Option<Uuid>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        let token = create_jwt(user, JWT_SECRET, 1).unwrap();
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let store = Arc::new(MemoryStore::new());
    let app = test_app(&store);

    let response = app
        .oneshot(request(Method::GET, "/api/conversations", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn traveler_and_agency_exchange_messages() {
    let store = Arc::new(MemoryStore::new());
    let app = test_app(&store);
    let traveler = Uuid::new_v4();
    let owner = Uuid::new_v4();
    let offer = store.seed_offer(owner, AgencyStatus::Active, SubscriptionStatus::Active);

    // Traveler opens the conversation with a first message.
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/conversations",
            Some(traveler),
            Some(json!({ "offer_id": offer, "message": "Hello, is this available?" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    let conversation_id = body["conversation_id"].as_str().unwrap().to_string();

    // Starting again resolves to the same conversation.
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/conversations",
            Some(traveler),
            Some(json!({ "offer_id": offer })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["conversation_id"].as_str().unwrap(), conversation_id);

    // The owner sees one unread conversation with the traveler.
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/conversations",
            Some(owner),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summaries = json_body(response).await;
    assert_eq!(summaries.as_array().unwrap().len(), 1);
    assert_eq!(summaries[0]["unread_count"], 1);
    assert_eq!(
        summaries[0]["other_user_id"].as_str().unwrap(),
        traveler.to_string()
    );
    assert_eq!(
        summaries[0]["last_message"]["content"],
        "Hello, is this available?"
    );

    // The owner replies.
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/conversations/{conversation_id}/messages"),
            Some(owner),
            Some(json!({ "content": "Yes, still available!" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // The traveler reads the thread: two messages in order, and the fetch
    // marks the conversation read.
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/conversations/{conversation_id}/messages"),
            Some(traveler),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let messages = json_body(response).await;
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "Hello, is this available?");
    assert_eq!(messages[1]["content"], "Yes, still available!");

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/conversations",
            Some(traveler),
            None,
        ))
        .await
        .unwrap();
    let summaries = json_body(response).await;
    assert_eq!(summaries[0]["unread_count"], 0);
}

#[tokio::test]
async fn outsiders_cannot_read_or_write_a_conversation() {
    let store = Arc::new(MemoryStore::new());
    let app = test_app(&store);
    let traveler = Uuid::new_v4();
    let owner = Uuid::new_v4();
    let outsider = Uuid::new_v4();
    let offer = store.seed_offer(owner, AgencyStatus::Active, SubscriptionStatus::Active);

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/conversations",
            Some(traveler),
            Some(json!({ "offer_id": offer, "message": "hi" })),
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    let conversation_id = body["conversation_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/conversations/{conversation_id}/messages"),
            Some(outsider),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/conversations/{conversation_id}/messages"),
            Some(outsider),
            Some(json!({ "content": "let me in" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn pending_subscription_blocks_new_conversations() {
    let store = Arc::new(MemoryStore::new());
    let app = test_app(&store);
    let traveler = Uuid::new_v4();
    let owner = Uuid::new_v4();
    let offer = store.seed_offer(owner, AgencyStatus::Active, SubscriptionStatus::Pending);

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/conversations",
            Some(traveler),
            Some(json!({ "offer_id": offer })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

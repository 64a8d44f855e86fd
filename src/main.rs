use std::sync::Arc;

use safrgo_messaging::{
    conversation::{ConversationService, PgConversationRepository},
    db::{create_pool, run_migrations},
    directory::PgOfferDirectory,
    message::{MessageService, PgMessageRepository},
    participant::PgParticipantRepository,
    routes::create_router,
    state::{AppState, Config},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,safrgo_messaging=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());

    // Create database connection pool
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is not set"))?;

    tracing::info!("Connecting to database...");
    let db = create_pool(&database_url).await?;

    // Run migrations
    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    // Create repositories
    let conversations = Arc::new(PgConversationRepository::new(db.clone()));
    let participants = Arc::new(PgParticipantRepository::new(db.clone()));
    let messages = Arc::new(PgMessageRepository::new(db.clone()));
    let directory = Arc::new(PgOfferDirectory::new(db.clone()));

    // Create services
    let message_service = MessageService::new(
        messages,
        participants.clone(),
        conversations.clone(),
        directory.clone(),
    );
    let conversation_service = ConversationService::new(
        conversations,
        participants,
        directory,
        message_service.clone(),
    );

    // Create application state
    let state = AppState {
        config,
        conversation_service,
        message_service,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

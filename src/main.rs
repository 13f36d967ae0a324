use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liveboard::{
    server, AppState, Config, EventStore, InMemoryConnectionManager, InMemoryEventStore,
    InMemorySessionRegistry, SqliteEventStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liveboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(bind_addr = %config.bind_addr, "Starting LiveBoard relay");

    // Easy to switch between implementations:
    let event_store: Arc<dyn EventStore> = if config.uses_in_memory_store() {
        info!("Using in-memory event store; history is lost on restart");
        Arc::new(InMemoryEventStore::new())
    } else {
        Arc::new(
            SqliteEventStore::connect(&config.database_url)
                .await
                .with_context(|| format!("opening event store at {}", config.database_url))?,
        )
    };

    let app_state = AppState::new(
        event_store,
        Arc::new(InMemorySessionRegistry::new()),
        Arc::new(InMemoryConnectionManager::new()),
        &config.default_session,
    );

    let app = server::router(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

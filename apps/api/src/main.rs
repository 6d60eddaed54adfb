mod config;
mod errors;
mod matching;
mod mentors;
mod models;
mod routes;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreBackend};
use crate::matching::recommender::TfidfMatcher;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{CsvMentorStore, InMemoryMentorStore, MentorStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mentor API v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&config)?;

    let state = AppState {
        store,
        matcher: Arc::new(TfidfMatcher),
        config: config.clone(),
    };
    info!("Matcher: {} (top {})", state.matcher.backend(), config.top_k);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the configured store and reads it once, so a missing file is created
/// header-only and a broken one stops startup instead of the first request.
fn open_store(config: &Config) -> Result<Arc<dyn MentorStore>> {
    let store: Arc<dyn MentorStore> = match config.store_backend {
        StoreBackend::Csv => Arc::new(
            CsvMentorStore::new(&config.data_path).with_lock_timeout(config.lock_timeout),
        ),
        StoreBackend::Memory => {
            warn!("Using in-memory mentor store; registrations are lost on restart");
            Arc::new(InMemoryMentorStore::new())
        }
    };

    let pool_size = store
        .load()
        .with_context(|| format!("Failed to open mentor store at {}", config.data_path.display()))?
        .len();
    info!(
        "Mentor store ready ({:?}, {}): {pool_size} mentors",
        config.store_backend,
        config.data_path.display()
    );

    Ok(store)
}

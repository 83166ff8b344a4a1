//! # civic-api — Binary Entry Point
//!
//! Reads configuration from the environment, selects the Postgres or
//! in-memory store and the HTTP or static classifier, and serves the API.

use std::sync::Arc;

use civic_api::state::{AppConfig, AppState};
use civic_api::store::PgStore;
use civic_classifier::HttpClassifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("invalid configuration: {e}");
        e
    })?;
    tracing::info!(?config, "configuration loaded");
    let port = config.port;

    let mut state = AppState::with_config(config.clone());

    if let Some(url) = &config.database_url {
        let pool = civic_api::db::init_pool(url).await.map_err(|e| {
            tracing::error!("database initialization failed: {e}");
            e
        })?;
        state = state
            .with_store(Arc::new(PgStore::new(pool.clone())))
            .with_db_pool(pool);
    } else {
        tracing::warn!("DATABASE_URL not set, using the in-memory store");
    }

    match config.classifier {
        Some(classifier_config) => {
            let classifier = HttpClassifier::new(classifier_config).map_err(|e| {
                tracing::error!("failed to create classifier client: {e}");
                e
            })?;
            state = state.with_classifier(Arc::new(classifier));
            tracing::info!("classifier service configured");
        }
        None => tracing::warn!(
            "classifier not configured, submissions use category OTHER and cluster 1"
        ),
    }

    if state.config.auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set, bearer secrets are not checked");
    }

    let app = civic_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("civic API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

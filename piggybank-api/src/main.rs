//! # Piggy Bank API Server
//!
//! Records spending transactions per user and serves a spending analysis
//! with AI-generated advice.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p piggybank-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use piggybank_api::{
    app::{build_router, AppState},
    config::Config,
};
use piggybank_shared::{
    advice::{OpenAiClient, OpenAiConfig},
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    store::PgStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "piggybank_api=debug,piggybank_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!(
        "{} v{} starting...",
        config.app_name,
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(DatabaseConfig::new(
        config.database.url.clone(),
        config.database.max_connections,
    ))
    .await
    .context("Failed to connect to the database")?;

    if config.database.run_migrations {
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
    }

    let advice_client = OpenAiClient::new(OpenAiConfig {
        api_key: config.advice.api_key.clone(),
        base_url: config.advice.base_url.clone(),
        timeout: config.advice.timeout(),
    })
    .context("Failed to build the advice client")?;

    tracing::info!(
        model = %config.advice.model,
        endpoint = advice_client.endpoint(),
        "Advice client ready"
    );

    let bind_address = config.bind_address();
    let state = AppState::new(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(advice_client),
        config,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, draining connections..."),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

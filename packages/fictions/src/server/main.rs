// Main entry point for the fictions API server

use std::sync::Arc;

use anyhow::{Context, Result};
use fictions_core::domains::auth::JwtService;
use fictions_core::kernel::{LocalFileStorage, Notifier, PgStore, ServerDeps, StreamHub};
use fictions_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fictions_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Fictions API");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Events flow action -> notifier worker -> stream hub -> SSE listeners
    let stream_hub = StreamHub::new();
    let notifier = Notifier::spawn(stream_hub.clone());

    let server_deps = Arc::new(ServerDeps::new(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(LocalFileStorage::new(&config.attachments_dir)),
        notifier,
        config.fictions.clone(),
        Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone())),
    ));

    // Drop stream channels whose listeners went away
    let hub_for_cleanup = stream_hub.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            hub_for_cleanup.cleanup().await;
        }
    });

    let app = build_app(server_deps, stream_hub, Some(pool));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("GraphQL endpoint: http://localhost:{}/graphql", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

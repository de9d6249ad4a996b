use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logbook::config::Config;
use logbook::db;
use logbook::migrations::run_migrations;
use logbook::oauth::LineProvider;
use logbook::repositories::{PendingLoginRepository, SessionRepository};
use logbook::routes::{self, RouterStates};
use logbook::session::CookieSettings;
use logbook::version::GIT_VERSION;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first so RUST_LOG from .env applies
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logbook=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting logbook {}", GIT_VERSION);
    tracing::info!("Connecting to database: {}", config.database_url);

    let pool = db::create_pool(&config.database_url)?;
    run_migrations(&pool)?;

    if config.line_channel_id.is_empty() {
        tracing::warn!("LINE_CHANNEL_ID is not set; login will fail");
    }

    spawn_cleanup_task(
        SessionRepository::new(pool.clone()),
        PendingLoginRepository::new(pool.clone()),
    );

    let states = RouterStates::new(
        pool,
        Arc::new(LineProvider::from_config(&config)),
        CookieSettings::from_config(&config),
        &config.frontend_origin,
    );
    let app = routes::create_router(states);

    let addr = config.server_addr();
    tracing::info!("Starting server at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Purge expired sessions and abandoned logins once an hour.
fn spawn_cleanup_task(sessions: SessionRepository, pending_logins: PendingLoginRepository) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match sessions.cleanup_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Removed {} expired sessions", n),
                Err(e) => tracing::error!("Session cleanup failed: {}", e),
            }
            match pending_logins.cleanup_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Removed {} expired pending logins", n),
                Err(e) => tracing::error!("Pending login cleanup failed: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

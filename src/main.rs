//! bank-service - account and balance management server
//!
//! Serves the bank API over HTTP, backed by Postgres or an in-memory store.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bank_service::api::{self, AppState};
use bank_service::domain::Canceller;
use bank_service::{db, Bank, BankService, Config, InMemoryStore, PgBankStore, StorageBackend};

/// Initialize tracing/logging
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bank_service=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.is_production());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let log = tracing::info_span!("bank", environment = %config.environment);

    tracing::info!("Starting bank service");

    match config.storage {
        StorageBackend::Postgres => {
            let database_url = config.database_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("DATABASE_URL is required for the postgres backend")
            })?;

            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;

            db::verify_connection(&pool).await?;
            if config.auto_migrate {
                db::ensure_schema(&pool).await?;
            } else if !db::check_schema(&pool).await? {
                tracing::error!("Database schema is not complete. Please run migrations.");
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }
            tracing::info!("Database connected successfully");

            let store = PgBankStore::new(pool.clone());
            let bank = Bank::new(log, store.clone(), store);
            serve(bank, &config, addr).await?;

            // Cleanup
            pool.close().await;
            tracing::info!("Database connections closed. Goodbye!");
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; accounts are lost on exit");
            let store = InMemoryStore::new();
            let bank = Bank::new(log, store.clone(), store);
            serve(bank, &config, addr).await?;
        }
    }

    Ok(())
}

/// Serve `bank` until a shutdown signal, then cancel stragglers after the grace period
async fn serve<S: BankService>(bank: S, config: &Config, addr: SocketAddr) -> anyhow::Result<()> {
    let canceller = Canceller::new();
    let state =
        AppState::new(Arc::new(bank), config.request_timeout).with_shutdown(canceller.token());
    let app = api::app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let grace = config.shutdown_grace;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                tracing::warn!("Grace period elapsed, cancelling in-flight requests");
                canceller.cancel();
            });
        })
        .await?;

    tracing::info!("Server shutting down...");
    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

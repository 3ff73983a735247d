//! Foodprint API server binary.
//!
//! Serves the user and session endpoints. Signing secrets come from the
//! environment (or `.env`); the server refuses to start without them.

use std::sync::Arc;

use clap::Parser;
use foodprint_core::auth::config::SessionConfig;
use foodprint_core::auth::memory::MemoryCredentialStore;
use foodprint_core::auth::queries::PgCredentialStore;
use foodprint_core::auth::session::SessionManager;
use foodprint_core::auth::store::CredentialStore;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "foodprint_api_server", about = "Foodprint API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/foodprint"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// Keep users in process memory instead of PostgreSQL.
    ///
    /// Everything is lost on exit. Meant for local development.
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,foodprint_api=debug,foodprint_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let config = SessionConfig::from_env()?;
    info!(
        bind_addr = %args.bind_addr,
        access_ttl_secs = config.access_ttl.num_seconds(),
        refresh_ttl_secs = config.refresh_ttl.num_seconds(),
        "starting foodprint_api_server"
    );

    let store: Arc<dyn CredentialStore> = if args.in_memory {
        warn!("using in-memory credential store; accounts will not persist");
        Arc::new(MemoryCredentialStore::new())
    } else {
        info!(max_connections = args.max_connections, "configuring connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&args.database_url)
            .await?;

        info!("running database migrations");
        foodprint_core::migrate::migrate(&pool).await?;
        Arc::new(PgCredentialStore::new(pool))
    };

    let state = foodprint_api::AppState::new(SessionManager::new(store, config));
    let app = foodprint_api::router(state);

    let listener = tokio::net::TcpListener::bind(&args.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

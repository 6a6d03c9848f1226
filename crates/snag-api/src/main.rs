//! # snagd — Snag Tracker Server
//!
//! Assembles the store, the service layer, and the HTTP router, then
//! serves. With a database URL the PostgreSQL store is used (running
//! migrations at startup); without one, the in-memory store backs a
//! throwaway development instance.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use snag_api::{routes, AppState, Config};
use snag_service::{Services, StaticTokenResolver};
use snag_store::{FsBlobStore, MemoryStore, PgStore};

/// Snag defect tracker server.
#[derive(Parser, Debug)]
#[command(name = "snagd", version, about)]
struct Args {
    /// Address to bind, e.g. 0.0.0.0:4000. Overrides SNAG_PORT.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// PostgreSQL connection string. Overrides SNAG_DATABASE_URL; the
    /// in-memory store is used when neither is set.
    #[arg(long)]
    database_url: Option<String>,

    /// Directory for attachment blobs. Overrides SNAG_UPLOAD_DIR.
    #[arg(long)]
    upload_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = Some(database_url);
    }
    if let Some(upload_dir) = args.upload_dir {
        config.upload_dir = upload_dir;
    }

    let blobs = Arc::new(FsBlobStore::new(config.upload_dir.clone()));
    let identity = Arc::new(StaticTokenResolver::new());

    let services = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(8).connect(url).await?;
            let store = PgStore::new(pool);
            store.migrate().await?;
            tracing::info!("using PostgreSQL store");
            Services::new(Arc::new(store), blobs, identity)
        }
        None => {
            tracing::warn!("no database configured; using the in-memory store");
            Services::new(Arc::new(MemoryStore::new()), blobs, identity)
        }
    };

    if config.dev_auth {
        tracing::warn!("development identity headers are enabled");
    }

    let state = AppState::new(Arc::new(services), config.dev_auth);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %config.bind, "snagd listening");
    axum::serve(listener, routes::app(state)).await?;
    Ok(())
}

//! snk-daemon entry point.
//!
//! This file is intentionally thin: it sets up tracing, loads config, picks
//! the storage backend, wires middleware, and starts the HTTP server. All
//! route handlers live in `routes.rs`; shared state lives in `state.rs`.

use std::sync::Arc;

use anyhow::Context;
use snk_daemon::{
    config::{DaemonConfig, StorageKind},
    routes, state,
};
use snk_db::{InventoryStore, MemStore, PgStore};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience).
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cfg = DaemonConfig::from_env().context("invalid daemon configuration")?;
    let store = open_store(&cfg).await?;
    info!(storage = store.backend_name(), "storage ready");

    let shared = Arc::new(state::AppState::new(store, cfg.request_timeout));

    let app = routes::build_router(Arc::clone(&shared)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    info!("snk-daemon listening on http://{}", cfg.addr);

    let listener = tokio::net::TcpListener::bind(cfg.addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    info!("snk-daemon stopped");
    Ok(())
}

async fn open_store(cfg: &DaemonConfig) -> anyhow::Result<Arc<dyn InventoryStore>> {
    match cfg.storage {
        StorageKind::Postgres => {
            let url = cfg
                .database_url
                .as_deref()
                .context("database url missing for postgres storage")?;
            let pg = PgStore::connect(url, cfg.max_connections).await?;
            if cfg.migrate_on_boot {
                snk_db::migrate(pg.pool()).await?;
                info!("migrations applied");
            }
            Ok(Arc::new(pg))
        }
        StorageKind::Memory => {
            warn!("using in-memory storage; inventory is lost on exit");
            Ok(Arc::new(MemStore::new()))
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

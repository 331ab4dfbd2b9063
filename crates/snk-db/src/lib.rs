//! snk-db
//!
//! Storage boundary for SnackInventory: the [`InventoryStore`] trait and its
//! two backends, the [`add_snack`] reconciler, and Postgres bootstrap helpers
//! (connect, migrate, status).

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

mod ctx;
mod error;
mod memory;
mod pg;
mod reconcile;
mod store;

pub use ctx::{CancelHandle, Ctx};
pub use error::{StoreError, StoreErrorKind};
pub use memory::{MemStore, StoreOp};
pub use pg::PgStore;
pub use reconcile::{add_snack, AddSnackOutcome};
pub use store::InventoryStore;

pub const ENV_DB_URL: &str = "SNK_DATABASE_URL";
pub const ENV_DB_MAX_CONNECTIONS: &str = "SNK_DB_MAX_CONNECTIONS";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Connect to Postgres using SNK_DATABASE_URL (pool size from
/// SNK_DB_MAX_CONNECTIONS, default 10).
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let max_connections = match std::env::var(ENV_DB_MAX_CONNECTIONS) {
        Ok(v) => v
            .parse::<u32>()
            .with_context(|| format!("{ENV_DB_MAX_CONNECTIONS} must be a positive integer"))?,
        Err(_) => DEFAULT_MAX_CONNECTIONS,
    };

    connect_pool(&url, max_connections).await
}

/// Build a pool of at most `max_connections` connections to `url`.
pub async fn connect_pool(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .context("failed to connect to Postgres")
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='location_contents'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok,
        has_contents_table: exists,
    })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_contents_table: bool,
}

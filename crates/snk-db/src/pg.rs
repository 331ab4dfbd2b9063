//! Postgres backend.
//!
//! Each trait method is a single statement committed on its own; the
//! reconciler decides the ordering. Failures are classified by SQLSTATE in
//! [`StoreError::from_sqlx`].
//!
//! Writes run under [`Ctx::run_write`]: once a statement is sent its outcome
//! is awaited, so a created row is never reported as not created. Reads race
//! the context with [`Ctx::run`].

use anyhow::Result;
use async_trait::async_trait;
use snk_schemas::{ContentEntry, Location, Snack};
use sqlx::{PgPool, Row};

use crate::ctx::Ctx;
use crate::error::{StoreError, StoreErrorKind};
use crate::store::InventoryStore;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        Ok(Self::new(crate::connect_pool(url, max_connections).await?))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Re-label an AlreadyExists/NotFound with a message naming the key.
fn keyed(err: StoreError, what: &str, key: &str) -> StoreError {
    match err.kind() {
        StoreErrorKind::AlreadyExists => {
            StoreError::already_exists(format!("{what} {key:?} already has an entry"))
        }
        StoreErrorKind::NotFound => StoreError::not_found(format!("{what} {key:?} not found")),
        _ => err,
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn create_snack(&self, ctx: &Ctx, snack: &Snack) -> Result<(), StoreError> {
        ctx.run_write(async {
            sqlx::query(
                r#"
                insert into snack_registry (barcode, name, brand)
                values ($1, $2, $3)
                "#,
            )
            .bind(&snack.barcode)
            .bind(&snack.name)
            .bind(&snack.brand)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                keyed(
                    StoreError::from_sqlx(e, "create_snack"),
                    "barcode",
                    &snack.barcode,
                )
            })?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn list_snacks(&self, ctx: &Ctx) -> Result<Vec<Snack>, StoreError> {
        ctx.run(async {
            let rows: Vec<(String, String, String)> = sqlx::query_as(
                r#"
                select barcode, name, brand
                from snack_registry
                order by barcode
                "#,
            )
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx(e, "list_snacks"))?;

            let snacks: Vec<Snack> = rows
                .into_iter()
                .map(|(barcode, name, brand)| Snack {
                    barcode,
                    name,
                    brand,
                })
                .collect();
            Ok::<_, StoreError>(snacks)
        })
        .await
    }

    async fn update_snack(&self, ctx: &Ctx, snack: &Snack) -> Result<(), StoreError> {
        ctx.run_write(async {
            let res = sqlx::query(
                r#"
                update snack_registry
                set name = $2,
                    brand = $3
                where barcode = $1
                "#,
            )
            .bind(&snack.barcode)
            .bind(&snack.name)
            .bind(&snack.brand)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx(e, "update_snack"))?;

            if res.rows_affected() == 0 {
                return Err(StoreError::not_found(format!(
                    "barcode {:?} not found",
                    snack.barcode
                )));
            }
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn delete_snack(&self, ctx: &Ctx, barcode: &str) -> Result<(), StoreError> {
        ctx.run_write(async {
            let res = sqlx::query("delete from snack_registry where barcode = $1")
                .bind(barcode)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::from_sqlx(e, "delete_snack"))?;

            if res.rows_affected() == 0 {
                return Err(StoreError::not_found(format!("barcode {barcode:?} not found")));
            }
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn create_location(&self, ctx: &Ctx, location: &Location) -> Result<(), StoreError> {
        ctx.run_write(async {
            sqlx::query("insert into location_registry (name) values ($1)")
                .bind(&location.name)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    keyed(StoreError::from_sqlx(e, "create_location"), "name", &location.name)
                })?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn list_locations(&self, ctx: &Ctx) -> Result<Vec<Location>, StoreError> {
        ctx.run(async {
            let rows: Vec<(String,)> =
                sqlx::query_as("select name from location_registry order by name")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| StoreError::from_sqlx(e, "list_locations"))?;

            Ok::<_, StoreError>(rows.into_iter().map(|(name,)| Location { name }).collect())
        })
        .await
    }

    async fn update_location(
        &self,
        ctx: &Ctx,
        name: &str,
        new_name: &str,
    ) -> Result<(), StoreError> {
        ctx.run_write(async {
            // location_contents.location_name is `on update cascade`.
            let res = sqlx::query("update location_registry set name = $2 where name = $1")
                .bind(name)
                .bind(new_name)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    keyed(StoreError::from_sqlx(e, "update_location"), "name", new_name)
                })?;

            if res.rows_affected() == 0 {
                return Err(StoreError::not_found(format!("location {name:?} not found")));
            }
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn delete_location(&self, ctx: &Ctx, name: &str) -> Result<(), StoreError> {
        ctx.run_write(async {
            let res = sqlx::query("delete from location_registry where name = $1")
                .bind(name)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::from_sqlx(e, "delete_location"))?;

            if res.rows_affected() == 0 {
                return Err(StoreError::not_found(format!("location {name:?} not found")));
            }
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn increment_mapping(
        &self,
        ctx: &Ctx,
        barcode: &str,
        location: &str,
    ) -> Result<u64, StoreError> {
        ctx.run_write(async {
            let res = sqlx::query(
                r#"
                update location_contents
                set num_present = num_present + 1
                where snack_barcode = $1
                  and location_name = $2
                "#,
            )
            .bind(barcode)
            .bind(location)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx(e, "increment_mapping"))?;

            Ok::<_, StoreError>(res.rows_affected())
        })
        .await
    }

    async fn insert_mapping(
        &self,
        ctx: &Ctx,
        barcode: &str,
        location: &str,
    ) -> Result<(), StoreError> {
        ctx.run_write(async {
            // The upsert arm only fires when a concurrent caller inserted the
            // same mapping after our increment missed; both placements count.
            sqlx::query(
                r#"
                insert into location_contents (snack_barcode, location_name, num_present)
                values ($1, $2, 1)
                on conflict (snack_barcode, location_name)
                do update set num_present = location_contents.num_present + 1
                "#,
            )
            .bind(barcode)
            .bind(location)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx(e, "insert_mapping"))?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn list_contents(
        &self,
        ctx: &Ctx,
        location: Option<&str>,
    ) -> Result<Vec<ContentEntry>, StoreError> {
        ctx.run(async {
            let rows = sqlx::query(
                r#"
                select
                  c.location_name,
                  s.barcode,
                  s.name,
                  s.brand,
                  c.num_present
                from location_contents c
                join snack_registry s on s.barcode = c.snack_barcode
                where ($1::text is null or c.location_name = $1)
                order by c.location_name, s.barcode
                "#,
            )
            .bind(location)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::from_sqlx(e, "list_contents"))?;

            rows.iter()
                .map(|row| -> Result<ContentEntry, sqlx::Error> {
                    Ok(ContentEntry {
                        location_name: row.try_get("location_name")?,
                        snack: Snack {
                            barcode: row.try_get("barcode")?,
                            name: row.try_get("name")?,
                            brand: row.try_get("brand")?,
                        },
                        count: row.try_get("num_present")?,
                    })
                })
                .collect::<Result<Vec<_>, sqlx::Error>>()
                .map_err(|e| StoreError::from_sqlx(e, "list_contents decode"))
        })
        .await
    }
}

//! AddSnack reconciliation: increment an existing (snack, location) mapping,
//! or create the mapping, auto-creating missing parent rows first.
//!
//! Order of statements (each commits on its own):
//!
//! 1. increment the mapping; one row affected means done.
//! 2. insert the mapping with count 1; success means done.
//! 3. on a foreign-key miss: create the snack, create the location (an
//!    existing row is fine), then insert the mapping one more time.
//!
//! Parent rows created in step 3 are never rolled back. The created flags are
//! returned with every outcome, including failures, so callers can see what
//! the repair left behind.

use snk_schemas::{Location, Snack};
use tracing::{debug, info, warn};

use crate::ctx::Ctx;
use crate::error::StoreError;
use crate::store::InventoryStore;

/// Result of [`add_snack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddSnackOutcome {
    /// A snack row was newly created during repair.
    pub snack_created: bool,
    /// A location row was newly created during repair.
    pub location_created: bool,
    pub result: Result<(), StoreError>,
}

impl AddSnackOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&StoreError> {
        self.result.as_ref().err()
    }

    /// Drop the flags and keep only the result.
    pub fn into_result(self) -> Result<(), StoreError> {
        self.result
    }
}

#[derive(Debug, Default)]
struct Created {
    snack: bool,
    location: bool,
}

/// Add one unit of `barcode` to `location`.
pub async fn add_snack<S>(store: &S, ctx: &Ctx, barcode: &str, location: &str) -> AddSnackOutcome
where
    S: InventoryStore + ?Sized,
{
    let mut created = Created::default();
    let result = reconcile(store, ctx, barcode, location, &mut created).await;

    if let Err(e) = &result {
        warn!(
            barcode,
            location,
            snack_created = created.snack,
            location_created = created.location,
            error = %e,
            "add_snack failed"
        );
    }

    AddSnackOutcome {
        snack_created: created.snack,
        location_created: created.location,
        result,
    }
}

async fn reconcile<S>(
    store: &S,
    ctx: &Ctx,
    barcode: &str,
    location: &str,
    created: &mut Created,
) -> Result<(), StoreError>
where
    S: InventoryStore + ?Sized,
{
    let affected = store.increment_mapping(ctx, barcode, location).await?;
    if affected > 0 {
        debug!(barcode, location, "add_snack: incremented existing mapping");
        return Ok(());
    }

    match store.insert_mapping(ctx, barcode, location).await {
        Ok(()) => {
            debug!(barcode, location, "add_snack: inserted new mapping");
            return Ok(());
        }
        Err(e) if e.is_foreign_key_violation() => {
            info!(barcode, location, "add_snack: missing parent row, repairing");
        }
        Err(e) => return Err(e),
    }

    created.snack = created_unless_exists(store.create_snack(ctx, &Snack::minimal(barcode)).await)?;
    created.location =
        created_unless_exists(store.create_location(ctx, &Location::new(location)).await)?;

    store.insert_mapping(ctx, barcode, location).await?;
    info!(
        barcode,
        location,
        snack_created = created.snack,
        location_created = created.location,
        "add_snack: repaired parents and inserted mapping"
    );
    Ok(())
}

/// `Ok(true)` for a fresh row, `Ok(false)` if someone else already created it.
fn created_unless_exists(res: Result<(), StoreError>) -> Result<bool, StoreError> {
    match res {
        Ok(()) => Ok(true),
        Err(e) if e.is_already_exists() => Ok(false),
        Err(e) => Err(e),
    }
}

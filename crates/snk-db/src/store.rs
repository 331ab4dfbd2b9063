//! Storage capability boundary.
//!
//! [`InventoryStore`] is implemented by [`crate::PgStore`] (production) and
//! [`crate::MemStore`] (in-process backend and test double). The daemon holds
//! an `Arc<dyn InventoryStore>` chosen at startup.

use async_trait::async_trait;
use snk_schemas::{ContentEntry, Location, Snack};

use crate::ctx::Ctx;
use crate::error::StoreError;

/// Storage contract shared by every backend.
///
/// Every method must honor `ctx` (fail with `Cancelled`/`DeadlineExceeded`
/// instead of issuing or completing the statement) and must classify its
/// failures into [`crate::StoreErrorKind`].
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Short name for logs and health output (e.g. `"postgres"`).
    fn backend_name(&self) -> &'static str;

    // --- snack registry ---------------------------------------------------

    /// `AlreadyExists` if the barcode is registered.
    async fn create_snack(&self, ctx: &Ctx, snack: &Snack) -> Result<(), StoreError>;

    /// All snacks, ordered by barcode.
    async fn list_snacks(&self, ctx: &Ctx) -> Result<Vec<Snack>, StoreError>;

    /// Overwrite name and brand. `NotFound` if the barcode is absent.
    async fn update_snack(&self, ctx: &Ctx, snack: &Snack) -> Result<(), StoreError>;

    /// `NotFound` if absent. Removes the snack's mappings.
    async fn delete_snack(&self, ctx: &Ctx, barcode: &str) -> Result<(), StoreError>;

    // --- location registry ------------------------------------------------

    /// `AlreadyExists` if the name is registered.
    async fn create_location(&self, ctx: &Ctx, location: &Location) -> Result<(), StoreError>;

    /// All locations, ordered by name.
    async fn list_locations(&self, ctx: &Ctx) -> Result<Vec<Location>, StoreError>;

    /// Rename a location, carrying its mappings. `NotFound` if `name` is
    /// absent, `AlreadyExists` if `new_name` is taken.
    async fn update_location(&self, ctx: &Ctx, name: &str, new_name: &str)
        -> Result<(), StoreError>;

    /// `NotFound` if absent. Removes the location's mappings.
    async fn delete_location(&self, ctx: &Ctx, name: &str) -> Result<(), StoreError>;

    // --- location contents ------------------------------------------------

    /// Add one to the count of `(barcode, location)` if that mapping exists.
    /// Returns the number of rows affected (0 or 1).
    async fn increment_mapping(
        &self,
        ctx: &Ctx,
        barcode: &str,
        location: &str,
    ) -> Result<u64, StoreError>;

    /// Insert `(barcode, location, count = 1)`.
    ///
    /// `ForeignKeyViolation` if either parent row is missing. If the mapping
    /// was created concurrently since the caller's increment attempt, the
    /// existing row is incremented instead of failing.
    async fn insert_mapping(&self, ctx: &Ctx, barcode: &str, location: &str)
        -> Result<(), StoreError>;

    /// Mapping rows joined with their snack, ordered by (location, barcode).
    /// `location = None` lists every location.
    async fn list_contents(
        &self,
        ctx: &Ctx,
        location: Option<&str>,
    ) -> Result<Vec<ContentEntry>, StoreError>;
}

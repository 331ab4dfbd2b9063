//! In-process backend.
//!
//! Enforces the same key, foreign-key, and cascade rules as the Postgres
//! schema, so it can stand in for it in tests and in `SNK_STORAGE=memory`
//! dev runs. Tests can inject failures and latency per operation and read
//! back how many times each operation was called.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use snk_schemas::{ContentEntry, Location, Snack};

use crate::ctx::Ctx;
use crate::error::{StoreError, StoreErrorKind};
use crate::store::InventoryStore;

/// Operations exposed by [`InventoryStore`], used to target injected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    CreateSnack,
    ListSnacks,
    UpdateSnack,
    DeleteSnack,
    CreateLocation,
    ListLocations,
    UpdateLocation,
    DeleteLocation,
    IncrementMapping,
    InsertMapping,
    ListContents,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoreOp::CreateSnack => "create_snack",
            StoreOp::ListSnacks => "list_snacks",
            StoreOp::UpdateSnack => "update_snack",
            StoreOp::DeleteSnack => "delete_snack",
            StoreOp::CreateLocation => "create_location",
            StoreOp::ListLocations => "list_locations",
            StoreOp::UpdateLocation => "update_location",
            StoreOp::DeleteLocation => "delete_location",
            StoreOp::IncrementMapping => "increment_mapping",
            StoreOp::InsertMapping => "insert_mapping",
            StoreOp::ListContents => "list_contents",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default)]
struct Tables {
    snacks: BTreeMap<String, Snack>,
    locations: BTreeSet<String>,
    /// (location_name, snack_barcode) -> count. Keyed location-first so
    /// iteration matches the list_contents ordering.
    contents: BTreeMap<(String, String), i64>,
}

#[derive(Debug, Default)]
struct Hooks {
    faults: HashMap<StoreOp, VecDeque<StoreErrorKind>>,
    delays: HashMap<StoreOp, Duration>,
    calls: HashMap<StoreOp, usize>,
}

#[derive(Debug, Default)]
pub struct MemStore {
    tables: Mutex<Tables>,
    hooks: Mutex<Hooks>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call to `op` fail with `kind` before touching any table.
    /// Repeated calls queue further failures.
    pub fn fail_next(&self, op: StoreOp, kind: StoreErrorKind) {
        self.hooks
            .lock()
            .faults
            .entry(op)
            .or_default()
            .push_back(kind);
    }

    /// Delay every call to `op` by `delay` (still bounded by the caller's ctx).
    pub fn set_delay(&self, op: StoreOp, delay: Duration) {
        self.hooks.lock().delays.insert(op, delay);
    }

    /// Number of times `op` was invoked, including failed invocations.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.hooks.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Current count for one mapping, `None` if the mapping does not exist.
    pub fn count(&self, barcode: &str, location: &str) -> Option<i64> {
        self.tables
            .lock()
            .contents
            .get(&(location.to_string(), barcode.to_string()))
            .copied()
    }

    pub fn snack(&self, barcode: &str) -> Option<Snack> {
        self.tables.lock().snacks.get(barcode).cloned()
    }

    pub fn has_location(&self, name: &str) -> bool {
        self.tables.lock().locations.contains(name)
    }

    /// Number of mapping rows across all locations.
    pub fn mapping_rows(&self) -> usize {
        self.tables.lock().contents.len()
    }

    /// Mappings whose snack or location row is missing. Always empty unless
    /// the cascade rules are broken.
    pub fn dangling_mappings(&self) -> Vec<(String, String)> {
        let t = self.tables.lock();
        t.contents
            .keys()
            .filter(|(loc, bc)| !t.locations.contains(loc) || !t.snacks.contains_key(bc))
            .map(|(loc, bc)| (bc.clone(), loc.clone()))
            .collect()
    }

    /// Common prologue: count the call, honor ctx and any configured delay,
    /// then surface an injected fault.
    async fn enter(&self, ctx: &Ctx, op: StoreOp) -> Result<(), StoreError> {
        let (delay, fault) = {
            let mut hooks = self.hooks.lock();
            *hooks.calls.entry(op).or_insert(0) += 1;
            let delay = hooks.delays.get(&op).copied();
            let fault = hooks.faults.get_mut(&op).and_then(|q| q.pop_front());
            (delay, fault)
        };

        match delay {
            Some(d) => {
                ctx.run(async {
                    tokio::time::sleep(d).await;
                    Ok(())
                })
                .await?
            }
            None => {
                if let Some(e) = ctx.err() {
                    return Err(e);
                }
            }
        }

        match fault {
            Some(kind) => Err(StoreError::new(kind, format!("{op} failed: injected fault"))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl InventoryStore for MemStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create_snack(&self, ctx: &Ctx, snack: &Snack) -> Result<(), StoreError> {
        self.enter(ctx, StoreOp::CreateSnack).await?;
        let mut t = self.tables.lock();
        if t.snacks.contains_key(&snack.barcode) {
            return Err(StoreError::already_exists(format!(
                "barcode {:?} already has an entry",
                snack.barcode
            )));
        }
        t.snacks.insert(snack.barcode.clone(), snack.clone());
        Ok(())
    }

    async fn list_snacks(&self, ctx: &Ctx) -> Result<Vec<Snack>, StoreError> {
        self.enter(ctx, StoreOp::ListSnacks).await?;
        Ok(self.tables.lock().snacks.values().cloned().collect())
    }

    async fn update_snack(&self, ctx: &Ctx, snack: &Snack) -> Result<(), StoreError> {
        self.enter(ctx, StoreOp::UpdateSnack).await?;
        let mut t = self.tables.lock();
        match t.snacks.get_mut(&snack.barcode) {
            Some(row) => {
                row.name = snack.name.clone();
                row.brand = snack.brand.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(format!(
                "barcode {:?} not found",
                snack.barcode
            ))),
        }
    }

    async fn delete_snack(&self, ctx: &Ctx, barcode: &str) -> Result<(), StoreError> {
        self.enter(ctx, StoreOp::DeleteSnack).await?;
        let mut t = self.tables.lock();
        if t.snacks.remove(barcode).is_none() {
            return Err(StoreError::not_found(format!("barcode {barcode:?} not found")));
        }
        t.contents.retain(|(_, bc), _| bc != barcode);
        Ok(())
    }

    async fn create_location(&self, ctx: &Ctx, location: &Location) -> Result<(), StoreError> {
        self.enter(ctx, StoreOp::CreateLocation).await?;
        let mut t = self.tables.lock();
        if !t.locations.insert(location.name.clone()) {
            return Err(StoreError::already_exists(format!(
                "name {:?} already has an entry",
                location.name
            )));
        }
        Ok(())
    }

    async fn list_locations(&self, ctx: &Ctx) -> Result<Vec<Location>, StoreError> {
        self.enter(ctx, StoreOp::ListLocations).await?;
        Ok(self
            .tables
            .lock()
            .locations
            .iter()
            .map(|n| Location::new(n))
            .collect())
    }

    async fn update_location(
        &self,
        ctx: &Ctx,
        name: &str,
        new_name: &str,
    ) -> Result<(), StoreError> {
        self.enter(ctx, StoreOp::UpdateLocation).await?;
        let mut t = self.tables.lock();
        if !t.locations.contains(name) {
            return Err(StoreError::not_found(format!("location {name:?} not found")));
        }
        if name == new_name {
            return Ok(());
        }
        if t.locations.contains(new_name) {
            return Err(StoreError::already_exists(format!(
                "name {new_name:?} already has an entry"
            )));
        }
        t.locations.remove(name);
        t.locations.insert(new_name.to_string());

        let moved: Vec<((String, String), i64)> = t
            .contents
            .iter()
            .filter(|((loc, _), _)| loc == name)
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        for ((_, bc), count) in moved {
            t.contents.remove(&(name.to_string(), bc.clone()));
            t.contents.insert((new_name.to_string(), bc), count);
        }
        Ok(())
    }

    async fn delete_location(&self, ctx: &Ctx, name: &str) -> Result<(), StoreError> {
        self.enter(ctx, StoreOp::DeleteLocation).await?;
        let mut t = self.tables.lock();
        if !t.locations.remove(name) {
            return Err(StoreError::not_found(format!("location {name:?} not found")));
        }
        t.contents.retain(|(loc, _), _| loc != name);
        Ok(())
    }

    async fn increment_mapping(
        &self,
        ctx: &Ctx,
        barcode: &str,
        location: &str,
    ) -> Result<u64, StoreError> {
        self.enter(ctx, StoreOp::IncrementMapping).await?;
        let mut t = self.tables.lock();
        match t
            .contents
            .get_mut(&(location.to_string(), barcode.to_string()))
        {
            Some(count) => {
                *count += 1;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn insert_mapping(
        &self,
        ctx: &Ctx,
        barcode: &str,
        location: &str,
    ) -> Result<(), StoreError> {
        self.enter(ctx, StoreOp::InsertMapping).await?;
        let mut t = self.tables.lock();
        if !t.snacks.contains_key(barcode) {
            return Err(StoreError::foreign_key_violation(format!(
                "snack {barcode:?} is not registered"
            )));
        }
        if !t.locations.contains(location) {
            return Err(StoreError::foreign_key_violation(format!(
                "location {location:?} is not registered"
            )));
        }
        *t.contents
            .entry((location.to_string(), barcode.to_string()))
            .or_insert(0) += 1;
        Ok(())
    }

    async fn list_contents(
        &self,
        ctx: &Ctx,
        location: Option<&str>,
    ) -> Result<Vec<ContentEntry>, StoreError> {
        self.enter(ctx, StoreOp::ListContents).await?;
        let t = self.tables.lock();
        let mut out = Vec::new();
        for ((loc, bc), count) in &t.contents {
            if location.is_some_and(|want| want != loc.as_str()) {
                continue;
            }
            let snack = t
                .snacks
                .get(bc)
                .cloned()
                .unwrap_or_else(|| Snack::minimal(bc));
            out.push(ContentEntry {
                location_name: loc.clone(),
                snack,
                count: *count,
            });
        }
        Ok(out)
    }
}

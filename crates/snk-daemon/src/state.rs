//! Shared runtime state for snk-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum; this module owns
//! nothing async itself.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use snk_db::{Ctx, InventoryStore};

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    pub store: Arc<dyn InventoryStore>,
    /// Deadline applied to the storage work of each request.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn InventoryStore>, request_timeout: Duration) -> Self {
        Self {
            build: BuildInfo {
                service: "snk-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            store,
            request_timeout,
        }
    }

    /// Fresh per-request context. A client disconnect drops the handler
    /// future, which abandons any storage call still in flight.
    pub fn ctx(&self) -> Ctx {
        Ctx::with_timeout(self.request_timeout)
    }
}

//! Shared row and wire types for SnackInventory.
//!
//! Domain rows live here; request/response bodies for the daemon's RPC
//! surface live in [`api`]. Both the daemon and the CLI depend on this crate
//! so the JSON shapes cannot drift apart.

use serde::{Deserialize, Serialize};

pub mod api;

/// A registered snack, keyed by barcode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snack {
    pub barcode: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
}

impl Snack {
    /// Minimal row used when a snack is referenced before it was registered.
    pub fn minimal(barcode: &str) -> Self {
        Self {
            barcode: barcode.to_string(),
            name: String::new(),
            brand: String::new(),
        }
    }
}

/// A registered storage place, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
}

impl Location {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// One row of the (snack, location) -> count mapping, joined with the snack
/// registry so callers get display fields without a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub location_name: String,
    pub snack: Snack,
    pub count: i64,
}

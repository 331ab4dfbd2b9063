//! Request and response bodies for every daemon RPC.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded by
//! Axum on the server and decoded by the CLI. No business logic lives here.

use serde::{Deserialize, Serialize};

use crate::{ContentEntry, Location, Snack};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Body returned with every non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable category, e.g. "ALREADY_EXISTS", "NOT_FOUND", "INVALID_ARGUMENT".
    pub code: String,
    pub error: String,
}

/// Empty acknowledgement body for mutating calls that return nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {}

// ---------------------------------------------------------------------------
// Snack registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSnackRequest {
    pub snack: Snack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSnacksResponse {
    pub snacks: Vec<Snack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSnackRequest {
    pub snack: Snack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSnackRequest {
    pub barcode: String,
}

// ---------------------------------------------------------------------------
// Location registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocationRequest {
    pub location: Location,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListLocationsResponse {
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLocationRequest {
    pub name: String,
    pub new_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteLocationRequest {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Location contents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSnackRequest {
    pub snack_barcode: String,
    pub location_name: String,
}

/// Result of `AddSnack`.
///
/// The created flags are populated even when `error` is set: parent rows
/// created before a failure stay in place and callers need to know about them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSnackResponse {
    pub snack_created: bool,
    pub location_created: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListContentsRequest {
    /// Restrict to one location; `None` (or empty) lists every location.
    #[serde(default)]
    pub location_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListContentsResponse {
    pub contents: Vec<ContentEntry>,
}

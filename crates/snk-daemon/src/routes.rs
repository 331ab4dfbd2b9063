//! Axum router and all HTTP handlers for snk-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers validate input, build a per-request [`Ctx`]
//! and delegate to the store; status mapping lives in `api_types`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use snk_db::{add_snack, Ctx};
use snk_schemas::api::{
    Ack, AddSnackRequest, AddSnackResponse, CreateLocationRequest, CreateSnackRequest,
    DeleteLocationRequest, DeleteSnackRequest, ListContentsRequest, ListContentsResponse,
    ListLocationsResponse, ListSnacksResponse, UpdateLocationRequest, UpdateSnackRequest,
};
use tracing::{info, warn};

use crate::{
    api_types::{error_body, status_for, ApiError, HealthResponse},
    state::AppState,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (tracing) are **not** applied here; `main.rs` attaches
/// them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/snacks/create", post(create_snack))
        .route("/v1/snacks/list", get(list_snacks))
        .route("/v1/snacks/update", post(update_snack))
        .route("/v1/snacks/delete", post(delete_snack))
        .route("/v1/locations/create", post(create_location))
        .route("/v1/locations/list", get(list_locations))
        .route("/v1/locations/update", post(update_location))
        .route("/v1/locations/delete", post(delete_location))
        .route("/v1/contents/add", post(add_snack_handler))
        .route("/v1/contents/list", post(list_contents))
        .with_state(state)
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid_argument(format!("{field} must not be empty")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
            storage: st.store.backend_name().to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Snack registry
// ---------------------------------------------------------------------------

pub(crate) async fn create_snack(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CreateSnackRequest>,
) -> ApiResult<Ack> {
    require("barcode", &req.snack.barcode)?;
    st.store.create_snack(&st.ctx(), &req.snack).await?;
    info!(barcode = %req.snack.barcode, "snack created");
    Ok(Json(Ack {}))
}

pub(crate) async fn list_snacks(State(st): State<Arc<AppState>>) -> ApiResult<ListSnacksResponse> {
    let snacks = st.store.list_snacks(&st.ctx()).await?;
    Ok(Json(ListSnacksResponse { snacks }))
}

pub(crate) async fn update_snack(
    State(st): State<Arc<AppState>>,
    Json(req): Json<UpdateSnackRequest>,
) -> ApiResult<Ack> {
    require("barcode", &req.snack.barcode)?;
    st.store.update_snack(&st.ctx(), &req.snack).await?;
    info!(barcode = %req.snack.barcode, "snack updated");
    Ok(Json(Ack {}))
}

pub(crate) async fn delete_snack(
    State(st): State<Arc<AppState>>,
    Json(req): Json<DeleteSnackRequest>,
) -> ApiResult<Ack> {
    require("barcode", &req.barcode)?;
    st.store.delete_snack(&st.ctx(), &req.barcode).await?;
    info!(barcode = %req.barcode, "snack deleted");
    Ok(Json(Ack {}))
}

// ---------------------------------------------------------------------------
// Location registry
// ---------------------------------------------------------------------------

pub(crate) async fn create_location(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CreateLocationRequest>,
) -> ApiResult<Ack> {
    require("location name", &req.location.name)?;
    st.store.create_location(&st.ctx(), &req.location).await?;
    info!(location = %req.location.name, "location created");
    Ok(Json(Ack {}))
}

pub(crate) async fn list_locations(
    State(st): State<Arc<AppState>>,
) -> ApiResult<ListLocationsResponse> {
    let locations = st.store.list_locations(&st.ctx()).await?;
    Ok(Json(ListLocationsResponse { locations }))
}

/// Rename a location. Its contents follow the new name.
pub(crate) async fn update_location(
    State(st): State<Arc<AppState>>,
    Json(req): Json<UpdateLocationRequest>,
) -> ApiResult<Ack> {
    require("location name", &req.name)?;
    require("new location name", &req.new_name)?;
    st.store
        .update_location(&st.ctx(), &req.name, &req.new_name)
        .await?;
    info!(from = %req.name, to = %req.new_name, "location renamed");
    Ok(Json(Ack {}))
}

pub(crate) async fn delete_location(
    State(st): State<Arc<AppState>>,
    Json(req): Json<DeleteLocationRequest>,
) -> ApiResult<Ack> {
    require("location name", &req.name)?;
    st.store.delete_location(&st.ctx(), &req.name).await?;
    info!(location = %req.name, "location deleted");
    Ok(Json(Ack {}))
}

// ---------------------------------------------------------------------------
// POST /v1/contents/add
// ---------------------------------------------------------------------------

/// Add one unit of a snack to a location.
///
/// The body is always an [`AddSnackResponse`]: on failure the created flags
/// still report which parent rows the repair left behind.
pub(crate) async fn add_snack_handler(
    State(st): State<Arc<AppState>>,
    Json(req): Json<AddSnackRequest>,
) -> Response {
    if let Err(e) = require("snack barcode", &req.snack_barcode)
        .and_then(|_| require("location name", &req.location_name))
    {
        return (
            e.status,
            Json(AddSnackResponse {
                error: Some(e.body),
                ..AddSnackResponse::default()
            }),
        )
            .into_response();
    }

    let ctx: Ctx = st.ctx();
    let out = add_snack(
        st.store.as_ref(),
        &ctx,
        &req.snack_barcode,
        &req.location_name,
    )
    .await;

    let mut body = AddSnackResponse {
        snack_created: out.snack_created,
        location_created: out.location_created,
        error: None,
    };

    match out.error() {
        None => (StatusCode::OK, Json(body)).into_response(),
        Some(err) => {
            warn!(
                barcode = %req.snack_barcode,
                location = %req.location_name,
                snack_created = body.snack_created,
                location_created = body.location_created,
                error = %err,
                "add snack failed"
            );
            body.error = Some(error_body(err));
            (status_for(err.kind()), Json(body)).into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// POST /v1/contents/list
// ---------------------------------------------------------------------------

pub(crate) async fn list_contents(
    State(st): State<Arc<AppState>>,
    Json(req): Json<ListContentsRequest>,
) -> ApiResult<ListContentsResponse> {
    let filter = req.location_name.as_deref().filter(|l| !l.trim().is_empty());
    let contents = st.store.list_contents(&st.ctx(), filter).await?;
    Ok(Json(ListContentsResponse { contents }))
}

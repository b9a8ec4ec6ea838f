//! Serial key endpoint handlers

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Query};
use crate::domain::serial_key::{KeyPlan, RecordField, SerialKeyRecord};

#[derive(Debug, Deserialize)]
pub struct CreateParams {
    pub customer: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub keyword: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateParams {
    pub serial: String,
}

/// Create the serial key router
pub fn create_serial_key_router() -> Router<AppState> {
    Router::new()
        .route("/create/m", post(create_monthly))
        .route("/create/y", post(create_yearly))
        .route("/inquiry", get(list_all))
        .route("/inquiry/{field}", get(list_field))
        .route("/search", get(search))
        .route("/validate_serial", get(validate_serial))
}

/// POST /create/m
pub async fn create_monthly(
    State(state): State<AppState>,
    Query(params): Query<CreateParams>,
) -> Result<Json<SerialKeyRecord>, ApiError> {
    issue(&state, KeyPlan::Monthly, &params.customer).await
}

/// POST /create/y
pub async fn create_yearly(
    State(state): State<AppState>,
    Query(params): Query<CreateParams>,
) -> Result<Json<SerialKeyRecord>, ApiError> {
    issue(&state, KeyPlan::Yearly, &params.customer).await
}

async fn issue(
    state: &AppState,
    plan: KeyPlan,
    customer: &str,
) -> Result<Json<SerialKeyRecord>, ApiError> {
    let record = state.serial_key_service.issue(plan, customer).await?;
    Ok(Json(record))
}

/// GET /inquiry
pub async fn list_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<SerialKeyRecord>>, ApiError> {
    debug!("Listing all serial keys");

    let records = state.serial_key_service.list().await?;
    Ok(Json(records))
}

/// GET /inquiry/{field}
pub async fn list_field(
    State(state): State<AppState>,
    Path(field): Path<String>,
) -> Result<Json<Vec<Map<String, Value>>>, ApiError> {
    let field = RecordField::from_str(&field).ok_or_else(ApiError::route_not_found)?;
    debug!(field = %field, "Projecting serial keys");

    let projected = state.serial_key_service.project(field).await?;
    Ok(Json(projected))
}

/// GET /search
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SerialKeyRecord>>, ApiError> {
    let matches = state.serial_key_service.search(&params.keyword).await?;
    Ok(Json(matches))
}

/// GET /validate_serial
pub async fn validate_serial(
    State(state): State<AppState>,
    Query(params): Query<ValidateParams>,
) -> Result<Json<Vec<SerialKeyRecord>>, ApiError> {
    debug!(serial = %params.serial, "Validating serial key");

    let found = state.serial_key_service.validate(&params.serial).await?;
    Ok(Json(found))
}

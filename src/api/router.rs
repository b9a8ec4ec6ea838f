use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::health;
use super::middleware::{logging_middleware, REQUEST_ID_HEADER};
use super::serial_keys;
use super::state::AppState;
use super::types::ApiError;

/// Create the full router with application state
///
/// Unknown routes answer 404 `{"detail": "Not Found"}`. With `cors_enabled`,
/// any origin, method and header is allowed.
pub fn create_router(state: AppState, cors_enabled: bool) -> Router {
    let request_id = axum::http::HeaderName::from_static(REQUEST_ID_HEADER);

    let router = Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Serial key API
        .merge(serial_keys::create_serial_key_router())
        .fallback(|| async { ApiError::route_not_found() })
        // Add state and middleware
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        );

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use tandem_shared::errors::StoreResult;
use tandem_shared::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

/// Liveness plus a storage probe.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let checks = vec![store_check(state.store.ping())];
    let response = HealthResponse::from_checks("tandem-api", env!("CARGO_PKG_VERSION"), checks);

    let status = match response.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (status, Json(response)).into_response()
}

fn store_check(ping: StoreResult<()>) -> HealthCheck {
    match ping {
        Ok(()) => HealthCheck::passed("store"),
        Err(e) => {
            tracing::error!(error = %e, "store health probe failed");
            HealthCheck::failed("store", "unreachable")
        }
    }
}

/// Prometheus exposition. Empty when no recorder was installed.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|h| h.render())
        .unwrap_or_default()
}

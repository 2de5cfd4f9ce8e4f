use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store: StoreHealth,
}

#[derive(Serialize)]
pub struct StoreHealth {
    pub backend: &'static str,
    pub status: &'static str,
}

/// Health check endpoint - public
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let procurement = &state.procurement;
    let result = procurement.health_check().await;

    if let Err(e) = &result {
        tracing::error!(error = %e, backend = procurement.backend(), "Store health check failed");
    }

    // The store is the only critical dependency
    let (status, status_code, store_status) = match result {
        Ok(()) => ("healthy", StatusCode::OK, "ok"),
        Err(_) => ("unhealthy", StatusCode::SERVICE_UNAVAILABLE, "error"),
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            store: StoreHealth {
                backend: procurement.backend(),
                status: store_status,
            },
        }),
    )
}

//! Health check endpoint handler.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use helios_vstore::core::VersionStore;
use tracing::{debug, warn};

use crate::state::AppState;

/// Handler for the health check endpoint.
///
/// Reports the backend and the number of logical resources it holds.
///
/// # HTTP Request
///
/// `GET [base]/health`
///
/// # Response
///
/// - `200 OK` - Server is healthy
/// - `503 Service Unavailable` - The backend cannot be queried
pub async fn health_handler<S>(State(state): State<AppState<S>>) -> Response
where
    S: VersionStore + Send + Sync,
{
    debug!("Processing health check request");

    let backend_name = state.repository().backend_name();
    let timestamp = chrono::Utc::now().to_rfc3339();

    match state.repository().store().resource_count().await {
        Ok(resources) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "backend": backend_name,
                "resources": resources,
                "timestamp": timestamp
            })),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "backend": backend_name,
                    "error": e.to_string(),
                    "timestamp": timestamp
                })),
            )
                .into_response()
        }
    }
}

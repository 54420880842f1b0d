//! Version read (vread) interaction handler.
//!
//! `GET [base]/[type]/[id]/_history/[vid]`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use helios_vstore::core::VersionStore;
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::responses::format::{render_resource, resource_response};
use crate::responses::headers::ResourceHeaders;
use crate::state::AppState;

/// Handler for the vread interaction.
///
/// # Response
///
/// - `200 OK` - The requested version
/// - `404 Not Found` - Resource or version does not exist
/// - `410 Gone` - The requested version is a tombstone
pub async fn vread_handler<S>(
    State(state): State<AppState<S>>,
    Path((resource_type, id, version_id)): Path<(String, String, String)>,
) -> RestResult<Response>
where
    S: VersionStore + Send + Sync,
{
    debug!(
        resource_type = %resource_type,
        id = %id,
        version_id = %version_id,
        "Processing vread request"
    );

    // Version numbers start at 1; anything else cannot exist.
    let version = match version_id.parse::<u64>() {
        Ok(v) if v >= 1 => v,
        _ => {
            return Err(RestError::VersionNotFound {
                resource_type,
                id,
                version_id,
            });
        }
    };

    let record = state
        .repository()
        .vread(&resource_type, &id, version)
        .await?;

    Ok(resource_response(
        StatusCode::OK,
        ResourceHeaders::from_record(&record),
        Some(render_resource(&record)),
    ))
}

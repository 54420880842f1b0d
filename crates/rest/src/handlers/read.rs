//! Read interaction handler.
//!
//! Implements the FHIR [read interaction](https://hl7.org/fhir/http.html#read):
//! `GET [base]/[type]/[id]`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use helios_vstore::core::VersionStore;
use helios_vstore::repository::ReadOutcome;
use tracing::debug;

use crate::error::RestResult;
use crate::middleware::conditional::ConditionalHeaders;
use crate::responses::format::{render_resource, resource_response};
use crate::responses::headers::ResourceHeaders;
use crate::state::AppState;

/// Handler for the read interaction.
///
/// Reads the current version of a resource.
///
/// # Headers
///
/// - `If-None-Match` - Return 304 Not Modified if any listed ETag matches
/// - `If-Modified-Since` - Return 304 Not Modified if not modified since date
///
/// # Response
///
/// - `200 OK` - Resource found, returns the resource
/// - `304 Not Modified` - Resource unchanged (conditional read)
/// - `404 Not Found` - Resource does not exist
/// - `410 Gone` - Resource was deleted
///
/// # Example
///
/// ```http
/// GET /Patient/123 HTTP/1.1
/// If-None-Match: W/"2"
/// ```
pub async fn read_handler<S>(
    State(state): State<AppState<S>>,
    Path((resource_type, id)): Path<(String, String)>,
    conditional: ConditionalHeaders,
) -> RestResult<Response>
where
    S: VersionStore + Send + Sync,
{
    debug!(resource_type = %resource_type, id = %id, "Processing read request");

    let outcome = state
        .repository()
        .read_conditional(&resource_type, &id, conditional.request())
        .await?;

    match outcome {
        ReadOutcome::NotModified(record) => {
            debug!(etag = %record.etag(), "Returning 304 Not Modified");
            Ok(resource_response(
                StatusCode::NOT_MODIFIED,
                ResourceHeaders::from_record(&record),
                None,
            ))
        }
        ReadOutcome::Found(record) => {
            debug!(
                resource_type = %resource_type,
                id = %id,
                version = record.version_id(),
                "Returning resource"
            );
            Ok(resource_response(
                StatusCode::OK,
                ResourceHeaders::from_record(&record),
                Some(render_resource(&record)),
            ))
        }
    }
}

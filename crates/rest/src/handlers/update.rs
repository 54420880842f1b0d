//! Update interaction handler.
//!
//! `PUT [base]/[type]/[id]`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use helios_vstore::core::VersionStore;
use helios_vstore::error::{ResourceError, StorageError};
use helios_vstore::repository::{UpdateOptions, WriteOutcome};
use tracing::{debug, info};

use crate::error::{RestError, RestResult};
use crate::extractors::ResourceBody;
use crate::middleware::conditional::ConditionalHeaders;
use crate::middleware::prefer::PreferHeader;
use crate::responses::format::resource_response;
use crate::responses::headers::ResourceHeaders;
use crate::responses::operation_outcome::{IssueType, OperationOutcomeBuilder};
use crate::state::AppState;

use super::{version_location, write_response};

/// Handler for the update interaction.
///
/// # Headers
///
/// - `If-Match` - Only update if the head is this version (`W/"<n>"` or `*`)
/// - `If-None-Match` - `*` creates the resource only if it has no live version
/// - `Prefer` - Body of the response
///
/// # Response
///
/// - `200 OK` - Resource updated
/// - `201 Created` - Resource created (or resurrected)
/// - `304 Not Modified` - `If-None-Match` matched; nothing was written
/// - `400 Bad Request` - Invalid body, mismatched type or id, or bad If-Match
/// - `405 Method Not Allowed` - Resource absent and update-as-create is disabled
/// - `409 Conflict` - The head is not the If-Match version
pub async fn update_handler<S>(
    State(state): State<AppState<S>>,
    Path((resource_type, id)): Path<(String, String)>,
    conditional: ConditionalHeaders,
    prefer: PreferHeader,
    body: ResourceBody,
) -> RestResult<Response>
where
    S: VersionStore + Send + Sync,
{
    debug!(
        resource_type = %resource_type,
        id = %id,
        if_match = ?conditional.request().if_match,
        "Processing update request"
    );

    body.check_type(&resource_type)?;
    body.check_id(&id)?;

    let options = UpdateOptions {
        expected: conditional.expected_version()?,
        if_none_match: conditional.if_none_match().to_vec(),
        allow_create: state.update_create_enabled(),
    };

    let outcome = match state
        .repository()
        .update(&resource_type, &id, body.into_inner(), options)
        .await
    {
        Ok(outcome) => outcome,
        Err(StorageError::Resource(ResourceError::NotFound { .. })) => {
            return Err(RestError::MethodNotAllowed {
                method: "PUT (create)".to_string(),
                resource_type,
            });
        }
        Err(e) => return Err(e.into()),
    };

    let record = outcome.record();
    let headers = ResourceHeaders::from_record(record);

    match &outcome {
        WriteOutcome::Unchanged { .. } => {
            debug!(
                resource_type = %resource_type,
                id = %id,
                version = record.version_id(),
                "Update suppressed by If-None-Match"
            );
            Ok(resource_response(StatusCode::NOT_MODIFIED, headers, None))
        }
        WriteOutcome::Committed { .. } if outcome.is_created() => {
            info!(
                resource_type = %resource_type,
                id = %id,
                version = record.version_id(),
                "Resource created via update"
            );
            let headers = headers.with_location(version_location(state.base_url(), record));
            Ok(write_response(
                StatusCode::CREATED,
                record,
                headers,
                prefer,
                OperationOutcomeBuilder::new().information(IssueType::Informational, "Resource created"),
            ))
        }
        WriteOutcome::Committed { .. } => {
            info!(
                resource_type = %resource_type,
                id = %id,
                version = record.version_id(),
                "Resource updated"
            );
            Ok(write_response(
                StatusCode::OK,
                record,
                headers,
                prefer,
                OperationOutcomeBuilder::new().information(IssueType::Informational, "Resource updated"),
            ))
        }
    }
}

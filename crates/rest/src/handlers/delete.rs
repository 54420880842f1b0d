//! Delete interaction handler.
//!
//! `DELETE [base]/[type]/[id]`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use helios_vstore::core::VersionStore;
use helios_vstore::repository::DeleteOutcome;
use tracing::{debug, info};

use crate::error::{RestError, RestResult};
use crate::middleware::conditional::ConditionalHeaders;
use crate::responses::format::resource_response;
use crate::responses::headers::ResourceHeaders;
use crate::responses::operation_outcome::success_outcome;
use crate::state::AppState;

/// Handler for the delete interaction.
///
/// Appends a tombstone. Deleting a resource that is already deleted
/// succeeds without writing anything.
///
/// # Headers
///
/// - `If-Match` - Only delete if the head is this version
///
/// # Response
///
/// - `204 No Content` - Resource deleted
/// - `200 OK` - Resource deleted, with an OperationOutcome (when configured)
/// - `404 Not Found` - Resource never existed
/// - `405 Method Not Allowed` - Delete is disabled
/// - `409 Conflict` - The head is not the If-Match version
pub async fn delete_handler<S>(
    State(state): State<AppState<S>>,
    Path((resource_type, id)): Path<(String, String)>,
    conditional: ConditionalHeaders,
) -> RestResult<Response>
where
    S: VersionStore + Send + Sync,
{
    debug!(resource_type = %resource_type, id = %id, "Processing delete request");

    if !state.delete_enabled() {
        return Err(RestError::MethodNotAllowed {
            method: "DELETE".to_string(),
            resource_type,
        });
    }

    let expected = conditional.expected_version()?;
    let outcome = state
        .repository()
        .delete(&resource_type, &id, expected)
        .await?;

    let message = match &outcome {
        DeleteOutcome::Deleted(record) => {
            info!(
                resource_type = %resource_type,
                id = %id,
                version = record.version_id(),
                "Resource deleted"
            );
            "Resource deleted"
        }
        DeleteOutcome::AlreadyDeleted(_) => "Resource was already deleted",
    };

    let headers = ResourceHeaders::from_record(outcome.record());
    if state.config().delete_returns_outcome {
        Ok(resource_response(
            StatusCode::OK,
            headers,
            Some(success_outcome(message)),
        ))
    } else {
        Ok(resource_response(StatusCode::NO_CONTENT, headers, None))
    }
}

//! Create interaction handler.
//!
//! `POST [base]/[type]`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use helios_vstore::core::VersionStore;
use tracing::{debug, info};

use crate::error::RestResult;
use crate::extractors::ResourceBody;
use crate::middleware::prefer::PreferHeader;
use crate::responses::headers::ResourceHeaders;
use crate::responses::operation_outcome::{IssueType, OperationOutcomeBuilder};
use crate::state::AppState;

use super::{version_location, write_response};

/// Handler for the create interaction.
///
/// The server always assigns a fresh id, so a successful create is always
/// version 1. An `id` in the body is replaced and the replacement is reported
/// as an informational issue. Client-chosen ids go through update instead.
///
/// # Headers
///
/// - `Prefer` - `return=minimal`, `return=representation` or `return=OperationOutcome`
///
/// # Response
///
/// - `201 Created` - with `Location`, `ETag` and `Last-Modified`
/// - `400 Bad Request` - invalid body or mismatched resource type
/// - `415 Unsupported Media Type` - the body is not JSON
pub async fn create_handler<S>(
    State(state): State<AppState<S>>,
    Path(resource_type): Path<String>,
    prefer: PreferHeader,
    body: ResourceBody,
) -> RestResult<Response>
where
    S: VersionStore + Send + Sync,
{
    debug!(resource_type = %resource_type, "Processing create request");

    body.check_type(&resource_type)?;
    let replaced_id = body.id().map(str::to_string);

    let outcome = state
        .repository()
        .create(&resource_type, None, body.into_inner())
        .await?;
    let record = outcome.record();

    let mut issues =
        OperationOutcomeBuilder::new().information(IssueType::Informational, "Resource created");
    if let Some(replaced) = replaced_id {
        debug!(
            resource_type = %resource_type,
            requested = %replaced,
            assigned = %record.id(),
            "Replaced client-supplied id on create"
        );
        issues = issues.information(
            IssueType::Informational,
            format!(
                "The id {} in the request body has been replaced by {}",
                replaced,
                record.id()
            ),
        );
    }

    info!(
        resource_type = %resource_type,
        id = %record.id(),
        version = record.version_id(),
        "Resource created"
    );

    let headers = ResourceHeaders::from_record(record)
        .with_location(version_location(state.base_url(), record));

    Ok(write_response(
        StatusCode::CREATED,
        record,
        headers,
        prefer,
        issues,
    ))
}

//! Instance history interaction handler.
//!
//! `GET [base]/[type]/[id]/_history`

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use helios_vstore::core::VersionStore;
use helios_vstore::types::HistoryParams;
use serde::Deserialize;
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::responses::bundle::{BundleBuilder, BundleEntry};
use crate::responses::headers::FHIR_JSON;
use crate::state::AppState;

/// Query parameters of a history request.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Page size.
    #[serde(rename = "_count")]
    pub count: Option<String>,

    /// Only versions last modified at or after this instant.
    #[serde(rename = "_since")]
    pub since: Option<String>,
}

impl HistoryQuery {
    fn parse_count(&self) -> RestResult<Option<usize>> {
        self.count
            .as_deref()
            .map(|raw| {
                raw.parse::<usize>().map_err(|_| RestError::BadRequest {
                    message: format!("Invalid _count: {}", raw),
                })
            })
            .transpose()
    }

    fn parse_since(&self) -> RestResult<Option<DateTime<Utc>>> {
        self.since
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| RestError::BadRequest {
                        message: format!("Invalid _since: {}", raw),
                    })
            })
            .transpose()
    }
}

/// Handler for the instance history interaction.
///
/// Returns a `history` Bundle, newest version first, tombstones included.
/// `total` counts every version that passes `_since`, before `_count`
/// truncation.
///
/// # Response
///
/// - `200 OK` - History Bundle
/// - `400 Bad Request` - Invalid `_count` or `_since`
/// - `404 Not Found` - Resource never existed
pub async fn history_handler<S>(
    State(state): State<AppState<S>>,
    Path((resource_type, id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> RestResult<Response>
where
    S: VersionStore + Send + Sync,
{
    debug!(resource_type = %resource_type, id = %id, ?query, "Processing history request");

    let count = state.history_count(query.parse_count()?);
    let mut params = HistoryParams::new();
    if let Some(since) = query.parse_since()? {
        params = params.since(since);
    }

    let mut versions = state
        .repository()
        .history(&resource_type, &id, &params)
        .await?;
    let total = versions.len();
    versions.truncate(count);

    let base_url = state.base_url();
    let bundle = versions
        .iter()
        .fold(BundleBuilder::history().total(total), |builder, record| {
            builder.add_entry(BundleEntry::from_record(record, base_url))
        })
        .self_link(format!("{}/{}/{}/_history", base_url, resource_type, id))
        .build();

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, FHIR_JSON)],
        Json(bundle),
    )
        .into_response())
}

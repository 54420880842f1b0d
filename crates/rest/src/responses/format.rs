//! Resource rendering.
//!
//! Stored payloads are opaque. The server-managed elements (`id`,
//! `resourceType`, `meta.versionId`, `meta.lastUpdated`) are stamped onto a
//! copy at response time, so the body always agrees with the ETag and
//! Last-Modified headers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use serde_json::{Map, Value};

use helios_vstore::types::VersionRecord;

use super::headers::ResourceHeaders;

/// Renders the body of a live version.
pub fn render_resource(record: &VersionRecord) -> Value {
    let mut body = match record.payload() {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    body.insert(
        "resourceType".to_string(),
        Value::String(record.resource_type().to_string()),
    );
    body.insert("id".to_string(), Value::String(record.id().to_string()));

    let meta = body
        .entry("meta")
        .or_insert_with(|| Value::Object(Map::new()));
    if !meta.is_object() {
        *meta = Value::Object(Map::new());
    }
    if let Value::Object(meta) = meta {
        meta.insert(
            "versionId".to_string(),
            Value::String(record.version_id().to_string()),
        );
        meta.insert(
            "lastUpdated".to_string(),
            Value::String(
                record
                    .last_modified()
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        );
    }

    Value::Object(body)
}

/// Builds a response from a status, headers and optional JSON body.
pub fn resource_response(status: StatusCode, headers: ResourceHeaders, body: Option<Value>) -> Response {
    match body {
        Some(body) => (status, headers.to_header_map(), Json(body)).into_response(),
        None => (status, headers.without_content_type().to_header_map()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use chrono::{TimeZone, Utc};
    use helios_vstore::types::{ResourceKey, ResourceMethod};
    use serde_json::json;

    fn record(payload: Value) -> VersionRecord {
        VersionRecord::new(
            ResourceKey::new("Patient", "p1"),
            3,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            payload,
            ResourceMethod::Put,
        )
    }

    #[test]
    fn test_render_stamps_server_elements() {
        let body = render_resource(&record(json!({
            "resourceType": "Patient",
            "active": true,
            "meta": {"versionId": "99", "tag": [{"code": "x"}]}
        })));

        assert_eq!(body["id"], "p1");
        assert_eq!(body["resourceType"], "Patient");
        assert_eq!(body["active"], true);
        assert_eq!(body["meta"]["versionId"], "3");
        assert_eq!(body["meta"]["lastUpdated"], "2024-05-01T12:00:00.000Z");
        assert_eq!(body["meta"]["tag"][0]["code"], "x");
    }

    #[test]
    fn test_render_leaves_stored_payload_untouched() {
        let rec = record(json!({"resourceType": "Patient"}));
        let _ = render_resource(&rec);
        assert!(rec.payload().get("meta").is_none());
    }

    #[test]
    fn test_render_replaces_non_object_meta() {
        let body = render_resource(&record(json!({"meta": "bogus"})));
        assert_eq!(body["meta"]["versionId"], "3");
    }

    #[test]
    fn test_response_without_body_has_no_content_type() {
        let response = resource_response(
            StatusCode::NOT_MODIFIED,
            ResourceHeaders::new().with_etag("W/\"1\""),
            None,
        );
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert_eq!(response.headers()[header::ETAG], "W/\"1\"");
    }
}

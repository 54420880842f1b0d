//! Resource body extractor.
//!
//! Reads a JSON resource from the request body. The payload is otherwise
//! opaque: only its shape (a JSON object) and its `resourceType` and `id`
//! elements are looked at.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::error::RestError;

/// Axum extractor for a JSON resource body.
#[derive(Debug)]
pub struct ResourceBody(pub Value);

impl ResourceBody {
    /// Returns the resource type named in the body.
    pub fn resource_type(&self) -> Option<&str> {
        self.0.get("resourceType").and_then(Value::as_str)
    }

    /// Returns the resource ID named in the body.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// Checks that the body names `resource_type`, if it names one at all.
    pub fn check_type(&self, resource_type: &str) -> Result<(), RestError> {
        match self.0.get("resourceType") {
            None => Ok(()),
            Some(Value::String(body_type)) if body_type == resource_type => Ok(()),
            Some(other) => Err(RestError::BadRequest {
                message: format!(
                    "Resource type in body ({}) does not match URL ({})",
                    other, resource_type
                ),
            }),
        }
    }

    /// Checks that the body names `id`, if it names one at all.
    pub fn check_id(&self, id: &str) -> Result<(), RestError> {
        match self.0.get("id") {
            None => Ok(()),
            Some(Value::String(body_id)) if body_id == id => Ok(()),
            Some(other) => Err(RestError::BadRequest {
                message: format!("Resource ID in body ({}) does not match URL ({})", other, id),
            }),
        }
    }

    /// Consumes the extractor and returns the inner Value.
    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// Error type for body extraction failures.
#[derive(Debug)]
pub enum ResourceBodyRejection {
    /// The body could not be read or parsed.
    InvalidJson(String),
    /// The body is valid JSON but not an object.
    NotAnObject,
    /// The content type is not JSON.
    UnsupportedMediaType(String),
}

impl IntoResponse for ResourceBodyRejection {
    fn into_response(self) -> Response {
        let error = match self {
            ResourceBodyRejection::InvalidJson(msg) => RestError::BadRequest {
                message: format!("Invalid JSON: {}", msg),
            },
            ResourceBodyRejection::NotAnObject => RestError::BadRequest {
                message: "Resource must be a JSON object".to_string(),
            },
            ResourceBodyRejection::UnsupportedMediaType(content_type) => {
                RestError::UnsupportedMediaType { content_type }
            }
        };
        error.into_response()
    }
}

/// Accepts `application/json`, `application/fhir+json` and any other
/// `+json` media type.
fn is_json(content_type: &str) -> bool {
    content_type
        .parse::<mime::Mime>()
        .map(|m| m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
        .unwrap_or(false)
}

impl<S> FromRequest<S> for ResourceBody
where
    S: Send + Sync,
{
    type Rejection = ResourceBodyRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();

        if !is_json(&content_type) {
            return Err(ResourceBodyRejection::UnsupportedMediaType(content_type));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ResourceBodyRejection::InvalidJson(e.to_string()))?;

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ResourceBodyRejection::InvalidJson(e.to_string()))?;

        if !value.is_object() {
            return Err(ResourceBodyRejection::NotAnObject);
        }

        Ok(ResourceBody(value))
    }
}

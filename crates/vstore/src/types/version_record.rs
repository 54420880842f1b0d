//! Version record types.
//!
//! This module defines the [`VersionRecord`] type, one immutable numbered
//! snapshot of a logical resource, together with the [`ResourceKey`] that
//! identifies the logical resource across its whole history.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::etag::EntityTag;

/// Identity of a logical resource: `(resourceType, id)`.
///
/// # Examples
///
/// ```
/// use helios_vstore::types::ResourceKey;
///
/// let key = ResourceKey::new("Patient", "p1");
/// assert_eq!(key.to_string(), "Patient/p1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    resource_type: String,
    id: String,
}

impl ResourceKey {
    /// Creates a key from a resource type and logical id.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Returns the resource type.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Returns the logical id.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

/// HTTP method that produced a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceMethod {
    /// Version was created via POST.
    Post,
    /// Version was created or updated via PUT.
    Put,
    /// Version is a tombstone written by DELETE.
    Delete,
}

impl ResourceMethod {
    /// Returns the method name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceMethod::Post => "POST",
            ResourceMethod::Put => "PUT",
            ResourceMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ResourceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POST" => Ok(ResourceMethod::Post),
            "PUT" => Ok(ResourceMethod::Put),
            "DELETE" => Ok(ResourceMethod::Delete),
            other => Err(format!("unknown resource method: {}", other)),
        }
    }
}

/// One immutable snapshot in a logical resource's version chain.
///
/// Records are created once by a store append and never edited. They are
/// handed out as `Arc<VersionRecord>` so readers share them without copying
/// or locking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// The logical resource this version belongs to.
    key: ResourceKey,

    /// Contiguous version number, starting at 1.
    version_id: u64,

    /// When this version was appended.
    last_modified: DateTime<Utc>,

    /// Opaque resource content. `null` for tombstones.
    payload: Value,

    /// Whether this version marks the resource deleted.
    deleted: bool,

    /// The interaction that produced this version.
    method: ResourceMethod,
}

impl VersionRecord {
    /// Creates a live (non-tombstone) version.
    pub fn new(
        key: ResourceKey,
        version_id: u64,
        last_modified: DateTime<Utc>,
        payload: Value,
        method: ResourceMethod,
    ) -> Self {
        Self {
            key,
            version_id,
            last_modified,
            payload,
            deleted: false,
            method,
        }
    }

    /// Creates a tombstone version.
    pub fn tombstone(key: ResourceKey, version_id: u64, last_modified: DateTime<Utc>) -> Self {
        Self {
            key,
            version_id,
            last_modified,
            payload: Value::Null,
            deleted: true,
            method: ResourceMethod::Delete,
        }
    }

    /// Returns the logical resource key.
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Returns the resource type.
    pub fn resource_type(&self) -> &str {
        self.key.resource_type()
    }

    /// Returns the logical id.
    pub fn id(&self) -> &str {
        self.key.id()
    }

    /// Returns the version number.
    pub fn version_id(&self) -> u64 {
        self.version_id
    }

    /// Returns when this version was appended.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Returns the stored payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns true if this version is a tombstone.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Returns the interaction that produced this version.
    pub fn method(&self) -> ResourceMethod {
        self.method
    }

    /// Returns the entity tag for this version.
    pub fn entity_tag(&self) -> EntityTag {
        EntityTag::weak(self.version_id)
    }

    /// Returns the ETag header value, `W/"<versionId>"`.
    pub fn etag(&self) -> String {
        self.entity_tag().to_string()
    }

    /// Returns the relative URL `type/id`.
    pub fn url(&self) -> String {
        self.key.to_string()
    }

    /// Returns the relative version URL `type/id/_history/N`.
    pub fn versioned_url(&self) -> String {
        format!("{}/_history/{}", self.key, self.version_id)
    }
}

/// Timestamp for the next version of a chain.
///
/// Wall clocks can step backwards; the chain's `lastModified` must not, so
/// the result is never earlier than the previous head's timestamp.
pub fn next_last_modified(previous: Option<&VersionRecord>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(prev) if prev.last_modified() > now => prev.last_modified(),
        _ => now,
    }
}

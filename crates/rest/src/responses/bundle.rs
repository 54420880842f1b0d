//! History Bundle building.

use serde_json::Value;

use helios_vstore::precondition::format_http_date;
use helios_vstore::types::{ResourceMethod, VersionRecord};

use super::format::render_resource;

/// An entry in a history Bundle.
#[derive(Debug, Clone)]
pub struct BundleEntry {
    /// Full URL of the version.
    pub full_url: String,
    /// The rendered resource; absent for tombstones.
    pub resource: Option<Value>,
    /// The interaction that produced the version.
    pub request_method: String,
    /// The request URL, relative to the base.
    pub request_url: String,
    /// Response status of the interaction.
    pub status: String,
    /// ETag of the version.
    pub etag: String,
    /// Last-Modified of the version.
    pub last_modified: String,
}

impl BundleEntry {
    /// Creates the history entry for one version.
    pub fn from_record(record: &VersionRecord, base_url: &str) -> Self {
        let (request_url, status) = match record.method() {
            ResourceMethod::Post => (record.resource_type().to_string(), "201"),
            ResourceMethod::Put if record.version_id() == 1 => (record.url(), "201"),
            ResourceMethod::Put => (record.url(), "200"),
            ResourceMethod::Delete => (record.url(), "204"),
        };

        Self {
            full_url: format!("{}/{}", base_url, record.versioned_url()),
            resource: (!record.is_deleted()).then(|| render_resource(record)),
            request_method: record.method().to_string(),
            request_url,
            status: status.to_string(),
            etag: record.etag(),
            last_modified: format_http_date(&record.last_modified()),
        }
    }

    /// Converts to FHIR JSON.
    pub fn to_json(&self) -> Value {
        let mut entry = serde_json::json!({
            "fullUrl": self.full_url,
            "request": {
                "method": self.request_method,
                "url": self.request_url
            },
            "response": {
                "status": self.status,
                "etag": self.etag,
                "lastModified": self.last_modified
            }
        });

        if let Some(resource) = &self.resource {
            entry["resource"] = resource.clone();
        }

        entry
    }
}

/// Builder for history Bundle resources.
#[derive(Debug, Default)]
pub struct BundleBuilder {
    total: Option<usize>,
    self_link: Option<String>,
    entries: Vec<BundleEntry>,
}

impl BundleBuilder {
    /// Creates a history bundle builder.
    pub fn history() -> Self {
        Self::default()
    }

    /// Sets the total count.
    pub fn total(mut self, count: usize) -> Self {
        self.total = Some(count);
        self
    }

    /// Sets the self link.
    pub fn self_link(mut self, url: impl Into<String>) -> Self {
        self.self_link = Some(url.into());
        self
    }

    /// Adds an entry.
    pub fn add_entry(mut self, entry: BundleEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Builds the Bundle resource.
    pub fn build(self) -> Value {
        let mut bundle = serde_json::json!({
            "resourceType": "Bundle",
            "type": "history"
        });

        if let Some(total) = self.total {
            bundle["total"] = serde_json::json!(total);
        }

        if let Some(url) = self.self_link {
            bundle["link"] = serde_json::json!([{
                "relation": "self",
                "url": url
            }]);
        }

        bundle["entry"] =
            serde_json::json!(self.entries.iter().map(BundleEntry::to_json).collect::<Vec<_>>());

        bundle
    }
}

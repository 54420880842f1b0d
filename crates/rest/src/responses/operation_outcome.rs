//! OperationOutcome response generation.

use serde_json::Value;

/// Issue severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Error - processing has failed.
    Error,
    /// Warning - processing succeeded but with concerns.
    Warning,
    /// Information - informational message.
    Information,
}

impl IssueSeverity {
    /// Returns the FHIR string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
            IssueSeverity::Information => "information",
        }
    }
}

/// Issue type codes used by this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueType {
    /// Invalid content.
    Invalid,
    /// Resource not found.
    NotFound,
    /// Resource was deleted.
    Deleted,
    /// Conflict with existing state.
    Conflict,
    /// Duplicate resource.
    Duplicate,
    /// Not supported.
    NotSupported,
    /// Unexpected failure.
    Exception,
    /// Informational message.
    Informational,
}

impl IssueType {
    /// Returns the FHIR code string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Invalid => "invalid",
            IssueType::NotFound => "not-found",
            IssueType::Deleted => "deleted",
            IssueType::Conflict => "conflict",
            IssueType::Duplicate => "duplicate",
            IssueType::NotSupported => "not-supported",
            IssueType::Exception => "exception",
            IssueType::Informational => "informational",
        }
    }
}

/// An issue in an OperationOutcome.
#[derive(Debug, Clone)]
pub struct Issue {
    /// The severity of the issue.
    pub severity: IssueSeverity,
    /// The code of the issue.
    pub code: IssueType,
    /// Human-readable description.
    pub details: String,
}

impl Issue {
    /// Creates a new issue.
    pub fn new(severity: IssueSeverity, code: IssueType, details: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            details: details.into(),
        }
    }

    /// Converts to FHIR JSON.
    pub fn to_json(&self) -> Value {
        issue_json(self.severity.as_str(), self.code.as_str(), &self.details)
    }
}

/// Builder for OperationOutcome resources.
#[derive(Debug, Default)]
pub struct OperationOutcomeBuilder {
    issues: Vec<Issue>,
}

impl OperationOutcomeBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an issue.
    pub fn add_issue(mut self, issue: Issue) -> Self {
        self.issues.push(issue);
        self
    }

    /// Adds a warning issue.
    pub fn warning(self, code: IssueType, details: impl Into<String>) -> Self {
        self.add_issue(Issue::new(IssueSeverity::Warning, code, details))
    }

    /// Adds an information issue.
    pub fn information(self, code: IssueType, details: impl Into<String>) -> Self {
        self.add_issue(Issue::new(IssueSeverity::Information, code, details))
    }

    /// Builds the OperationOutcome resource.
    pub fn build(self) -> Value {
        let issues: Vec<Value> = self.issues.iter().map(Issue::to_json).collect();

        serde_json::json!({
            "resourceType": "OperationOutcome",
            "issue": issues
        })
    }
}

fn issue_json(severity: &str, code: &str, details: &str) -> Value {
    serde_json::json!({
        "severity": severity,
        "code": code,
        "details": {
            "text": details
        }
    })
}

/// Creates a single-issue OperationOutcome.
///
/// # Arguments
///
/// * `severity` - The issue severity (error, warning, information)
/// * `code` - The FHIR issue code
/// * `details` - Human-readable details
pub fn create_operation_outcome(severity: &str, code: &str, details: &str) -> Value {
    serde_json::json!({
        "resourceType": "OperationOutcome",
        "issue": [issue_json(severity, code, details)]
    })
}

/// Creates a simple success OperationOutcome.
pub fn success_outcome(message: &str) -> Value {
    OperationOutcomeBuilder::new()
        .information(IssueType::Informational, message)
        .build()
}

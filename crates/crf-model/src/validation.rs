use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// A problem found while checking a generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Short machine-readable code (e.g. "UNRESOLVED_ITEM_REF").
    pub code: String,
    /// Human-readable message describing the issue.
    pub message: String,
    pub severity: IssueSeverity,
    /// OID the issue refers to (if applicable).
    pub oid: Option<String>,
}

/// Result of validating one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// What produced the report ("references", "schema").
    pub source: String,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            issues: Vec::new(),
        }
    }

    pub fn push(
        &mut self,
        code: &str,
        severity: IssueSeverity,
        oid: Option<&str>,
        message: impl Into<String>,
    ) {
        self.issues.push(ValidationIssue {
            code: code.to_string(),
            message: message.into(),
            severity,
            oid: oid.map(str::to_string),
        });
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

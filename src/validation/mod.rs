//! Configuration document validation.

pub mod schema;

use serde_json::Value;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    /// Blocks the document from being accepted.
    Error,
    /// Logged but allows the document through.
    Warning,
}

/// A validation issue found during document checking.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: ValidationSeverity,
    /// Path to the problematic field (e.g., "categories[2].id").
    pub path: String,
    /// Description of the issue.
    pub message: String,
    /// Optional suggestion for fixing the issue.
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Creates a new error-level validation issue.
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ValidationSeverity::Error,
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Creates a new warning-level validation issue.
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ValidationSeverity::Warning,
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Adds a suggestion to this validation issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Result of validating a document.
#[derive(Debug, Default)]
pub struct ValidationResult {
    issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Creates an empty validation result.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the result.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Extends the result with issues from another result.
    pub fn extend(&mut self, other: ValidationResult) {
        self.issues.extend(other.issues);
    }

    /// Returns true if there are no errors (warnings are allowed).
    pub fn is_valid(&self) -> bool {
        !self
            .issues
            .iter()
            .any(|i| i.severity == ValidationSeverity::Error)
    }

    /// Returns an iterator over error-level issues.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Error)
    }

    /// Returns an iterator over warning-level issues.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Warning)
    }

    /// Returns the total number of issues.
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Returns the number of errors.
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}

/// Validates a raw configuration document.
pub fn validate_document(document: &Value) -> ValidationResult {
    schema::validate(document)
}

/// Formats a validation result as a human-readable report.
pub fn format_report(result: &ValidationResult) -> String {
    let mut report = String::new();

    if result.is_valid() && result.issue_count() == 0 {
        report.push_str("Document is valid.\n");
        return report;
    }

    for issue in result.errors() {
        report.push_str(&format!("error: {}: {}\n", issue.path, issue.message));
        if let Some(suggestion) = &issue.suggestion {
            report.push_str(&format!("  hint: {}\n", suggestion));
        }
    }

    for issue in result.warnings() {
        report.push_str(&format!("warning: {}: {}\n", issue.path, issue.message));
        if let Some(suggestion) = &issue.suggestion {
            report.push_str(&format!("  hint: {}\n", suggestion));
        }
    }

    report.push_str(&format!(
        "{} error(s), {} warning(s)\n",
        result.error_count(),
        result.warnings().count()
    ));

    report
}

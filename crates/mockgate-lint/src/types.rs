//! Core types for the linting library.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Severity level of a lint issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The route will fail at request time (or the file cannot be loaded).
    Error,
    /// The route loads and serves, but probably not as intended.
    Warning,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// A single lint issue found during validation.
#[derive(Debug, Clone, Serialize)]
pub struct LintIssue {
    pub severity: Severity,
    /// Error code (e.g., "E007", "W002").
    pub code: String,
    pub message: String,
    #[serde(serialize_with = "serialize_path")]
    pub file: PathBuf,
    /// Route key the issue belongs to, when it concerns a single route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Field path within the file (e.g., `routes["/ping"].status`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

fn serialize_path<S>(path: &Path, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&path.to_string_lossy())
}

impl LintIssue {
    fn new(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
        file: PathBuf,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            file,
            route: None,
            location: None,
            suggestion: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>, file: PathBuf) -> Self {
        Self::new(Severity::Error, code, message, file)
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>, file: PathBuf) -> Self {
        Self::new(Severity::Warning, code, message, file)
    }

    /// Attach the route key, and the location of the route within the file.
    pub fn for_route(mut self, route: &str) -> Self {
        self.location = Some(route_location(route));
        self.route = Some(route.to_string());
        self
    }

    /// Attach the route key and a field of that route as the location.
    pub fn for_route_field(mut self, route: &str, field: &str) -> Self {
        self.location = Some(format!("{}.{field}", route_location(route)));
        self.route = Some(route.to_string());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

fn route_location(route: &str) -> String {
    format!("routes[{route:?}]")
}

/// Result of linting one or more files.
#[derive(Debug, Default, Serialize)]
pub struct LintResult {
    pub issues: Vec<LintIssue>,
    pub files_checked: usize,
    pub routes_checked: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl LintResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, issue: LintIssue) {
        match issue.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
        self.issues.push(issue);
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings > 0
    }

    /// Check if validation passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors == 0
    }

    /// Issue codes in the order they were reported.
    pub fn codes(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.code.as_str()).collect()
    }

    pub fn merge(&mut self, other: LintResult) {
        self.issues.extend(other.issues);
        self.files_checked += other.files_checked;
        self.routes_checked += other.routes_checked;
        self.errors += other.errors;
        self.warnings += other.warnings;
    }
}

/// Options for validation.
#[derive(Debug, Clone)]
pub struct LintOptions {
    /// Delays above this many milliseconds are reported as W004.
    pub max_delay_ms: u64,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            max_delay_ms: 30_000,
        }
    }
}

//! Route file linting for mockgate.
//!
//! The mock server accepts any non-empty routes map and only discovers a
//! broken route when a request reaches it. This library checks every route of
//! a file up front. It can be used directly or through the `mockgate-lint`
//! binary.
//!
//! # Example
//!
//! ```no_run
//! use mockgate_lint::{lint_file, LintOptions};
//! use std::path::Path;
//!
//! let result = lint_file(Path::new("mocks.yaml"), &LintOptions::default());
//! if result.has_errors() {
//!     eprintln!("Found {} errors", result.errors);
//! }
//! ```

mod types;
mod validator;

use mockgate::config::ConfigFormat;
use mockgate::error::DocumentError;
use std::path::{Path, PathBuf};

pub use types::{LintIssue, LintOptions, LintResult, Severity};
pub use validator::{validate_config, validate_route};

/// Failure to turn a file into a JSON value.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read file: {0}")]
    Read(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] DocumentError),
}

impl LoadError {
    fn code(&self) -> &'static str {
        match self {
            LoadError::Read(_) => "E001",
            LoadError::Parse(_) => "E002",
        }
    }
}

/// Whether a path has a JSON or YAML extension (any case).
pub fn is_route_file(path: &Path) -> bool {
    matches!(
        ConfigFormat::from_path(path),
        ConfigFormat::Json | ConfigFormat::Yaml
    )
}

/// Parse file contents the same way the server loads them: by extension, with
/// JSON then YAML tried for anything else.
pub fn parse_route_file(path: &Path, contents: &str) -> Result<serde_json::Value, LoadError> {
    Ok(ConfigFormat::from_path(path).parse(contents)?)
}

/// Lint a single route file.
pub fn lint_file(path: &Path, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();
    result.files_checked = 1;

    let loaded = std::fs::read_to_string(path)
        .map_err(LoadError::from)
        .and_then(|contents| parse_route_file(path, &contents));

    match loaded {
        Ok(value) => validate_config(path, &value, &mut result, options),
        Err(e) => result.add_issue(LintIssue::error(e.code(), e.to_string(), path.to_path_buf())),
    }
    result
}

/// Lint all route files in a directory (non-recursive), or a single route file.
pub fn lint_directory(path: &Path, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();

    for file in collect_route_files(path) {
        result.merge(lint_file(&file, options));
    }

    if result.files_checked == 0 {
        if !path.exists() {
            result.add_issue(LintIssue::error(
                "E001",
                "Path does not exist",
                path.to_path_buf(),
            ));
        } else if !path.is_dir() {
            result.add_issue(
                LintIssue::error("E001", "Not a route file", path.to_path_buf())
                    .with_suggestion("Route files end in .json, .yaml or .yml"),
            );
        }
    }
    result
}

/// Route files at `path`: the path itself if it is a route file, or the route
/// files directly inside it if it is a directory. Sorted for stable output.
pub fn collect_route_files(path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if path.is_file() {
        if is_route_file(path) {
            files.push(path.to_path_buf());
        }
    } else if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            let entry_path = entry.path();
            if entry_path.is_file() && is_route_file(&entry_path) {
                files.push(entry_path);
            }
        }
    }

    files.sort();
    files
}

/// Lint an in-memory document. `source_name` picks the format the same way a
/// file extension does.
pub fn lint_str(contents: &str, source_name: &str, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();
    result.files_checked = 1;

    let path = Path::new(source_name);
    match parse_route_file(path, contents) {
        Ok(value) => validate_config(path, &value, &mut result, options),
        Err(e) => result.add_issue(LintIssue::error(e.code(), e.to_string(), path.to_path_buf())),
    }
    result
}

/// Lint an already parsed configuration value.
pub fn lint_value(
    value: &serde_json::Value,
    source_name: &str,
    options: &LintOptions,
) -> LintResult {
    let mut result = LintResult::new();
    result.files_checked = 1;
    validate_config(Path::new(source_name), value, &mut result, options);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_lint_str_yaml_and_json() {
        let yaml = "routes:\n  /ping:\n    response:\n      ok: true\n  /broken:\n    method: GET\n";
        let result = lint_str(yaml, "mocks.yaml", &LintOptions::default());
        assert_eq!(result.codes(), vec!["E007"]);
        assert_eq!(result.routes_checked, 2);

        let json = r#"{"routes": {"/ping": {"response": {"ok": true}}}}"#;
        let result = lint_str(json, "mocks.json", &LintOptions::default());
        assert!(result.is_valid());
    }

    #[test]
    fn test_lint_str_parse_error() {
        let result = lint_str("{not json", "mocks.json", &LintOptions::default());
        assert_eq!(result.codes(), vec!["E002"]);
    }

    #[test]
    fn test_lint_file_missing() {
        let result = lint_file(Path::new("/nonexistent/mocks.json"), &LintOptions::default());
        assert_eq!(result.codes(), vec!["E001"]);
    }

    #[test]
    fn test_lint_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("good.json"),
            r#"{"routes": {"/ping": {"response": "pong"}}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("bad.yml"), "routes: {}\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let result = lint_directory(dir.path(), &LintOptions::default());
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.codes(), vec!["E004"]);
        assert!(result.issues[0].file.ends_with("bad.yml"));
    }

    #[test]
    fn test_extension_case_and_fallback_match_the_server() {
        let yaml = "routes:\n  /ping:\n    response: pong\n";
        assert!(lint_str(yaml, "MOCKS.YAML", &LintOptions::default()).is_valid());
        assert!(lint_str(yaml, "inline", &LintOptions::default()).is_valid());
        assert!(is_route_file(Path::new("mocks.Json")));
        assert!(!is_route_file(Path::new("mocks.txt")));

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("UPPER.YML"), yaml).unwrap();
        let result = lint_directory(dir.path(), &LintOptions::default());
        assert_eq!(result.files_checked, 1);
        assert!(result.is_valid());
    }

    #[test]
    fn test_lint_directory_bad_paths() {
        let result = lint_directory(Path::new("/nonexistent/mocks"), &LintOptions::default());
        assert_eq!(result.codes(), vec!["E001"]);
        assert_eq!(result.issues[0].message, "Path does not exist");

        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, "ignored").unwrap();
        let result = lint_directory(&notes, &LintOptions::default());
        assert_eq!(result.codes(), vec!["E001"]);
        assert_eq!(result.issues[0].message, "Not a route file");

        let empty = tempfile::tempdir().unwrap();
        let result = lint_directory(empty.path(), &LintOptions::default());
        assert!(result.issues.is_empty());
        assert_eq!(result.files_checked, 0);
    }

    #[test]
    fn test_demo_routes_are_clean() {
        let demos = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        let result = lint_directory(&demos, &LintOptions::default());
        assert_eq!(result.files_checked, 1);
        assert!(result.issues.is_empty(), "{:?}", result.issues);
    }

    #[test]
    fn test_lint_value_respects_options() {
        let value = serde_json::json!({"routes": {"/slow": {"response": 1, "delay": 500}}});
        let options = LintOptions { max_delay_ms: 100 };
        assert_eq!(lint_value(&value, "inline", &options).codes(), vec!["W004"]);
        assert!(lint_value(&value, "inline", &LintOptions::default()).is_valid());
    }
}

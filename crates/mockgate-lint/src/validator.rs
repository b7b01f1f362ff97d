//! Validation rules for mock route files.
//!
//! The server only checks that the configuration and its routes map are
//! non-empty when it starts; individual routes are checked when a request
//! reaches them. These rules look at every route up front.

use crate::types::{LintIssue, LintOptions, LintResult};
use mockgate::config::is_falsy;
use serde_json::{Map, Value};
use std::path::Path;

const KNOWN_METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
];

/// Validate a complete mock configuration.
pub fn validate_config(file: &Path, config: &Value, result: &mut LintResult, options: &LintOptions) {
    let top = match config {
        Value::Object(map) if !map.is_empty() => map,
        Value::Object(_) | Value::Null => {
            result.add_issue(
                LintIssue::error("E003", "No mock configuration found", file.to_path_buf())
                    .with_suggestion("Add a top-level \"routes\" map"),
            );
            return;
        }
        _ => {
            result.add_issue(
                LintIssue::error(
                    "E003",
                    "Mock configuration must be an object",
                    file.to_path_buf(),
                )
                .with_suggestion("Add a top-level \"routes\" map"),
            );
            return;
        }
    };

    let routes = match top.get("routes") {
        Some(Value::Object(routes)) if !routes.is_empty() => routes,
        Some(Value::Object(_)) | Some(Value::Null) | None => {
            result.add_issue(
                LintIssue::error("E004", "Routes map is missing or empty", file.to_path_buf())
                    .with_location("routes")
                    .with_suggestion("Add at least one route, e.g. \"/ping\": {\"response\": {}}"),
            );
            return;
        }
        Some(_) => {
            result.add_issue(
                LintIssue::error(
                    "E005",
                    "Routes must be a map from path to route entry",
                    file.to_path_buf(),
                )
                .with_location("routes"),
            );
            return;
        }
    };

    for (route, entry) in routes {
        validate_route(file, route, entry, result, options);
    }
}

/// Validate a single route entry.
pub fn validate_route(
    file: &Path,
    route: &str,
    entry: &Value,
    result: &mut LintResult,
    options: &LintOptions,
) {
    result.routes_checked += 1;
    check_route_key(file, route, result);

    let entry = match entry.as_object() {
        Some(entry) => entry,
        None => {
            result.add_issue(
                LintIssue::error("E006", "Route entry must be an object", file.to_path_buf())
                    .for_route(route),
            );
            return;
        }
    };

    check_response(file, route, entry, result);
    check_method(file, route, entry, result);
    check_status(file, route, entry, result);
    check_delay(file, route, entry, result, options);
}

fn check_route_key(file: &Path, route: &str, result: &mut LintResult) {
    if let Some((path, _)) = route.split_once('?') {
        result.add_issue(
            LintIssue::warning(
                "W002",
                format!("Route key '{route}' contains a query string and can never match"),
                file.to_path_buf(),
            )
            .for_route(route)
            .with_suggestion(format!(
                "Query strings are ignored when matching; use '{path}' as the key"
            )),
        );
    }

    if !route.starts_with('/') {
        result.add_issue(
            LintIssue::warning(
                "W003",
                format!("Route key '{route}' does not start with '/'"),
                file.to_path_buf(),
            )
            .for_route(route)
            .with_suggestion(format!("Request paths always start with '/', e.g. '/{route}'")),
        );
    }
}

fn check_response(file: &Path, route: &str, entry: &Map<String, Value>, result: &mut LintResult) {
    let message = match entry.get("response") {
        None => "Route has no 'response'".to_string(),
        Some(value) if is_falsy(value) => {
            format!("Route 'response' is {value}, which counts as missing")
        }
        Some(_) => return,
    };

    result.add_issue(
        LintIssue::error("E007", message, file.to_path_buf())
            .for_route_field(route, "response")
            .with_suggestion("Requests to this route will fail; add a non-empty 'response' value"),
    );
}

fn check_method(file: &Path, route: &str, entry: &Map<String, Value>, result: &mut LintResult) {
    let method = match entry.get("method") {
        None => return,
        // An empty method falls back to the GET default, like a missing one.
        Some(Value::String(method)) if method.is_empty() => return,
        Some(Value::String(method)) => method,
        Some(other) => {
            result.add_issue(
                LintIssue::error(
                    "E010",
                    format!("Route 'method' must be a string, found {other}"),
                    file.to_path_buf(),
                )
                .for_route_field(route, "method"),
            );
            return;
        }
    };

    let upper = method.to_ascii_uppercase();
    if !KNOWN_METHODS.contains(&upper.as_str()) {
        result.add_issue(
            LintIssue::warning(
                "W001",
                format!("Unknown HTTP method '{method}'"),
                file.to_path_buf(),
            )
            .for_route_field(route, "method")
            .with_suggestion(format!("Use one of: {}", KNOWN_METHODS.join(", "))),
        );
    }
}

fn check_status(file: &Path, route: &str, entry: &Map<String, Value>, result: &mut LintResult) {
    let status = match entry.get("status") {
        None => return,
        Some(status) => status,
    };

    match status.as_u64() {
        Some(0) => result.add_issue(
            LintIssue::warning(
                "W005",
                "Status 0 is treated as the default status 200",
                file.to_path_buf(),
            )
            .for_route_field(route, "status")
            .with_suggestion("Remove 'status' or set it to 200 explicitly"),
        ),
        Some(code) if (100..=999).contains(&code) => {}
        _ => result.add_issue(
            LintIssue::error(
                "E008",
                format!("Invalid status {status}, expected an integer in 100..=999"),
                file.to_path_buf(),
            )
            .for_route_field(route, "status"),
        ),
    }
}

fn check_delay(
    file: &Path,
    route: &str,
    entry: &Map<String, Value>,
    result: &mut LintResult,
    options: &LintOptions,
) {
    let delay = match entry.get("delay") {
        None => return,
        Some(delay) => delay,
    };

    match delay.as_u64() {
        Some(ms) if ms > options.max_delay_ms => result.add_issue(
            LintIssue::warning(
                "W004",
                format!(
                    "Delay of {ms}ms exceeds {}ms; clients may time out first",
                    options.max_delay_ms
                ),
                file.to_path_buf(),
            )
            .for_route_field(route, "delay"),
        ),
        Some(_) => {}
        None => result.add_issue(
            LintIssue::error(
                "E009",
                format!("Invalid delay {delay}, expected a non-negative integer of milliseconds"),
                file.to_path_buf(),
            )
            .for_route_field(route, "delay"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lint(config: Value) -> LintResult {
        let mut result = LintResult::new();
        validate_config(
            Path::new("mocks.json"),
            &config,
            &mut result,
            &LintOptions::default(),
        );
        result
    }

    #[test]
    fn test_valid_configuration_has_no_issues() {
        let result = lint(json!({
            "routes": {
                "/ping": {"response": {"ok": true}},
                "/item": {"response": {"id": 1}, "method": "post", "status": 201, "delay": 50}
            }
        }));
        assert!(result.issues.is_empty(), "{:?}", result.issues);
        assert_eq!(result.routes_checked, 2);
    }

    #[test]
    fn test_empty_configuration() {
        assert_eq!(lint(json!({})).codes(), vec!["E003"]);
        assert_eq!(lint(Value::Null).codes(), vec!["E003"]);
        assert_eq!(lint(json!("routes")).codes(), vec!["E003"]);
    }

    #[test]
    fn test_missing_or_malformed_routes() {
        assert_eq!(lint(json!({"routes": {}})).codes(), vec!["E004"]);
        assert_eq!(lint(json!({"name": "demo"})).codes(), vec!["E004"]);
        assert_eq!(lint(json!({"routes": ["/ping"]})).codes(), vec!["E005"]);
    }

    #[test]
    fn test_missing_and_falsy_response() {
        let result = lint(json!({
            "routes": {
                "/a": {"method": "GET"},
                "/b": {"response": null},
                "/c": {"response": ""},
                "/d": {"response": []}
            }
        }));
        assert_eq!(result.codes(), vec!["E007", "E007", "E007"]);
        assert_eq!(result.issues[0].route.as_deref(), Some("/a"));
    }

    #[test]
    fn test_entry_must_be_object() {
        let result = lint(json!({"routes": {"/a": "pong"}}));
        assert_eq!(result.codes(), vec!["E006"]);
    }

    #[test]
    fn test_method_checks() {
        let result = lint(json!({
            "routes": {
                "/a": {"response": 1, "method": "fetch"},
                "/b": {"response": 1, "method": 5},
                "/c": {"response": 1, "method": "patch"},
                "/d": {"response": 1, "method": ""}
            }
        }));
        assert_eq!(result.codes(), vec!["W001", "E010"]);
    }

    #[test]
    fn test_status_checks() {
        let result = lint(json!({
            "routes": {
                "/a": {"response": 1, "status": 0},
                "/b": {"response": 1, "status": 42},
                "/c": {"response": 1, "status": "200"},
                "/d": {"response": 1, "status": 404}
            }
        }));
        assert_eq!(result.codes(), vec!["W005", "E008", "E008"]);
    }

    #[test]
    fn test_delay_checks() {
        let result = lint(json!({
            "routes": {
                "/a": {"response": 1, "delay": -1},
                "/b": {"response": 1, "delay": 1.5},
                "/c": {"response": 1, "delay": 60000},
                "/d": {"response": 1, "delay": 0}
            }
        }));
        assert_eq!(result.codes(), vec!["E009", "E009", "W004"]);
    }

    #[test]
    fn test_route_key_checks() {
        let result = lint(json!({
            "routes": {
                "/users?active=true": {"response": 1},
                "users": {"response": 1}
            }
        }));
        assert_eq!(result.codes(), vec!["W002", "W003"]);
        assert!(result.issues[0]
            .suggestion
            .as_deref()
            .unwrap()
            .contains("'/users'"));
    }
}

//! Mockgate Route File Linter CLI
//!
//! Checks every route of one or more mock configuration files before they are
//! served.
//!
//! Usage:
//!   mockgate-lint <directory_or_file> [OPTIONS]

use clap::{Parser, ValueEnum};
use mockgate_lint::{collect_route_files, lint_file, LintIssue, LintOptions, LintResult, Severity};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Mockgate Route File Linter
#[derive(Parser, Debug)]
#[command(name = "mockgate-lint")]
#[command(author, version, about = "Validate mockgate route files before serving them")]
struct Args {
    /// Route file (JSON or YAML) or directory containing route files
    #[arg(required = true)]
    path: PathBuf,

    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Only show errors (hide warnings)
    #[arg(short = 'e', long)]
    errors_only: bool,

    /// Strict mode - treat warnings as errors
    #[arg(short, long)]
    strict: bool,

    /// Warn about delays longer than this many milliseconds
    #[arg(long, default_value = "30000")]
    max_delay_ms: u64,
}

fn main() {
    let args = Args::parse();
    let options = LintOptions {
        max_delay_ms: args.max_delay_ms,
    };

    if !args.path.exists() {
        eprintln!("{RED}Error:{RESET} {} does not exist", args.path.display());
        std::process::exit(1);
    }

    let files = collect_route_files(&args.path);
    if files.is_empty() {
        eprintln!(
            "{YELLOW}Warning:{RESET} No JSON or YAML files found in {}",
            args.path.display()
        );
        std::process::exit(0);
    }

    let mut result = LintResult::default();
    for file in &files {
        result.merge(lint_file(file, &options));
    }

    match args.output {
        OutputFormat::Json => print_results_json(&result),
        OutputFormat::Text => print_results(&result, &args),
    }

    let has_errors = result.errors > 0 || (args.strict && result.warnings > 0);
    std::process::exit(if has_errors { 1 } else { 0 });
}

fn print_results_json(result: &LintResult) {
    match serde_json::to_string_pretty(result) {
        Ok(output) => println!("{output}"),
        Err(e) => eprintln!("{RED}Failed to serialize results:{RESET} {e}"),
    }
}

fn print_results(result: &LintResult, args: &Args) {
    println!("{BOLD}{CYAN}Mockgate Route Linter{RESET}");
    println!("{DIM}Scanning:{RESET} {CYAN}{}{RESET}\n", args.path.display());

    let mut issues_by_file: BTreeMap<&Path, Vec<&LintIssue>> = BTreeMap::new();
    for issue in &result.issues {
        if args.errors_only && issue.severity != Severity::Error {
            continue;
        }
        issues_by_file
            .entry(issue.file.as_path())
            .or_default()
            .push(issue);
    }

    if issues_by_file.is_empty() {
        println!("{GREEN}{BOLD}No issues found!{RESET}");
    }

    for (file, issues) in &issues_by_file {
        let file_errors = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        let status_indicator = if file_errors > 0 {
            format!("{RED}FAIL{RESET}")
        } else {
            format!("{YELLOW}WARN{RESET}")
        };
        let file_name = file.file_name().unwrap_or_default().to_string_lossy();
        println!("{status_indicator} {BOLD}{CYAN}{file_name}{RESET}");

        for issue in issues {
            let color = severity_color(issue.severity);
            let location = issue
                .location
                .as_ref()
                .map(|l| format!("{DIM}[{RESET}{CYAN}{l}{RESET}{DIM}]{RESET} "))
                .unwrap_or_default();

            println!(
                "  {color}|{RESET} {location}{BOLD}{color}{}{RESET}: {} {DIM}({}){RESET}",
                issue.severity.label(),
                issue.message,
                issue.code
            );
            if let Some(suggestion) = &issue.suggestion {
                println!("  {color}|{RESET}   {GREEN}-> {suggestion}{RESET}");
            }
        }
        println!();
    }

    println!("{BOLD}{CYAN}Summary{RESET}");
    println!("  {DIM}Files checked:{RESET}  {BOLD}{}{RESET}", result.files_checked);
    println!("  {DIM}Routes checked:{RESET} {BOLD}{}{RESET}", result.routes_checked);
    if result.errors > 0 {
        println!("  {RED}Errors:{RESET}         {BOLD}{RED}{}{RESET}", result.errors);
    } else {
        println!("  {GREEN}Errors:{RESET}         {BOLD}{GREEN}0{RESET}");
    }
    if result.warnings > 0 {
        println!("  {YELLOW}Warnings:{RESET}       {BOLD}{YELLOW}{}{RESET}", result.warnings);
    } else {
        println!("  {DIM}Warnings:{RESET}       {BOLD}0{RESET}");
    }
    println!();

    if result.errors == 0 && result.warnings == 0 {
        println!("{GREEN}{BOLD}All checks passed!{RESET}");
    } else if result.errors == 0 {
        println!("{YELLOW}{BOLD}Passed with warnings{RESET}");
    } else {
        println!("{RED}{BOLD}Linting failed with errors{RESET}");
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => RED,
        Severity::Warning => YELLOW,
    }
}

//! Pass/fail results of preflight and validation checks

use colored::*;
use serde::Serialize;
use serde_json::Value;

use crate::logging::{RunLogger, BANNER_WIDTH};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    /// Diagnosis for a failure, or a short note for a pass
    pub message: Option<String>,
    pub warnings: Vec<String>,
    pub metadata: Option<Value>,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: None,
            warnings: Vec::new(),
            metadata: None,
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: Some(message.into()),
            warnings: Vec::new(),
            metadata: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn status_label(&self) -> &'static str {
        if self.passed { "PASS" } else { "FAIL" }
    }
}

/// Ordered results of one run of checks
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn warning_count(&self) -> usize {
        self.results.iter().map(|r| r.warnings.len()).sum()
    }

    /// 0 when every check passed, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }

    /// `name  PASS|FAIL` rows with the names padded to `name_width`
    pub fn summary_lines(&self, name_width: usize) -> Vec<String> {
        self.results
            .iter()
            .map(|r| format!("  {:<width$} {}", r.name, r.status_label(), width = name_width))
            .collect()
    }

    /// Log the summary table between `-` rules
    pub fn log_summary(&self, logger: &RunLogger, name_width: usize) {
        logger.rule('-');
        for line in self.summary_lines(name_width) {
            logger.info(line);
        }
        logger.rule('-');
    }

    /// Print the summary table to stdout with ✓/✗ marks
    pub fn print_summary(&self, name_width: usize) {
        println!("{}", "-".repeat(BANNER_WIDTH).dimmed());
        for result in &self.results {
            let mark = if result.passed {
                "✓".bright_green().bold()
            } else {
                "✗".bright_red().bold()
            };
            let label = if result.passed {
                result.status_label().bright_green()
            } else {
                result.status_label().bright_red()
            };
            println!("  {} {:<width$} {}", mark, result.name, label, width = name_width);
        }
        println!("{}", "-".repeat(BANNER_WIDTH).dimmed());
    }
}

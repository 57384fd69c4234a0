//! Local repository structure checks
//!
//! Pure filesystem inspection, no credentials and no network. Hard failures
//! are a missing `workspace/` directory and a missing or unparsable
//! `config/parameter.yml`; everything else is a warning.

use std::fs;
use std::path::Path;

use crate::config::TargetEnvironment;
use crate::logging::RunLogger;
use crate::report::{CheckReport, CheckResult};

pub const WORKSPACE_DIR: &str = "workspace";
pub const PARAMETER_FILE: &str = "config/parameter.yml";
pub const PLATFORM_FILE: &str = ".platform";

/// Sections of `parameter.yml` expected to be keyed by environment
pub const PARAMETER_SECTIONS: [&str; 2] = ["find_replace", "key_value_replace"];

pub const WORKSPACE_CHECK: &str = "Workspace directory";
pub const PARAMETER_CHECK: &str = "parameter.yml";
pub const PLATFORM_CHECK: &str = "Platform files";

pub const SUMMARY_NAME_WIDTH: usize = 25;

/// (a) `workspace/` exists; empty is only a warning
pub fn check_workspace_dir(repo_root: &Path, logger: &RunLogger) -> CheckResult {
    let workspace = repo_root.join(WORKSPACE_DIR);
    if !workspace.is_dir() {
        let message = format!("workspace/ directory not found at {}", workspace.display());
        logger.error(&message);
        return CheckResult::fail(WORKSPACE_CHECK, message);
    }

    let count = match fs::read_dir(&workspace) {
        Ok(entries) => entries.filter_map(|e| e.ok()).count(),
        Err(e) => {
            let message = format!("workspace/ directory could not be read: {}", e);
            logger.error(&message);
            return CheckResult::fail(WORKSPACE_CHECK, message);
        }
    };

    if count == 0 {
        let warning = "workspace/ directory is empty; nothing to deploy.";
        logger.warn(warning);
        return CheckResult::pass(WORKSPACE_CHECK).with_warning(warning);
    }

    let message = format!("workspace/ contains {} item(s).", count);
    logger.info(&message);
    CheckResult::pass(WORKSPACE_CHECK).with_message(message)
}

/// (b) `config/parameter.yml` exists and is a YAML mapping
pub fn check_parameter_yml(repo_root: &Path, logger: &RunLogger) -> CheckResult {
    let param_file = repo_root.join(PARAMETER_FILE);
    if !param_file.is_file() {
        let message = format!("config/parameter.yml not found at {}", param_file.display());
        logger.error(&message);
        return CheckResult::fail(PARAMETER_CHECK, message);
    }

    let content = match fs::read_to_string(&param_file) {
        Ok(content) => content,
        Err(e) => {
            let message = format!("config/parameter.yml could not be read: {}", e);
            logger.error(&message);
            return CheckResult::fail(PARAMETER_CHECK, message);
        }
    };

    let data: serde_yaml::Value = match serde_yaml::from_str(&content) {
        Ok(data) => data,
        Err(e) => {
            let message = format!("config/parameter.yml is not valid YAML: {}", e);
            logger.error(&message);
            return CheckResult::fail(PARAMETER_CHECK, message);
        }
    };

    let Some(mapping) = data.as_mapping() else {
        let message = "config/parameter.yml root should be a mapping.";
        logger.error(message);
        return CheckResult::fail(PARAMETER_CHECK, message);
    };

    let mut result = CheckResult::pass(PARAMETER_CHECK);
    let mut has_sections = false;

    for section in PARAMETER_SECTIONS {
        let Some(section_data) = mapping.get(section) else {
            continue;
        };
        has_sections = true;

        if let Some(section_map) = section_data.as_mapping() {
            let missing: Vec<&str> = missing_environments(section_map);
            if !missing.is_empty() {
                let warning = format!(
                    "config/parameter.yml section '{}' is missing environments: {}",
                    section,
                    missing.join(", ")
                );
                logger.warn(&warning);
                result = result.with_warning(warning);
            }
        }
    }

    if !has_sections {
        let warning = "config/parameter.yml has no 'find_replace' or 'key_value_replace' sections.";
        logger.warn(warning);
        result = result.with_warning(warning);
    }

    logger.info("config/parameter.yml is valid.");
    result
}

/// Required environments absent from a section, sorted
fn missing_environments(section: &serde_yaml::Mapping) -> Vec<&'static str> {
    let mut missing: Vec<&'static str> = TargetEnvironment::ALL
        .iter()
        .map(TargetEnvironment::as_str)
        .filter(|env| !section.contains_key(*env))
        .collect();
    missing.sort_unstable();
    missing
}

/// (c) every item folder has a `.platform` file; missing ones are warnings
pub fn check_platform_files(repo_root: &Path, logger: &RunLogger) -> CheckResult {
    let workspace = repo_root.join(WORKSPACE_DIR);
    let mut result = CheckResult::pass(PLATFORM_CHECK);

    // A missing workspace/ is already reported by check_workspace_dir
    let Ok(entries) = fs::read_dir(&workspace) else {
        return result;
    };

    let mut item_dirs: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    item_dirs.sort();

    for item_dir in item_dirs {
        if !item_dir.join(PLATFORM_FILE).is_file() {
            let name = item_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let warning = format!("Item folder '{}' is missing a .platform file.", name);
            logger.warn(&warning);
            result = result.with_warning(warning);
        }
    }

    result
}

/// Run all repository checks in order
pub fn validate_repository(repo_root: &Path, logger: &RunLogger) -> CheckReport {
    logger.info(format!("Validating repository at {}", repo_root.display()));

    let mut report = CheckReport::new();
    report.push(check_workspace_dir(repo_root, logger));
    report.push(check_parameter_yml(repo_root, logger));
    report.push(check_platform_files(repo_root, logger));
    report
}

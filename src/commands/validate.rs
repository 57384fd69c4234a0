use anyhow::Result;
use std::path::Path;

use crate::logging::RunLogger;
use crate::validate::{validate_repository, SUMMARY_NAME_WIDTH};

pub fn validate_command(repo_root: &Path) -> Result<i32> {
    let logger = RunLogger::new("fabric_deploy::validate");
    let repo_root = std::path::absolute(repo_root).unwrap_or_else(|_| repo_root.to_path_buf());

    let report = validate_repository(&repo_root, &logger);
    report.log_summary(&logger, SUMMARY_NAME_WIDTH);
    report.print_summary(SUMMARY_NAME_WIDTH);

    if report.all_passed() {
        logger.info(format!(
            "All validation checks PASSED ({} warning(s)).",
            report.warning_count()
        ));
    } else {
        logger.error("Validation FAILED. Fix errors above before deploying.");
    }
    Ok(report.exit_code())
}

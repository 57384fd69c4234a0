use anyhow::{Context, Result};

use crate::config::{Endpoints, PreflightConfig, VarSource};
use crate::logging::RunLogger;
use crate::preflight::{run_preflight, COMMON_FIXES, SUMMARY_NAME_WIDTH};

pub async fn preflight_command(vars: &dyn VarSource) -> Result<i32> {
    let logger = RunLogger::new("fabric_deploy::preflight");
    let config = PreflightConfig::from_vars(vars).context("Invalid preflight configuration")?;
    let endpoints = Endpoints::from_vars(vars);

    let report = run_preflight(&config, vars, &endpoints, &logger).await?;

    report.log_summary(&logger, SUMMARY_NAME_WIDTH);
    report.print_summary(SUMMARY_NAME_WIDTH);

    if report.all_passed() {
        logger.info("All pre-flight checks PASSED, safe to deploy.");
    } else {
        logger.error(format!(
            "Pre-flight checks FAILED. Fix the errors above before deploying.\n{}",
            COMMON_FIXES
        ));
    }
    Ok(report.exit_code())
}

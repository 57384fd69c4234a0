//! Pre-deployment credential and workspace accessibility checks
//!
//! Two read-only probes, always both run:
//! 1. a Fabric token can be issued for the service principal;
//! 2. `GET /v1/workspaces/{id}` succeeds with that token.

use serde_json::json;

use crate::api::auth::{AuthError, TokenCredential};
use crate::api::client::{ApiResponse, FabricClient};
use crate::api::constants::{truncate_body, FABRIC_SCOPE};
use crate::api::models::WorkspaceInfo;
use crate::auth::{resolve_credential, ValidationMode};
use crate::config::{Endpoints, PreflightConfig, VarSource};
use crate::error::{DeployError, Result};
use crate::logging::RunLogger;
use crate::report::{CheckReport, CheckResult};

pub const TOKEN_CHECK: &str = "AAD token acquisition";
pub const ACCESS_CHECK: &str = "Fabric workspace access";

/// Padding of the check-name column in the summary table
pub const SUMMARY_NAME_WIDTH: usize = 30;

pub const TOKEN_REJECTED_HINT: &str = "\
Hint: Verify TENANT_ID, CLIENT_ID, CLIENT_SECRET are correct for this
      environment and that the service principal exists in the target
      Azure AD tenant (not a different tenant/directory).";

pub const TOKEN_UNEXPECTED_HINT: &str = "\
Hint: The token request failed for a reason other than a rejected
      credential. Check connectivity to the identity provider.";

pub const FORBIDDEN_HINT: &str = "\
Hint: The service principal (CLIENT_ID) must be added to the Fabric
      workspace with at least the 'Contributor' role.
Steps to fix:
  1. Open the Fabric portal (https://app.fabric.microsoft.com).
  2. Navigate to the workspace.
  3. Go to Workspace settings -> Manage access.
  4. Add the service principal with the 'Contributor' role.";

pub const NOT_FOUND_HINT: &str =
    "Hint: Verify TARGET_WORKSPACE_ID is the correct Fabric workspace GUID.";

pub const COMMON_FIXES: &str = "\
Common fixes:
  - Wrong tenant: ensure TENANT_ID matches the tenant that owns the
    service principal AND the Fabric workspace.
  - SP not in workspace: add the SP to the workspace with Contributor
    role via Fabric portal -> Workspace settings -> Manage access.
  - SP not consented: run  az ad sp show --id <CLIENT_ID>  to verify
    the SP exists in the target tenant.";

/// Check 1: a token is issued for the Fabric scope
pub async fn check_token(credential: &dyn TokenCredential, logger: &RunLogger) -> CheckResult {
    logger.info("Checking AAD token acquisition…");

    match credential.get_token(FABRIC_SCOPE).await {
        Ok(token) => {
            logger.info(format!(
                "AAD token acquired successfully (token[:10]={}).",
                token.masked()
            ));
            CheckResult::pass(TOKEN_CHECK)
        }
        Err(err) => {
            let message = token_failure_message(&err);
            logger.error(&message);
            CheckResult::fail(TOKEN_CHECK, message)
        }
    }
}

fn token_failure_message(err: &AuthError) -> String {
    if err.is_rejected() {
        format!("AAD token acquisition FAILED.\n  Cause: {}\n{}", err, TOKEN_REJECTED_HINT)
    } else {
        format!("Unexpected error acquiring token: {}\n{}", err, TOKEN_UNEXPECTED_HINT)
    }
}

/// Check 2: the workspace can be read with a fresh token
pub async fn check_workspace_access(
    credential: &dyn TokenCredential,
    client: &FabricClient,
    workspace_id: &str,
    logger: &RunLogger,
) -> CheckResult {
    logger.info(format!(
        "Checking Fabric workspace access (workspace_id={})…",
        workspace_id
    ));

    let token = match credential.get_token(FABRIC_SCOPE).await {
        Ok(token) => token,
        Err(err) => {
            let message = format!("Cannot check workspace: token error: {}", err);
            logger.error(&message);
            return CheckResult::fail(ACCESS_CHECK, message);
        }
    };

    let result = match client.get_workspace(workspace_id, &token.token).await {
        Ok(response) => classify_access_response(&response, workspace_id),
        Err(err) => transport_failure(&err, client.base_url()),
    };

    match (&result.passed, &result.message) {
        (true, Some(message)) => logger.info(message),
        (false, Some(message)) => logger.error(message),
        _ => {}
    }
    result
}

/// Response-code policy of the access check
pub fn classify_access_response(response: &ApiResponse, workspace_id: &str) -> CheckResult {
    match response.status {
        200 => {
            let info: WorkspaceInfo = response.json().unwrap_or_default();
            CheckResult::pass(ACCESS_CHECK)
                .with_message(format!(
                    "Workspace accessible: name={:?}, capacity={:?}.",
                    info.display_name, info.capacity_id
                ))
                .with_metadata(json!({
                    "id": info.id,
                    "displayName": info.display_name,
                    "capacityId": info.capacity_id,
                }))
        }
        403 => CheckResult::fail(
            ACCESS_CHECK,
            format!(
                "Workspace access DENIED (HTTP 403).\n  Workspace ID : {}\n{}",
                workspace_id, FORBIDDEN_HINT
            ),
        ),
        404 => CheckResult::fail(
            ACCESS_CHECK,
            format!(
                "Workspace NOT FOUND (HTTP 404).\n  Workspace ID : {}\n{}",
                workspace_id, NOT_FOUND_HINT
            ),
        ),
        status => CheckResult::fail(
            ACCESS_CHECK,
            format!(
                "Unexpected response from Fabric API (HTTP {}): {}",
                status,
                truncate_body(&response.body)
            ),
        ),
    }
}

fn transport_failure(err: &DeployError, api_base: &str) -> CheckResult {
    let cause = match err {
        DeployError::Transport { source, .. } => source.to_string(),
        other => other.to_string(),
    };
    CheckResult::fail(
        ACCESS_CHECK,
        format!(
            "HTTP request to Fabric API failed: {}\nHint: Check network connectivity and that the Fabric API endpoint\n      ({}) is reachable from the runner.",
            cause, api_base
        ),
    )
}

/// Resolve the credential lazily and run both checks.
///
/// Configuration errors are returned before anything touches the network;
/// check failures are reported in the returned [`CheckReport`].
pub async fn run_preflight(
    config: &PreflightConfig,
    vars: &dyn VarSource,
    endpoints: &Endpoints,
    logger: &RunLogger,
) -> Result<CheckReport> {
    let logger = logger.for_environment(config.environment);
    let resolved = resolve_credential(
        config.environment.as_str(),
        vars,
        endpoints,
        ValidationMode::Lazy,
        &logger,
    )
    .await?;

    logger.banner(
        "PRE-FLIGHT CHECK",
        &[
            ("Environment", config.environment.to_string()),
            ("Workspace ID", config.workspace_id.clone()),
            ("Tenant ID", resolved.tenant_id.clone()),
            ("Client ID", resolved.client_id.clone()),
        ],
    );

    let client = FabricClient::new(&endpoints.api_base, &logger)?;
    let credential = resolved.credential.as_ref();

    let mut report = CheckReport::new();
    report.push(check_token(credential, &logger).await);
    report.push(check_workspace_access(credential, &client, &config.workspace_id, &logger).await);
    Ok(report)
}

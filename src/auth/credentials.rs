use std::fmt;
use std::sync::Arc;

use crate::api::auth::{AuthError, ClientSecretCredential, TokenCredential};
use crate::api::constants::FABRIC_SCOPE;
use crate::config::{resolve_credentials, Endpoints, VarSource};
use crate::error::{DeployError, Result};
use crate::logging::{mask_secret, RunLogger};

/// Remediation steps printed when the identity provider refuses the credential
pub const AUTH_FAILURE_HINTS: &str = "\
  Hints:
    - Tenant mismatch: TENANT_ID must be the tenant that owns both the service
      principal and the Fabric workspace.
    - Expired or rotated secret: create a new client secret for the app
      registration and update CLIENT_SECRET for this environment.
    - Missing workspace role: add the service principal to the workspace with
      at least the 'Contributor' role (Workspace settings -> Manage access).";

/// Whether to prove the credential works before returning it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Build the handle only; the first real call validates it
    Lazy,
    /// Request a Fabric token immediately and fail fast if it is refused
    Eager,
}

/// A service-principal credential resolved for one environment
#[derive(Clone)]
pub struct ResolvedCredential {
    pub environment: String,
    pub tenant_id: String,
    pub client_id: String,
    pub credential: Arc<dyn TokenCredential>,
}

impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("environment", &self.environment)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Resolve and optionally validate the credential for `environment`.
///
/// This is the only way the deploy and preflight paths obtain a credential.
/// Resolution errors return before any network call is made.
pub async fn resolve_credential(
    environment: &str,
    vars: &dyn VarSource,
    endpoints: &Endpoints,
    mode: ValidationMode,
    logger: &RunLogger,
) -> Result<ResolvedCredential> {
    let environment = environment.trim().to_uppercase();
    let triple = resolve_credentials(&environment, vars)?;

    logger.info(format!(
        "Authenticating service principal for {} (tenant={}, client={}, secret={}).",
        environment,
        triple.tenant_id,
        triple.client_id,
        mask_secret(triple.client_secret())
    ));

    let credential = ClientSecretCredential::new(&triple, &endpoints.authority_host).map_err(|source| {
        DeployError::Authentication {
            tenant_id: triple.tenant_id.clone(),
            client_id: triple.client_id.clone(),
            source,
        }
    })?;

    if mode == ValidationMode::Eager {
        validate(&credential, logger).await?;
    }

    Ok(ResolvedCredential {
        environment,
        tenant_id: triple.tenant_id,
        client_id: triple.client_id,
        credential: Arc::new(credential),
    })
}

async fn validate(credential: &ClientSecretCredential, logger: &RunLogger) -> Result<()> {
    match credential.get_token(FABRIC_SCOPE).await {
        Ok(token) => {
            logger.info(format!("Credential validated (token[:10]={}).", token.masked()));
            Ok(())
        }
        Err(source) => {
            logger.error(format!(
                "Credential validation FAILED.\n  Tenant ID : {}\n  Client ID : {}\n  Cause     : {}\n{}",
                credential.tenant_id(),
                credential.client_id(),
                source,
                failure_hint(&source)
            ));
            Err(DeployError::Authentication {
                tenant_id: credential.tenant_id().to_string(),
                client_id: credential.client_id().to_string(),
                source,
            })
        }
    }
}

/// The hint block matching an authentication failure
pub fn failure_hint(err: &AuthError) -> &'static str {
    match err {
        AuthError::Transport(_) => {
            "  Hint: The identity provider could not be reached. Check network\n        connectivity and AZURE_AUTHORITY_HOST."
        }
        _ => AUTH_FAILURE_HINTS,
    }
}

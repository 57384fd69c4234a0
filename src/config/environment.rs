//! Target environments and service-principal credential resolution

use std::fmt;
use std::str::FromStr;

use super::vars::{first_match, VarSource};
use crate::error::{DeployError, Result};

/// Prefix of the generic credential variables used when no
/// environment-specific one is set.
pub const FALLBACK_PREFIX: &str = "FABRIC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetEnvironment {
    Dev,
    Qa,
    Prod,
}

impl TargetEnvironment {
    pub const ALL: [TargetEnvironment; 3] = [Self::Dev, Self::Qa, Self::Prod];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "DEV",
            Self::Qa => "QA",
            Self::Prod => "PROD",
        }
    }
}

impl fmt::Display for TargetEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetEnvironment {
    type Err = DeployError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_uppercase().as_str() {
            "DEV" => Ok(Self::Dev),
            "QA" => Ok(Self::Qa),
            "PROD" => Ok(Self::Prod),
            _ => Err(DeployError::InvalidEnvironment {
                value: value.to_string(),
            }),
        }
    }
}

/// The three fields of a service-principal credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    TenantId,
    ClientId,
    ClientSecret,
}

impl CredentialField {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::TenantId => "TENANT_ID",
            Self::ClientId => "CLIENT_ID",
            Self::ClientSecret => "CLIENT_SECRET",
        }
    }

    /// Lookup order for this field: `<ENV>_<FIELD>` then `FABRIC_<FIELD>`.
    pub fn candidate_keys(&self, environment: &str) -> Vec<String> {
        vec![
            format!("{}_{}", environment.trim().to_uppercase(), self.suffix()),
            format!("{}_{}", FALLBACK_PREFIX, self.suffix()),
        ]
    }
}

/// Tenant, client id and client secret of a service principal.
///
/// The secret is only reachable through [`CredentialTriple::client_secret`];
/// `Debug` output redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialTriple {
    pub tenant_id: String,
    pub client_id: String,
    client_secret: String,
}

impl CredentialTriple {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for CredentialTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialTriple")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Resolve the credential triple for `environment`.
///
/// The name is upper-cased before variable names are built, so `dev`, `Dev`
/// and `DEV` all read `DEV_TENANT_ID`. Any field with neither a specific nor
/// a generic value is a configuration error naming the generic variable.
pub fn resolve_credentials(environment: &str, vars: &dyn VarSource) -> Result<CredentialTriple> {
    let resolve = |field: CredentialField| -> Result<String> {
        let candidates = field.candidate_keys(environment);
        match first_match(vars, &candidates) {
            Some((key, value)) => {
                log::debug!("Resolved {} from {}", field.suffix(), key);
                Ok(value)
            }
            None => Err(DeployError::MissingVar(
                candidates.last().cloned().unwrap_or_default(),
            )),
        }
    };

    Ok(CredentialTriple {
        tenant_id: resolve(CredentialField::TenantId)?,
        client_id: resolve(CredentialField::ClientId)?,
        client_secret: resolve(CredentialField::ClientSecret)?,
    })
}

use async_trait::async_trait;
use std::fmt;
use std::time::{Duration, SystemTime};
use thiserror::Error;

use super::constants::{http_client, token_endpoint, truncate_body};
use crate::config::CredentialTriple;

/// A bearer token and the instant it stops being valid
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: SystemTime,
}

impl AccessToken {
    /// First ten characters followed by an ellipsis, safe to log
    pub fn masked(&self) -> String {
        let prefix: String = self.token.chars().take(10).collect();
        format!("{}…", prefix)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &self.masked())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider answered and refused the credential
    #[error("Identity provider rejected the credential (HTTP {status}, {code}): {description}")]
    Rejected {
        status: u16,
        code: String,
        description: String,
    },

    #[error("Token request could not be completed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected token response (HTTP {status}): {body}")]
    Unexpected { status: u16, body: String },
}

impl AuthError {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Anything that can issue bearer tokens for a scope
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthError>;
}

/// Service-principal credential using the OAuth2 client-credentials grant
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    authority_host: String,
    http_client: reqwest::Client,
}

impl ClientSecretCredential {
    /// Build the handle without contacting the identity provider
    pub fn new(triple: &CredentialTriple, authority_host: &str) -> Result<Self, AuthError> {
        Ok(Self {
            tenant_id: triple.tenant_id.clone(),
            client_id: triple.client_id.clone(),
            client_secret: triple.client_secret().to_string(),
            authority_host: authority_host.trim_end_matches('/').to_string(),
            http_client: http_client()?,
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("authority_host", &self.authority_host)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
        let token_url = token_endpoint(&self.authority_host, &self.tenant_id);
        log::debug!("Requesting token for scope {} from {}", scope, token_url);

        let response = self
            .http_client
            .post(&token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope),
            ])
            .send()
            .await?;

        let status = response.status();
        log::debug!("Token request status: {}", status);

        if status.is_success() {
            let token_data: serde_json::Value = response.json().await?;

            let access_token = token_data
                .get("access_token")
                .and_then(|t| t.as_str())
                .ok_or_else(|| AuthError::Unexpected {
                    status: status.as_u16(),
                    body: "no access_token in response".to_string(),
                })?;

            // Some authorities send expires_in as a string
            let expires_in = token_data
                .get("expires_in")
                .and_then(|e| e.as_u64().or_else(|| e.as_str().and_then(|s| s.parse().ok())))
                .unwrap_or(3600);

            return Ok(AccessToken {
                token: access_token.to_string(),
                expires_at: SystemTime::now() + Duration::from_secs(expires_in),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let error_data: Option<serde_json::Value> = serde_json::from_str(&body).ok();
        let code = error_data
            .as_ref()
            .and_then(|d| d.get("error"))
            .and_then(|e| e.as_str());

        match (status.as_u16(), code) {
            (400 | 401, Some(code)) => Err(AuthError::Rejected {
                status: status.as_u16(),
                code: code.to_string(),
                description: error_data
                    .as_ref()
                    .and_then(|d| d.get("error_description"))
                    .and_then(|d| d.as_str())
                    .unwrap_or_default()
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .to_string(),
            }),
            _ => Err(AuthError::Unexpected {
                status: status.as_u16(),
                body: truncate_body(&body),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_masking() {
        let token = AccessToken {
            token: "eyJ0eXAiOiJKV1QiLCJhbGciOiJSUzI1NiJ9".to_string(),
            expires_at: SystemTime::now() + Duration::from_secs(60),
        };
        assert_eq!(token.masked(), "eyJ0eXAiOi…");
        assert!(!format!("{:?}", token).contains("JSUzI1NiJ9"));
    }

    #[test]
    fn test_credential_debug_hides_secret() {
        let triple = CredentialTriple::new("tenant", "client", "s3cr3t");
        let credential = ClientSecretCredential::new(&triple, "https://login.example.com/").unwrap();
        let debug = format!("{:?}", credential);
        assert!(debug.contains("tenant"));
        assert!(!debug.contains("s3cr3t"));
        assert_eq!(credential.tenant_id(), "tenant");
        assert_eq!(credential.client_id(), "client");
    }
}

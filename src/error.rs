//! Error taxonomy shared by the deploy, preflight and listing paths.

use std::path::PathBuf;
use thiserror::Error;

use crate::api::auth::AuthError;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Required environment variable {0} is not set")]
    MissingVar(String),

    #[error("Invalid TARGET_ENVIRONMENT '{value}'. Must be one of: DEV, PROD, QA")]
    InvalidEnvironment { value: String },

    #[error("Authentication failed for tenant={tenant_id}, client={client_id}")]
    Authentication {
        tenant_id: String,
        client_id: String,
        #[source]
        source: AuthError,
    },

    #[error("Access denied to {resource} (HTTP 403): {body}")]
    Forbidden { resource: String, body: String },

    #[error("{resource} not found (HTTP 404): {body}")]
    NotFound { resource: String, body: String },

    #[error("HTTP request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Fabric API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Cannot page through {resource}: {message}")]
    Pagination { resource: String, message: String },

    #[error("Invalid parameter file {}: {message}", path.display())]
    Parameters { path: PathBuf, message: String },

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// HTTP status behind this failure, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Process exit status for this failure. Every failure exits with 1.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;

//! Microsoft Fabric REST API and Entra ID token access
//!
//! Token acquisition sits behind the [`TokenCredential`] trait; workspace
//! calls go through [`FabricClient`], which takes the bearer token per call.

pub mod auth;
pub mod client;
pub mod constants;
pub mod models;

pub use auth::{AccessToken, AuthError, ClientSecretCredential, TokenCredential};
pub use client::{status_error, ApiResponse, FabricClient};
pub use models::{WorkspaceInfo, WorkspaceItem};

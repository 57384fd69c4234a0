//! Service-principal credential building

pub mod credentials;

pub use credentials::{failure_hint, resolve_credential, ResolvedCredential, ValidationMode, AUTH_FAILURE_HINTS};

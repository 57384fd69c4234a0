//! API constants and URL builders for the Fabric REST API and Entra ID

use std::time::Duration;

/// Public-cloud Fabric REST API host
pub const FABRIC_API_BASE: &str = "https://api.fabric.microsoft.com";

/// Token scope requested for every Fabric API call
pub const FABRIC_SCOPE: &str = "https://api.fabric.microsoft.com/.default";

/// Public-cloud Entra ID authority
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Fabric REST API version segment
pub const API_VERSION: &str = "v1";

/// Request timeout for every HTTP call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub const USER_AGENT: &str = concat!("fabric-deploy/", env!("CARGO_PKG_VERSION"));

/// Response bodies are cut to this many characters in diagnostics
pub const BODY_SNIPPET_LIMIT: usize = 500;

/// Upper bound on long-running-operation status polls
pub const MAX_OPERATION_POLLS: u32 = 60;

/// Upper bound on pages fetched when listing workspace items
pub const MAX_ITEM_PAGES: usize = 1_000;

/// Poll interval when the server sends no `Retry-After`
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Payload type of inline item definition parts
pub const PAYLOAD_TYPE_INLINE_BASE64: &str = "InlineBase64";

/// OAuth2 v2 token endpoint for a tenant
pub fn token_endpoint(authority_host: &str, tenant_id: &str) -> String {
    format!("{}/{}/oauth2/v2.0/token", authority_host, tenant_id)
}

pub fn workspace_endpoint(base_url: &str, workspace_id: &str) -> String {
    format!("{}/{}/workspaces/{}", base_url, API_VERSION, workspace_id)
}

pub fn items_endpoint(base_url: &str, workspace_id: &str) -> String {
    format!("{}/items", workspace_endpoint(base_url, workspace_id))
}

pub fn item_endpoint(base_url: &str, workspace_id: &str, item_id: &str) -> String {
    format!("{}/{}", items_endpoint(base_url, workspace_id), item_id)
}

pub fn update_definition_endpoint(base_url: &str, workspace_id: &str, item_id: &str) -> String {
    format!("{}/updateDefinition", item_endpoint(base_url, workspace_id, item_id))
}

/// Cut a response body to [`BODY_SNIPPET_LIMIT`] characters
pub fn truncate_body(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_LIMIT).collect()
}

/// HTTP client shared by the token and workspace calls
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
}

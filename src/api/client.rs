use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use super::constants::{
    http_client, item_endpoint, items_endpoint, truncate_body, update_definition_endpoint,
    workspace_endpoint, DEFAULT_POLL_INTERVAL, MAX_ITEM_PAGES, MAX_OPERATION_POLLS,
};
use super::models::{
    CreateItemRequest, ItemDefinition, ItemsPage, OperationState, UpdateDefinitionRequest,
    WorkspaceItem,
};
use crate::error::{DeployError, Result};
use crate::logging::RunLogger;

/// Status and body of a response, read in full
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Map a non-success status to the matching error variant
pub fn status_error(status: u16, body: &str, resource: &str) -> DeployError {
    match status {
        403 => DeployError::Forbidden {
            resource: resource.to_string(),
            body: truncate_body(body),
        },
        404 => DeployError::NotFound {
            resource: resource.to_string(),
            body: truncate_body(body),
        },
        _ => DeployError::Api {
            status,
            body: truncate_body(body),
        },
    }
}

/// Fabric REST API client. Every call takes the bearer token explicitly.
pub struct FabricClient {
    base_url: String,
    http_client: reqwest::Client,
    logger: RunLogger,
}

impl FabricClient {
    pub fn new(base_url: &str, logger: &RunLogger) -> Result<Self> {
        let http_client = http_client().map_err(|source| DeployError::Transport {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self::with_custom_client(base_url, http_client, logger))
    }

    /// Create a client around a preconfigured HTTP client
    pub fn with_custom_client(base_url: &str, http_client: reqwest::Client, logger: &RunLogger) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            logger: logger.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        method: reqwest::Method,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let started = Instant::now();
        self.logger.log_request(method.as_str(), url);

        let mut request = self
            .http_client
            .request(method.clone(), url)
            .bearer_auth(token)
            .query(query);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|source| DeployError::Transport {
            url: url.to_string(),
            source,
        })?;
        self.logger
            .log_response(method.as_str(), url, response.status().as_u16(), started);
        Ok(response)
    }

    async fn read(url: &str, response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| DeployError::Transport {
            url: url.to_string(),
            source,
        })?;
        Ok(ApiResponse { status, body })
    }

    /// `GET /v1/workspaces/{id}` with the status left for the caller to judge
    pub async fn get_workspace(&self, workspace_id: &str, token: &str) -> Result<ApiResponse> {
        let url = workspace_endpoint(&self.base_url, workspace_id);
        let response = self.send(reqwest::Method::GET, &url, token, &[], None).await?;
        Self::read(&url, response).await
    }

    /// All items of a workspace, following continuation links.
    ///
    /// Stops with an error after [`MAX_ITEM_PAGES`] pages, on a repeated
    /// continuation, or on a continuation URI outside the API base.
    pub async fn list_items(&self, workspace_id: &str, token: &str) -> Result<Vec<WorkspaceItem>> {
        let resource = format!("workspace {}", workspace_id);
        let pagination_error = |message: String| DeployError::Pagination {
            resource: resource.clone(),
            message,
        };

        let mut items = Vec::new();
        let mut url = items_endpoint(&self.base_url, workspace_id);
        let mut continuation: Option<String> = None;
        let mut seen: HashSet<String> = HashSet::new();

        for _ in 0..MAX_ITEM_PAGES {
            let query: Vec<(&str, &str)> = continuation
                .as_deref()
                .map(|next| vec![("continuationToken", next)])
                .unwrap_or_default();
            let response = self.send(reqwest::Method::GET, &url, token, &query, None).await?;
            let response = Self::read(&url, response).await?;
            if response.status != 200 {
                return Err(status_error(response.status, &response.body, &resource));
            }

            let page: ItemsPage = response.json().map_err(|e| DeployError::Api {
                status: response.status,
                body: format!("invalid items page: {}", e),
            })?;
            items.extend(page.value);

            match (page.continuation_uri, page.continuation_token) {
                (Some(next), _) => {
                    if !self.is_own_url(&next) {
                        return Err(pagination_error(format!(
                            "continuation URI {} is outside {}",
                            next, self.base_url
                        )));
                    }
                    if !seen.insert(format!("uri:{}", next)) {
                        return Err(pagination_error(format!("continuation URI {} repeated", next)));
                    }
                    url = next;
                    continuation = None;
                }
                (None, Some(next)) => {
                    if !seen.insert(format!("token:{}", next)) {
                        return Err(pagination_error(format!("continuation token {} repeated", next)));
                    }
                    continuation = Some(next);
                }
                (None, None) => return Ok(items),
            }
        }

        Err(pagination_error(format!(
            "more than {} pages of items",
            MAX_ITEM_PAGES
        )))
    }

    /// Whether `url` points at this client's API host and path prefix
    fn is_own_url(&self, url: &str) -> bool {
        url.strip_prefix(self.base_url.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
    }

    pub async fn create_item(&self, workspace_id: &str, token: &str, request: &CreateItemRequest) -> Result<()> {
        let url = items_endpoint(&self.base_url, workspace_id);
        let resource = format!("{} '{}'", request.item_type, request.display_name);
        let response = self
            .send(reqwest::Method::POST, &url, token, &[], Some(to_body(request)?))
            .await?;
        self.complete(response, &url, token, &resource).await
    }

    pub async fn update_item_definition(
        &self,
        workspace_id: &str,
        item_id: &str,
        token: &str,
        definition: ItemDefinition,
    ) -> Result<()> {
        let url = update_definition_endpoint(&self.base_url, workspace_id, item_id);
        let request = UpdateDefinitionRequest { definition };
        let response = self
            .send(reqwest::Method::POST, &url, token, &[], Some(to_body(&request)?))
            .await?;
        self.complete(response, &url, token, &format!("item {}", item_id)).await
    }

    pub async fn delete_item(&self, workspace_id: &str, item_id: &str, token: &str) -> Result<()> {
        let url = item_endpoint(&self.base_url, workspace_id, item_id);
        let response = self.send(reqwest::Method::DELETE, &url, token, &[], None).await?;
        self.complete(response, &url, token, &format!("item {}", item_id)).await
    }

    /// Accept 200/201/204, follow a 202 operation to its end, map anything else to an error
    async fn complete(&self, response: reqwest::Response, url: &str, token: &str, resource: &str) -> Result<()> {
        let status = response.status().as_u16();
        match status {
            200 | 201 | 204 => Ok(()),
            202 => {
                let location = header(&response, reqwest::header::LOCATION);
                let delay = retry_after(&response);
                match location {
                    Some(location) => self.await_operation(&location, delay, token, resource).await,
                    None => {
                        self.logger
                            .warn(format!("{} accepted without an operation location", resource));
                        Ok(())
                    }
                }
            }
            _ => {
                let response = Self::read(url, response).await?;
                Err(status_error(response.status, &response.body, resource))
            }
        }
    }

    async fn await_operation(&self, location: &str, mut delay: Duration, token: &str, resource: &str) -> Result<()> {
        for attempt in 1..=MAX_OPERATION_POLLS {
            tokio::time::sleep(delay).await;

            let response = self.send(reqwest::Method::GET, location, token, &[], None).await?;
            delay = retry_after(&response);
            let response = Self::read(location, response).await?;
            if !(200..300).contains(&response.status) {
                return Err(status_error(response.status, &response.body, resource));
            }

            let state: OperationState = response.json().map_err(|e| DeployError::Api {
                status: response.status,
                body: format!("invalid operation state: {}", e),
            })?;
            self.logger.debug(format!(
                "{}: operation status {} (poll {})",
                resource, state.status, attempt
            ));

            if state.succeeded() {
                return Ok(());
            }
            if state.is_terminal() {
                let detail = state
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no error details".to_string());
                return Err(DeployError::Publish(format!(
                    "{}: operation {} ({})",
                    resource, state.status, detail
                )));
            }
        }

        Err(DeployError::Publish(format!(
            "{}: operation did not finish after {} status polls",
            resource, MAX_OPERATION_POLLS
        )))
    }
}

fn header(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn retry_after(response: &reqwest::Response) -> Duration {
    header(response, reqwest::header::RETRY_AFTER)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_POLL_INTERVAL)
}

fn to_body<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| DeployError::Publish(format!("cannot encode request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_mapping() {
        match status_error(403, "SP lacks Viewer role", "workspace x") {
            DeployError::Forbidden { body, .. } => assert_eq!(body, "SP lacks Viewer role"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(matches!(status_error(404, "", "workspace x"), DeployError::NotFound { .. }));

        let long_body = "x".repeat(2_000);
        match status_error(500, &long_body, "workspace x") {
            DeployError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), 500);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_own_url_requires_base_prefix() {
        let client = FabricClient::new("https://api.fabric.microsoft.com/", &RunLogger::new("test")).unwrap();
        assert!(client.is_own_url("https://api.fabric.microsoft.com/v1/workspaces/x/items?continuationToken=a"));
        assert!(!client.is_own_url("https://api.fabric.microsoft.com.evil.example/v1/items"));
        assert!(!client.is_own_url("https://evil.example/v1/workspaces/x/items"));
    }

    #[test]
    fn test_api_response_json() {
        let response = ApiResponse {
            status: 200,
            body: r#"{"displayName":"Sales"}"#.to_string(),
        };
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["displayName"], "Sales");
    }
}

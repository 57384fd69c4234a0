//! Shared fixtures: credential variables and mocked identity / Fabric APIs

#![allow(dead_code)]

use std::collections::HashMap;

use fabric_deploy::config::Endpoints;
use fabric_deploy::logging::RunLogger;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT_ID: &str = "11111111-1111-1111-1111-111111111111";
pub const CLIENT_ID: &str = "22222222-2222-2222-2222-222222222222";
pub const CLIENT_SECRET: &str = "dev-secret-value";
pub const WORKSPACE_ID: &str = "33333333-3333-3333-3333-333333333333";
pub const ACCESS_TOKEN: &str = "eyJ0eXAiOiJKV1QiLCJhbGciOiJSUzI1NiJ9.test";

pub fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// `<ENV>_TENANT_ID`, `<ENV>_CLIENT_ID`, `<ENV>_CLIENT_SECRET`
pub fn credential_vars(environment: &str) -> HashMap<String, String> {
    [
        ("TENANT_ID", TENANT_ID),
        ("CLIENT_ID", CLIENT_ID),
        ("CLIENT_SECRET", CLIENT_SECRET),
    ]
    .iter()
    .map(|(field, value)| (format!("{}_{}", environment, field), value.to_string()))
    .collect()
}

/// Identity and Fabric API both served by `server`
pub fn endpoints(server: &MockServer) -> Endpoints {
    Endpoints {
        api_base: server.uri(),
        authority_host: server.uri(),
    }
}

/// Route the URL variables to `server` as well
pub fn with_endpoints(mut vars: HashMap<String, String>, server: &MockServer) -> HashMap<String, String> {
    vars.insert("FABRIC_API_BASE_URL".to_string(), server.uri());
    vars.insert("AZURE_AUTHORITY_HOST".to_string(), server.uri());
    vars
}

pub fn token_path() -> String {
    format!("/{}/oauth2/v2.0/token", TENANT_ID)
}

pub fn workspace_path() -> String {
    format!("/v1/workspaces/{}", WORKSPACE_ID)
}

pub fn items_path() -> String {
    format!("/v1/workspaces/{}/items", WORKSPACE_ID)
}

/// Identity provider issuing a token for the client-credentials grant
pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(token_path()))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": ACCESS_TOKEN
        })))
        .mount(server)
        .await;
}

/// Identity provider rejecting the client secret
pub async fn mount_token_rejected(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(token_path()))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided.\r\nTrace ID: 0"
        })))
        .mount(server)
        .await;
}

pub async fn mount_workspace(server: &MockServer, status: u16) {
    let response = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!({
            "id": WORKSPACE_ID,
            "displayName": "Sales DEV",
            "type": "Workspace",
            "capacityId": "44444444-4444-4444-4444-444444444444"
        }))
    } else {
        ResponseTemplate::new(status).set_body_json(json!({
            "errorCode": "WorkspaceError",
            "message": "request failed"
        }))
    };

    Mock::given(method("GET"))
        .and(path(workspace_path()))
        .respond_with(response)
        .mount(server)
        .await;
}

pub fn logger() -> RunLogger {
    RunLogger::new("fabric_deploy::tests")
}

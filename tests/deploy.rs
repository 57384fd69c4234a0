mod common;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::*;
use fabric_deploy::api::client::FabricClient;
use fabric_deploy::config::{DeployConfig, TargetEnvironment};
use fabric_deploy::deploy::{self, FabricWorkspace, PublishEngine, PublishSummary, RestPublisher};
use fabric_deploy::error::{DeployError, Result};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;
use wiremock::matchers::{any, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Records which engine operations ran, and for which workspace
#[derive(Default)]
struct RecordingEngine {
    calls: Mutex<Vec<String>>,
    fail_publish: bool,
}

impl RecordingEngine {
    fn failing() -> Self {
        Self {
            fail_publish: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PublishEngine for RecordingEngine {
    async fn publish_all_items(&self, workspace: &FabricWorkspace) -> Result<PublishSummary> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("publish:{}:{}", workspace.workspace_id, workspace.environment));
        if self.fail_publish {
            return Err(DeployError::Publish("Notebook 'Broken' rejected".to_string()));
        }
        Ok(PublishSummary {
            created: vec!["Notebook 'Notebook_Sales'".to_string()],
            ..PublishSummary::default()
        })
    }

    async fn unpublish_all_orphan_items(&self, workspace: &FabricWorkspace) -> Result<PublishSummary> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("unpublish:{}", workspace.item_type_in_scope.join(",")));
        Ok(PublishSummary::default())
    }
}

fn deploy_config(repo_dir: &Path, clean_orphans: bool) -> DeployConfig {
    DeployConfig {
        workspace_id: WORKSPACE_ID.to_string(),
        environment: TargetEnvironment::Dev,
        repo_dir: repo_dir.to_path_buf(),
        item_types: vec!["Notebook".to_string(), "Report".to_string()],
        clean_orphans,
        git_commit: "abc1234".to_string(),
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// `<root>/workspace/` with one notebook and `<root>/config/parameter.yml`
fn sample_repo() -> (TempDir, PathBuf) {
    let root = TempDir::new().unwrap();
    let workspace = root.path().join("workspace");
    write(
        &workspace.join("Notebook_Sales.Notebook/.platform"),
        r#"{"metadata": {"type": "Notebook", "displayName": "Notebook_Sales"}}"#,
    );
    write(
        &workspace.join("Notebook_Sales.Notebook/notebook-content.py"),
        "lakehouse = \"dev-lakehouse\"\n",
    );
    write(
        &root.path().join("config/parameter.yml"),
        "find_replace:\n  DEV:\n    dev-lakehouse: dev-lakehouse-resolved\n",
    );
    (root, workspace)
}

async fn mount_remote_items(server: &MockServer, items: Value) {
    Mock::given(method("GET"))
        .and(path(items_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": items })))
        .mount(server)
        .await;
}

fn publisher(server: &MockServer) -> RestPublisher {
    let client = FabricClient::new(&server.uri(), &logger()).unwrap();
    RestPublisher::new(client, &logger())
}

#[tokio::test]
async fn test_deploy_publishes_without_orphan_cleanup() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let engine = RecordingEngine::default();

    let code = deploy::run(
        &deploy_config(Path::new("./workspace"), false),
        &credential_vars("DEV"),
        &endpoints(&server),
        &engine,
        &logger(),
    )
    .await;

    assert_eq!(code, 0);
    assert_eq!(engine.calls(), vec![format!("publish:{}:DEV", WORKSPACE_ID)]);
}

#[tokio::test]
async fn test_deploy_cleans_orphans_after_publish() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let engine = RecordingEngine::default();

    let code = deploy::run(
        &deploy_config(Path::new("./workspace"), true),
        &credential_vars("DEV"),
        &endpoints(&server),
        &engine,
        &logger(),
    )
    .await;

    assert_eq!(code, 0);
    assert_eq!(
        engine.calls(),
        vec![
            format!("publish:{}:DEV", WORKSPACE_ID),
            "unpublish:Notebook,Report".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_deploy_publish_failure_exits_one() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let engine = RecordingEngine::failing();

    let code = deploy::run(
        &deploy_config(Path::new("./workspace"), true),
        &credential_vars("DEV"),
        &endpoints(&server),
        &engine,
        &logger(),
    )
    .await;

    assert_eq!(code, 1);
    // No orphan cleanup after a failed publish
    assert_eq!(engine.calls().len(), 1);
}

#[tokio::test]
async fn test_deploy_missing_credential_never_reaches_engine() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let engine = RecordingEngine::default();

    let mut vars = credential_vars("DEV");
    vars.remove("DEV_TENANT_ID");

    let code = deploy::run(
        &deploy_config(Path::new("./workspace"), false),
        &vars,
        &endpoints(&server),
        &engine,
        &logger(),
    )
    .await;

    assert_eq!(code, 1);
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_deploy_rejected_credential_never_reaches_engine() {
    let server = MockServer::start().await;
    mount_token_rejected(&server).await;
    let engine = RecordingEngine::default();

    let code = deploy::run(
        &deploy_config(Path::new("./workspace"), false),
        &credential_vars("DEV"),
        &endpoints(&server),
        &engine,
        &logger(),
    )
    .await;

    assert_eq!(code, 1);
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_rest_publisher_creates_missing_item_with_substitution() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_remote_items(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path(items_path()))
        .and(body_partial_json(json!({
            "displayName": "Notebook_Sales",
            "type": "Notebook"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "new-item" })))
        .expect(1)
        .mount(&server)
        .await;

    let (_root, repo_dir) = sample_repo();
    let code = deploy::run(
        &deploy_config(&repo_dir, false),
        &credential_vars("DEV"),
        &endpoints(&server),
        &publisher(&server),
        &logger(),
    )
    .await;
    assert_eq!(code, 0);

    let requests = server.received_requests().await.unwrap();
    let create = requests
        .iter()
        .find(|r| r.method.as_str() == "POST" && r.url.path() == items_path())
        .unwrap();
    let body: Value = serde_json::from_slice(&create.body).unwrap();
    let parts = body["definition"]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0]["path"], "notebook-content.py");
    assert_eq!(parts[0]["payloadType"], "InlineBase64");

    let payload = STANDARD.decode(parts[0]["payload"].as_str().unwrap()).unwrap();
    assert_eq!(
        String::from_utf8(payload).unwrap(),
        "lakehouse = \"dev-lakehouse-resolved\"\n"
    );
}

#[tokio::test]
async fn test_rest_publisher_updates_existing_item() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_remote_items(
        &server,
        json!([{ "id": "item-1", "type": "Notebook", "displayName": "Notebook_Sales" }]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/item-1/updateDefinition", items_path())))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(items_path()))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let (_root, repo_dir) = sample_repo();
    let code = deploy::run(
        &deploy_config(&repo_dir, false),
        &credential_vars("DEV"),
        &endpoints(&server),
        &publisher(&server),
        &logger(),
    )
    .await;

    assert_eq!(code, 0);
}

#[tokio::test]
async fn test_rest_publisher_removes_only_in_scope_orphans() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_remote_items(
        &server,
        json!([
            { "id": "item-1", "type": "Notebook", "displayName": "Notebook_Sales" },
            { "id": "item-2", "type": "Report", "displayName": "Old_Report" },
            { "id": "item-3", "type": "Lakehouse", "displayName": "Bronze" }
        ]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/item-1/updateDefinition", items_path())))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/item-2", items_path())))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/item-3", items_path())))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (_root, repo_dir) = sample_repo();
    let code = deploy::run(
        &deploy_config(&repo_dir, true),
        &credential_vars("DEV"),
        &endpoints(&server),
        &publisher(&server),
        &logger(),
    )
    .await;

    assert_eq!(code, 0);
}

#[tokio::test]
async fn test_rest_publisher_follows_long_running_operation() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_remote_items(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path(items_path()))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", format!("{}/v1/operations/op-1", server.uri()).as_str())
                .insert_header("Retry-After", "0"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/operations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "Succeeded" })))
        .expect(1)
        .mount(&server)
        .await;

    let (_root, repo_dir) = sample_repo();
    let code = deploy::run(
        &deploy_config(&repo_dir, false),
        &credential_vars("DEV"),
        &endpoints(&server),
        &publisher(&server),
        &logger(),
    )
    .await;

    assert_eq!(code, 0);
}

#[tokio::test]
async fn test_rest_publisher_failed_operation_fails_deployment() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_remote_items(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path(items_path()))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", format!("{}/v1/operations/op-2", server.uri()).as_str())
                .insert_header("Retry-After", "0"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/operations/op-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Failed",
            "error": { "errorCode": "InvalidDefinition" }
        })))
        .mount(&server)
        .await;

    let (_root, repo_dir) = sample_repo();
    let code = deploy::run(
        &deploy_config(&repo_dir, false),
        &credential_vars("DEV"),
        &endpoints(&server),
        &publisher(&server),
        &logger(),
    )
    .await;

    assert_eq!(code, 1);
}

#[tokio::test]
async fn test_rest_publisher_forbidden_listing_fails_deployment() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(items_path()))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let (_root, repo_dir) = sample_repo();
    let code = deploy::run(
        &deploy_config(&repo_dir, false),
        &credential_vars("DEV"),
        &endpoints(&server),
        &publisher(&server),
        &logger(),
    )
    .await;

    assert_eq!(code, 1);
}

//! Deployment driver
//!
//! One run: log parameters, resolve and eagerly validate the credential,
//! publish every in-scope item, optionally remove orphans. The publish work
//! itself sits behind [`PublishEngine`].

pub mod items;
pub mod parameters;
pub mod publisher;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::auth::TokenCredential;
use crate::auth::{resolve_credential, ResolvedCredential, ValidationMode};
use crate::config::{DeployConfig, Endpoints, TargetEnvironment, VarSource};
use crate::error::Result;
use crate::logging::{RunLogger, RunTimer};

pub use publisher::RestPublisher;

/// Everything a publish engine needs to act on one workspace
#[derive(Clone)]
pub struct FabricWorkspace {
    pub workspace_id: String,
    pub environment: TargetEnvironment,
    pub repository_directory: PathBuf,
    pub item_type_in_scope: Vec<String>,
    pub tenant_id: String,
    pub client_id: String,
    pub credential: Arc<dyn TokenCredential>,
}

impl FabricWorkspace {
    pub fn new(config: &DeployConfig, resolved: &ResolvedCredential) -> Self {
        Self {
            workspace_id: config.workspace_id.clone(),
            environment: config.environment,
            repository_directory: config.repo_dir.clone(),
            item_type_in_scope: config.item_types.clone(),
            tenant_id: resolved.tenant_id.clone(),
            client_id: resolved.client_id.clone(),
            credential: Arc::clone(&resolved.credential),
        }
    }
}

/// Labels of the items touched by a publish or unpublish pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
}

/// The publish / unpublish operations of a deployment
#[async_trait]
pub trait PublishEngine: Send + Sync {
    /// Publish every in-scope item of the repository to the workspace
    async fn publish_all_items(&self, workspace: &FabricWorkspace) -> Result<PublishSummary>;

    /// Remove in-scope workspace items that no longer exist in the repository
    async fn unpublish_all_orphan_items(&self, workspace: &FabricWorkspace) -> Result<PublishSummary>;
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Run a full deployment. Errors propagate to [`run`].
pub async fn deploy(
    config: &DeployConfig,
    vars: &dyn VarSource,
    endpoints: &Endpoints,
    engine: &dyn PublishEngine,
    logger: &RunLogger,
) -> Result<()> {
    logger.banner(
        "DEPLOYMENT START",
        &[
            ("Workspace ID", config.workspace_id.clone()),
            ("Environment", config.environment.to_string()),
            ("Repo directory", absolute(&config.repo_dir).display().to_string()),
            ("Item types", config.item_types.join(", ")),
            ("Clean orphans", config.clean_orphans.to_string()),
            ("Git commit", config.git_commit.clone()),
        ],
    );

    let upn_only = config.upn_only_item_types();
    if !upn_only.is_empty() {
        logger.warn(format!(
            "Item types {} can only be deployed with a user identity; a service principal publish will fail for them.",
            upn_only.join(", ")
        ));
    }

    let resolved = resolve_credential(
        config.environment.as_str(),
        vars,
        endpoints,
        ValidationMode::Eager,
        logger,
    )
    .await?;
    let workspace = FabricWorkspace::new(config, &resolved);

    logger.info("Publishing items…");
    let published = engine.publish_all_items(&workspace).await?;
    logger.info(format!(
        "Publish completed successfully ({} created, {} updated).",
        published.created.len(),
        published.updated.len()
    ));

    if config.clean_orphans {
        logger.info("Removing orphaned items not present in repository…");
        let removed = engine.unpublish_all_orphan_items(&workspace).await?;
        logger.info(format!(
            "Orphan cleanup completed successfully ({} removed).",
            removed.deleted.len()
        ));
    }

    logger.info("DEPLOYMENT FINISHED SUCCESSFULLY.");
    Ok(())
}

/// Top-level wrapper: times the run and turns any error into exit code 1
pub async fn run(
    config: &DeployConfig,
    vars: &dyn VarSource,
    endpoints: &Endpoints,
    engine: &dyn PublishEngine,
    logger: &RunLogger,
) -> i32 {
    let logger = logger.for_environment(config.environment);
    let _timer = RunTimer::start(&logger, "Deployment");

    match deploy(config, vars, endpoints, engine, &logger).await {
        Ok(()) => 0,
        Err(err) => {
            logger.error_chain("Deployment failed", &err);
            err.exit_code()
        }
    }
}

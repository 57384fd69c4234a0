use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::items::{discover_items, LocalItem};
use super::parameters::Substitutions;
use super::{FabricWorkspace, PublishEngine, PublishSummary};
use crate::api::client::FabricClient;
use crate::api::constants::FABRIC_SCOPE;
use crate::api::models::CreateItemRequest;
use crate::error::{DeployError, Result};
use crate::logging::RunLogger;
use crate::validate::PARAMETER_FILE;

/// Publishes item definitions through the Fabric REST API
pub struct RestPublisher {
    client: FabricClient,
    parameter_file: Option<PathBuf>,
    logger: RunLogger,
}

impl RestPublisher {
    pub fn new(client: FabricClient, logger: &RunLogger) -> Self {
        Self {
            client,
            parameter_file: None,
            logger: logger.clone(),
        }
    }

    /// Use an explicit `parameter.yml` instead of the one next to the repository
    pub fn with_parameter_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.parameter_file = Some(path.into());
        self
    }

    /// `<repo_dir>/../config/parameter.yml` unless set explicitly
    fn parameter_path(&self, repo_dir: &Path) -> PathBuf {
        if let Some(path) = &self.parameter_file {
            return path.clone();
        }
        // `.` has no parent until made absolute
        let repo_dir = std::path::absolute(repo_dir).unwrap_or_else(|_| repo_dir.to_path_buf());
        repo_dir
            .parent()
            .unwrap_or(repo_dir.as_path())
            .join(PARAMETER_FILE)
    }

    fn substitutions(&self, workspace: &FabricWorkspace) -> Result<Substitutions> {
        let path = self.parameter_path(&workspace.repository_directory);
        if !path.is_file() {
            self.logger
                .info(format!("No parameter file at {}; publishing without substitutions.", path.display()));
            return Ok(Substitutions::default());
        }
        let substitutions = Substitutions::load(&path, workspace.environment)?;
        self.logger.info(format!(
            "Loaded {} find/replace and {} key/value substitutions from {}.",
            substitutions.find_replace.len(),
            substitutions.key_values.len(),
            path.display()
        ));
        Ok(substitutions)
    }

    async fn token(&self, workspace: &FabricWorkspace) -> Result<String> {
        workspace
            .credential
            .get_token(FABRIC_SCOPE)
            .await
            .map(|token| token.token)
            .map_err(|source| DeployError::Authentication {
                tenant_id: workspace.tenant_id.clone(),
                client_id: workspace.client_id.clone(),
                source,
            })
    }

    async fn publish_item(
        &self,
        workspace: &FabricWorkspace,
        token: &str,
        item: &LocalItem,
        remote_id: Option<&str>,
        substitutions: &Substitutions,
    ) -> Result<()> {
        let definition = item.definition(substitutions)?;
        match remote_id {
            Some(item_id) => {
                self.logger
                    .info(format!("Updating {} '{}'…", item.item_type, item.display_name));
                self.client
                    .update_item_definition(&workspace.workspace_id, item_id, token, definition)
                    .await
            }
            None => {
                self.logger
                    .info(format!("Creating {} '{}'…", item.item_type, item.display_name));
                let request = CreateItemRequest {
                    display_name: item.display_name.clone(),
                    item_type: item.item_type.clone(),
                    description: item.description.clone(),
                    definition: Some(definition),
                };
                self.client
                    .create_item(&workspace.workspace_id, token, &request)
                    .await
            }
        }
    }
}

#[async_trait]
impl PublishEngine for RestPublisher {
    async fn publish_all_items(&self, workspace: &FabricWorkspace) -> Result<PublishSummary> {
        let substitutions = self.substitutions(workspace)?;
        let local = discover_items(
            &workspace.repository_directory,
            &workspace.item_type_in_scope,
            &self.logger,
        )?;
        self.logger
            .info(format!("Found {} item(s) in scope in the repository.", local.len()));

        let token = self.token(workspace).await?;
        let remote = self.client.list_items(&workspace.workspace_id, &token).await?;

        let mut summary = PublishSummary::default();
        for item in &local {
            let remote_id = remote
                .iter()
                .find(|r| r.matches(&item.item_type, &item.display_name))
                .map(|r| r.id.as_str());
            self.publish_item(workspace, &token, item, remote_id, &substitutions)
                .await?;

            let label = format!("{} '{}'", item.item_type, item.display_name);
            if remote_id.is_some() {
                summary.updated.push(label);
            } else {
                summary.created.push(label);
            }
        }

        Ok(summary)
    }

    async fn unpublish_all_orphan_items(&self, workspace: &FabricWorkspace) -> Result<PublishSummary> {
        let local = discover_items(
            &workspace.repository_directory,
            &workspace.item_type_in_scope,
            &self.logger,
        )?;
        let keep: HashSet<(&str, &str)> = local
            .iter()
            .map(|i| (i.item_type.as_str(), i.display_name.as_str()))
            .collect();

        let token = self.token(workspace).await?;
        let remote = self.client.list_items(&workspace.workspace_id, &token).await?;

        let mut summary = PublishSummary::default();
        for item in &remote {
            let (Some(item_type), Some(name)) = (item.item_type.as_deref(), item.display_name.as_deref()) else {
                continue;
            };
            if !workspace.item_type_in_scope.iter().any(|t| t == item_type)
                || keep.contains(&(item_type, name))
            {
                continue;
            }

            self.logger
                .info(format!("Removing orphan {} '{}'…", item_type, name));
            self.client
                .delete_item(&workspace.workspace_id, &item.id, &token)
                .await?;
            summary.deleted.push(format!("{} '{}'", item_type, name));
        }

        Ok(summary)
    }
}

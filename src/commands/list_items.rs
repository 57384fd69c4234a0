use anyhow::{Context, Result};

use crate::api::client::FabricClient;
use crate::api::models::WorkspaceItem;
use crate::config::{Endpoints, ListItemsConfig, VarSource};
use crate::error::DeployError;
use crate::logging::RunLogger;

/// Fetch every item of the workspace with a pre-issued token
pub async fn list_items(
    workspace_id: &str,
    access_token: &str,
    endpoints: &Endpoints,
    logger: &RunLogger,
) -> crate::error::Result<Vec<WorkspaceItem>> {
    let client = FabricClient::new(&endpoints.api_base, logger)?;
    client.list_items(workspace_id, access_token).await
}

/// `workspace: Type  Name` lines for the listing
pub fn item_lines(items: &[WorkspaceItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            format!(
                "  {:<22}  {}",
                item.item_type.as_deref().unwrap_or("?"),
                item.display_name.as_deref().unwrap_or("?")
            )
        })
        .collect()
}

pub async fn list_items_command(vars: &dyn VarSource) -> Result<i32> {
    let logger = RunLogger::new("fabric_deploy::list_items");
    let config = ListItemsConfig::from_vars(vars).context("Invalid listing configuration")?;
    let endpoints = Endpoints::from_vars(vars);

    let Some(token) = config.access_token.as_deref() else {
        logger.warn("FABRIC_ACCESS_TOKEN is not set; skipping workspace item listing.");
        return Ok(0);
    };

    let items = match list_items(&config.workspace_id, token, &endpoints, &logger).await {
        Ok(items) => items,
        Err(DeployError::Transport { source, .. }) => {
            logger.error(format!("HTTP request to Fabric API failed: {}", source));
            return Ok(1);
        }
        Err(err) => {
            match err.status() {
                Some(status) => logger.error(format!(
                    "Listing workspace items failed with HTTP {}: {}",
                    status, err
                )),
                None => logger.error(format!("Listing workspace items failed: {}", err)),
            }
            return Ok(1);
        }
    };

    logger.info("=== Fabric workspace items after deployment ===");
    logger.info(format!("Workspace ID  : {}", config.workspace_id));
    logger.info(format!("Total items   : {}", items.len()));
    for line in item_lines(&items) {
        logger.info(line);
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_lines_use_placeholder_for_missing_fields() {
        let items = vec![
            WorkspaceItem {
                id: "1".to_string(),
                display_name: Some("Notebook_Sales".to_string()),
                item_type: Some("Notebook".to_string()),
                description: None,
            },
            WorkspaceItem::default(),
        ];
        let lines = item_lines(&items);
        assert_eq!(lines[0], format!("  {:<22}  Notebook_Sales", "Notebook"));
        assert_eq!(lines[1], format!("  {:<22}  ?", "?"));
    }
}

//! Request and response bodies of the Fabric REST API

use serde::{Deserialize, Serialize};

use super::constants::PAYLOAD_TYPE_INLINE_BASE64;

/// `GET /v1/workspaces/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub workspace_type: Option<String>,
    #[serde(default)]
    pub capacity_id: Option<String>,
}

/// One entry of `GET /v1/workspaces/{id}/items`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl WorkspaceItem {
    pub fn matches(&self, item_type: &str, display_name: &str) -> bool {
        self.item_type.as_deref() == Some(item_type)
            && self.display_name.as_deref() == Some(display_name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsPage {
    #[serde(default)]
    pub value: Vec<WorkspaceItem>,
    #[serde(default)]
    pub continuation_token: Option<String>,
    #[serde(default)]
    pub continuation_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionPart {
    pub path: String,
    pub payload: String,
    pub payload_type: String,
}

impl DefinitionPart {
    /// Part with an already base64-encoded payload
    pub fn inline(path: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            payload: payload.into(),
            payload_type: PAYLOAD_TYPE_INLINE_BASE64.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub parts: Vec<DefinitionPart>,
}

/// `POST /v1/workspaces/{id}/items`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub display_name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<ItemDefinition>,
}

/// `POST /v1/workspaces/{id}/items/{itemId}/updateDefinition`
#[derive(Debug, Clone, Serialize)]
pub struct UpdateDefinitionRequest {
    pub definition: ItemDefinition,
}

/// Body of a long-running operation status poll
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationState {
    pub status: String,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "Succeeded" | "Failed" | "Undefined")
    }

    pub fn succeeded(&self) -> bool {
        self.status == "Succeeded"
    }
}

//! Typed per-command configuration read from environment variables

use std::path::PathBuf;

use super::environment::TargetEnvironment;
use super::vars::{parse_bool, require, VarSource};
use crate::api::constants::{AUTHORITY_HOST, FABRIC_API_BASE};
use crate::error::Result;

pub const DEFAULT_REPO_DIR: &str = "./workspace";
pub const DEFAULT_REPO_ROOT: &str = ".";

/// Item types published when `ITEMS_IN_SCOPE` is unset or blank.
pub const DEFAULT_ITEM_TYPES: [&str; 4] = ["Notebook", "SemanticModel", "Report", "Environment"];

/// Item types the publish API only accepts from a user identity, never from
/// a service principal.
pub const UPN_ONLY_ITEM_TYPES: [&str; 1] = ["DataPipeline"];

/// Base URLs of the remote APIs. Overridable for sovereign clouds and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: String,
    pub authority_host: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: FABRIC_API_BASE.to_string(),
            authority_host: AUTHORITY_HOST.to_string(),
        }
    }
}

impl Endpoints {
    /// `FABRIC_API_BASE_URL` and `AZURE_AUTHORITY_HOST`, else the public cloud
    pub fn from_vars(vars: &dyn VarSource) -> Self {
        let defaults = Self::default();
        Self {
            api_base: vars
                .non_empty("FABRIC_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            authority_host: vars
                .non_empty("AZURE_AUTHORITY_HOST")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.authority_host),
        }
    }
}

/// Parse a comma-separated item-type list, falling back to [`DEFAULT_ITEM_TYPES`].
pub fn parse_items_in_scope(raw: Option<&str>) -> Vec<String> {
    let items: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        DEFAULT_ITEM_TYPES.iter().map(|s| s.to_string()).collect()
    } else {
        items
    }
}

#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub workspace_id: String,
    pub environment: TargetEnvironment,
    pub repo_dir: PathBuf,
    pub item_types: Vec<String>,
    pub clean_orphans: bool,
    pub git_commit: String,
}

impl DeployConfig {
    pub fn from_vars(vars: &dyn VarSource) -> Result<Self> {
        let workspace_id = require(vars, "TARGET_WORKSPACE_ID")?;
        let environment = require(vars, "TARGET_ENVIRONMENT")?.parse()?;
        let repo_dir = vars
            .non_empty("REPO_DIR")
            .unwrap_or_else(|| DEFAULT_REPO_DIR.to_string());

        Ok(Self {
            workspace_id,
            environment,
            repo_dir: PathBuf::from(repo_dir),
            item_types: parse_items_in_scope(vars.var("ITEMS_IN_SCOPE").as_deref()),
            clean_orphans: parse_bool(vars.var("CLEAN_ORPHANS").as_deref()),
            git_commit: vars
                .non_empty("GITHUB_SHA")
                .unwrap_or_else(|| "local".to_string()),
        })
    }

    /// In-scope item types that a service principal cannot publish
    pub fn upn_only_item_types(&self) -> Vec<&str> {
        self.item_types
            .iter()
            .map(String::as_str)
            .filter(|item| UPN_ONLY_ITEM_TYPES.contains(item))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct PreflightConfig {
    pub environment: TargetEnvironment,
    pub workspace_id: String,
}

impl PreflightConfig {
    pub fn from_vars(vars: &dyn VarSource) -> Result<Self> {
        let environment = require(vars, "TARGET_ENVIRONMENT")?.parse()?;
        let workspace_id = require(vars, "TARGET_WORKSPACE_ID")?;
        Ok(Self {
            environment,
            workspace_id,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ListItemsConfig {
    pub workspace_id: String,
    /// Pre-issued bearer token; listing is skipped without one.
    pub access_token: Option<String>,
}

impl ListItemsConfig {
    pub fn from_vars(vars: &dyn VarSource) -> Result<Self> {
        Ok(Self {
            workspace_id: require(vars, "TARGET_WORKSPACE_ID")?,
            access_token: vars.non_empty("FABRIC_ACCESS_TOKEN"),
        })
    }
}

/// Repository root for validation: `REPO_ROOT`, default `.`
pub fn repo_root(vars: &dyn VarSource) -> PathBuf {
    PathBuf::from(
        vars.non_empty("REPO_ROOT")
            .unwrap_or_else(|| DEFAULT_REPO_ROOT.to_string()),
    )
}

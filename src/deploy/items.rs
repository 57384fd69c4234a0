//! Item folders of the local content tree
//!
//! Each item lives in its own folder (`Notebook_Sales.Notebook/`) holding a
//! `.platform` JSON file with the item type and display name, plus the
//! definition files that are published verbatim (after substitution).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::parameters::Substitutions;
use crate::api::models::{DefinitionPart, ItemDefinition};
use crate::error::{DeployError, Result};
use crate::logging::RunLogger;
use crate::validate::PLATFORM_FILE;

#[derive(Debug, Deserialize)]
struct PlatformFile {
    metadata: PlatformMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlatformMetadata {
    #[serde(rename = "type")]
    item_type: String,
    display_name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalItem {
    pub item_type: String,
    pub display_name: String,
    pub description: Option<String>,
    pub path: PathBuf,
}

/// Items under `repo_dir` whose type is in `scope`, sorted by folder name.
///
/// Folders without a readable `.platform` file are skipped with a warning.
pub fn discover_items(repo_dir: &Path, scope: &[String], logger: &RunLogger) -> Result<Vec<LocalItem>> {
    if !repo_dir.is_dir() {
        return Err(DeployError::Publish(format!(
            "repository directory {} does not exist",
            repo_dir.display()
        )));
    }

    let mut dirs: Vec<PathBuf> = fs::read_dir(repo_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    let mut items = Vec::new();
    for dir in dirs {
        let platform_path = dir.join(PLATFORM_FILE);
        let platform = match fs::read_to_string(&platform_path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<PlatformFile>(&s).map_err(|e| e.to_string()))
        {
            Ok(platform) => platform,
            Err(e) => {
                logger.warn(format!(
                    "Skipping '{}': unreadable {} file ({}).",
                    dir.display(),
                    PLATFORM_FILE,
                    e
                ));
                continue;
            }
        };

        if !scope.iter().any(|t| t == &platform.metadata.item_type) {
            logger.debug(format!(
                "Skipping {} '{}': type not in scope.",
                platform.metadata.item_type, platform.metadata.display_name
            ));
            continue;
        }

        items.push(LocalItem {
            item_type: platform.metadata.item_type,
            display_name: platform.metadata.display_name,
            description: platform.metadata.description,
            path: dir,
        });
    }

    Ok(items)
}

impl LocalItem {
    /// Every file of the item except `.platform`, substituted and base64-encoded
    pub fn definition(&self, substitutions: &Substitutions) -> Result<ItemDefinition> {
        let mut files = Vec::new();
        collect_files(&self.path, &mut files)?;
        files.sort();

        let mut parts = Vec::new();
        for file in files {
            let relative = file.strip_prefix(&self.path).unwrap_or(&file);
            if relative == Path::new(PLATFORM_FILE) {
                continue;
            }
            let content = substitutions.apply(&file, fs::read(&file)?);
            let part_path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            parts.push(DefinitionPart::inline(part_path, STANDARD.encode(content)));
        }

        Ok(ItemDefinition { parts })
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetEnvironment;

    fn write_item(root: &Path, folder: &str, item_type: &str, name: &str) -> PathBuf {
        let dir = root.join(folder);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(".platform"),
            format!(
                r#"{{"metadata": {{"type": "{}", "displayName": "{}"}}, "config": {{"logicalId": "0000"}}}}"#,
                item_type, name
            ),
        )
        .unwrap();
        dir
    }

    fn scope(types: &[&str]) -> Vec<String> {
        types.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_discover_filters_by_scope_and_platform() {
        let tmp = tempfile::tempdir().unwrap();
        write_item(tmp.path(), "Notebook_Sales.Notebook", "Notebook", "Notebook_Sales");
        write_item(tmp.path(), "Sales.Report", "Report", "Sales");
        fs::create_dir(tmp.path().join("NoPlatform.Notebook")).unwrap();

        let logger = RunLogger::new("fabric-deploy::test");
        let items = discover_items(tmp.path(), &scope(&["Notebook"]), &logger).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].display_name, "Notebook_Sales");
        assert_eq!(items[0].item_type, "Notebook");
    }

    #[test]
    fn test_discover_missing_directory_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = RunLogger::new("fabric-deploy::test");
        assert!(discover_items(&tmp.path().join("absent"), &scope(&["Notebook"]), &logger).is_err());
    }

    #[test]
    fn test_definition_excludes_platform_and_encodes_parts() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_item(tmp.path(), "Notebook_Sales.Notebook", "Notebook", "Notebook_Sales");
        fs::write(dir.join("notebook-content.py"), "db = 'Sales_DEV'").unwrap();
        fs::create_dir(dir.join("resources")).unwrap();
        fs::write(dir.join("resources").join("seed.csv"), "id\n1\n").unwrap();

        let item = LocalItem {
            item_type: "Notebook".to_string(),
            display_name: "Notebook_Sales".to_string(),
            description: None,
            path: dir,
        };
        let subs = Substitutions::parse(
            "find_replace:\n  QA:\n    Sales_DEV: Sales_QA\n",
            TargetEnvironment::Qa,
        )
        .unwrap();
        let definition = item.definition(&subs).unwrap();

        let paths: Vec<&str> = definition.parts.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["notebook-content.py", "resources/seed.csv"]);

        let decoded = STANDARD.decode(&definition.parts[0].payload).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "db = 'Sales_QA'");
    }
}

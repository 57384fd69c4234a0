//! Environment-specific substitutions from `parameter.yml`
//!
//! ```yaml
//! find_replace:
//!   DEV:
//!     "<dev-lakehouse-guid>": "<dev-lakehouse-guid>"
//!   PROD:
//!     "<dev-lakehouse-guid>": "<prod-lakehouse-guid>"
//! key_value_replace:
//!   PROD:
//!     "connection.database": "Sales_PROD"
//! ```
//!
//! `find_replace` values are literal string replacements applied to every
//! text file of an item. `key_value_replace` keys are dotted paths into
//! `.json` files; only paths that already exist are overwritten.

use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::config::TargetEnvironment;
use crate::error::{DeployError, Result};

/// Substitutions in effect for one environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitutions {
    pub find_replace: Vec<(String, String)>,
    pub key_values: Vec<(String, Value)>,
}

impl Substitutions {
    /// Read `path` and pick out the entries for `environment`
    pub fn load(path: &Path, environment: TargetEnvironment) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, environment).map_err(|message| DeployError::Parameters {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn parse(content: &str, environment: TargetEnvironment) -> std::result::Result<Self, String> {
        let data: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        if data.is_null() {
            return Ok(Self::default());
        }
        if !data.is_mapping() {
            return Err("root should be a mapping".to_string());
        }

        let section = |name: &str| -> Vec<(String, serde_yaml::Value)> {
            data.get(name)
                .and_then(|s| s.get(environment.as_str()))
                .and_then(|s| s.as_mapping())
                .map(|m| {
                    m.iter()
                        .filter_map(|(k, v)| scalar_to_string(k).map(|k| (k, v.clone())))
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut find_replace = Vec::new();
        for (find, replace) in section("find_replace") {
            let replace = scalar_to_string(&replace)
                .ok_or_else(|| format!("find_replace value for '{}' must be a scalar", find))?;
            find_replace.push((find, replace));
        }

        let mut key_values = Vec::new();
        for (key, value) in section("key_value_replace") {
            let value = serde_json::to_value(&value).map_err(|e| e.to_string())?;
            key_values.push((key, value));
        }

        Ok(Self {
            find_replace,
            key_values,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.find_replace.is_empty() && self.key_values.is_empty()
    }

    /// Apply to one file. Non-UTF-8 content passes through untouched.
    pub fn apply(&self, file_path: &Path, content: Vec<u8>) -> Vec<u8> {
        if self.is_empty() {
            return content;
        }
        let mut text = match String::from_utf8(content) {
            Ok(text) => text,
            Err(e) => return e.into_bytes(),
        };

        for (find, replace) in &self.find_replace {
            if !find.is_empty() {
                text = text.replace(find.as_str(), replace);
            }
        }

        let is_json = file_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json && !self.key_values.is_empty() {
            if let Ok(mut json) = serde_json::from_str::<Value>(&text) {
                let mut changed = false;
                for (key, value) in &self.key_values {
                    if let Some(slot) = json.pointer_mut(&json_pointer(key)) {
                        *slot = value.clone();
                        changed = true;
                    }
                }
                if changed {
                    if let Ok(rendered) = serde_json::to_string_pretty(&json) {
                        text = rendered;
                    }
                }
            }
        }

        text.into_bytes()
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `a.b.c` → `/a/b/c`, escaping `~` and `/` per RFC 6901
fn json_pointer(dotted: &str) -> String {
    dotted
        .split('.')
        .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
        .collect()
}

//! Environment-variable sources
//!
//! All configuration is read through [`VarSource`] so the process
//! environment, CLI overrides and in-memory test maps are interchangeable.

use std::collections::HashMap;

use crate::error::{DeployError, Result};

pub trait VarSource {
    /// Raw lookup. `None` when the variable is not set.
    fn var(&self, key: &str) -> Option<String>;

    /// Lookup treating an empty value as absent.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|value| !value.is_empty())
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl VarSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: VarSource + ?Sized> VarSource for &T {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

/// `overrides` first, then `base`. Used to let CLI flags shadow the environment.
#[derive(Debug, Clone)]
pub struct Layered<B> {
    overrides: HashMap<String, String>,
    base: B,
}

impl<B: VarSource> Layered<B> {
    pub fn new(base: B) -> Self {
        Self {
            overrides: HashMap::new(),
            base,
        }
    }

    /// Shadow `key` with `value` when one is given
    pub fn with(mut self, key: &str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.overrides.insert(key.to_string(), value);
        }
        self
    }
}

impl<B: VarSource> VarSource for Layered<B> {
    fn var(&self, key: &str) -> Option<String> {
        self.overrides
            .get(key)
            .cloned()
            .or_else(|| self.base.var(key))
    }
}

/// First candidate key with a non-empty value wins. Returns the key that matched.
pub fn first_match(vars: &dyn VarSource, candidates: &[String]) -> Option<(String, String)> {
    candidates
        .iter()
        .find_map(|key| vars.non_empty(key).map(|value| (key.clone(), value)))
}

pub fn require(vars: &dyn VarSource, key: &str) -> Result<String> {
    vars.non_empty(key)
        .ok_or_else(|| DeployError::MissingVar(key.to_string()))
}

/// `true`, `1` and `yes` (any case, surrounding whitespace ignored) are true.
pub fn parse_bool(value: Option<&str>) -> bool {
    match value {
        Some(value) => matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        None => false,
    }
}

/// Load `.env` from the working directory if there is one.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        log::debug!("Loaded environment from {}", path.display());
    }
}

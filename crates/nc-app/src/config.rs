//! Session configuration and provider credentials.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codegen::{Framework, Provider};
use crate::error::{AppError, AppResult};

pub const DEFAULT_HISTORY_DEPTH: usize = 100;
pub const DEFAULT_EXPORT_FILENAME: &str = "neural_network";

/// User-level settings, stored as YAML. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of undo snapshots; the oldest is evicted beyond it.
    pub history_depth: usize,
    pub framework: Framework,
    pub provider: Provider,
    pub export_filename: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            framework: Framework::default(),
            provider: Provider::default(),
            export_filename: DEFAULT_EXPORT_FILENAME.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn from_yaml(text: &str) -> AppResult<Self> {
        let config: SessionConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> AppResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        self.validate()?;
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.history_depth == 0 {
            return Err(AppError::Config("history_depth must be at least 1".to_string()));
        }
        if self.export_filename.trim().is_empty() {
            return Err(AppError::Config("export_filename must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Process-environment lookup used outside tests.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Read the API key for `provider` through `lookup`.
///
/// Blank values count as missing.
pub fn credential_for<F>(provider: Provider, lookup: F) -> AppResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let variable = provider.env_var();
    match lookup(variable) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::MissingCredential {
            provider: provider.display_name(),
            variable,
        }),
    }
}

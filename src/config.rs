use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::utils::errors::{PvwaError, Result};
use crate::vault::credentials::AuthMechanism;
use crate::vault::DEFAULT_TIMEOUT_SECS;

/// Defaults read from `config.yaml`; command-line flags override them
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub base_url: Option<String>,
    pub auth_method: AuthMechanism,
    pub concurrent_session: bool,
    pub timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_method: AuthMechanism::default(),
            concurrent_session: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl CliConfig {
    /// Load the file at `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::trace!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| PvwaError::Config(format!("Invalid config file {}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

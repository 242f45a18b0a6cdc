//! Where the provider finds its databases, and how careful it has to be.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PROFILE: &str = "CFGVAULT_PROFILE";
pub const ENV_LOCAL_PROFILE: &str = "CFGVAULT_LOCAL_PROFILE";
pub const ENV_TEMPLATE: &str = "CFGVAULT_TEMPLATE";
pub const ENV_READ_ONLY: &str = "CFGVAULT_READ_ONLY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderOptions {
    /// Roaming databases.
    pub profile_path: PathBuf,
    /// Machine-local databases (local settings, plugin cache, history).
    pub local_profile_path: PathBuf,
    /// Seed document imported once into every new database.
    pub template_path: Option<PathBuf>,
    /// Damaged databases are opened in memory instead of being renamed.
    pub read_only: bool,
    /// Extra attempts at the per-database advisory lock.
    pub lock_retries: u32,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            profile_path: PathBuf::from("."),
            local_profile_path: PathBuf::from("."),
            template_path: None,
            read_only: false,
            lock_retries: 5,
        }
    }
}

impl ProviderOptions {
    /// Both profiles in one directory.
    pub fn with_profile(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            local_profile_path: path.clone(),
            profile_path: path,
            ..Self::default()
        }
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading options from {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing options in {}", path.display()))
    }

    /// Defaults overridden by whatever `CFGVAULT_*` variables are set.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    pub fn with_env(mut self) -> Self {
        if let Some(path) = std::env::var_os(ENV_PROFILE) {
            self.profile_path = path.into();
        }
        if let Some(path) = std::env::var_os(ENV_LOCAL_PROFILE) {
            self.local_profile_path = path.into();
        }
        if let Some(path) = std::env::var_os(ENV_TEMPLATE) {
            self.template_path = Some(path.into());
        }
        if let Ok(flag) = std::env::var(ENV_READ_ONLY) {
            self.read_only = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        self
    }

    pub(crate) fn database_path(&self, name: &str, local: bool) -> PathBuf {
        let dir = if local {
            &self.local_profile_path
        } else {
            &self.profile_path
        };
        dir.join(name)
    }
}

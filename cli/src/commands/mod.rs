//! Subcommand implementations.

pub mod groups;
pub mod list;
pub mod stop;
pub mod up;

use std::path::{Path, PathBuf};

use anyhow::Result;
use kfwd_core::{Config, Settings, SettingsStore};
use tracing::debug;

/// Settings plus the resolved grouping-file path for one invocation.
pub struct Context {
    pub settings: Settings,
    pub groups_file: PathBuf,
}

impl Context {
    pub async fn load(config_override: Option<&Path>) -> Result<Self> {
        let store = SettingsStore::new()?;
        let settings = store.load().await?;
        let groups_file = store.resolve_groups_file(&settings, config_override);
        debug!(groups_file = %groups_file.display(), client = %settings.primary_client, "Loaded settings");

        Ok(Self {
            settings,
            groups_file,
        })
    }

    pub async fn groups(&self) -> Result<Config> {
        Ok(kfwd_core::parse_file(&self.groups_file).await?)
    }
}

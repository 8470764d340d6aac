//! Tool settings and file locations.
//!
//! Settings live in JSON at `~/.kfwd/settings.json`; the grouping file
//! defaults to `~/.kfwd/groups.conf`. A missing settings file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Error, Result};

/// Directory under the home directory holding kfwd files.
pub const CONFIG_DIR_NAME: &str = ".kfwd";

/// Default grouping-file name inside the config directory.
pub const GROUPS_FILE_NAME: &str = "groups.conf";

const SETTINGS_FILE_NAME: &str = "settings.json";

const LOG_DIR_NAME: &str = "logs";

/// Persisted tool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Client used to open tunnels, and whose presence is probed.
    #[serde(default = "default_primary_client")]
    pub primary_client: String,

    /// Client tried when the primary fails to launch. POSIX hosts only.
    #[serde(default = "default_fallback_client")]
    pub fallback_client: Option<String>,

    /// How long to watch a fresh tunnel for an immediate failure.
    #[serde(default = "default_launch_grace_ms")]
    pub launch_grace_ms: u64,

    /// Upper bound for the client `version` probe.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Grouping file used when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups_file: Option<PathBuf>,

    /// Where tunnel stderr logs go. Defaults to `~/.kfwd/logs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

fn default_primary_client() -> String {
    "kubectl".to_string()
}

fn default_fallback_client() -> Option<String> {
    Some("oc".to_string())
}

fn default_launch_grace_ms() -> u64 {
    1500
}

fn default_probe_timeout_secs() -> u64 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            primary_client: default_primary_client(),
            fallback_client: default_fallback_client(),
            launch_grace_ms: default_launch_grace_ms(),
            probe_timeout_secs: default_probe_timeout_secs(),
            groups_file: None,
            log_dir: None,
        }
    }
}

impl Settings {
    pub fn launch_grace(&self) -> Duration {
        Duration::from_millis(self.launch_grace_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Directory for tunnel logs, falling back to the system temp dir
    /// when there is no home directory.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(CONFIG_DIR_NAME))
                .unwrap_or_else(|| std::env::temp_dir().join("kfwd"))
                .join(LOG_DIR_NAME)
        })
    }
}

/// Reads [`Settings`] and resolves the grouping-file path.
pub struct SettingsStore {
    settings_path: PathBuf,
}

impl SettingsStore {
    /// Create a store rooted at `~/.kfwd`.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            settings_path: home.join(CONFIG_DIR_NAME).join(SETTINGS_FILE_NAME),
        })
    }

    /// Create a store with a custom settings path (for testing).
    pub fn with_path(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    /// Directory holding the settings file.
    pub fn config_dir(&self) -> PathBuf {
        self.settings_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Load settings, falling back to defaults when the file is absent.
    pub async fn load(&self) -> Result<Settings> {
        if !self.settings_path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.settings_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read settings: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse settings: {}", e)))
    }

    /// Pick the grouping file: explicit path, then settings, then the default.
    pub fn resolve_groups_file(&self, settings: &Settings, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| settings.groups_file.clone())
            .unwrap_or_else(|| self.config_dir().join(GROUPS_FILE_NAME))
    }
}

//! Dashboard configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/lockerhub/hub.toml`
//! - Windows: `%APPDATA%/lockerhub/hub.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Display name of this dashboard instance (hostname by default).
    #[serde(default = "default_name")]
    pub name: String,

    /// Base URL of the locker backend's REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token for the backend API. Empty means unauthenticated.
    #[serde(default)]
    pub api_token: String,
}

fn default_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "Lockerhub".into())
}

fn default_api_base_url() -> String {
    "http://localhost:3000/api".into()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            api_base_url: default_api_base_url(),
            api_token: String::new(),
        }
    }
}

impl DashboardConfig {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Saves the current configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_path()?)
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: DashboardConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = DashboardConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix (may contain the API token).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("lockerhub")
            .join("hub.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("lockerhub").join("hub.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/lockerhub/hub.toml"))
    }
}

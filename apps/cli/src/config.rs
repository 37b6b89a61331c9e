//! CLI configuration.
//!
//! Stored as TOML:
//! - Linux: `~/.config/tableau-send/config.toml`
//! - Windows: `%APPDATA%/tableau-send/config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tableau_send_deploy::{ProjectSelector, SendSettings};
use tableau_send_protocol::OverwritePolicy;
use tableau_send_protocol::constants::{
    DEFAULT_API_VERSION, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT,
};
use tableau_send_rest::ClientConfig;

/// Environment variable that overrides the stored password.
pub const PASSWORD_ENV: &str = "TABLEAU_PASSWORD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Server URL, e.g. `https://tableau.example.com`.
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,

    /// Site content URL; empty selects the default site.
    #[serde(default)]
    pub site_content_url: String,

    /// Target project as a display path (`Finance/Reports`) or unique name.
    #[serde(default)]
    pub project: Option<String>,

    /// Target project id; takes precedence over `project`.
    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub datasource_name: Option<String>,

    #[serde(default)]
    pub overwrite: OverwritePolicy,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.into()
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_read_timeout() -> u64 {
    DEFAULT_READ_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            site_content_url: String::new(),
            project: None,
            project_id: None,
            datasource_name: None,
            overwrite: OverwritePolicy::default(),
            api_version: default_api_version(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or defaults if the file is missing.
    ///
    /// The password is then taken from `TABLEAU_PASSWORD` when set.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            Config::default()
        };
        config.apply_password_override(std::env::var(PASSWORD_ENV).ok());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    fn apply_password_override(&mut self, password: Option<String>) {
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            self.password = password;
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_version: self.api_version.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            ..ClientConfig::default()
        }
    }

    /// The configured project, preferring the id.
    pub fn project_selector(&self) -> Option<ProjectSelector> {
        match (&self.project_id, &self.project) {
            (Some(id), _) if !id.is_empty() => Some(ProjectSelector::Id(id.clone())),
            (_, Some(path)) if !path.is_empty() => Some(ProjectSelector::Path(path.clone())),
            _ => None,
        }
    }

    /// Builds send settings; missing values surface in `SendSettings::validate`.
    pub fn send_settings(&self, datasource_name: &str) -> SendSettings {
        SendSettings {
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            site_content_url: self.site_content_url.clone(),
            project: self
                .project_selector()
                .unwrap_or_else(|| ProjectSelector::Path(String::new())),
            datasource_name: datasource_name.to_string(),
            overwrite: self.overwrite,
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("tableau-send").join("config.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("tableau-send")
            .join("config.toml")
    }
}

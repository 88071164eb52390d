use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Backend started with `uvicorn` on the development machine
pub const LOCAL_BASE_URL: &str = "http://127.0.0.1:8000";

/// Hosted backend
pub const PRODUCTION_BASE_URL: &str = "https://medgenie-rag-chatbot.onrender.com";

/// Host names that identify the development machine
const LOCAL_HOSTS: [&str; 2] = ["127.0.0.1", "localhost"];

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host identity of the execution context, used to pick the endpoint
    pub host: Option<String>,

    /// Explicit service origin; skips host-based selection when set
    pub base_url: Option<String>,

    /// HTTP request timeout
    pub request_timeout_secs: u64,

    /// MedGenie home directory
    #[serde(skip)]
    pub medgenie_home: PathBuf,

    /// File this configuration was loaded from and is saved to
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
        let medgenie_home = home.join(".medgenie");

        Config {
            host: None,
            base_url: None,
            request_timeout_secs: 60,
            config_path: medgenie_home.join("config.toml"),
            medgenie_home,
        }
    }
}

impl Config {
    /// Load configuration from `~/.medgenie/config.toml`, falling back to defaults
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let medgenie_home = home.join(".medgenie");

        fs::create_dir_all(&medgenie_home)
            .context("Failed to create .medgenie directory")?;

        let mut config = Self::load_from(&medgenie_home.join("config.toml"))?;
        config.medgenie_home = medgenie_home;
        Ok(config)
    }

    /// Load configuration from an explicit file. A missing file yields defaults.
    /// The file becomes the target of [`Config::save`].
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config: Config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Config::default()
        };

        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Save configuration to the file it was loaded from
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write config file {}", self.config_path.display()))?;
        Ok(())
    }

    /// Apply command line / environment overrides on top of the file
    pub fn with_overrides(mut self, host: Option<String>, base_url: Option<String>) -> Self {
        if host.is_some() {
            self.host = host;
        }
        if base_url.is_some() {
            self.base_url = base_url;
        }
        self
    }

    /// Origin of the answer service, without a trailing slash
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => select_base_url(self.host.as_deref()).to_string(),
        }
    }

    /// Path of the log file written while the terminal UI is running
    pub fn log_path(&self) -> PathBuf {
        self.medgenie_home.join("medgenie.log")
    }
}

/// Pick the local or production origin from the host the client runs as.
/// No host means we are not on the development machine.
pub fn select_base_url(host: Option<&str>) -> &'static str {
    match host {
        Some(host) if is_local_host(host) => LOCAL_BASE_URL,
        _ => PRODUCTION_BASE_URL,
    }
}

fn is_local_host(host: &str) -> bool {
    let host = host.trim();
    LOCAL_HOSTS.iter().any(|local| host.eq_ignore_ascii_case(local))
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use validator::Validate;

pub const DEFAULT_QUEUE: &str = "addgroup";
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/soar-actions.sock";

/// Service-wide configuration loaded from app.toml and environment variables
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Settings {
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    #[serde(default)]
    #[validate(nested)]
    pub resilient: PlatformConfig,
    #[serde(default)]
    #[validate(nested)]
    pub addgroup: AddGroupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    pub transport: String,
    pub socket_path: Option<String>,
    #[validate(length(min = 1))]
    pub log_level: String,
}

/// Connection to the incident-response platform REST API
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlatformConfig {
    #[validate(url)]
    pub base_url: String,
    #[validate(length(min = 1, message = "org must not be empty"))]
    pub org: String,
    pub api_key_id: Option<String>,
    pub api_key_secret: Option<String>,
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    #[validate(range(min = 1, max = 600))]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[validate(range(min = 1, max = 1024))]
    #[serde(default = "default_label_cache_size")]
    pub label_cache_size: usize,
}

/// The add_group action section. Every assignment key is optional; a missing
/// key propagates as a null token when its severity tier matches.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddGroupConfig {
    #[validate(length(min = 1, message = "queue must not be empty"))]
    #[serde(default = "default_queue")]
    pub queue: String,
    pub high_owner: Option<String>,
    pub medium_owner: Option<String>,
    pub low_owner: Option<String>,
    pub high_member_1: Option<String>,
    pub medium_member_1: Option<String>,
    pub medium_member_2: Option<String>,
    pub low_member_1: Option<String>,
    pub low_member_2: Option<String>,
    pub low_member_3: Option<String>,
}

fn default_verify_tls() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_label_cache_size() -> usize {
    32
}

fn default_queue() -> String {
    DEFAULT_QUEUE.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".to_string(),
            socket_path: Some(DEFAULT_SOCKET_PATH.to_string()),
            log_level: "info".to_string(),
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost".to_string(),
            org: "Default Org".to_string(),
            api_key_id: None,
            api_key_secret: None,
            verify_tls: default_verify_tls(),
            timeout_secs: default_timeout_secs(),
            label_cache_size: default_label_cache_size(),
        }
    }
}

impl Default for AddGroupConfig {
    fn default() -> Self {
        Self {
            queue: default_queue(),
            high_owner: None,
            medium_owner: None,
            low_owner: None,
            high_member_1: None,
            medium_member_1: None,
            medium_member_2: None,
            low_member_1: None,
            low_member_2: None,
            low_member_3: None,
        }
    }
}

impl AddGroupConfig {
    /// Message-bus channel this action component listens on
    pub fn channel(&self) -> String {
        format!("actions.{}", self.queue)
    }
}

impl Settings {
    /// Load settings from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from an explicit file (or the default location), then
    /// apply environment overrides. A missing default file yields defaults.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    tracing::info!("No config file found at {}, using defaults", default_path.display());
                    Self::default()
                }
            }
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SOAR_ACTIONS_LOG_LEVEL") {
            self.server.log_level = val;
        }

        if let Ok(val) = std::env::var("SOAR_ACTIONS_TRANSPORT") {
            self.server.transport = val;
        }

        if let Ok(val) = std::env::var("SOAR_ACTIONS_SOCKET_PATH") {
            self.server.socket_path = Some(val);
        }

        if let Ok(val) = std::env::var("RESILIENT_API_KEY_ID") {
            self.resilient.api_key_id = Some(val);
        }

        if let Ok(val) = std::env::var("RESILIENT_API_KEY_SECRET") {
            self.resilient.api_key_secret = Some(val);
        }
    }

    pub fn config_path() -> PathBuf {
        if let Ok(custom_path) = std::env::var("SOAR_ACTIONS_CONFIG_PATH") {
            PathBuf::from(custom_path)
        } else {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("soar-actions")
                .join("app.toml")
        }
    }
}

//! Client configuration.
//!
//! Configuration is stored in `.kinetic/config.yaml` (or the file named by
//! `KQ_CONFIG`) and includes:
//! - The Kinetic server URL and the kapp holding queue items
//! - Credentials for HTTP basic authentication
//! - List paging and request timeout settings
//!
//! `KQ_SERVER`, `KQ_USERNAME` and `KQ_PASSWORD` take precedence over the file.

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{QueueError, Result};
use crate::types::{CONFIG_DIR, DEFAULT_LIMIT, validate_limit};

pub const ENV_CONFIG: &str = "KQ_CONFIG";
pub const ENV_SERVER: &str = "KQ_SERVER";
pub const ENV_USERNAME: &str = "KQ_USERNAME";
pub const ENV_PASSWORD: &str = "KQ_PASSWORD";

/// Keys accepted by [`Config::set`]
pub const CONFIG_KEYS: &[&str] = &[
    "server",
    "kapp",
    "username",
    "password",
    "page_size",
    "timeout_secs",
    "all_teams",
];

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Kinetic server, e.g. `https://acme.kinops.io`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Kapp whose submissions make up the queue
    #[serde(default = "default_kapp")]
    pub kapp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Items per page (default: 25)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Teams offered for assignment when a form does not restrict them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_teams: Option<Vec<String>>,
}

fn default_kapp() -> String {
    "queue".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_LIMIT
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: None,
            kapp: default_kapp(),
            username: None,
            password: None,
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            all_teams: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server", &self.server)
            .field("kapp", &self.kapp)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("all_teams", &self.all_teams)
            .finish()
    }
}

fn env_override(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        env_override(ENV_CONFIG)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("config.yaml"))
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            QueueError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        validate_limit(config.page_size)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                QueueError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content).map_err(|e| {
            QueueError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        // Owner read/write only, the file may hold a password
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, permissions)?;
        }

        Ok(())
    }

    /// Server base URL from environment or config file
    pub fn server_url(&self) -> Result<Url> {
        let raw = env_override(ENV_SERVER)
            .or_else(|| self.server.clone())
            .ok_or_else(|| {
                QueueError::Config(format!(
                    "server not configured. Set {ENV_SERVER} or run: kq config set server <url>"
                ))
            })?;
        Url::parse(raw.trim())
            .map_err(|e| QueueError::Config(format!("invalid server URL '{raw}': {e}")))
    }

    pub fn username(&self) -> Option<String> {
        env_override(ENV_USERNAME).or_else(|| self.username.clone())
    }

    pub fn password(&self) -> Option<SecretString> {
        env_override(ENV_PASSWORD)
            .or_else(|| self.password.clone())
            .map(SecretString::from)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Update one setting from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let optional = |v: &str| (!v.is_empty()).then(|| v.to_string());
        match key {
            "server" => {
                if !value.is_empty() {
                    Url::parse(value).map_err(|e| {
                        QueueError::Config(format!("invalid server URL '{value}': {e}"))
                    })?;
                }
                self.server = optional(value);
            }
            "kapp" => {
                if value.is_empty() {
                    return Err(QueueError::Config("kapp cannot be empty".to_string()));
                }
                self.kapp = value.to_string();
            }
            "username" => self.username = optional(value),
            "password" => self.password = optional(value),
            "page_size" => {
                let size: u32 = value.parse().map_err(|_| {
                    QueueError::Config(format!("page_size must be a number, got '{value}'"))
                })?;
                self.page_size = validate_limit(size)?;
            }
            "timeout_secs" => {
                self.timeout_secs = value.parse().map_err(|_| {
                    QueueError::Config(format!("timeout_secs must be a number, got '{value}'"))
                })?;
            }
            "all_teams" => {
                let teams: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect();
                self.all_teams = (!teams.is_empty()).then_some(teams);
            }
            other => {
                return Err(QueueError::Config(format!(
                    "unknown config key '{other}', expected one of: {}",
                    CONFIG_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Settings as display pairs, with the password masked
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let unset = || "(not set)".to_string();
        vec![
            ("server", self.server.clone().unwrap_or_else(unset)),
            ("kapp", self.kapp.clone()),
            ("username", self.username.clone().unwrap_or_else(unset)),
            (
                "password",
                self.password
                    .as_ref()
                    .map(|_| "********".to_string())
                    .unwrap_or_else(unset),
            ),
            ("page_size", self.page_size.to_string()),
            ("timeout_secs", self.timeout_secs.to_string()),
            (
                "all_teams",
                self.all_teams
                    .as_ref()
                    .map(|t| t.join(", "))
                    .unwrap_or_else(unset),
            ),
        ]
    }
}

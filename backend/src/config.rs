//! Configuration management for the inventory analysis server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with IMS_ prefix
//!
//! The whole tree can be reloaded at runtime through `POST /settings/reload`.

use std::path::PathBuf;

use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use shared::archive::DEFAULT_ARCHIVE_LIMIT;
use shared::expiration::ExpiryWindows;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Where history, fingerprints and archived runs live
    pub storage: StorageConfig,

    /// Expiry windows and notification routing
    pub alerts: AlertSettings,

    /// Outbound email
    pub smtp: SmtpSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,

    /// Largest accepted upload body
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,

    /// Archived runs kept before the oldest are pruned
    pub archive_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertSettings {
    /// Expiry alerts within this many days are urgent
    pub urgent_days: u32,

    /// Products expiring within this many days are alerted
    pub alert_days: u32,

    /// Receiver used when none has been saved through the settings API
    #[serde(default)]
    pub default_receiver: Option<String>,

    /// Pending messages the dispatch queue holds
    pub queue_capacity: usize,

    /// Dispatch outcomes kept for the status endpoint
    pub log_capacity: usize,
}

/// How the SMTP connection is secured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    #[default]
    Starttls,
    Tls,
    None,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// From address
    #[serde(default)]
    pub sender: String,
    /// Fallback recipients, comma separated
    #[serde(default)]
    pub recipients: String,
    #[serde(default)]
    pub tls: SmtpTls,
    pub timeout_secs: u64,
}

impl SmtpSettings {
    /// A host and a sender are the minimum needed to attempt delivery
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty() && !self.sender.trim().is_empty()
    }
}

impl AlertSettings {
    pub fn expiry_windows(&self) -> ExpiryWindows {
        ExpiryWindows {
            urgent_days: self.urgent_days,
            alert_days: self.alert_days,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("IMS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.max_upload_bytes", 16 * 1024 * 1024)?
            .set_default("storage.data_dir", "data")?
            .set_default("storage.archive_limit", DEFAULT_ARCHIVE_LIMIT as i64)?
            .set_default("alerts.urgent_days", 7)?
            .set_default("alerts.alert_days", 30)?
            .set_default("alerts.queue_capacity", 64)?
            .set_default("alerts.log_capacity", 50)?
            .set_default("smtp.host", "smtp.gmail.com")?
            .set_default("smtp.port", 587)?
            .set_default("smtp.timeout_secs", 30)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (IMS_ prefix)
            .add_source(
                Environment::with_prefix("IMS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Defaults rooted at a specific data directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            storage: StorageConfig {
                data_dir: data_dir.into(),
                archive_limit: DEFAULT_ARCHIVE_LIMIT,
            },
            alerts: AlertSettings::default(),
            smtp: SmtpSettings::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        let windows = ExpiryWindows::default();
        Self {
            urgent_days: windows.urgent_days,
            alert_days: windows.alert_days,
            default_receiver: None,
            queue_capacity: 64,
            log_capacity: 50,
        }
    }
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            sender: String::new(),
            recipients: String::new(),
            tls: SmtpTls::Starttls,
            timeout_secs: 30,
        }
    }
}

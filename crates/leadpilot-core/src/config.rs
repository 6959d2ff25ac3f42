//! LeadPilot configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadPilotConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub cloud_api: CloudApiConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl Default for LeadPilotConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            workers: WorkerConfig::default(),
            retry: RetryConfig::default(),
            pacing: PacingConfig::default(),
            provider: ProviderConfig::default(),
            cloud_api: CloudApiConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl LeadPilotConfig {
    /// Load config from the default path (~/.leadpilot/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::LeadPilotError::Config(format!("Failed to read config: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::LeadPilotError::Config(format!("Failed to parse config: {e}"))
        })?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| {
            crate::error::LeadPilotError::Config(format!("Failed to serialize config: {e}"))
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the LeadPilot home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".leadpilot")
    }
}

/// Job store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the jobs database. Empty = ~/.leadpilot/jobs.db.
    #[serde(default)]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: String::new(),
        }
    }
}

impl StoreConfig {
    /// Resolve the database path, falling back to the home default.
    pub fn resolve_db_path(&self) -> PathBuf {
        if self.db_path.is_empty() {
            LeadPilotConfig::home_dir().join("jobs.db")
        } else {
            PathBuf::from(&self.db_path)
        }
    }
}

/// Dispatcher worker-pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_worker_count")]
    pub count: usize,
    /// How often an idle worker re-polls the ready queue.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_worker_count() -> usize {
    4
}
fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Retry / backoff configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Escalating delay schedule in seconds, indexed by attempt (1-based).
    /// Attempts past the end of the table clamp to the last entry.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: Vec<u64>,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_backoff_secs() -> Vec<u64> {
    vec![5, 20, 60, 180, 600]
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

/// Channel pacing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Minimum gap between cloud-API sends to the same recipient (seconds).
    #[serde(default = "default_cloud_min_gap")]
    pub cloud_min_gap_secs: u64,
    /// Base pause before every web-session send (seconds).
    #[serde(default = "default_web_base_delay")]
    pub web_base_delay_secs: u64,
    /// Uniform jitter applied to the web-session pause (± seconds).
    #[serde(default = "default_web_jitter")]
    pub web_jitter_secs: u64,
    /// UTC hour (inclusive) at which email sending opens.
    #[serde(default = "default_email_open_hour")]
    pub email_open_hour: u32,
    /// UTC hour (exclusive) at which email sending closes.
    #[serde(default = "default_email_close_hour")]
    pub email_close_hour: u32,
}

fn default_cloud_min_gap() -> u64 {
    15
}
fn default_web_base_delay() -> u64 {
    60
}
fn default_web_jitter() -> u64 {
    15
}
fn default_email_open_hour() -> u32 {
    8
}
fn default_email_close_hour() -> u32 {
    22
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            cloud_min_gap_secs: default_cloud_min_gap(),
            web_base_delay_secs: default_web_base_delay(),
            web_jitter_secs: default_web_jitter(),
            email_open_hour: default_email_open_hour(),
            email_close_hour: default_email_close_hour(),
        }
    }
}

/// Reply provider (OpenAI-compatible chat API) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.4
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
        }
    }
}

/// WhatsApp-style cloud API credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudApiConfig {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub phone_number_id: String,
}

/// SMTP credentials for the email channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_from_email")]
    pub from_email: String,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".into()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_from_email() -> String {
    "noreply@example.com".into()
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from_email: default_from_email(),
        }
    }
}

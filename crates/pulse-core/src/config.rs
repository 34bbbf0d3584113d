use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::PulseError;

/// Top-level Pulse configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub twilio: TwilioConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Public base URL used in SMS templates to link the web form.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            base_url: default_base_url(),
        }
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bearer token for `/api/admin/*`. Empty means admin routes reject
    /// every request.
    #[serde(default)]
    pub admin_token: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_token: String::new(),
        }
    }
}

/// Twilio credentials. All three are required for sending; any can also be
/// supplied via `PULSE_TWILIO_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    /// Sender phone number in E.164 form.
    #[serde(default)]
    pub from_number: String,
}

impl TwilioConfig {
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty() && !self.from_number.is_empty()
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Daily dispatch schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// IANA zone name the fire time is interpreted in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_hour")]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    /// Fixed pause between consecutive sends in a dispatch pass.
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            hour: default_hour(),
            minute: 0,
            send_delay_ms: default_send_delay_ms(),
        }
    }
}

// --- Default value functions ---

fn default_name() -> String {
    "Pulse Daily Survey".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3001
}
fn default_db_path() -> String {
    "~/.pulse/survey.db".to_string()
}
fn default_timezone() -> String {
    "America/New_York".to_string()
}
fn default_hour() -> u32 {
    7
}
fn default_send_delay_ms() -> u64 {
    100
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

pub fn load(path: &str) -> Result<Config, PulseError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PulseError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| PulseError::Config(format!("failed to parse config: {}", e)))?
    } else {
        tracing::info!("Config file not found at {}, using defaults", path.display());
        Config::default()
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Secrets can come from the environment instead of the config file.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(v) = std::env::var("PULSE_TWILIO_ACCOUNT_SID") {
        config.twilio.account_sid = v;
    }
    if let Ok(v) = std::env::var("PULSE_TWILIO_AUTH_TOKEN") {
        config.twilio.auth_token = v;
    }
    if let Ok(v) = std::env::var("PULSE_TWILIO_FROM_NUMBER") {
        config.twilio.from_number = v;
    }
    if let Ok(v) = std::env::var("PULSE_ADMIN_TOKEN") {
        config.api.admin_token = v;
    }
}

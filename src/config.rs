use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.dynect.net";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub record: RecordConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Record and account values; any of them may instead come from the CLI.
#[derive(Clone, Default, Deserialize)]
pub struct RecordConfig {
    pub customer_name: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub fqdn: Option<String>,
    pub zone: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for RecordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordConfig")
            .field("customer_name", &self.customer_name)
            .field("user_name", &self.user_name)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("host", &self.host)
            .field("fqdn", &self.fqdn)
            .field("zone", &self.zone)
            .finish()
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        anyhow::ensure!(
            config.api.timeout_secs > 0,
            "Invalid config file {}: api.timeout_secs must be at least 1",
            path.display()
        );

        Ok(config)
    }
}

/// Command line values. Anything set here wins over the config file.
#[derive(Clone, Default)]
pub struct Overrides {
    pub record: RecordConfig,
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Clone)]
pub struct Credentials {
    pub customer_name: String,
    pub user_name: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("customer_name", &self.customer_name)
            .field("user_name", &self.user_name)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// Everything one run needs, fixed before the first request goes out.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    /// Target the CNAME should point at.
    pub host: String,
    pub fqdn: String,
    pub zone: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl Settings {
    /// Missing values are not rejected here: they go out as empty strings
    /// and Dyn reports the failure.
    pub fn resolve(config: Config, overrides: Overrides) -> Self {
        let file = config.record;
        let cli = overrides.record;

        let api_base = overrides.api_base.unwrap_or(config.api.base_url);

        Settings {
            credentials: Credentials {
                customer_name: pick("customerName", cli.customer_name, file.customer_name),
                user_name: pick("userName", cli.user_name, file.user_name),
                password: pick("password", cli.password, file.password),
            },
            host: pick("host", cli.host, file.host),
            fqdn: pick("fqdn", cli.fqdn, file.fqdn),
            zone: pick("zone", cli.zone, file.zone),
            api_base: api_base.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(overrides.timeout_secs.unwrap_or(config.api.timeout_secs)),
        }
    }
}

fn pick(name: &str, cli: Option<String>, file: Option<String>) -> String {
    match cli.or(file) {
        Some(value) => value,
        None => {
            warn!("No value given for {}, sending it empty", name);
            String::new()
        }
    }
}

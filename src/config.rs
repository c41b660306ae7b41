use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Program pages tried in order; `{date}` becomes `DD.MM.YYYY`
pub const DEFAULT_SOURCE_URLS: [&str; 5] = [
    "https://arsiv.sahadan.com/Iddaa/program.aspx",
    "https://www.sahadan.com/iddaa/program",
    "https://www.sahadan.com/iddaa",
    "https://arsiv.sahadan.com/iddaa/program.aspx?date={date}",
    "https://www.sahadan.com/iddaa/program?date={date}",
];

pub const DEFAULT_USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub source_urls: Vec<String>,
    pub fetch_timeout: Duration,
    pub user_agents: Vec<String>,
    /// Fixed seed for the fallback generator; fresh entropy per call when unset
    pub fallback_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3001))),
            source_urls: DEFAULT_SOURCE_URLS.iter().map(|s| s.to_string()).collect(),
            fetch_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            fallback_seed: None,
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read `IDDAA_*` variables over the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get("IDDAA_BIND_ADDR") {
            config.bind_addr = value.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    name: "IDDAA_BIND_ADDR",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(value) = get("IDDAA_SOURCE_URLS") {
            config.source_urls = split_list(&value, ',');
        }

        if let Some(value) = get("IDDAA_FETCH_TIMEOUT_SECS") {
            let secs: u64 = value.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    name: "IDDAA_FETCH_TIMEOUT_SECS",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: "IDDAA_FETCH_TIMEOUT_SECS",
                    value,
                    reason: "timeout must be at least one second".to_string(),
                });
            }
            config.fetch_timeout = Duration::from_secs(secs);
        }

        if let Some(value) = get("IDDAA_USER_AGENTS") {
            let agents = split_list(&value, '|');
            if !agents.is_empty() {
                config.user_agents = agents;
            }
        }

        if let Some(value) = get("IDDAA_FALLBACK_SEED") {
            let seed = value.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    name: "IDDAA_FALLBACK_SEED",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
            config.fallback_seed = Some(seed);
        }

        Ok(config)
    }
}

fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

use std::env;
use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_HEALTH_ADDR: &str = "0.0.0.0:10000";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("BOT_TOKEN is not set")]
    MissingToken,
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub api_base: String,
    pub poll_timeout_secs: u64,
    pub health_addr: SocketAddr,
    pub idle_timeout: Option<Duration>,
    pub dispatch_parallelism: usize,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("BOT_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let api_base = lookup("TELEGRAM_API_BASE")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let poll_timeout_secs = parse_u64(&lookup, "POLL_TIMEOUT_SECS")?
            .unwrap_or(30)
            .clamp(1, 50);

        let health_raw = lookup("HEALTH_ADDR").unwrap_or_else(|| DEFAULT_HEALTH_ADDR.to_string());
        let health_addr = health_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                key: "HEALTH_ADDR",
                value: health_raw.clone(),
            })?;

        let idle_timeout = parse_u64(&lookup, "SESSION_IDLE_SECS")?
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::seconds(secs.min(i64::MAX as u64 / 1000) as i64));

        let dispatch_parallelism = parse_u64(&lookup, "DISPATCH_PARALLELISM")?
            .unwrap_or(4)
            .clamp(1, 32) as usize;

        Ok(Self {
            token,
            api_base,
            poll_timeout_secs,
            health_addr,
            idle_timeout,
            dispatch_parallelism,
        })
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}

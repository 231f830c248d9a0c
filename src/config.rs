//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::reconcile::ScoringThresholds;

/// An API key accepted by the auth middleware, stored as a SHA-256 hex digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyEntry {
    pub name: String,
    pub key_hash: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL; in-memory stores are used when absent
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    pub api_keys: Vec<ApiKeyEntry>,

    /// Lifetime of cached history pages
    pub history_cache_ttl: Duration,

    /// How often expired cache entries are swept
    pub cache_sweep_interval: Duration,

    pub thresholds: ScoringThresholds,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "PORT", 3000)?;
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let api_keys = match lookup("API_KEYS") {
            Some(raw) => parse_api_keys(&raw)?,
            None => Vec::new(),
        };

        let history_cache_ttl = Duration::from_secs(parse_or(&lookup, "HISTORY_CACHE_TTL_SECS", 60)?);
        let cache_sweep_interval =
            Duration::from_secs(parse_or(&lookup, "CACHE_SWEEP_INTERVAL_SECS", 300)?);
        if cache_sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue("CACHE_SWEEP_INTERVAL_SECS"));
        }

        let defaults = ScoringThresholds::default();
        let thresholds = ScoringThresholds {
            risk_medium_percent: parse_or(&lookup, "RISK_MEDIUM_PERCENT", defaults.risk_medium_percent)?,
            risk_high_percent: parse_or(&lookup, "RISK_HIGH_PERCENT", defaults.risk_high_percent)?,
            efficiency_excellent_secs: parse_or(
                &lookup,
                "EFFICIENCY_EXCELLENT_SECS",
                defaults.efficiency_excellent_secs,
            )?,
            efficiency_good_secs: parse_or(&lookup, "EFFICIENCY_GOOD_SECS", defaults.efficiency_good_secs)?,
            efficiency_fair_secs: parse_or(&lookup, "EFFICIENCY_FAIR_SECS", defaults.efficiency_fair_secs)?,
            precision_review_percent: parse_or(
                &lookup,
                "PRECISION_REVIEW_PERCENT",
                defaults.precision_review_percent,
            )?,
            slow_count_alert_secs: parse_or(&lookup, "SLOW_COUNT_ALERT_SECS", defaults.slow_count_alert_secs)?,
        };
        thresholds
            .validate()
            .map_err(|e| ConfigError::Thresholds(e.to_string()))?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            api_keys,
            history_cache_ttl,
            cache_sweep_interval,
            thresholds,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(name)),
        None => Ok(default),
    }
}

/// Parse `name:sha256hex,name:sha256hex`
fn parse_api_keys(raw: &str) -> Result<Vec<ApiKeyEntry>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, hash) = entry
                .split_once(':')
                .ok_or(ConfigError::InvalidValue("API_KEYS"))?;
            let (name, hash) = (name.trim(), hash.trim().to_ascii_lowercase());

            let is_digest = hash.len() == 64 && hash.chars().all(|c| c.is_ascii_hexdigit());
            if name.is_empty() || !is_digest {
                return Err(ConfigError::InvalidValue("API_KEYS"));
            }

            Ok(ApiKeyEntry {
                name: name.to_string(),
                key_hash: hash,
            })
        })
        .collect()
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("Invalid scoring thresholds: {0}")]
    Thresholds(String),
}

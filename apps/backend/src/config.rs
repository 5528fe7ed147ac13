//! Environment configuration

use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;
use vocab_srs_core::Sm2;

use crate::services::sessions::DEFAULT_SESSION_TTL_MINUTES;

/// Configuration errors, reported at startup
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Scheduling settings shared by all requests
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSettings {
    pub algorithm: Sm2,
    /// Default cap on never-reviewed words per due set; `None` is unlimited.
    pub new_words_per_session: Option<usize>,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            algorithm: Sm2::default(),
            new_words_per_session: None,
        }
    }
}

/// Backend configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub log_filter: String,
    pub review: ReviewSettings,
    /// Idle time after which a review session is dropped
    pub session_ttl: Duration,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let mut algorithm = Sm2::default();
        if let Some(days) = parse_var::<_, u32>(&lookup, "SRS_MASTERY_INTERVAL_DAYS")? {
            if days == 0 {
                return Err(ConfigError::Invalid {
                    key: "SRS_MASTERY_INTERVAL_DAYS",
                    value: days.to_string(),
                });
            }
            algorithm.mastery_interval = days;
        }

        let ttl_minutes = parse_var::<_, u32>(&lookup, "SESSION_TTL_MINUTES")?
            .unwrap_or(DEFAULT_SESSION_TTL_MINUTES);
        if ttl_minutes == 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_TTL_MINUTES",
                value: ttl_minutes.to_string(),
            });
        }

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT")?.unwrap_or(3000),
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            review: ReviewSettings {
                algorithm,
                new_words_per_session: parse_var(&lookup, "NEW_WORDS_PER_SESSION")?,
            },
            session_ttl: Duration::minutes(i64::from(ttl_minutes)),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

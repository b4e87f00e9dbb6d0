use std::env;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnvVar { name: &'static str, value: String },
}

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_pool_size: u32,
    pub session_ttl_hours: i64,
    pub session_cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("DATABASE_URL"))?;

        let config = Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            db_pool_size: parse_or(&lookup, "DB_POOL_SIZE", 10)?,
            session_ttl_hours: parse_or(&lookup, "SESSION_TTL_HOURS", 336)?,
            session_cookie_secure: parse_flag(&lookup, "SESSION_COOKIE_SECURE")?,
        };

        if config.db_pool_size == 0 {
            return Err(ConfigError::InvalidEnvVar {
                name: "DB_POOL_SIZE",
                value: "0".to_string(),
            });
        }
        if config.session_ttl_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar {
                name: "SESSION_TTL_HOURS",
                value: config.session_ttl_hours.to_string(),
            });
        }
        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar { name, value }),
    }
}

fn parse_flag<F>(lookup: &F, name: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let Some(value) = lookup(name) else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnvVar { name, value }),
    }
}

use dotenvy::dotenv;
use std::env;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url:       String,
    pub db_max_connections: u32,

    // Backend
    pub backend_host:       String,
    pub backend_port:       u16,

    // Session / magic link
    pub session_days:       i64,
    pub magic_link_minutes: i64,

    // Email
    pub smtp_host:          String,
    pub smtp_port:          u16,
    pub smtp_user:          String,
    pub smtp_password:      String,
    pub smtp_from:          String,

    // Page cache revalidation webhook (optional)
    pub revalidate_url:     Option<String>,

    // Housekeeping
    pub cleanup_interval_minutes: u64,

    // App
    pub app_env:            String,
    pub app_base_url:       String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        fn optional(key: &str) -> Option<String> {
            env::var(key).ok().filter(|v| !v.trim().is_empty())
        }

        fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
            match optional(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<T>()
                    .map_err(|_| ConfigError::InvalidValue(key.to_string(), raw)),
                None => Ok(default),
            }
        }

        Ok(Self {
            database_url: optional("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://goaltracker.db?mode=rwc".into()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,

            backend_host: optional("BACKEND_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            backend_port: parse_or("BACKEND_PORT", 8080)?,

            session_days:       parse_or("SESSION_DAYS", 30)?,
            magic_link_minutes: parse_or("MAGIC_LINK_MINUTES", 15)?,

            smtp_host:     optional("SMTP_HOST").unwrap_or_default(),
            smtp_port:     parse_or("SMTP_PORT", 587)?,
            smtp_user:     optional("SMTP_USER").unwrap_or_default(),
            smtp_password: optional("SMTP_PASSWORD").unwrap_or_default(),
            smtp_from:     optional("SMTP_FROM").unwrap_or_default(),

            revalidate_url: optional("REVALIDATE_URL"),

            cleanup_interval_minutes: parse_or("CLEANUP_INTERVAL_MINUTES", 60)?,

            app_env:      optional("APP_ENV").unwrap_or_else(|| "development".into()),
            app_base_url: optional("APP_BASE_URL").unwrap_or_else(|| "http://localhost:8080".into()),
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
impl Config {
    /// Config used by in-process tests: no SMTP, no webhook, no cleanup job.
    pub fn for_tests() -> Self {
        Self {
            database_url:       "sqlite::memory:".into(),
            db_max_connections: 1,
            backend_host:       "127.0.0.1".into(),
            backend_port:       0,
            session_days:       30,
            magic_link_minutes: 15,
            smtp_host:          String::new(),
            smtp_port:          587,
            smtp_user:          String::new(),
            smtp_password:      String::new(),
            smtp_from:          String::new(),
            revalidate_url:     None,
            cleanup_interval_minutes: 0,
            app_env:            "test".into(),
            app_base_url:       "http://localhost:8080".into(),
        }
    }
}

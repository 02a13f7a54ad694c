//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use agora_infra::DatabaseConfig;

/// Where domain events go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventsBackend {
    Memory,
    Redis,
}

impl FromStr for EventsBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown events backend '{other}'")),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub events: EventsBackend,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .map(|url| {
                let mut config = DatabaseConfig::new(url);
                if let Some(max) = parse_var("DB_MAX_CONNECTIONS") {
                    config.max_connections = max;
                }
                if let Some(min) = parse_var("DB_MIN_CONNECTIONS") {
                    config.min_connections = min;
                }
                config
            });

        let events = match env::var("EVENTS_BACKEND") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to in-memory events");
                EventsBackend::Memory
            }),
            Err(_) => EventsBackend::Memory,
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT").unwrap_or(8080),
            database,
            events,
        }
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

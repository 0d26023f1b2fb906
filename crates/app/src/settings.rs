//! Application settings, read from an optional `settings.{toml,yaml,...}` file
//! and `MERCATO__*` environment variables.
//!
//! ```toml
//! [app]
//! level = "debug"
//!
//! [server]
//! database = { sqlite = "mercato.db" }
//! port = 3000
//! ```
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub database: Database,
    pub bind: Option<String>,
    pub port: u16,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl Server {
    pub fn session_ttl(&self) -> Result<Duration, ConfigError> {
        self.session_ttl_hours
            .checked_mul(60 * 60)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "server.session_ttl_hours is too large: {}",
                    self.session_ttl_hours
                ))
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_session_ttl_hours() -> u64 {
    72
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_image_bytes() -> usize {
    5 * 1024 * 1024
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("MERCATO").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(raw: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_settings_use_defaults() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert!(settings.server.is_none());
    }

    #[test]
    fn server_table_fills_defaults() {
        let settings = parse(
            r#"
            [server]
            database = { sqlite = "mercato.db" }
            port = 8080
            "#,
        );
        let server = settings.server.unwrap();
        assert!(matches!(server.database, Database::Sqlite(ref path) if path == "mercato.db"));
        assert_eq!(server.port, 8080);
        assert_eq!(server.session_ttl_hours, 72);
        assert_eq!(server.request_timeout_secs, 30);
        assert_eq!(server.max_image_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn session_ttl_converts_hours() {
        let settings = parse(
            r#"
            [server]
            database = "memory"
            port = 3000
            session_ttl_hours = 2
            "#,
        );
        assert_eq!(
            settings.server.unwrap().session_ttl().unwrap(),
            Duration::from_secs(2 * 60 * 60)
        );
    }

    #[test]
    fn oversized_session_ttl_is_a_config_error() {
        let settings = parse(&format!(
            r#"
            [server]
            database = "memory"
            port = 3000
            session_ttl_hours = {}
            "#,
            u64::MAX / 2
        ));
        assert!(matches!(
            settings.server.unwrap().session_ttl(),
            Err(ConfigError::Message(_))
        ));
    }

    #[test]
    fn memory_database() {
        let settings = parse(
            r#"
            [server]
            database = "memory"
            port = 3000
            "#,
        );
        assert!(matches!(settings.server.unwrap().database, Database::Memory));
    }
}

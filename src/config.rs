use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::slug::{SlugConfigError, SlugGenerator, DEFAULT_ALPHABET, DEFAULT_LENGTH};

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prefix of the `shortUrl` returned on creation.
    pub public_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlugConfig {
    pub alphabet: String,
    pub length: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Header carrying the authenticated principal id.
    pub principal_header: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub slug: SlugConfig,
    pub auth: AuthConfig,
    pub log: LogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            // Load from config/snaplink.toml
            .add_source(File::with_name("config/snaplink").required(false))
            // Override from environment (e.g., SNAPLINK__SLUG__LENGTH)
            .add_source(Environment::with_prefix("SNAPLINK").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.public_base_url", "http://localhost:3000")?
            .set_default("database.url", "sqlite:snaplink.db")?
            .set_default("database.max_connections", 5)?
            .set_default("slug.alphabet", DEFAULT_ALPHABET)?
            .set_default("slug.length", DEFAULT_LENGTH as u64)?
            .set_default("auth.principal_header", "x-user-id")?
            .set_default("log.level", "info")?
            .set_default("log.format", "pretty")
    }

    pub fn slug_generator(&self) -> Result<SlugGenerator, SlugConfigError> {
        SlugGenerator::new(&self.slug.alphabet, self.slug.length)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> AppConfig {
        AppConfig::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = defaults();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.slug.length, 6);
        assert_eq!(config.slug.alphabet.len(), 62);
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert!(config.slug_generator().is_ok());
    }

    #[test]
    fn test_invalid_slug_settings_rejected() {
        let mut config = defaults();
        config.slug.length = 300;
        assert_eq!(
            config.slug_generator().unwrap_err(),
            SlugConfigError::InvalidLength
        );

        config.slug.length = 6;
        config.slug.alphabet = "x".into();
        assert_eq!(
            config.slug_generator().unwrap_err(),
            SlugConfigError::AlphabetTooSmall
        );
    }
}

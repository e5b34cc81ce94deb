use config::{Config as ConfigLoader, ConfigError, Environment, File};
use rethread_fetch::CoordinatorConfig;
use rethread_source::PullPushConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub store: StoreConfig,
    pub fetch: FetchConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub batch_size: u32,
    pub rate_limit_ms: u64,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_ms: u64,
}

impl From<&SourceConfig> for PullPushConfig {
    fn from(config: &SourceConfig) -> Self {
        PullPushConfig::new()
            .with_base_url(config.base_url.clone())
            .with_batch_size(config.batch_size)
            .with_rate_limit(Duration::from_millis(config.rate_limit_ms))
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .with_retries(config.max_retries, Duration::from_millis(config.retry_base_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// `memory` or `mongodb`
    pub backend: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Cache mode used when the command line does not name one
    pub mode: String,
    pub upsert_batch_size: usize,
}

impl From<&FetchConfig> for CoordinatorConfig {
    fn from(config: &FetchConfig) -> Self {
        CoordinatorConfig::new().with_upsert_batch_size(config.upsert_batch_size)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables named RETHREAD_<SECTION>__<KEY>
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("RETHREAD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;

        let mut cfg: Config = config.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.mongodb_uri = std::env::var("MONGODB_URI").ok().filter(|uri| !uri.is_empty());

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [source]
        base_url = "http://localhost:9999/reddit/search"
        batch_size = 50
        rate_limit_ms = 0
        timeout_secs = 5
        max_retries = 1
        retry_base_ms = 100

        [store]
        backend = "memory"
        database = "test"

        [fetch]
        mode = "cache_only"
        upsert_batch_size = 25

        [logging]
        level = "debug"
        format = "json"
    "#;

    #[test]
    fn test_config_structure() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.source.batch_size, 50);
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.fetch.mode, "cache_only");
        assert!(config.mongodb_uri.is_none());
    }

    #[test]
    fn test_conversions() {
        let config: Config = toml::from_str(SAMPLE).unwrap();

        let client: PullPushConfig = (&config.source).into();
        assert_eq!(client.batch_size, 50);
        assert_eq!(client.rate_limit, Duration::ZERO);
        assert_eq!(client.max_retries, 1);

        let coordinator: CoordinatorConfig = (&config.fetch).into();
        assert_eq!(coordinator.upsert_batch_size, 25);
    }

    #[test]
    fn test_shipped_defaults_parse() {
        let config = Config::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml")).unwrap();
        assert_eq!(config.fetch.mode, "default");
        assert_eq!(config.store.backend, "memory");
    }
}

use anyhow::bail;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use tagtrail_domain::TrimStrategy;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Pre-shared ingestion credential; gateways send it in the x-api-key
    /// header. No default: the server refuses to start without one.
    pub api_key: String,

    /// Listen address for the HTTP server
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Log level fallback when RUST_LOG is unset (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Cap on each tag's retained history entries
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    /// History cap enforcement: "approximate", "exact", or "off"
    #[serde(default = "default_trim_mode")]
    pub trim_mode: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_cap() -> usize {
    10_000
}

fn default_trim_mode() -> String {
    "approximate".to_string()
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("TAGTRAIL"))
            .build()?
            .try_deserialize()
    }

    pub fn trim_strategy(&self) -> anyhow::Result<Option<TrimStrategy>> {
        match self.trim_mode.as_str() {
            "approximate" => Ok(Some(TrimStrategy::Approximate(self.history_cap))),
            "exact" => Ok(Some(TrimStrategy::Exact(self.history_cap))),
            "off" => Ok(None),
            other => bail!("unknown trim mode: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global; run these serially.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_apply_when_only_key_is_set() {
        let _lock = TEST_LOCK.lock().unwrap();
        std::env::set_var("TAGTRAIL_API_KEY", "secret");
        std::env::remove_var("TAGTRAIL_BIND_ADDR");
        std::env::remove_var("TAGTRAIL_TRIM_MODE");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.redis_url, "redis://localhost:6379");
        assert_eq!(config.history_cap, 10_000);
        assert_eq!(
            config.trim_strategy().unwrap(),
            Some(TrimStrategy::Approximate(10_000))
        );

        std::env::remove_var("TAGTRAIL_API_KEY");
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let _lock = TEST_LOCK.lock().unwrap();
        std::env::remove_var("TAGTRAIL_API_KEY");

        assert!(ServerConfig::from_env().is_err());
    }

    #[test]
    fn test_env_overrides_and_trim_modes() {
        let _lock = TEST_LOCK.lock().unwrap();
        std::env::set_var("TAGTRAIL_API_KEY", "secret");
        std::env::set_var("TAGTRAIL_BIND_ADDR", "127.0.0.1:9090");
        std::env::set_var("TAGTRAIL_HISTORY_CAP", "500");
        std::env::set_var("TAGTRAIL_TRIM_MODE", "exact");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9090");
        assert_eq!(
            config.trim_strategy().unwrap(),
            Some(TrimStrategy::Exact(500))
        );

        std::env::set_var("TAGTRAIL_TRIM_MODE", "off");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.trim_strategy().unwrap(), None);

        std::env::set_var("TAGTRAIL_TRIM_MODE", "sometimes");
        let config = ServerConfig::from_env().unwrap();
        assert!(config.trim_strategy().is_err());

        std::env::remove_var("TAGTRAIL_API_KEY");
        std::env::remove_var("TAGTRAIL_BIND_ADDR");
        std::env::remove_var("TAGTRAIL_HISTORY_CAP");
        std::env::remove_var("TAGTRAIL_TRIM_MODE");
    }
}

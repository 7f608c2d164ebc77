use crate::config_validator::ConfigValidator;
use crate::error::ClubsResult;
use envconfig::Envconfig;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Envconfig, Clone)]
pub struct Config {
    /// Server bind address
    #[envconfig(from = "BIND_ADDR", default = "127.0.0.1:3000")]
    pub bind_addr: SocketAddr,

    /// Comma-separated list of accepted API keys
    #[envconfig(from = "API_KEYS", default = "")]
    pub api_keys: String,

    /// Sustained requests per second per API key
    #[envconfig(from = "RATE_LIMIT", default = "100")]
    pub rate_limit: u32,

    /// Token bucket capacity multiplier
    #[envconfig(from = "BUCKET_CAPACITY_MULTIPLIER", default = "2")]
    pub bucket_capacity_multiplier: u32,

    /// Delay before a write becomes visible on the nation index
    #[envconfig(from = "INDEX_LAG_MS", default = "0")]
    pub index_lag_ms: u64,

    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> ClubsResult<Self> {
        let config = Config::init_from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration for an in-process service accepting the given keys.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let api_keys = keys
            .into_iter()
            .map(|k| k.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");

        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            api_keys,
            rate_limit: 100,
            bucket_capacity_multiplier: 2,
            index_lag_ms: 0,
            log_level: "info".to_string(),
        }
    }

    pub fn validate(&self) -> ClubsResult<()> {
        ConfigValidator::validate_bind_address(&self.bind_addr)?;
        ConfigValidator::validate_rate_limit(self.rate_limit, self.bucket_capacity_multiplier)?;
        ConfigValidator::validate_api_keys(&self.api_key_list())?;
        Ok(())
    }

    /// Get bucket capacity based on rate limit
    pub fn bucket_capacity(&self) -> u32 {
        self.rate_limit.saturating_mul(self.bucket_capacity_multiplier)
    }

    pub fn index_lag(&self) -> Duration {
        Duration::from_millis(self.index_lag_ms)
    }

    pub fn api_key_list(&self) -> Vec<String> {
        self.api_keys
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_burst_is_twice_rate() {
        let config = Config::with_keys(["k1"]);
        assert_eq!(config.rate_limit, 100);
        assert_eq!(config.bucket_capacity(), 200);
    }

    #[test]
    fn test_api_key_list_skips_blanks() {
        let mut config = Config::with_keys(["a"]);
        config.api_keys = " a , ,b,".to_string();
        assert_eq!(config.api_key_list(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_validate_requires_keys() {
        let config = Config::with_keys(Vec::<String>::new());
        assert!(config.validate().is_err());
        assert!(Config::with_keys(["k"]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_port_zero() {
        let mut config = Config::with_keys(["k"]);
        config.bind_addr = SocketAddr::from(([127, 0, 0, 1], 0));
        assert!(config.validate().is_err());
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub oracle: OracleConfig,
    pub chain: ChainConfig,
    pub engine: EngineConfig,
    pub database: DatabaseConfig,
    pub dry_run: DryRunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// Price oracle REST endpoint
    pub url: String,
    /// Per-quote-request timeout in milliseconds
    #[serde(default = "default_call_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// Chain RPC endpoint used for swap submission
    pub rpc_url: String,
    /// Per-submission timeout in milliseconds
    #[serde(default = "default_call_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Seconds between cycle starts
    pub cycle_interval_secs: u64,
    /// Maximum orders evaluated concurrently within one cycle
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Overall deadline for one cycle; orders not started by then wait for
    /// the next cycle
    #[serde(default = "default_cycle_deadline_secs")]
    pub cycle_deadline_secs: u64,
}

impl EngineConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn cycle_deadline(&self) -> Duration {
        Duration::from_secs(self.cycle_deadline_secs)
    }
}

fn default_call_timeout_ms() -> u64 {
    5000
}

fn default_max_concurrency() -> usize {
    8
}

fn default_cycle_deadline_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct DryRunConfig {
    /// Enable dry run mode (in-memory store, no real swaps)
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("oracle.timeout_ms", 5000)?
            .set_default("chain.timeout_ms", 5000)?
            .set_default("engine.max_concurrency", 8)?
            .set_default("engine.cycle_deadline_secs", 60)?
            .set_default("database.max_connections", 5)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("TONDEAL_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (TONDEAL_ORACLE__URL, etc.)
            .add_source(
                Environment::with_prefix("TONDEAL")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.oracle.url.is_empty() {
            errors.push("oracle.url must be set".to_string());
        }

        if self.chain.rpc_url.is_empty() {
            errors.push("chain.rpc_url must be set".to_string());
        }

        if self.engine.cycle_interval_secs == 0 {
            errors.push("engine.cycle_interval_secs must be positive".to_string());
        }

        if self.engine.max_concurrency == 0 {
            errors.push("engine.max_concurrency must be positive".to_string());
        }

        if self.engine.cycle_deadline_secs == 0 {
            errors.push("engine.cycle_deadline_secs must be positive".to_string());
        }

        if self.oracle.timeout_ms == 0 || self.chain.timeout_ms == 0 {
            errors.push("per-call timeouts must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> AppConfig {
        AppConfig {
            oracle: OracleConfig {
                url: "https://oracle.example".to_string(),
                timeout_ms: 5000,
            },
            chain: ChainConfig {
                rpc_url: "https://rpc.example".to_string(),
                timeout_ms: 5000,
            },
            engine: EngineConfig {
                cycle_interval_secs: 30,
                max_concurrency: 8,
                cycle_deadline_secs: 25,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/tondeal".to_string(),
                max_connections: 5,
            },
            dry_run: DryRunConfig { enabled: true },
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = sample_config();
        config.engine.max_concurrency = 0;

        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("max_concurrency")));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let mut config = sample_config();
        config.oracle.timeout_ms = 0;

        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("timeouts")));
    }
}

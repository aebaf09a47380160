//! Configuration loading.
//!
//! Sources, later ones overriding earlier ones:
//!
//! 1. `fleetline.yaml` in the current directory, if present
//! 2. the path passed to [`Config::load`]
//! 3. the file named by `FLEETLINE_CONFIG`
//! 4. `FLEETLINE__*` environment variables, `__` separating nested keys
//!    (e.g. `FLEETLINE__CLUSTER__PARTITIONS=6`)

use std::time::Duration;

use serde::Deserialize;

use crate::directory::NodeAddr;
use crate::domain::Domain;
use crate::utils::retry::RetryPolicy;

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "fleetline.yaml";

/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "FLEETLINE_CONFIG";

/// Prefix for environment overrides.
pub const CONFIG_ENV_PREFIX: &str = "FLEETLINE";

/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "FLEETLINE_LOG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Aggregate type this cluster serves.
    pub domain: Domain,
    pub server: ServerConfig,
    pub cluster: ClusterConfig,
    pub rpc: RpcConfig,
    /// Command response polling.
    pub polling: RetryPolicy,
    /// Retries of client-facing reads on transient failures.
    pub query_retry: RetryPolicy,
    pub responses: ResponsesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// Node `i` listens on `base_port + i`. Zero picks ephemeral ports.
    pub base_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            base_port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub nodes: usize,
    pub partitions: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            nodes: 1,
            partitions: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Per-call timeout for peer requests.
    pub timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self { timeout_ms: 2_000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResponsesConfig {
    /// How long command responses stay queryable.
    pub retention_secs: u64,
}

impl Default for ResponsesConfig {
    fn default() -> Self {
        Self {
            retention_secs: 3_600,
        }
    }
}

impl Config {
    /// Load and validate configuration from all sources.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config: Config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster.partitions == 0 {
            return Err(ConfigError::Invalid(
                "cluster.partitions must be at least 1".to_string(),
            ));
        }
        if self.cluster.nodes == 0 {
            return Err(ConfigError::Invalid(
                "cluster.nodes must be at least 1".to_string(),
            ));
        }
        if self.polling.max_attempts == 0 || self.query_retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.polling.min_delay_ms > self.polling.max_delay_ms
            || self.query_retry.min_delay_ms > self.query_retry.max_delay_ms
        {
            return Err(ConfigError::Invalid(
                "min_delay_ms must not exceed max_delay_ms".to_string(),
            ));
        }
        Ok(())
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc.timeout_ms)
    }

    pub fn response_retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.responses.retention_secs as i64)
    }

    /// Configured node addresses, `base_port + i` for node `i`.
    ///
    /// Meaningless when `base_port` is zero; the cluster then uses the
    /// addresses its listeners actually bound.
    pub fn node_addrs(&self) -> Vec<NodeAddr> {
        (0..self.cluster.nodes)
            .map(|i| {
                NodeAddr::new(
                    self.server.host.clone(),
                    self.server.base_port.saturating_add(i as u16),
                )
            })
            .collect()
    }

    /// Small, fast settings for tests.
    pub fn for_test() -> Self {
        let fast = RetryPolicy::new(20, Duration::from_millis(10), Duration::from_millis(100));
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                base_port: 0,
            },
            polling: fast,
            query_retry: fast,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;

    use super::*;

    fn clear_env() {
        for (key, _) in std::env::vars() {
            if key.starts_with("FLEETLINE") {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.domain, Domain::Traveler);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.base_port, 8080);
        assert_eq!(config.cluster.nodes, 1);
        assert_eq!(config.cluster.partitions, 3);
        assert_eq!(config.rpc_timeout(), Duration::from_secs(2));
        assert_eq!(config.polling, RetryPolicy::default());
        assert_eq!(config.response_retention(), chrono::Duration::hours(1));
    }

    #[test]
    fn test_node_addrs() {
        let mut config = Config::default();
        config.cluster.nodes = 3;
        let addrs = config.node_addrs();
        assert_eq!(addrs.len(), 3);
        assert_eq!(addrs[2], NodeAddr::new("127.0.0.1", 8082));
    }

    #[test]
    fn test_validate_rejects_zero_partitions_and_nodes() {
        let mut config = Config::default();
        config.cluster.partitions = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cluster.nodes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.polling.max_attempts = 0;
        assert!(config.validate().is_err());

        assert!(Config::for_test().validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_from_yaml_file() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "domain: car\ncluster:\n  nodes: 3\n  partitions: 6\npolling:\n  max_attempts: 2"
        )
        .unwrap();

        let config = Config::load(file.path().to_str()).unwrap();

        assert_eq!(config.domain, Domain::Car);
        assert_eq!(config.cluster.nodes, 3);
        assert_eq!(config.cluster.partitions, 6);
        assert_eq!(config.polling.max_attempts, 2);
        assert_eq!(config.polling.min_delay_ms, 1_000);
        assert_eq!(config.server.base_port, 8080);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "cluster:\n  partitions: 6").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, file.path());
        std::env::set_var("FLEETLINE__CLUSTER__PARTITIONS", "9");
        std::env::set_var("FLEETLINE__SERVER__BASE_PORT", "9100");
        let config = Config::load(None);
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.cluster.partitions, 9);
        assert_eq!(config.server.base_port, 9100);
    }

    #[test]
    #[serial]
    fn test_load_rejects_invalid_values() {
        clear_env();
        std::env::set_var("FLEETLINE__CLUSTER__PARTITIONS", "0");
        let result = Config::load(None);
        clear_env();

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_an_error() {
        clear_env();
        let result = Config::load(Some("/nonexistent/fleetline-test.yaml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}

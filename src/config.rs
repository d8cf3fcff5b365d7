//! Configuration management for basewatch

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::rpc::RpcOptions;

pub const DEFAULT_CONFIG_PATH: &str = "basewatch.toml";

/// Comma-separated endpoint list that replaces `rpc.endpoints`.
pub const RPC_ENV_VAR: &str = "BASE_MAINNET_RPC";
pub const PORT_ENV_VAR: &str = "PORT";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            timeout_ms: default_timeout_ms(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl RpcConfig {
    pub fn options(&self) -> RpcOptions {
        RpcOptions {
            timeout: Duration::from_millis(self.timeout_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

fn default_endpoints() -> Vec<String> {
    vec![
        "https://mainnet.base.org".to_string(),
        "https://base-mainnet.public.blastapi.io".to_string(),
    ]
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_port() -> u16 {
    3000
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    50
}

impl Config {
    /// Applies environment overrides on top of file values.
    pub fn apply_env(&mut self, rpc: Option<String>, port: Option<String>) {
        if let Some(list) = rpc {
            let endpoints: Vec<String> = list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !endpoints.is_empty() {
                self.rpc.endpoints = endpoints;
            }
        }
        if let Some(port) = port.and_then(|p| p.trim().parse::<u16>().ok()) {
            self.api.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.rpc.endpoints.iter().all(|e| e.trim().is_empty()) {
            return Err("rpc.endpoints must list at least one endpoint".into());
        }
        if self.rpc.timeout_ms == 0 {
            return Err("rpc.timeout_ms must be greater than zero".into());
        }
        if self.api.max_limit == 0 {
            return Err("api.max_limit must be at least 1".into());
        }
        if self.api.default_limit == 0 || self.api.default_limit > self.api.max_limit {
            return Err(format!(
                "api.default_limit must be within 1..={}",
                self.api.max_limit
            )
            .into());
        }
        Ok(())
    }
}

/// Reads `path` (or `basewatch.toml`), applies environment overrides and
/// validates. Only a missing implicit `basewatch.toml` yields the built-in
/// defaults; an explicit path must be readable.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let config_str = match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?,
        None => match fs::read_to_string(DEFAULT_CONFIG_PATH) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(format!("Failed to read config {}: {}", DEFAULT_CONFIG_PATH, e).into())
            }
        },
    };
    let mut config: Config = if config_str.trim().is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)?
    };

    config.apply_env(
        std::env::var(RPC_ENV_VAR).ok(),
        std::env::var(PORT_ENV_VAR).ok(),
    );
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.rpc.endpoints.len(), 2);
        assert_eq!(config.rpc.timeout_ms, 10_000);
        assert_eq!(config.rpc.retry_delay_ms, 1_000);
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.api.default_limit, 10);
        assert_eq!(config.api.max_limit, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[rpc]\nendpoints = [\"http://node-a\", \"http://node-b\", \"http://node-c\"]\nretry_delay_ms = 50\n"
        )
        .unwrap();

        let config: Config =
            toml::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(config.rpc.endpoints.len(), 3);
        assert_eq!(config.rpc.retry_delay_ms, 50);
        assert_eq!(config.rpc.timeout_ms, 10_000);
        assert_eq!(config.api.max_limit, 50);
        assert_eq!(config.rpc.options().retry_delay, Duration::from_millis(50));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(
            Some(" http://one , ,http://two ".to_string()),
            Some("8081".to_string()),
        );
        assert_eq!(config.rpc.endpoints, vec!["http://one", "http://two"]);
        assert_eq!(config.api.port, 8081);

        config.apply_env(Some(",".to_string()), Some("not-a-port".to_string()));
        assert_eq!(config.rpc.endpoints, vec!["http://one", "http://two"]);
        assert_eq!(config.api.port, 8081);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.rpc.endpoints = vec![" ".to_string()];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.default_limit = 60;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rpc.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_path_must_be_readable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("basewatch-typo.toml");
        let err = load_config(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("basewatch-typo.toml"));

        // A directory is not a config file either.
        assert!(load_config(Some(dir.path())).is_err());
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[rpc\nendpoints = 3").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }
}

//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Each `[states.<name>]` table is passed untouched to the `mstranslate` state
//! creator as its parameter bag. A state's client secret may be supplied via
//! `MSTRANSLATE_CLIENT_SECRET_<NAME>` instead of the file.

use common::Params;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const SECRET_ENV_PREFIX: &str = "MSTRANSLATE_CLIENT_SECRET_";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub states: BTreeMap<String, toml::Table>,
}

/// HTTP listener and outbound client settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Applied to every outbound call, token refreshes included
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_timeout() -> u64 {
    30
}

fn default_max_connections() -> usize {
    256
}

/// Env var that overrides `client_secret` for the named state.
pub fn secret_env_var(state: &str) -> String {
    format!(
        "{SECRET_ENV_PREFIX}{}",
        state.to_ascii_uppercase().replace('-', "_")
    )
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.server.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if config.states.is_empty() {
            return Err(common::Error::Config(
                "at least one [states.<name>] table is required".into(),
            ));
        }

        for (name, table) in config.states.iter_mut() {
            if let Ok(secret) = std::env::var(secret_env_var(name)) {
                table.insert("client_secret".into(), toml::Value::String(secret));
            }
        }

        Ok(config)
    }

    /// Parameter bags for every configured state, in name order.
    pub fn state_params(&self) -> Vec<(String, Params)> {
        self.states
            .iter()
            .map(|(name, table)| (name.clone(), Params::from(table.clone())))
            .collect()
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("translate-gateway.toml")
    }
}

// chainindex_node_rust/src/config.rs

use crate::chainparams::{params_for, ChainParams};
use crate::error::{ChainIndexError, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "chainindex.toml";
pub const DEFAULT_API_LISTEN_ADDR: &str = "0.0.0.0:3001";
const ENV_PREFIX: &str = "CHAININDEX";

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub network: String,
    pub api_listen_addr: String,
    /// JSON header feed loaded at startup.
    pub snapshot_path: Option<String>,
    pub prune_mode: bool,
}

impl NodeConfig {
    /// Defaults, then the config file (optional), then `CHAININDEX_*`
    /// environment variables.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = path.unwrap_or(DEFAULT_CONFIG_FILE);
        let settings = Config::builder()
            .set_default("network", "main")?
            .set_default("api_listen_addr", DEFAULT_API_LISTEN_ADDR)?
            .set_default("prune_mode", false)?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        let cfg: NodeConfig = settings.try_deserialize()?;
        log::debug!("Loaded configuration: {:?}", cfg);
        Ok(cfg)
    }

    pub fn chain_params(&self) -> Result<&'static ChainParams> {
        params_for(&self.network).ok_or_else(|| {
            ChainIndexError::Config(config::ConfigError::Message(format!(
                "unknown network '{}'",
                self.network
            )))
        })
    }
}

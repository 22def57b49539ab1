use std::env;
use std::time::Duration;
use thiserror::Error;

/// Environment variable names
pub mod env_vars {
    pub const RPC_URL: &str = "SEQUENCER_RPC_URL";
    pub const NETWORK: &str = "SEQUENCER_NETWORK";
    pub const CHAIN_ID: &str = "SEQUENCER_CHAIN_ID";
    pub const SUCCESS_EXPIRY_SECS: &str = "SEQUENCER_SUCCESS_EXPIRY_SECS";
    pub const WALLET_PRIVATE_KEY: &str = "SEQUENCER_WALLET_PRIVATE_KEY";
}

/// How long a successful record stays visible before it is dropped
pub const DEFAULT_SUCCESS_EXPIRY_SECS: u64 = 30;

pub const DEFAULT_NETWORK: &str = "base";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a valid number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub network: String,
    pub chain_id: u64,
    pub success_expiry: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network = lookup(env_vars::NETWORK)
            .map(|n| n.trim().to_lowercase())
            .unwrap_or_else(|| DEFAULT_NETWORK.to_string());
        if network.is_empty() {
            return Err(ConfigError::Empty { var: env_vars::NETWORK });
        }

        let chain_id = match lookup(env_vars::CHAIN_ID) {
            Some(raw) => parse_number(env_vars::CHAIN_ID, &raw)?,
            None => chain_id_for_network(&network),
        };

        let rpc_url = lookup(env_vars::RPC_URL)
            .map(|u| u.trim().to_string())
            .unwrap_or_else(|| default_rpc_url(&network).to_string());
        if rpc_url.is_empty() {
            return Err(ConfigError::Empty { var: env_vars::RPC_URL });
        }

        let expiry_secs = match lookup(env_vars::SUCCESS_EXPIRY_SECS) {
            Some(raw) => parse_number(env_vars::SUCCESS_EXPIRY_SECS, &raw)?,
            None => DEFAULT_SUCCESS_EXPIRY_SECS,
        };

        Ok(Self {
            rpc_url,
            network,
            chain_id,
            success_expiry: Duration::from_secs(expiry_secs),
        })
    }
}

fn parse_number(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    })
}

/// Chain ID for a network name
pub fn chain_id_for_network(network: &str) -> u64 {
    match network {
        "mainnet" => 1,
        "polygon" => 137,
        "arbitrum" => 42161,
        "optimism" => 10,
        _ => 8453, // Base
    }
}

fn default_rpc_url(network: &str) -> &'static str {
    match network {
        "mainnet" => "https://eth.llamarpc.com",
        "polygon" => "https://polygon-rpc.com",
        "arbitrum" => "https://arb1.arbitrum.io/rpc",
        "optimism" => "https://mainnet.optimism.io",
        _ => "https://mainnet.base.org",
    }
}

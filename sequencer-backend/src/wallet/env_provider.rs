//! Environment-based Wallet Provider
//!
//! Loads the signing key from SEQUENCER_WALLET_PRIVATE_KEY.

use async_trait::async_trait;
use ethers::core::k256::ecdsa::SigningKey;
use ethers::signers::{LocalWallet, Signer};

use super::WalletProvider;
use crate::config::env_vars;

/// Wallet provider backed by a private key held in memory
pub struct EnvWalletProvider {
    wallet: LocalWallet,
    address: String,
}

impl EnvWalletProvider {
    /// Create provider from the environment; `None` when the variable is unset or blank
    pub fn from_env() -> Result<Option<Self>, String> {
        match std::env::var(env_vars::WALLET_PRIVATE_KEY) {
            Ok(key) if !key.trim().is_empty() => Self::from_private_key(key.trim()).map(Some),
            _ => Ok(None),
        }
    }

    /// Create provider from a private key string, with or without 0x prefix
    pub fn from_private_key(private_key: &str) -> Result<Self, String> {
        let key_hex = private_key.strip_prefix("0x").unwrap_or(private_key);

        let key_bytes = hex::decode(key_hex)
            .map_err(|e| format!("Invalid private key hex: {}", e))?;

        let signing_key = SigningKey::from_slice(&key_bytes)
            .map_err(|e| format!("Invalid private key: {}", e))?;

        let wallet = LocalWallet::from(signing_key);
        let address = format!("{:?}", wallet.address()).to_lowercase();

        Ok(Self { wallet, address })
    }
}

#[async_trait]
impl WalletProvider for EnvWalletProvider {
    async fn get_wallet(&self) -> Result<LocalWallet, String> {
        Ok(self.wallet.clone())
    }

    fn get_address(&self) -> String {
        self.address.clone()
    }

    fn mode_name(&self) -> &'static str {
        "env"
    }
}

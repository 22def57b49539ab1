//! Wallet Provider Abstraction
//!
//! Action functions never hold key material directly; they ask a
//! [`WalletProvider`] for a signer right before submitting. The only provider
//! shipped here loads a private key from the environment, but the seam keeps
//! remote signers (hardware, custody APIs) pluggable.

mod env_provider;

pub use env_provider::EnvWalletProvider;

use async_trait::async_trait;
use ethers::signers::LocalWallet;
use std::sync::Arc;

/// Trait for wallet providers - abstracts where the signing key comes from
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Get the wallet for signing transactions
    async fn get_wallet(&self) -> Result<LocalWallet, String>;

    /// Get the wallet address (lowercase hex, always available)
    fn get_address(&self) -> String;

    /// Get the mode name for logging
    fn mode_name(&self) -> &'static str;
}

/// Create the wallet provider from the environment.
///
/// Returns `Ok(None)` when no key is configured, so read-only and demo use
/// still works.
pub fn create_wallet_provider() -> Result<Option<Arc<dyn WalletProvider>>, String> {
    match EnvWalletProvider::from_env()? {
        Some(provider) => {
            log::info!(
                "Wallet provider initialized ({} mode): {}",
                provider.mode_name(),
                provider.get_address()
            );
            Ok(Some(Arc::new(provider)))
        }
        None => {
            log::warn!("No wallet key configured; chain actions that sign will be unavailable");
            Ok(None)
        }
    }
}

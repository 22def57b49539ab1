//! EVM action functions
//!
//! Each public method performs one externally visible effect and maps every
//! failure to an [`ActionError`] naming the step that failed. Multi-step
//! bundles (approve-then-swap) wait for each approval to be mined before the
//! next step so the final call sees the allowance.

use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip1559::Eip1559TransactionRequest;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, H256, U256, U64};
use serde_json::{json, Value};
use std::sync::Arc;

use super::router::{self, AddLiquidityParams, RemoveLiquidityParams, SwapParams};
use super::{abi, erc20, ActionError, ActionOutput, ActionResult};
use crate::config::Config;
use crate::wallet::WalletProvider;

/// Handle to one chain: a JSON-RPC provider plus an optional signer source.
///
/// Cheap to clone; clone it into each `async move` action handed to the queue.
#[derive(Clone)]
pub struct ChainClient {
    provider: Provider<Http>,
    wallet_provider: Option<Arc<dyn WalletProvider>>,
    network: String,
    chain_id: u64,
}

impl ChainClient {
    pub fn new(
        rpc_url: &str,
        network: &str,
        chain_id: u64,
        wallet_provider: Option<Arc<dyn WalletProvider>>,
    ) -> Result<Self, String> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| format!("Invalid RPC URL '{}': {}", rpc_url, e))?;
        Ok(Self {
            provider,
            wallet_provider,
            network: network.to_string(),
            chain_id,
        })
    }

    pub fn from_config(
        config: &Config,
        wallet_provider: Option<Arc<dyn WalletProvider>>,
    ) -> Result<Self, String> {
        Self::new(&config.rpc_url, &config.network, config.chain_id, wallet_provider)
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Address of the configured wallet, if any
    pub fn wallet_address(&self) -> Option<Address> {
        self.wallet_provider
            .as_ref()
            .and_then(|w| w.get_address().parse().ok())
    }

    // ── writes ───────────────────────────────────────────────────────

    /// Send native value (wei) to `to`
    pub async fn send_native(&self, to: Address, amount: U256) -> ActionResult {
        let hash = self.submit("Transfer", to, Vec::new(), amount, false).await?;
        Ok(tx_output(hash))
    }

    /// ERC-20 transfer of `amount` base units
    pub async fn transfer_token(&self, token: Address, to: Address, amount: U256) -> ActionResult {
        let data = erc20::encode_transfer(to, amount);
        let hash = self.submit("Token transfer", token, data, U256::zero(), false).await?;
        Ok(tx_output(hash))
    }

    /// ERC-20 approve; resolves on submission
    pub async fn approve_token(&self, token: Address, spender: Address, amount: U256) -> ActionResult {
        let data = erc20::encode_approve(spender, amount);
        let hash = self.submit("Approve", token, data, U256::zero(), false).await?;
        Ok(tx_output(hash))
    }

    /// Approve the router for `amount_in` of the input token, then swap
    pub async fn swap_exact_tokens(&self, router_address: Address, params: SwapParams) -> ActionResult {
        let data = router::encode_swap_exact_tokens_for_tokens(&params).map_err(ActionError::new)?;

        self.approve_and_wait(params.path[0], router_address, params.amount_in)
            .await?;
        let hash = self.submit("Swap", router_address, data, U256::zero(), false).await?;
        Ok(tx_output(hash))
    }

    /// Approve both pair tokens, then add liquidity
    pub async fn add_liquidity(&self, router_address: Address, params: AddLiquidityParams) -> ActionResult {
        let data = router::encode_add_liquidity(&params);

        self.approve_and_wait(params.token_a, router_address, params.amount_a_desired)
            .await?;
        self.approve_and_wait(params.token_b, router_address, params.amount_b_desired)
            .await?;
        let hash = self
            .submit("Add liquidity", router_address, data, U256::zero(), false)
            .await?;
        Ok(tx_output(hash))
    }

    /// Approve the LP token, then remove liquidity
    pub async fn remove_liquidity(&self, router_address: Address, params: RemoveLiquidityParams) -> ActionResult {
        let data = router::encode_remove_liquidity(&params);

        self.approve_and_wait(params.pair, router_address, params.liquidity)
            .await?;
        let hash = self
            .submit("Remove liquidity", router_address, data, U256::zero(), false)
            .await?;
        Ok(tx_output(hash))
    }

    /// Call a state-changing contract function described by a JSON ABI
    pub async fn call_contract(
        &self,
        contract: Address,
        abi_json: &str,
        function: &str,
        args: &[Value],
        value: U256,
    ) -> ActionResult {
        let abi = abi::parse_abi(abi_json).map_err(ActionError::new)?;
        let func = abi::find_function(&abi, function).map_err(ActionError::new)?;
        let data = abi::encode_call(func, args).map_err(ActionError::new)?;

        let step = format!("Contract call {}", function);
        let hash = self.submit(&step, contract, data, value, false).await?;
        Ok(tx_output(hash))
    }

    // ── reads ────────────────────────────────────────────────────────

    /// Read-only contract call; resolves with the decoded return value
    pub async fn read_contract(
        &self,
        contract: Address,
        abi_json: &str,
        function: &str,
        args: &[Value],
    ) -> ActionResult {
        let abi = abi::parse_abi(abi_json).map_err(ActionError::new)?;
        let func = abi::find_function(&abi, function).map_err(ActionError::new)?;
        let data = abi::encode_call(func, args).map_err(ActionError::new)?;

        let raw = self.eth_call(function, contract, data).await?;
        let value = abi::decode_return(func, &raw).map_err(ActionError::new)?;
        Ok(ActionOutput::Read(value))
    }

    pub async fn token_allowance(&self, token: Address, owner: Address, spender: Address) -> ActionResult {
        let raw = self
            .eth_call("allowance", token, erc20::encode_allowance(owner, spender))
            .await?;
        let allowance = erc20::decode_uint256(&raw).map_err(ActionError::new)?;
        Ok(ActionOutput::Read(json!({
            "token": format!("{:?}", token),
            "owner": format!("{:?}", owner),
            "spender": format!("{:?}", spender),
            "allowance": allowance.to_string(),
        })))
    }

    pub async fn token_balance(&self, token: Address, owner: Address) -> ActionResult {
        let raw = self
            .eth_call("balanceOf", token, erc20::encode_balance_of(owner))
            .await?;
        let balance = erc20::decode_uint256(&raw).map_err(ActionError::new)?;
        Ok(ActionOutput::Read(json!({
            "token": format!("{:?}", token),
            "owner": format!("{:?}", owner),
            "balance": balance.to_string(),
        })))
    }

    pub async fn native_balance(&self, owner: Address) -> ActionResult {
        let balance = self
            .provider
            .get_balance(owner, None)
            .await
            .map_err(|e| ActionError::new(format!("Balance lookup failed: {}", e)))?;
        Ok(ActionOutput::Read(json!({
            "network": self.network,
            "owner": format!("{:?}", owner),
            "balance_wei": balance.to_string(),
        })))
    }

    // ── internals ────────────────────────────────────────────────────

    async fn signer(&self) -> Result<SignerMiddleware<Provider<Http>, LocalWallet>, ActionError> {
        let wallet_provider = self
            .wallet_provider
            .as_ref()
            .ok_or_else(|| ActionError::new("Wallet not configured"))?;
        let wallet = wallet_provider
            .get_wallet()
            .await
            .map_err(|e| ActionError::new(format!("Wallet unavailable: {}", e)))?;
        Ok(SignerMiddleware::new(
            self.provider.clone(),
            wallet.with_chain_id(self.chain_id),
        ))
    }

    async fn approve_and_wait(&self, token: Address, spender: Address, amount: U256) -> Result<H256, ActionError> {
        let data = erc20::encode_approve(spender, amount);
        self.submit("Approve", token, data, U256::zero(), true).await
    }

    /// Sign and submit one transaction. With `wait`, also require a successful receipt.
    async fn submit(
        &self,
        step: &str,
        to: Address,
        data: Vec<u8>,
        value: U256,
        wait: bool,
    ) -> Result<H256, ActionError> {
        let client = self.signer().await?;

        log::info!(
            "[ChainClient] {} to {:?} on {} (value={}, data_len={} bytes)",
            step,
            to,
            self.network,
            value,
            data.len()
        );

        let tx = Eip1559TransactionRequest::new().to(to).value(value).data(data);
        let pending = client
            .send_transaction(tx, None)
            .await
            .map_err(|e| ActionError::new(format!("{} failed: {}", step, e)))?;
        let tx_hash = pending.tx_hash();

        if wait {
            let receipt = pending
                .await
                .map_err(|e| ActionError::new(format!("{} receipt failed: {}", step, e)))?
                .ok_or_else(|| ActionError::new(format!("{} dropped before confirmation", step)))?;
            if receipt.status != Some(U64::from(1)) {
                return Err(ActionError::new(format!("{} reverted ({:?})", step, tx_hash)));
            }
            log::info!("[ChainClient] {} confirmed: {:?}", step, tx_hash);
        }

        Ok(tx_hash)
    }

    async fn eth_call(&self, label: &str, to: Address, data: Vec<u8>) -> Result<Bytes, ActionError> {
        let tx: TypedTransaction = Eip1559TransactionRequest::new().to(to).data(data).into();
        self.provider
            .call(&tx, None)
            .await
            .map_err(|e| ActionError::new(format!("Read {} failed: {}", label, e)))
    }
}

fn tx_output(hash: H256) -> ActionOutput {
    ActionOutput::TxHash(format!("{:?}", hash))
}

pub mod common;
pub mod constants;
pub mod trading;
pub mod utils;

use crate::common::{
    AnyResult, JupiterApiClient, SolanaRpcClient, SwapConfig, TokenHolding, TradeableToken,
};
use crate::trading::{
    AmountInput, CallbackRef, RpcSubmitter, SettlementExecutor, SettlementOutcome,
    SwapOrchestrator, SwapSigner,
};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

pub use crate::common::{InvalidReason, PreparedSwap, QuoteResult, SwapError, ValidationError};
pub use crate::trading::{SwapState, SwapStatus};

/// Shared infrastructure components, independent of the connected wallet
///
/// Holds the RPC client and the aggregator HTTP client so several sessions
/// (or a reconnecting wallet) can reuse their connection pools.
pub struct SwapInfrastructure {
    /// Shared RPC client for blockchain interactions
    pub rpc: Arc<SolanaRpcClient>,
    /// Aggregator quote/swap API client
    pub api: Arc<JupiterApiClient>,
    pub config: SwapConfig,
}

impl SwapInfrastructure {
    pub fn new(config: SwapConfig) -> AnyResult<Self> {
        let rpc = Arc::new(SolanaRpcClient::new_with_commitment(
            config.rpc_url.clone(),
            config.commitment,
        ));
        let api = Arc::new(JupiterApiClient::new(&config)?);
        Ok(Self { rpc, api, config })
    }
}

/// Main swap client
///
/// Wires the orchestrator (selection → validated quote → prepared swap) to
/// an RPC-backed settlement executor.
pub struct SwapClient {
    pub infrastructure: Arc<SwapInfrastructure>,
    pub orchestrator: Arc<SwapOrchestrator>,
    pub executor: Arc<SettlementExecutor>,
}

impl SwapClient {
    pub fn new(config: SwapConfig) -> AnyResult<Self> {
        let infrastructure = Arc::new(SwapInfrastructure::new(config)?);
        Ok(Self::from_infrastructure(infrastructure, None))
    }

    /// Build a client on shared infrastructure, optionally with a
    /// post-signing callback.
    pub fn from_infrastructure(
        infrastructure: Arc<SwapInfrastructure>,
        on_transaction_signed: Option<CallbackRef>,
    ) -> Self {
        let orchestrator = Arc::new(SwapOrchestrator::new(infrastructure.api.clone()));
        let submitter = Arc::new(RpcSubmitter::new(
            infrastructure.rpc.clone(),
            infrastructure.config.confirm_poll_interval(),
        ));
        let mut executor =
            SettlementExecutor::new(submitter, infrastructure.config.confirm_timeout());
        if let Some(callback) = on_transaction_signed {
            executor = executor.with_callback(callback);
        }
        Self { infrastructure, orchestrator, executor: Arc::new(executor) }
    }

    /// Tradeable token registry, fetched once by the surrounding application.
    pub async fn load_tradeable_tokens(&self) -> Option<Vec<TradeableToken>> {
        self.infrastructure.api.get_tradeable_tokens().await
    }

    pub async fn load_sol_holding(&self, owner: &Pubkey) -> AnyResult<TokenHolding> {
        common::balances::load_sol_holding(&self.infrastructure.rpc, owner).await
    }

    /// Amount input debounced with the configured quiet window.
    pub fn amount_input(&self) -> AmountInput {
        self.orchestrator.amount_input(self.infrastructure.config.debounce())
    }

    /// Settle the current prepared swap with `signer`.
    pub async fn swap(&self, signer: &dyn SwapSigner) -> SettlementOutcome {
        self.orchestrator.settle(&self.executor, signer).await
    }
}

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::{pubkey::Pubkey, transaction::VersionedTransaction};
use std::env;
use std::time::Duration;
use tracing::debug;

use crate::common::jupiter_api::QuoteResult;
use crate::constants::{
    DEFAULT_CONFIRM_POLL_INTERVAL_MS, DEFAULT_CONFIRM_TIMEOUT_MS, DEFAULT_DEBOUNCE_MS,
    DEFAULT_QUOTE_API_BASE, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RPC_URL, DEFAULT_TOKEN_LIST_URL,
};

/// Swap pipeline configuration (wallet-independent)
#[derive(Debug, Clone, PartialEq)]
pub struct SwapConfig {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    /// 聚合器 API 基础地址，例如 `https://quote-api.jup.ag/v6`
    pub quote_api_base: String,
    /// Tradeable token registry (full URL)
    pub token_list_url: String,
    /// Explicit proxy for aggregator requests. `None` connects directly.
    pub proxy_url: Option<String>,
    pub request_timeout_ms: u64,
    /// Quiet window applied to amount input
    pub debounce_ms: u64,
    pub confirm_timeout_ms: u64,
    pub confirm_poll_interval_ms: u64,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: CommitmentConfig::confirmed(),
            quote_api_base: DEFAULT_QUOTE_API_BASE.to_string(),
            token_list_url: DEFAULT_TOKEN_LIST_URL.to_string(),
            proxy_url: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            confirm_timeout_ms: DEFAULT_CONFIRM_TIMEOUT_MS,
            confirm_poll_interval_ms: DEFAULT_CONFIRM_POLL_INTERVAL_MS,
        }
    }
}

impl SwapConfig {
    pub fn new(rpc_url: String, commitment: CommitmentConfig) -> Self {
        debug!(%rpc_url, ?commitment, "SwapConfig created with default aggregator endpoints");
        Self { rpc_url, commitment, ..Self::default() }
    }

    /// Build from process environment, falling back to defaults.
    ///
    /// Reads `RPC_URL`, `JUPITER_API_BASE`, `TOKEN_LIST_URL`, then
    /// `HTTPS_PROXY` / `HTTP_PROXY` (either case) for the proxy.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(rpc_url) = env::var("RPC_URL") {
            config.rpc_url = rpc_url;
        }
        if let Ok(base) = env::var("JUPITER_API_BASE") {
            config.quote_api_base = base;
        }
        if let Ok(url) = env::var("TOKEN_LIST_URL") {
            config.token_list_url = url;
        }
        // 优先使用 HTTPS_PROXY，其次 HTTP_PROXY
        config.proxy_url = env::var("HTTPS_PROXY")
            .or_else(|_| env::var("https_proxy"))
            .or_else(|_| env::var("HTTP_PROXY"))
            .or_else(|_| env::var("http_proxy"))
            .ok()
            .filter(|p| !p.is_empty());
        config
    }

    pub fn with_quote_api_base(mut self, base: impl Into<String>) -> Self {
        self.quote_api_base = base.into();
        self
    }

    pub fn with_token_list_url(mut self, url: impl Into<String>) -> Self {
        self.token_list_url = url.into();
        self
    }

    pub fn with_proxy(mut self, proxy_url: Option<String>) -> Self {
        self.proxy_url = proxy_url;
        self
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// 设置确认超时与轮询间隔
    pub fn with_confirmation(mut self, timeout_ms: u64, poll_interval_ms: u64) -> Self {
        self.confirm_timeout_ms = timeout_ms;
        self.confirm_poll_interval_ms = poll_interval_ms;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }
}

/// A token the wallet owns, as listed by the balance lookup service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHolding {
    /// Display name, e.g. "SOL" or the metadata name
    pub identifier: String,
    pub mint: Pubkey,
    /// Balance in smallest units
    pub raw_balance: u64,
    pub decimals: u8,
}

impl TokenHolding {
    pub fn new(
        identifier: impl Into<String>,
        mint: Pubkey,
        raw_balance: u64,
        decimals: u8,
    ) -> Self {
        Self { identifier: identifier.into(), mint, raw_balance, decimals }
    }
}

/// Entry of the tradeable token registry
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeableToken {
    #[serde_as(as = "DisplayFromStr")]
    pub address: Pubkey,
    pub chain_id: u64,
    pub decimals: u8,
    pub name: String,
    pub symbol: String,
}

/// The user's current choice of tokens and amount.
///
/// `raw_amount` is what was typed; `amount` is the debounced value the
/// pipeline acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapSelection {
    pub from_mint: Option<Pubkey>,
    pub to_mint: Option<Pubkey>,
    pub raw_amount: String,
    pub amount: String,
}

/// Quote plus the unsigned transaction built from it.
///
/// Consumed exactly once by settlement, or discarded on any selection change.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSwap {
    pub quote: QuoteResult,
    pub transaction: VersionedTransaction,
    pub prioritization_fee_lamports: u64,
}

pub type SolanaRpcClient = solana_client::nonblocking::rpc_client::RpcClient;
pub type AnyResult<T> = anyhow::Result<T>;

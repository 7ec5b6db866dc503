use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Proxy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{DisplayFromStr, serde_as};
use solana_sdk::{pubkey::Pubkey, transaction::VersionedTransaction};
use std::time::Duration;
use tracing::{debug, warn};

use crate::common::serialization::deserialize_transaction;
use crate::common::types::{SwapConfig, TradeableToken};

/// Source of quotes and prebuilt swap transactions.
///
/// Implementations perform a single attempt per call and report every
/// failure as `None`; retry policy belongs to the caller.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn request_quote(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
    ) -> Option<QuoteResult>;

    async fn build_transaction(
        &self,
        user_public_key: &Pubkey,
        quote: &QuoteResult,
    ) -> Option<(VersionedTransaction, u64)>;
}

/// Jupiter HTTP API 客户端（仅负责 REST 查询，不参与签名和发送）
#[derive(Clone)]
pub struct JupiterApiClient {
    http: Client,
    base_url: String,
    token_list_url: String,
}

impl JupiterApiClient {
    pub fn new(config: &SwapConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(16)
            .tcp_nodelay(true)
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(5))
            .no_proxy();

        if let Some(proxy_url) = &config.proxy_url {
            builder = builder.proxy(Proxy::all(proxy_url)?);
        }

        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: config.quote_api_base.clone(),
            token_list_url: config.token_list_url.clone(),
        })
    }

    /// 使用默认配置（主网 Jupiter v6 + 10s 超时）创建客户端
    pub fn mainnet_default() -> Result<Self> {
        Self::new(&SwapConfig::default())
    }

    #[inline]
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// GET `/quote?inputMint=..&outputMint=..&amount=..`
    pub async fn fetch_quote(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
    ) -> Result<QuoteResult> {
        let url = self.endpoint("/quote");
        let query = QuoteRequest {
            input_mint: input_mint.to_string(),
            output_mint: output_mint.to_string(),
            amount: amount.to_string(),
        };
        let resp = self.http.get(url).query(&query).send().await?.error_for_status()?;
        let quote = resp.json::<QuoteResult>().await?;
        Ok(quote)
    }

    /// POST `/swap` with `{ userPublicKey, quoteResponse }`
    pub async fn fetch_swap_transaction(
        &self,
        user_public_key: &Pubkey,
        quote: &QuoteResult,
    ) -> Result<(VersionedTransaction, u64)> {
        let url = self.endpoint("/swap");
        let body = SwapRequest {
            user_public_key: user_public_key.to_string(),
            quote_response: quote,
        };
        let resp = self.http.post(url).json(&body).send().await?.error_for_status()?;
        let swap = resp.json::<SwapResponse>().await?;
        if swap.swap_transaction.is_empty() {
            return Err(anyhow!("aggregator returned an empty swapTransaction"));
        }
        let transaction = deserialize_transaction(&swap.swap_transaction)?;
        Ok((transaction, swap.prioritization_fee_lamports))
    }

    /// Tradeable token registry, `None` if it cannot be fetched.
    pub async fn get_tradeable_tokens(&self) -> Option<Vec<TradeableToken>> {
        let result: Result<Vec<TradeableToken>> = async {
            let resp = self.http.get(&self.token_list_url).send().await?.error_for_status()?;
            Ok(resp.json::<Vec<TradeableToken>>().await?)
        }
        .await;

        match result {
            Ok(tokens) => {
                debug!(count = tokens.len(), "loaded tradeable tokens");
                Some(tokens)
            }
            Err(e) => {
                warn!("Failed to fetch tradeable tokens: {e:#}");
                None
            }
        }
    }
}

#[async_trait]
impl QuoteSource for JupiterApiClient {
    async fn request_quote(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
    ) -> Option<QuoteResult> {
        debug!(%input_mint, %output_mint, amount, "requesting quote");
        match self.fetch_quote(input_mint, output_mint, amount).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!(%input_mint, %output_mint, amount, "quote unavailable: {e:#}");
                None
            }
        }
    }

    async fn build_transaction(
        &self,
        user_public_key: &Pubkey,
        quote: &QuoteResult,
    ) -> Option<(VersionedTransaction, u64)> {
        match self.fetch_swap_transaction(user_public_key, quote).await {
            Ok(built) => Some(built),
            Err(e) => {
                warn!(%user_public_key, "swap transaction build failed: {e:#}");
                None
            }
        }
    }
}

// ===================== 请求/响应类型定义 =====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRequest {
    input_mint: String,
    output_mint: String,
    amount: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequest<'a> {
    user_public_key: String,
    quote_response: &'a QuoteResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    swap_transaction: String,
    #[serde(default)]
    prioritization_fee_lamports: u64,
}

/// Aggregator quote.
///
/// Fields the pipeline does not interpret are kept in `extra` so the quote
/// is echoed back to `/swap` exactly as received.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    #[serde(default)]
    pub context_slot: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub in_amount: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub out_amount: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub input_mint: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub output_mint: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub other_amount_threshold: u64,
    pub route_plan: Vec<RoutePlanStep>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuoteResult {
    /// Whether this quote was computed for the given triple.
    pub fn matches(&self, input_mint: &Pubkey, output_mint: &Pubkey, amount: u64) -> bool {
        self.input_mint == *input_mint
            && self.output_mint == *output_mint
            && self.in_amount == amount
    }

    /// Sum of route fees, in the fee mint's smallest units.
    pub fn total_route_fees(&self) -> u64 {
        self.route_plan.iter().map(|step| step.swap_info.fee_amount).sum()
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    pub percent: u8,
    pub swap_info: SwapInfo,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde_as(as = "DisplayFromStr")]
    pub fee_amount: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

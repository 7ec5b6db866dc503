//! 测试工具函数
//!
//! 提供脚本化的报价源、签名器、交易提交器，以及基于 axum 的本地假聚合器

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use sol_swap_sdk::common::serialization::{TransactionEncoding, serialize_transaction};
use sol_swap_sdk::common::{QuoteResult, QuoteSource, SwapConfig, TokenHolding};
use sol_swap_sdk::constants::{SOL_MINT, USDC_MINT};
use sol_swap_sdk::trading::{
    BlockhashConfirmation, SettlementCallback, SettlementContext, SwapSigner, TransactionSubmitter,
    sign_versioned_transaction,
};
use solana_sdk::{
    hash::Hash,
    message::{Message, VersionedMessage},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::VersionedTransaction,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub const FAKE_PRIORITIZATION_FEE: u64 = 4_242;

/// Unsigned single-signer transaction paid by `payer`.
pub fn sample_transaction(payer: &Pubkey) -> VersionedTransaction {
    let message = Message::new_with_blockhash(&[], Some(payer), &Hash::new_unique());
    VersionedTransaction {
        signatures: vec![Signature::default()],
        message: VersionedMessage::Legacy(message),
    }
}

pub fn sample_quote(input_mint: Pubkey, output_mint: Pubkey, amount: u64) -> QuoteResult {
    QuoteResult {
        context_slot: 250_000_000,
        in_amount: amount,
        out_amount: amount.saturating_mul(2),
        input_mint,
        output_mint,
        other_amount_threshold: amount.saturating_mul(2) / 100 * 99,
        route_plan: vec![],
        extra: Map::new(),
    }
}

/// Wallet holding 1 SOL and 1 USDC.
pub fn default_holdings() -> Vec<TokenHolding> {
    vec![
        TokenHolding::new("SOL", SOL_MINT, 1_000_000_000, 9),
        TokenHolding::new("USDC", USDC_MINT, 1_000_000, 6),
    ]
}

// ============================================================================
// 脚本化报价源
// ============================================================================

/// In-memory [`QuoteSource`] whose responses can be held back per amount.
#[derive(Default)]
pub struct ScriptedQuotes {
    gates: Mutex<HashMap<u64, Arc<Notify>>>,
    quote_calls: AtomicUsize,
    build_calls: AtomicUsize,
    pub fail_quotes: AtomicBool,
    pub fail_builds: AtomicBool,
    /// Quote a different amount than requested
    pub mismatch: AtomicBool,
}

impl ScriptedQuotes {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Hold back quotes for `amount` until [`release`](Self::release).
    pub fn hold(&self, amount: u64) {
        self.gates.lock().insert(amount, Arc::new(Notify::new()));
    }

    pub fn release(&self, amount: u64) {
        if let Some(gate) = self.gates.lock().get(&amount) {
            gate.notify_one();
        }
    }

    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub fn build_calls(&self) -> usize {
        self.build_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for ScriptedQuotes {
    async fn request_quote(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
    ) -> Option<QuoteResult> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().get(&amount).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_quotes.load(Ordering::SeqCst) {
            return None;
        }
        let quoted = if self.mismatch.load(Ordering::SeqCst) { amount + 1 } else { amount };
        Some(sample_quote(*input_mint, *output_mint, quoted))
    }

    async fn build_transaction(
        &self,
        user_public_key: &Pubkey,
        _quote: &QuoteResult,
    ) -> Option<(VersionedTransaction, u64)> {
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_builds.load(Ordering::SeqCst) {
            return None;
        }
        Some((sample_transaction(user_public_key), 5_000))
    }
}

// ============================================================================
// 签名器
// ============================================================================

pub struct TestSigner {
    keypair: Arc<Keypair>,
    reject: bool,
    calls: AtomicUsize,
}

impl TestSigner {
    pub fn approving() -> Arc<Self> {
        Self::with_reject(false)
    }

    /// Signer whose user declines every request.
    pub fn rejecting() -> Arc<Self> {
        Self::with_reject(true)
    }

    fn with_reject(reject: bool) -> Arc<Self> {
        Arc::new(Self { keypair: Arc::new(Keypair::new()), reject, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SwapSigner for TestSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(anyhow!("User rejected the request"));
        }
        sign_versioned_transaction(self.keypair.as_ref(), transaction)
    }
}

// ============================================================================
// 交易提交器
// ============================================================================

#[derive(Clone)]
pub enum ConfirmBehavior {
    Confirmed,
    /// Blockhash expires before the transaction lands
    Expired,
    /// Never resolves
    Hang,
    /// Resolves as confirmed once the gate is notified
    Gated(Arc<Notify>),
    Fail,
}

pub struct MockSubmitter {
    behavior: Mutex<ConfirmBehavior>,
    pub fail_send: AtomicBool,
    send_calls: AtomicUsize,
    sent: Mutex<Vec<Signature>>,
}

impl MockSubmitter {
    pub fn new(behavior: ConfirmBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            fail_send: AtomicBool::new(false),
            send_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Signature> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl TransactionSubmitter for MockSubmitter {
    async fn send_transaction(&self, transaction: &VersionedTransaction) -> Result<Signature> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(anyhow!("node is behind"));
        }
        let signature = transaction.signatures.first().copied().unwrap_or_default();
        self.sent.lock().push(signature);
        Ok(signature)
    }

    async fn latest_blockhash(&self) -> Result<BlockhashConfirmation> {
        Ok(BlockhashConfirmation { blockhash: Hash::new_unique(), last_valid_block_height: 1_000 })
    }

    async fn confirm_transaction(
        &self,
        _signature: &Signature,
        _strategy: &BlockhashConfirmation,
    ) -> Result<bool> {
        let behavior = self.behavior.lock().clone();
        match behavior {
            ConfirmBehavior::Confirmed => Ok(true),
            ConfirmBehavior::Expired => Ok(false),
            ConfirmBehavior::Hang => std::future::pending().await,
            ConfirmBehavior::Gated(gate) => {
                gate.notified().await;
                Ok(true)
            }
            ConfirmBehavior::Fail => Err(anyhow!("InstructionError(2, Custom(6001))")),
        }
    }
}

/// Records the signature of every signed transaction it is shown.
#[derive(Default)]
pub struct RecordingCallback {
    pub seen: Arc<Mutex<Vec<String>>>,
    pub fail: bool,
}

impl SettlementCallback for RecordingCallback {
    fn on_transaction_signed(
        &self,
        context: SettlementContext,
    ) -> futures::future::BoxFuture<'static, Result<()>> {
        let seen = self.seen.clone();
        let fail = self.fail;
        Box::pin(async move {
            seen.lock().push(context.signature.to_string());
            if fail { Err(anyhow!("audit sink unavailable")) } else { Ok(()) }
        })
    }
}

// ============================================================================
// 本地假聚合器 (axum)
// ============================================================================

#[derive(Default)]
pub struct AggregatorState {
    /// Answer every route with HTTP 500
    pub fail: AtomicBool,
    pub quote_requests: AtomicUsize,
    pub swap_requests: AtomicUsize,
    pub last_quote: Mutex<Option<Value>>,
    pub last_swap_body: Mutex<Option<Value>>,
}

pub struct FakeAggregator {
    /// e.g. `http://127.0.0.1:PORT/v6`
    pub base_url: String,
    pub token_list_url: String,
    pub state: Arc<AggregatorState>,
    server: JoinHandle<()>,
}

impl FakeAggregator {
    pub async fn start() -> Self {
        let state = Arc::new(AggregatorState::default());
        let app = Router::new()
            .route("/v6/quote", get(quote_handler))
            .route("/v6/swap", post(swap_handler))
            .route("/strict", get(token_list_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/v6"),
            token_list_url: format!("http://{addr}/strict"),
            state,
            server,
        }
    }

    pub fn config(&self) -> SwapConfig {
        SwapConfig::default()
            .with_quote_api_base(self.base_url.clone())
            .with_token_list_url(self.token_list_url.clone())
            .with_proxy(None)
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::SeqCst);
    }

    pub fn quote_requests(&self) -> usize {
        self.state.quote_requests.load(Ordering::SeqCst)
    }

    pub fn swap_requests(&self) -> usize {
        self.state.swap_requests.load(Ordering::SeqCst)
    }
}

impl Drop for FakeAggregator {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream unavailable").into_response()
}

async fn quote_handler(
    State(state): State<Arc<AggregatorState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.quote_requests.fetch_add(1, Ordering::SeqCst);
    if state.fail.load(Ordering::SeqCst) {
        return internal_error();
    }
    let (Some(input), Some(output), Some(amount)) =
        (params.get("inputMint"), params.get("outputMint"), params.get("amount"))
    else {
        return (StatusCode::BAD_REQUEST, "missing query parameter").into_response();
    };
    let Ok(amount) = amount.parse::<u64>() else {
        return (StatusCode::BAD_REQUEST, "invalid amount").into_response();
    };

    let quote = json!({
        "inputMint": input,
        "inAmount": amount.to_string(),
        "outputMint": output,
        "outAmount": (amount * 2).to_string(),
        "otherAmountThreshold": (amount * 2 / 100 * 99).to_string(),
        "swapMode": "ExactIn",
        "slippageBps": 50,
        "platformFee": null,
        "priceImpactPct": "0.0012",
        "routePlan": [
            {
                "swapInfo": {
                    "ammKey": "HcoJqG325TTifs6jyWvRJ9ET4pDu12Xrt2EQKZGFmuKX",
                    "label": "Whirlpool",
                    "inputMint": input,
                    "outputMint": output,
                    "inAmount": amount.to_string(),
                    "outAmount": (amount * 2).to_string(),
                    "feeAmount": "25",
                    "feeMint": input
                },
                "percent": 100
            }
        ],
        "contextSlot": 250348213,
        "timeTaken": 0.004
    });
    *state.last_quote.lock() = Some(quote.clone());
    Json(quote).into_response()
}

async fn swap_handler(
    State(state): State<Arc<AggregatorState>>,
    Json(body): Json<Value>,
) -> Response {
    state.swap_requests.fetch_add(1, Ordering::SeqCst);
    if state.fail.load(Ordering::SeqCst) {
        return internal_error();
    }
    let Some(payer) = body["userPublicKey"].as_str().and_then(|s| s.parse::<Pubkey>().ok()) else {
        return (StatusCode::BAD_REQUEST, "invalid userPublicKey").into_response();
    };
    *state.last_swap_body.lock() = Some(body);

    let encoded =
        serialize_transaction(&sample_transaction(&payer), TransactionEncoding::Base64).unwrap();
    Json(json!({
        "swapTransaction": encoded,
        "lastValidBlockHeight": 279632475,
        "prioritizationFeeLamports": FAKE_PRIORITIZATION_FEE
    }))
    .into_response()
}

async fn token_list_handler(State(state): State<Arc<AggregatorState>>) -> Response {
    if state.fail.load(Ordering::SeqCst) {
        return internal_error();
    }
    Json(json!([
        {
            "address": SOL_MINT.to_string(),
            "chainId": 101,
            "decimals": 9,
            "name": "Wrapped SOL",
            "symbol": "SOL",
            "logoURI": "https://example.invalid/sol.png",
            "tags": ["old-registry"]
        },
        {
            "address": USDC_MINT.to_string(),
            "chainId": 101,
            "decimals": 6,
            "name": "USD Coin",
            "symbol": "USDC",
            "logoURI": "https://example.invalid/usdc.png",
            "tags": ["old-registry", "solana-fm"]
        }
    ]))
    .into_response()
}

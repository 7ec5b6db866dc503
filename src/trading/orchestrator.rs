//! Swap orchestrator
//!
//! Owns the current selection and the single "current" prepared swap.
//! Every selection change bumps a monotonically increasing version; a quote
//! pipeline only commits its result if the version it was started under is
//! still current, so a slow response can never overwrite newer state.

use parking_lot::Mutex;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::common::{
    InvalidReason, PreparedSwap, QuoteSource, SwapError, SwapSelection, TokenHolding,
};
use crate::trading::debounce::Debouncer;
use crate::trading::settlement::SettlementExecutor;
use crate::trading::signer::SwapSigner;
use crate::utils::validate_swap;

#[derive(Debug, Clone, PartialEq)]
pub enum SwapState {
    Idle,
    Validating,
    AwaitingQuote,
    Ready(PreparedSwap),
    Invalid(InvalidReason),
    /// A prepared swap has been handed to settlement
    Settling,
}

impl SwapState {
    pub fn prepared(&self) -> Option<&PreparedSwap> {
        match self {
            SwapState::Ready(prepared) => Some(prepared),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, SwapState::Ready(_))
    }

    pub fn invalid_reason(&self) -> Option<&InvalidReason> {
        match self {
            SwapState::Invalid(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Snapshot published to observers on every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapStatus {
    pub state: SwapState,
    /// User-visible message, if any
    pub message: Option<String>,
    /// Selection version the state belongs to
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettlementOutcome {
    /// Base58 signature of the confirmed transaction
    Confirmed(String),
    Failed(SwapError),
    /// No prepared swap for the current selection
    NotReady,
    /// Another settlement is still in flight
    Busy,
}

struct Inner {
    selection: SwapSelection,
    holdings: Vec<TokenHolding>,
    wallet: Option<Pubkey>,
    state: SwapState,
    message: Option<String>,
    version: u64,
    settling: bool,
    /// Selection changed while settling; re-run once settlement ends
    deferred: bool,
}

/// Work order for one quote pipeline run.
struct QuoteTicket {
    version: u64,
    wallet: Pubkey,
    input_mint: Pubkey,
    output_mint: Pubkey,
    amount: u64,
}

pub struct SwapOrchestrator {
    quotes: Arc<dyn QuoteSource>,
    inner: Mutex<Inner>,
    status_tx: watch::Sender<SwapStatus>,
}

impl SwapOrchestrator {
    pub fn new(quotes: Arc<dyn QuoteSource>) -> Self {
        let (status_tx, _) =
            watch::channel(SwapStatus { state: SwapState::Idle, message: None, version: 0 });
        Self {
            quotes,
            inner: Mutex::new(Inner {
                selection: SwapSelection::default(),
                holdings: Vec::new(),
                wallet: None,
                state: SwapState::Idle,
                message: None,
                version: 0,
                settling: false,
                deferred: false,
            }),
            status_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SwapStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> SwapStatus {
        let inner = self.inner.lock();
        SwapStatus {
            state: inner.state.clone(),
            message: inner.message.clone(),
            version: inner.version,
        }
    }

    pub fn state(&self) -> SwapState {
        self.inner.lock().state.clone()
    }

    pub fn selection(&self) -> SwapSelection {
        self.inner.lock().selection.clone()
    }

    pub fn is_settling(&self) -> bool {
        self.inner.lock().settling
    }

    // ===================== selection events =====================

    /// Connect or disconnect the wallet identity quotes are built for.
    pub async fn set_wallet(&self, wallet: Option<Pubkey>) -> SwapState {
        self.update(|inner| replace_if_changed(&mut inner.wallet, wallet)).await
    }

    /// Replace the wallet's holdings (balances feed validation).
    pub async fn set_holdings(&self, holdings: Vec<TokenHolding>) -> SwapState {
        self.update(|inner| replace_if_changed(&mut inner.holdings, holdings)).await
    }

    pub async fn select_from(&self, mint: Option<Pubkey>) -> SwapState {
        self.update(|inner| replace_if_changed(&mut inner.selection.from_mint, mint)).await
    }

    pub async fn select_to(&self, mint: Option<Pubkey>) -> SwapState {
        self.update(|inner| replace_if_changed(&mut inner.selection.to_mint, mint)).await
    }

    /// Record the amount as typed. Does not trigger a quote.
    pub fn set_raw_amount(&self, raw: impl Into<String>) {
        self.inner.lock().selection.raw_amount = raw.into();
    }

    /// Debounced amount channel; triggers the pipeline.
    pub async fn apply_debounced_amount(&self, amount: impl Into<String>) -> SwapState {
        let amount = amount.into();
        self.update(|inner| replace_if_changed(&mut inner.selection.amount, amount)).await
    }

    /// Re-run the pipeline for the unchanged selection.
    pub async fn refresh(&self) -> SwapState {
        self.update(|_| true).await
    }

    /// Wire a [`Debouncer`] between raw and debounced amount input.
    pub fn amount_input(self: &Arc<Self>, quiet: Duration) -> AmountInput {
        let (debouncer, mut settled) = Debouncer::new(quiet);
        let orchestrator = Arc::clone(self);
        let forwarder = tokio::spawn(async move {
            while let Some(amount) = settled.recv().await {
                // apply the change in arrival order, run the network part detached
                let ticket = orchestrator
                    .begin_update(|inner| replace_if_changed(&mut inner.selection.amount, amount));
                if let Some(ticket) = ticket {
                    let orchestrator = Arc::clone(&orchestrator);
                    tokio::spawn(async move {
                        orchestrator.run_pipeline(ticket).await;
                    });
                }
            }
        });
        AmountInput { orchestrator: Arc::clone(self), debouncer, forwarder }
    }

    // ===================== settlement =====================

    /// Hand the current prepared swap to `executor`.
    ///
    /// The prepared swap is consumed whatever the outcome; afterwards the
    /// orchestrator is `Idle` with the settlement message, or re-runs the
    /// pipeline if the selection changed meanwhile.
    pub async fn settle(
        &self,
        executor: &SettlementExecutor,
        signer: &dyn SwapSigner,
    ) -> SettlementOutcome {
        let prepared = {
            let mut inner = self.inner.lock();
            if inner.settling {
                return SettlementOutcome::Busy;
            }
            match std::mem::replace(&mut inner.state, SwapState::Settling) {
                SwapState::Ready(prepared) => {
                    inner.settling = true;
                    inner.message = None;
                    self.publish(&inner);
                    prepared
                }
                other => {
                    inner.state = other;
                    return SettlementOutcome::NotReady;
                }
            }
        };

        info!(
            input_mint = %prepared.quote.input_mint,
            output_mint = %prepared.quote.output_mint,
            in_amount = prepared.quote.in_amount,
            "settling swap"
        );
        let result = executor.try_execute(&prepared, signer).await;

        let rerun = {
            let mut inner = self.inner.lock();
            inner.settling = false;
            let message = match &result {
                Ok(signature) => format!("Transaction succeeded with signature: {signature}"),
                Err(_) => "Transaction failed".to_string(),
            };
            self.transition(&mut inner, SwapState::Idle, Some(message));
            std::mem::take(&mut inner.deferred)
        };
        if rerun {
            debug!("selection changed during settlement, re-running pipeline");
            self.refresh().await;
        }

        match result {
            Ok(signature) => SettlementOutcome::Confirmed(signature),
            Err(e) => SettlementOutcome::Failed(e),
        }
    }

    // ===================== pipeline =====================

    async fn update<F>(&self, mutate: F) -> SwapState
    where
        F: FnOnce(&mut Inner) -> bool,
    {
        match self.begin_update(mutate) {
            Some(ticket) => self.run_pipeline(ticket).await,
            None => self.state(),
        }
    }

    /// Apply a selection change and validate it synchronously.
    ///
    /// Returns a ticket when a quote must be fetched.
    fn begin_update<F>(&self, mutate: F) -> Option<QuoteTicket>
    where
        F: FnOnce(&mut Inner) -> bool,
    {
        let mut inner = self.inner.lock();
        if !mutate(&mut inner) {
            return None;
        }
        inner.version += 1;
        if inner.settling {
            debug!(version = inner.version, "selection changed during settlement, quote deferred");
            inner.deferred = true;
            return None;
        }
        self.transition(&mut inner, SwapState::Validating, None);

        let validation = {
            let selection = &inner.selection;
            let holding = selection
                .from_mint
                .and_then(|mint| inner.holdings.iter().find(|h| h.mint == mint));
            validate_swap(
                selection.from_mint.as_ref(),
                selection.to_mint.as_ref(),
                holding,
                &selection.amount,
            )
        };
        let amount = match validation {
            Ok(amount) => amount,
            Err(reason) => {
                debug!(version = inner.version, %reason, "selection rejected");
                self.transition(&mut inner, SwapState::Invalid(reason.into()), None);
                return None;
            }
        };
        let Some(wallet) = inner.wallet else {
            let state = SwapState::Invalid(InvalidReason::WalletNotConnected);
            self.transition(&mut inner, state, None);
            return None;
        };
        let (Some(input_mint), Some(output_mint)) =
            (inner.selection.from_mint, inner.selection.to_mint)
        else {
            return None;
        };

        self.transition(&mut inner, SwapState::AwaitingQuote, None);
        Some(QuoteTicket {
            version: inner.version,
            wallet,
            input_mint,
            output_mint,
            amount: amount.units(),
        })
    }

    async fn run_pipeline(&self, ticket: QuoteTicket) -> SwapState {
        let prepared = self.fetch_prepared(&ticket).await;

        let mut inner = self.inner.lock();
        if inner.version != ticket.version || inner.settling {
            debug!(
                ticket_version = ticket.version,
                current_version = inner.version,
                "discarding stale quote response"
            );
            return inner.state.clone();
        }
        match prepared {
            Ok(prepared) => {
                debug!(
                    version = ticket.version,
                    out_amount = prepared.quote.out_amount,
                    fee = prepared.prioritization_fee_lamports,
                    "swap ready"
                );
                self.transition(&mut inner, SwapState::Ready(prepared), None);
            }
            Err(e) => {
                debug!(version = ticket.version, "{e}");
                let state = SwapState::Invalid(InvalidReason::QuoteUnavailable);
                self.transition(&mut inner, state, None);
            }
        }
        inner.state.clone()
    }

    async fn fetch_prepared(&self, ticket: &QuoteTicket) -> Result<PreparedSwap, SwapError> {
        let quote = self
            .quotes
            .request_quote(&ticket.input_mint, &ticket.output_mint, ticket.amount)
            .await
            .ok_or(SwapError::QuoteUnavailable)?;
        if !quote.matches(&ticket.input_mint, &ticket.output_mint, ticket.amount) {
            debug!(
                in_amount = quote.in_amount,
                requested = ticket.amount,
                "quote does not match the requested swap"
            );
            return Err(SwapError::QuoteUnavailable);
        }
        // no point building a transaction nobody will use
        if self.inner.lock().version != ticket.version {
            return Err(SwapError::QuoteUnavailable);
        }
        let (transaction, prioritization_fee_lamports) = self
            .quotes
            .build_transaction(&ticket.wallet, &quote)
            .await
            .ok_or(SwapError::QuoteUnavailable)?;
        Ok(PreparedSwap { quote, transaction, prioritization_fee_lamports })
    }

    fn transition(&self, inner: &mut Inner, state: SwapState, message: Option<String>) {
        inner.message = match &state {
            SwapState::Invalid(reason) => Some(reason.to_string()),
            _ => message,
        };
        inner.state = state;
        self.publish(inner);
    }

    fn publish(&self, inner: &Inner) {
        self.status_tx.send_replace(SwapStatus {
            state: inner.state.clone(),
            message: inner.message.clone(),
            version: inner.version,
        });
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Amount input with debouncing in front of the orchestrator.
///
/// Dropping it cancels any pending (not yet debounced) value.
pub struct AmountInput {
    orchestrator: Arc<SwapOrchestrator>,
    debouncer: Debouncer<String>,
    forwarder: JoinHandle<()>,
}

impl AmountInput {
    pub fn push(&self, raw: impl Into<String>) {
        let raw = raw.into();
        self.orchestrator.set_raw_amount(raw.clone());
        self.debouncer.push(raw);
    }
}

impl Drop for AmountInput {
    fn drop(&mut self) {
        self.debouncer.cancel();
        self.forwarder.abort();
    }
}

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::common::{PreparedSwap, SwapError};
use crate::trading::lifecycle::{CallbackRef, SettlementContext};
use crate::trading::signer::SwapSigner;
use crate::trading::submitter::TransactionSubmitter;

/// Signs, submits and confirms a prepared swap.
///
/// Each call submits the transaction at most once. Callers must not run
/// two executions for the same swap concurrently.
pub struct SettlementExecutor {
    submitter: Arc<dyn TransactionSubmitter>,
    confirm_timeout: Duration,
    on_transaction_signed: Option<CallbackRef>,
}

impl SettlementExecutor {
    pub fn new(submitter: Arc<dyn TransactionSubmitter>, confirm_timeout: Duration) -> Self {
        Self { submitter, confirm_timeout, on_transaction_signed: None }
    }

    pub fn with_callback(mut self, callback: CallbackRef) -> Self {
        self.on_transaction_signed = Some(callback);
        self
    }

    /// Base58 signature of the confirmed transaction, `None` on any failure.
    pub async fn execute(
        &self,
        prepared: &PreparedSwap,
        signer: &dyn SwapSigner,
    ) -> Option<String> {
        self.try_execute(prepared, signer).await.ok()
    }

    /// Like [`execute`](Self::execute) but keeps the failure kind.
    pub async fn try_execute(
        &self,
        prepared: &PreparedSwap,
        signer: &dyn SwapSigner,
    ) -> Result<String, SwapError> {
        let signed = signer.sign_transaction(prepared.transaction.clone()).await.map_err(|e| {
            warn!(signer = %signer.pubkey(), "signing failed, nothing submitted: {e:#}");
            SwapError::SigningFailed(e.to_string())
        })?;

        if let Some(callback) = &self.on_transaction_signed {
            let context = SettlementContext::new(prepared, signed.clone());
            if let Err(e) = callback.on_transaction_signed(context).await {
                warn!("settlement callback failed, continuing: {e:#}");
            }
        }

        let signature = self.submitter.send_transaction(&signed).await.map_err(|e| {
            warn!("swap submission failed: {e:#}");
            SwapError::SubmissionFailed(e.to_string())
        })?;
        info!(%signature, "swap transaction submitted");

        let strategy = self.submitter.latest_blockhash().await.map_err(|e| {
            warn!(%signature, "failed to fetch blockhash for confirmation: {e:#}");
            SwapError::SubmissionFailed(e.to_string())
        })?;
        debug!(
            %signature,
            last_valid_block_height = strategy.last_valid_block_height,
            "awaiting confirmation"
        );

        let confirmation = tokio::time::timeout(
            self.confirm_timeout,
            self.submitter.confirm_transaction(&signature, &strategy),
        )
        .await;

        match confirmation {
            Ok(Ok(true)) => {
                info!(%signature, "swap confirmed");
                Ok(signature.to_string())
            }
            Ok(Ok(false)) | Err(_) => {
                warn!(%signature, "swap not confirmed in time");
                Err(SwapError::ConfirmationTimeout)
            }
            Ok(Err(e)) => {
                warn!(%signature, "swap confirmation failed: {e:#}");
                Err(SwapError::SubmissionFailed(e.to_string()))
            }
        }
    }
}

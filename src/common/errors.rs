//! Error taxonomy of the swap pipeline.
//!
//! `Display` of every variant is the message shown to the user, so these
//! can be surfaced inline without further mapping.

use thiserror::Error;

/// Local rejection of a selection; never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a from and to token")]
    MissingSelection,
    #[error("Please select differing tokens and a valid amount")]
    SameToken,
    #[error("Please select differing tokens and a valid amount")]
    NonPositiveAmount,
    #[error("Insufficient {identifier}")]
    InsufficientBalance { identifier: String },
}

/// Why the orchestrator settled on `Invalid`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidReason {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Please connect a wallet to continue")]
    WalletNotConnected,
    #[error("No route available for this swap")]
    QuoteUnavailable,
}

/// Failures of the quote/settlement steps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    #[error("No route available for this swap")]
    QuoteUnavailable,
    #[error("Transaction failed: signing rejected ({0})")]
    SigningFailed(String),
    #[error("Transaction failed: submission error ({0})")]
    SubmissionFailed(String),
    #[error("Transaction failed: confirmation timed out")]
    ConfirmationTimeout,
}

impl SwapError {
    /// Signing failures mean nothing was broadcast.
    pub fn is_signing_failure(&self) -> bool {
        matches!(self, SwapError::SigningFailed(_))
    }
}

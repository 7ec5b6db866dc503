//! Aggregator endpoints and pipeline timing defaults.

/// Jupiter v6 quote/swap API
pub const DEFAULT_QUOTE_API_BASE: &str = "https://quote-api.jup.ag/v6";

/// Strict token list (tradeable tokens registry)
pub const DEFAULT_TOKEN_LIST_URL: &str = "https://token.jup.ag/strict";

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Quiet window for amount input before a quote is requested
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

pub const DEFAULT_CONFIRM_TIMEOUT_MS: u64 = 60_000;

pub const DEFAULT_CONFIRM_POLL_INTERVAL_MS: u64 = 500;

pub mod balances;
pub mod errors;
pub mod jupiter_api;
pub mod serialization;
pub mod types;

pub use errors::{InvalidReason, SwapError, ValidationError};
pub use jupiter_api::{JupiterApiClient, QuoteResult, QuoteSource, RoutePlanStep, SwapInfo};
pub use types::*;

pub mod debounce;
pub mod lifecycle;
pub mod orchestrator;
pub mod settlement;
pub mod signer;
pub mod submitter;

pub use debounce::Debouncer;
pub use lifecycle::{CallbackRef, NoopCallback, SettlementCallback, SettlementContext};
pub use orchestrator::{AmountInput, SettlementOutcome, SwapOrchestrator, SwapState, SwapStatus};
pub use settlement::SettlementExecutor;
pub use signer::{KeypairSigner, SwapSigner, sign_versioned_transaction};
pub use submitter::{BlockhashConfirmation, RpcSubmitter, TransactionSubmitter};

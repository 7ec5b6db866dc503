pub mod amount;

pub use amount::{AmountError, SwapAmount, validate_swap};

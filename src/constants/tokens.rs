//! 常用代币常量定义
//!
//! Well-known mints used when listing holdings and building default selections.

use solana_sdk::pubkey;

pub use solana_sdk::pubkey::Pubkey;

/// SOL Mint (Wrapped SOL)
///
/// Native SOL is quoted by the aggregator under this mint.
pub const SOL_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");

/// Identifier shown for the native SOL holding
pub const SOL_IDENTIFIER: &str = "SOL";

/// Native SOL decimals (lamports)
pub const SOL_DECIMALS: u8 = 9;

/// USDC Mint (mainnet)
pub const USDC_MINT: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");

/// USDT Mint (mainnet)
pub const USDT_MINT: Pubkey = pubkey!("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB");

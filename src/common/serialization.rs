//! 交易序列化模块
//!
//! Wire codec between aggregator blobs and `VersionedTransaction`.

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use solana_sdk::transaction::VersionedTransaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionEncoding {
    Base58,
    Base64,
}

/// Decode a base64 serialized transaction, as returned by the swap endpoint.
pub fn deserialize_transaction(encoded: &str) -> Result<VersionedTransaction> {
    let bytes = STANDARD.decode(encoded.trim()).context("invalid base64 transaction")?;
    if bytes.is_empty() {
        return Err(anyhow!("empty transaction payload"));
    }
    let transaction: VersionedTransaction =
        bincode::deserialize(&bytes).context("malformed transaction bytes")?;
    Ok(transaction)
}

/// 交易序列化
pub fn serialize_transaction(
    transaction: &VersionedTransaction,
    encoding: TransactionEncoding,
) -> Result<String> {
    let bytes = bincode::serialize(transaction)?;
    let encoded = match encoding {
        TransactionEncoding::Base58 => bs58::encode(&bytes).into_string(),
        TransactionEncoding::Base64 => STANDARD.encode(&bytes),
    };
    Ok(encoded)
}

//! 结算生命周期回调模块
//!
//! Hook invoked after the swap transaction is signed and before it is
//! broadcast, e.g. for auditing or persisting the signed payload upstream.

use anyhow::Result;
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::VersionedTransaction};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::common::PreparedSwap;
use crate::common::serialization::{TransactionEncoding, serialize_transaction};

pub trait SettlementCallback: Send + Sync {
    /// 交易签名后、发送前的回调
    ///
    /// An `Err` is logged and does **not** stop the submission.
    fn on_transaction_signed(
        &self,
        context: SettlementContext,
    ) -> futures::future::BoxFuture<'static, Result<()>>;
}

/// 回调上下文
#[derive(Clone)]
pub struct SettlementContext {
    /// 签名后的交易
    pub transaction: VersionedTransaction,
    /// Fee payer signature, the id the transaction will land under
    pub signature: Signature,
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub in_amount: u64,
    pub prioritization_fee_lamports: u64,
    /// 签名完成时间（纳秒）
    pub timestamp_ns: u64,
}

impl SettlementContext {
    pub fn new(prepared: &PreparedSwap, signed: VersionedTransaction) -> Self {
        let signature = signed.signatures.first().copied().unwrap_or_default();
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();
        Self {
            transaction: signed,
            signature,
            input_mint: prepared.quote.input_mint,
            output_mint: prepared.quote.output_mint,
            in_amount: prepared.quote.in_amount,
            prioritization_fee_lamports: prepared.prioritization_fee_lamports,
            timestamp_ns,
        }
    }

    /// Signed transaction as submitted, base64 encoded
    pub fn to_base64(&self) -> Option<String> {
        match serialize_transaction(&self.transaction, TransactionEncoding::Base64) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                warn!(signature = %self.signature, "cannot encode signed transaction: {e}");
                None
            }
        }
    }

    /// 用于日志/审计的 JSON 摘要
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "signature": self.signature.to_string(),
            "input_mint": self.input_mint.to_string(),
            "output_mint": self.output_mint.to_string(),
            "in_amount": self.in_amount,
            "prioritization_fee_lamports": self.prioritization_fee_lamports,
            "timestamp_ns": self.timestamp_ns,
            "transaction_base64": self.to_base64(),
        })
    }
}

#[derive(Clone)]
pub struct NoopCallback;

impl SettlementCallback for NoopCallback {
    fn on_transaction_signed(
        &self,
        _context: SettlementContext,
    ) -> futures::future::BoxFuture<'static, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

pub type CallbackRef = Arc<dyn SettlementCallback>;

//! Broadcast and confirmation capability.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use solana_sdk::{hash::Hash, signature::Signature, transaction::VersionedTransaction};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::common::SolanaRpcClient;

/// Blockhash-based confirmation: the transaction can no longer land once
/// the chain passes `last_valid_block_height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockhashConfirmation {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn send_transaction(&self, transaction: &VersionedTransaction) -> Result<Signature>;

    async fn latest_blockhash(&self) -> Result<BlockhashConfirmation>;

    /// `Ok(true)` once confirmed, `Ok(false)` if the blockhash expired first,
    /// `Err` if the transaction failed on-chain or the node could not be reached.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        strategy: &BlockhashConfirmation,
    ) -> Result<bool>;
}

/// Submitter backed by a Solana JSON-RPC node
pub struct RpcSubmitter {
    rpc: Arc<SolanaRpcClient>,
    poll_interval: Duration,
}

impl RpcSubmitter {
    pub fn new(rpc: Arc<SolanaRpcClient>, poll_interval: Duration) -> Self {
        Self { rpc, poll_interval }
    }
}

#[async_trait]
impl TransactionSubmitter for RpcSubmitter {
    async fn send_transaction(&self, transaction: &VersionedTransaction) -> Result<Signature> {
        let signature = self.rpc.send_transaction(transaction).await?;
        Ok(signature)
    }

    async fn latest_blockhash(&self) -> Result<BlockhashConfirmation> {
        let (blockhash, last_valid_block_height) =
            self.rpc.get_latest_blockhash_with_commitment(self.rpc.commitment()).await?;
        Ok(BlockhashConfirmation { blockhash, last_valid_block_height })
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        strategy: &BlockhashConfirmation,
    ) -> Result<bool> {
        let commitment = self.rpc.commitment();
        loop {
            // 单次查询失败不终止确认，交易可能已经上链
            match self.rpc.get_signature_statuses(&[*signature]).await {
                Ok(response) => {
                    if let Some(Some(status)) = response.value.into_iter().next() {
                        if let Some(err) = status.err {
                            return Err(anyhow!(
                                "transaction {} failed on-chain: {:?}",
                                signature,
                                err
                            ));
                        }
                        if status.satisfies_commitment(commitment) {
                            return Ok(true);
                        }
                    }
                }
                Err(e) => warn!(%signature, "signature status poll failed, retrying: {e}"),
            }

            match self.rpc.get_block_height().await {
                Ok(block_height) if block_height > strategy.last_valid_block_height => {
                    debug!(%signature, block_height, "blockhash expired before confirmation");
                    return Ok(false);
                }
                Ok(_) => {}
                Err(e) => warn!(%signature, "block height poll failed, retrying: {e}"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

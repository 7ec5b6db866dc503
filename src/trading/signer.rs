//! Signing capability supplied by the connected wallet.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::VersionedTransaction,
};
use std::sync::Arc;

#[async_trait]
pub trait SwapSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Sign `transaction` as this identity. Errors mean the user declined or
    /// the signer failed; nothing has been broadcast.
    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction>;
}

/// Local keypair signer
#[derive(Clone)]
pub struct KeypairSigner {
    keypair: Arc<Keypair>,
}

impl KeypairSigner {
    pub fn new(keypair: Arc<Keypair>) -> Self {
        Self { keypair }
    }
}

#[async_trait]
impl SwapSigner for KeypairSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction> {
        sign_versioned_transaction(self.keypair.as_ref(), transaction)
    }
}

/// Fill in `signer`'s slot of an aggregator-built transaction.
///
/// The other signature slots are left untouched.
pub fn sign_versioned_transaction(
    signer: &dyn Signer,
    mut transaction: VersionedTransaction,
) -> Result<VersionedTransaction> {
    let pubkey = signer.try_pubkey()?;
    let required = transaction.message.header().num_required_signatures as usize;
    let index = transaction
        .message
        .static_account_keys()
        .iter()
        .take(required)
        .position(|key| *key == pubkey)
        .ok_or_else(|| anyhow!("{} is not a required signer of this transaction", pubkey))?;

    let msg_bytes = transaction.message.serialize();
    let signature = signer.try_sign_message(&msg_bytes)?;
    if transaction.signatures.len() < required {
        transaction.signatures.resize(required, Signature::default());
    }
    transaction.signatures[index] = signature;
    Ok(transaction)
}

use anyhow::anyhow;
use solana_sdk::pubkey::Pubkey;

use crate::common::{SolanaRpcClient, TokenHolding};
use crate::constants::{SOL_DECIMALS, SOL_IDENTIFIER, SOL_MINT};

#[inline]
pub async fn get_sol_balance(
    rpc: &SolanaRpcClient,
    account: &Pubkey,
) -> Result<u64, anyhow::Error> {
    let balance = rpc
        .get_balance(account)
        .await
        .map_err(|e| anyhow!("Failed to get SOL balance for {}: {}", account, e))?;
    Ok(balance)
}

/// Native SOL as a holding, quoted under the wrapped SOL mint.
pub fn sol_holding(lamports: u64) -> TokenHolding {
    TokenHolding::new(SOL_IDENTIFIER, SOL_MINT, lamports, SOL_DECIMALS)
}

/// Load the wallet's native SOL holding.
pub async fn load_sol_holding(
    rpc: &SolanaRpcClient,
    owner: &Pubkey,
) -> Result<TokenHolding, anyhow::Error> {
    let lamports = get_sol_balance(rpc, owner).await?;
    Ok(sol_holding(lamports))
}

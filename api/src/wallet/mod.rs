/// Wallet access
///
/// The purchase flow only sees the `Wallet` trait; `JsonRpcWallet` backs it
/// with an Ethereum JSON-RPC node that holds the signing account.
pub mod jsonrpc;

pub use jsonrpc::JsonRpcWallet;

use async_trait::async_trait;
use iotmarket_eth::{parse_ether, UnitError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Success,
    Failed,
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("No Ethereum wallet found. Please install MetaMask.")]
    NotInstalled,
    #[error("Wallet access was not granted")]
    AccessDenied,
    #[error("{message}")]
    Rpc { code: i64, message: String },
    #[error("Transaction failed")]
    Reverted { tx_hash: String },
    #[error("Wallet unreachable: {0}")]
    Transport(String),
    #[error("Unexpected wallet response: {0}")]
    Decode(String),
    #[error(transparent)]
    Units(#[from] UnitError),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Ask for account access; an empty list means access was refused
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError>;

    async fn signer_address(&self) -> Result<String, WalletError>;

    /// Returns the transaction hash once the node accepted it
    async fn send_transaction(&self, to: &str, value_wei: u128) -> Result<String, WalletError>;

    /// Blocks until the transaction is mined
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<ReceiptStatus, WalletError>;
}

/// Request account access and return the signer's address
pub async fn connect(wallet: &dyn Wallet) -> Result<String, WalletError> {
    let accounts = wallet.request_accounts().await?;
    if accounts.is_empty() {
        return Err(WalletError::AccessDenied);
    }
    wallet.signer_address().await
}

/// Send `eth_amount` (decimal ether) to `to` and wait for a successful receipt
pub async fn pay(wallet: &dyn Wallet, to: &str, eth_amount: &str) -> Result<String, WalletError> {
    let value_wei = parse_ether(eth_amount)?;
    let tx_hash = wallet.send_transaction(to, value_wei).await?;
    tracing::info!(tx_hash = %tx_hash, value_wei = %value_wei, "Payment submitted");

    match wallet.wait_for_receipt(&tx_hash).await? {
        ReceiptStatus::Success => Ok(tx_hash),
        ReceiptStatus::Failed => Err(WalletError::Reverted { tx_hash }),
    }
}

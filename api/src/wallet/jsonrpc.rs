// Ethereum JSON-RPC wallet
// The node (or signer proxy) in front of `rpc_url` holds the key; this client
// never signs anything itself

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use iotmarket_eth::{parse_quantity, to_quantity};
use reqwest::Client as HttpClient;
use serde_json::{json, Value};

use super::{ReceiptStatus, Wallet, WalletError};
use crate::config::WalletConfig;

/// EIP-1193 "user rejected the request"
const USER_REJECTED: i64 = 4001;

pub struct JsonRpcWallet {
    http_client: HttpClient,
    rpc_url: String,
    signer: Option<String>,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl JsonRpcWallet {
    pub fn new(config: &WalletConfig) -> Result<Self, WalletError> {
        let http_client = HttpClient::builder()
            .build()
            .map_err(|e| WalletError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            rpc_url: config.rpc_url.clone(),
            signer: config.signer_address.clone(),
            poll_interval: Duration::from_millis(config.receipt_poll_interval_ms.max(1)),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| WalletError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WalletError::Transport(format!("http {}", response.status())));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| WalletError::Decode(e.to_string()))?;

        if let Some(err) = payload.get("error") {
            let code = err.get("code").and_then(|c| c.as_i64()).unwrap_or_default();
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("rpc error")
                .to_string();
            tracing::warn!(method, code, message = %message, "Wallet RPC error");
            if code == USER_REJECTED {
                return Err(WalletError::AccessDenied);
            }
            return Err(WalletError::Rpc { code, message });
        }

        payload
            .get("result")
            .cloned()
            .ok_or_else(|| WalletError::Decode("invalid rpc payload (no result)".to_string()))
    }
}

#[async_trait]
impl Wallet for JsonRpcWallet {
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        let result = self.call("eth_accounts", json!([])).await?;
        serde_json::from_value(result).map_err(|e| WalletError::Decode(e.to_string()))
    }

    async fn signer_address(&self) -> Result<String, WalletError> {
        if let Some(signer) = &self.signer {
            return Ok(signer.clone());
        }
        self.request_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(WalletError::AccessDenied)
    }

    async fn send_transaction(&self, to: &str, value_wei: u128) -> Result<String, WalletError> {
        let from = self.signer_address().await?;
        let result = self
            .call(
                "eth_sendTransaction",
                json!([{ "from": from, "to": to, "value": to_quantity(value_wei) }]),
            )
            .await?;

        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WalletError::Decode(format!("transaction hash: {}", result)))
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<ReceiptStatus, WalletError> {
        loop {
            let receipt = self
                .call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;

            if receipt.is_null() {
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            let status = receipt
                .get("status")
                .and_then(|s| s.as_str())
                .ok_or_else(|| WalletError::Decode("receipt without status".to_string()))?;

            return Ok(if parse_quantity(status)? == 1 {
                ReceiptStatus::Success
            } else {
                ReceiptStatus::Failed
            });
        }
    }
}

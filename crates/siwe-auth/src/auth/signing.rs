/*
[INPUT]:  Prepared SIWE text and the connected account
[OUTPUT]: SignatureResult over the exact text
[POS]:    Auth layer - signature request to the connected wallet
[UPDATE]: When signature normalization or signing preconditions change
*/

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::error::{AuthError, Capability, ConnectorError, Result};
use crate::types::{Account, SignatureResult};
use crate::wallet::{ConnectionStatus, WalletRuntime};

/// Requests one signature per call; never retries
pub struct SigningCoordinator {
    runtime: Arc<dyn WalletRuntime>,
}

impl SigningCoordinator {
    pub fn new(runtime: Arc<dyn WalletRuntime>) -> Self {
        Self { runtime }
    }

    pub async fn sign(&self, message_text: &str, account: &Account) -> Result<SignatureResult> {
        match self.runtime.status() {
            ConnectionStatus::Connected { address, .. } if address == account.address => {}
            _ => return Err(AuthError::NotConnected),
        }
        if let Some(connector) = self.runtime.active_connector() {
            if !connector.capabilities().sign_message {
                return Err(ConnectorError::Unsupported(Capability::SignMessage).into());
            }
        }

        debug!(address = %account.checksum_address(), bytes = message_text.len(), "requesting signature");
        let raw = self.runtime.request_sign(message_text).await?;
        let signature_hex = normalize_signature(&raw)?;

        Ok(SignatureResult {
            message_text: message_text.to_string(),
            signature_hex,
            address: account.address,
            signed_at: Utc::now(),
        })
    }
}

fn normalize_signature(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    if digits.is_empty() || hex::decode(digits).is_err() {
        return Err(AuthError::ConnectorError(format!(
            "wallet returned a malformed signature: {raw}"
        )));
    }
    Ok(format!("0x{}", digits.to_ascii_lowercase()))
}

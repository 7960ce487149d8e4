/*
[INPUT]:  EVM private key (hex string) and supported chain list
[OUTPUT]: Connector that signs EIP-191 personal messages locally
[POS]:    Wallet layer - local key connector implementation
[UPDATE]: When signing logic or EVM address formatting changes
*/

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use alloy_primitives::Address;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use crate::error::{AuthError, Capability, ConnectorError, Result};
use crate::types::{ChainId, ConnectedAccount};

use super::{Capabilities, Connector};

/// Wallet prompt shown before a connect, switch or sign is carried out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalRequest {
    Connect { address: Address },
    SwitchChain { chain_id: ChainId },
    SignMessage { address: Address, message: String },
}

/// Decides whether the user approves a wallet prompt
pub type Approver = Arc<dyn Fn(&ApprovalRequest) -> bool + Send + Sync>;

/// Connector backed by an in-process EVM private key
pub struct LocalKeyConnector {
    id: String,
    name: String,
    signer: PrivateKeySigner,
    chain_id: Mutex<ChainId>,
    supported_chains: Vec<ChainId>,
    can_switch: bool,
    approver: Option<Approver>,
}

impl fmt::Debug for LocalKeyConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeyConnector")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("address", &self.signer.address())
            .field("supported_chains", &self.supported_chains)
            .field("can_switch", &self.can_switch)
            .finish()
    }
}

impl LocalKeyConnector {
    /// Create a connector from a hex-encoded private key
    ///
    /// Supports both "0x"-prefixed and non-prefixed hex strings. The wallet
    /// starts on `chain_id` and accepts switching to any of `supported_chains`.
    pub fn new(
        id: &str,
        name: &str,
        private_key_hex: &str,
        chain_id: ChainId,
        supported_chains: Vec<ChainId>,
    ) -> Result<Self> {
        let private_key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());
        let signer = PrivateKeySigner::from_str(private_key_hex)
            .map_err(|e| AuthError::Config(format!("Invalid EVM private key: {e}")))?;

        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            signer,
            chain_id: Mutex::new(chain_id),
            supported_chains,
            can_switch: true,
            approver: None,
        })
    }

    /// Drop the switchChain capability, like wallets that manage chains themselves
    pub fn without_chain_switch(mut self) -> Self {
        self.can_switch = false;
        self
    }

    pub fn with_approver(mut self, approver: Approver) -> Self {
        self.approver = Some(approver);
        self
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> ChainId {
        *self.chain_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn approve(&self, request: ApprovalRequest) -> std::result::Result<(), ConnectorError> {
        match &self.approver {
            Some(approver) if !approver(&request) => Err(ConnectorError::UserRejected),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Connector for LocalKeyConnector {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            switch_chain: self.can_switch,
            ..Capabilities::ALL
        }
    }

    async fn connect(&self) -> std::result::Result<ConnectedAccount, ConnectorError> {
        let address = self.address();
        self.approve(ApprovalRequest::Connect { address })?;
        Ok(ConnectedAccount {
            address,
            chain_id: Some(self.chain_id()),
        })
    }

    async fn switch_chain(&self, chain_id: ChainId) -> std::result::Result<(), ConnectorError> {
        if !self.can_switch {
            return Err(ConnectorError::Unsupported(Capability::SwitchChain));
        }
        if self.chain_id() == chain_id {
            return Ok(());
        }
        if !self.supported_chains.contains(&chain_id) {
            return Err(ConnectorError::UnsupportedChain(chain_id));
        }
        self.approve(ApprovalRequest::SwitchChain { chain_id })?;
        *self.chain_id.lock().unwrap_or_else(PoisonError::into_inner) = chain_id;
        Ok(())
    }

    async fn sign_message(
        &self,
        address: Address,
        message: &str,
    ) -> std::result::Result<String, ConnectorError> {
        if address != self.address() {
            return Err(ConnectorError::Internal(format!(
                "account {address} is not managed by this wallet"
            )));
        }
        self.approve(ApprovalRequest::SignMessage {
            address,
            message: message.to_string(),
        })?;

        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| ConnectorError::Internal(format!("Failed to sign EVM message: {e}")))?;

        // alloy's Signature as_bytes() returns [r, s, v]
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}

/*
[INPUT]:  Scripted outcomes for connect, chain switch and signing
[OUTPUT]: Deterministic connector for tests and demos
[POS]:    Wallet layer - mock connector implementation
[UPDATE]: When the Connector trait gains capabilities
*/

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use alloy_primitives::{Address, address};
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{Capability, ConnectorError};
use crate::types::{BSC_TESTNET_CHAIN_ID, ChainId, ConnectedAccount};

use super::{Capabilities, Connector};

/// Address of the well-known hardhat test key #0
pub const MOCK_ADDRESS: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// Scripted result of a mock wallet call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    Approve,
    Reject,
    UnsupportedChain,
    Fail(String),
}

impl MockOutcome {
    fn into_result(self, chain_id: ChainId) -> Result<(), ConnectorError> {
        match self {
            MockOutcome::Approve => Ok(()),
            MockOutcome::Reject => Err(ConnectorError::UserRejected),
            MockOutcome::UnsupportedChain => Err(ConnectorError::UnsupportedChain(chain_id)),
            MockOutcome::Fail(message) => Err(ConnectorError::Internal(message)),
        }
    }
}

/// Call counters shared between a mock connector and the test holding it
#[derive(Debug, Default)]
pub struct MockCalls {
    connect: AtomicUsize,
    switch_chain: AtomicUsize,
    sign: AtomicUsize,
    disconnect: AtomicUsize,
    signed_messages: Mutex<Vec<String>>,
}

impl MockCalls {
    pub fn connect(&self) -> usize {
        self.connect.load(Ordering::SeqCst)
    }

    pub fn switch_chain(&self) -> usize {
        self.switch_chain.load(Ordering::SeqCst)
    }

    pub fn sign(&self) -> usize {
        self.sign.load(Ordering::SeqCst)
    }

    pub fn disconnect(&self) -> usize {
        self.disconnect.load(Ordering::SeqCst)
    }

    pub fn signed_messages(&self) -> Vec<String> {
        self.signed_messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Mock connector for testing
#[derive(Debug)]
pub struct MockConnector {
    id: String,
    name: String,
    address: Address,
    chain_id: Mutex<Option<ChainId>>,
    capabilities: Capabilities,
    connect_outcome: MockOutcome,
    switch_outcome: MockOutcome,
    sign_outcome: MockOutcome,
    signature: String,
    connect_gate: Option<Arc<Notify>>,
    sign_gate: Option<Arc<Notify>>,
    calls: Arc<MockCalls>,
}

impl MockConnector {
    /// Create a mock that approves everything and sits on chain 97
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            address: MOCK_ADDRESS,
            chain_id: Mutex::new(Some(BSC_TESTNET_CHAIN_ID)),
            capabilities: Capabilities::ALL,
            connect_outcome: MockOutcome::Approve,
            switch_outcome: MockOutcome::Approve,
            sign_outcome: MockOutcome::Approve,
            signature: format!("0x{}", "11".repeat(65)),
            connect_gate: None,
            sign_gate: None,
            calls: Arc::new(MockCalls::default()),
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    pub fn with_chain(self, chain_id: Option<ChainId>) -> Self {
        *self.chain_id.lock().unwrap_or_else(PoisonError::into_inner) = chain_id;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_connect_outcome(mut self, outcome: MockOutcome) -> Self {
        self.connect_outcome = outcome;
        self
    }

    pub fn with_switch_outcome(mut self, outcome: MockOutcome) -> Self {
        self.switch_outcome = outcome;
        self
    }

    pub fn with_sign_outcome(mut self, outcome: MockOutcome) -> Self {
        self.sign_outcome = outcome;
        self
    }

    pub fn with_signature(mut self, signature: &str) -> Self {
        self.signature = signature.to_string();
        self
    }

    /// Hold `connect` until the gate is notified
    pub fn with_connect_gate(mut self, gate: Arc<Notify>) -> Self {
        self.connect_gate = Some(gate);
        self
    }

    /// Hold `sign_message` until the gate is notified
    pub fn with_sign_gate(mut self, gate: Arc<Notify>) -> Self {
        self.sign_gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Arc<MockCalls> {
        self.calls.clone()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn current_chain(&self) -> Option<ChainId> {
        *self.chain_id.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn connect(&self) -> Result<ConnectedAccount, ConnectorError> {
        self.calls.connect.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.connect_gate {
            gate.notified().await;
        }
        let chain_id = self.current_chain();
        self.connect_outcome
            .clone()
            .into_result(chain_id.unwrap_or_default())?;
        Ok(ConnectedAccount {
            address: self.address,
            chain_id,
        })
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ConnectorError> {
        if !self.capabilities.switch_chain {
            return Err(ConnectorError::Unsupported(Capability::SwitchChain));
        }
        self.calls.switch_chain.fetch_add(1, Ordering::SeqCst);
        self.switch_outcome.clone().into_result(chain_id)?;
        *self.chain_id.lock().unwrap_or_else(PoisonError::into_inner) = Some(chain_id);
        Ok(())
    }

    async fn sign_message(&self, address: Address, message: &str) -> Result<String, ConnectorError> {
        if !self.capabilities.sign_message {
            return Err(ConnectorError::Unsupported(Capability::SignMessage));
        }
        self.calls.sign.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.sign_gate {
            gate.notified().await;
        }
        if address != self.address {
            return Err(ConnectorError::Internal(format!(
                "account {address} is not managed by this wallet"
            )));
        }
        self.sign_outcome
            .clone()
            .into_result(self.current_chain().unwrap_or_default())?;
        self.calls
            .signed_messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
        Ok(self.signature.clone())
    }

    async fn disconnect(&self) -> Result<(), ConnectorError> {
        self.calls.disconnect.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_connector_defaults() {
        let connector = MockConnector::new("io.metamask", "Metamask");
        assert_eq!(connector.id(), "io.metamask");
        assert_eq!(connector.name(), "Metamask");

        let account = connector.connect().await.unwrap();
        assert_eq!(account.address, MOCK_ADDRESS);
        assert_eq!(account.chain_id, Some(97));

        let signature = connector.sign_message(MOCK_ADDRESS, "hello").await.unwrap();
        assert_eq!(signature.len(), 132);
        assert_eq!(connector.calls().signed_messages(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_connector_switch_updates_chain() {
        let connector = MockConnector::new("io.metamask", "Metamask").with_chain(Some(1));
        connector.switch_chain(97).await.unwrap();
        assert_eq!(connector.connect().await.unwrap().chain_id, Some(97));
        assert_eq!(connector.calls().switch_chain(), 1);
    }

    #[tokio::test]
    async fn test_mock_connector_scripted_rejection() {
        let connector = MockConnector::new("io.metamask", "Metamask")
            .with_sign_outcome(MockOutcome::Reject);
        let err = connector.sign_message(MOCK_ADDRESS, "hello").await.unwrap_err();
        assert_eq!(err, ConnectorError::UserRejected);
        assert!(connector.calls().signed_messages().is_empty());
    }
}

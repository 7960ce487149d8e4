/*
[INPUT]:  Wallet runtime bindings (extension, mobile wallet, local key)
[OUTPUT]: Capability-polymorphic connector interface
[POS]:    Wallet layer - connector abstraction
[UPDATE]: When adding connector capabilities or changing signature format
*/

use async_trait::async_trait;
use alloy_primitives::Address;

use crate::error::{Capability, ConnectorError};
use crate::types::{ChainId, ConnectedAccount};

/// Capabilities a connector exposes; each one is queried independently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub connect: bool,
    pub switch_chain: bool,
    pub sign_message: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        connect: true,
        switch_chain: true,
        sign_message: true,
    };

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Connect => self.connect,
            Capability::SwitchChain => self.switch_chain,
            Capability::SignMessage => self.sign_message,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::ALL
    }
}

/// Binding to one wallet implementation
///
/// Implementations only need to override the capabilities they report in
/// [`Connector::capabilities`]. The async methods may wait on the user
/// approving a prompt in the wallet UI and carry no timeout.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Stable reverse-domain identifier, e.g. `io.metamask`
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    /// Request access to an account
    async fn connect(&self) -> Result<ConnectedAccount, ConnectorError>;

    /// Move the wallet to `chain_id`
    async fn switch_chain(&self, _chain_id: ChainId) -> Result<(), ConnectorError> {
        Err(ConnectorError::Unsupported(Capability::SwitchChain))
    }

    /// Personal-sign `message` with `address`; returns a hex signature
    async fn sign_message(&self, address: Address, message: &str) -> Result<String, ConnectorError>;

    async fn disconnect(&self) -> Result<(), ConnectorError> {
        Ok(())
    }
}

/*
[INPUT]:  Runtime connector and the application's required chain id
[OUTPUT]: Success or ChainSwitchFailed with a reason
[POS]:    Auth layer - chain enforcement before a connection is finalized
[UPDATE]: When chain switching rules change
*/

use tracing::{debug, info};

use crate::error::{AuthError, ChainSwitchReason, ConnectorError, Result};
use crate::types::ChainId;
use crate::wallet::Connector;

/// Keeps wallets on the one chain the application accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainGuard {
    required: ChainId,
}

impl ChainGuard {
    pub fn new(required: ChainId) -> Self {
        Self { required }
    }

    pub fn required_chain(&self) -> ChainId {
        self.required
    }

    /// Ask the wallet to switch to the required chain
    ///
    /// Wallets without a switch capability are assumed to already be on the
    /// right chain, or not to care.
    pub async fn ensure_chain(&self, connector: &dyn Connector) -> Result<()> {
        if !connector.capabilities().switch_chain {
            debug!(
                connector = connector.id(),
                "connector cannot switch chains, skipping"
            );
            return Ok(());
        }

        connector
            .switch_chain(self.required)
            .await
            .map_err(|err| self.switch_failed(err))?;
        info!(connector = connector.id(), chain_id = self.required, "wallet on required chain");
        Ok(())
    }

    /// Resolve the chain a freshly connected wallet reports
    pub fn check_account(&self, reported: Option<ChainId>) -> Result<ChainId> {
        match reported {
            None => Ok(self.required),
            Some(chain_id) if chain_id == self.required => Ok(chain_id),
            Some(actual) => Err(AuthError::ChainSwitchFailed {
                chain_id: self.required,
                reason: ChainSwitchReason::ChainMismatch { actual },
            }),
        }
    }

    fn switch_failed(&self, err: ConnectorError) -> AuthError {
        let reason = match err {
            ConnectorError::UserRejected => ChainSwitchReason::UserRejected,
            ConnectorError::UnsupportedChain(_) => ChainSwitchReason::UnsupportedChain,
            other => ChainSwitchReason::Connector(other.to_string()),
        };
        AuthError::ChainSwitchFailed {
            chain_id: self.required,
            reason,
        }
    }
}

/*
[INPUT]:  Registered connectors and connect/sign/disconnect requests
[OUTPUT]: Process-wide wallet connection status
[POS]:    Wallet layer - external wallet runtime port and in-memory implementation
[UPDATE]: When the runtime port gains operations or status fields
*/

use std::sync::{Arc, PoisonError, RwLock};

use alloy_primitives::Address;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ConnectorError;
use crate::types::{Account, ChainId};

use super::Connector;

/// Connection status as seen by the wallet runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connected {
        address: Address,
        chain_id: ChainId,
        connector_id: String,
    },
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected { .. })
    }
}

/// Port to the shared wallet runtime
///
/// The runtime owns which wallet is connected, on which chain, with which
/// account. Callers read that state and request changes to it; they never
/// hold it.
#[async_trait]
pub trait WalletRuntime: Send + Sync {
    /// Connectors the runtime currently exposes
    fn connectors(&self) -> Vec<Arc<dyn Connector>>;

    fn status(&self) -> ConnectionStatus;

    /// Connector behind the active session, if any
    fn active_connector(&self) -> Option<Arc<dyn Connector>>;

    /// Connect through `connector`; `chain_id` is recorded for wallets that do not report one
    async fn request_connect(
        &self,
        connector: Arc<dyn Connector>,
        chain_id: ChainId,
    ) -> Result<Account, ConnectorError>;

    /// Drop the active session, if any
    async fn request_disconnect(&self);

    /// Personal-sign `message` with the active session's account
    async fn request_sign(&self, message: &str) -> Result<String, ConnectorError>;
}

struct ActiveConnection {
    connector: Arc<dyn Connector>,
    account: Account,
}

/// Wallet runtime kept in process memory
#[derive(Default)]
pub struct InMemoryWalletRuntime {
    connectors: RwLock<Vec<Arc<dyn Connector>>>,
    active: RwLock<Option<ActiveConnection>>,
}

impl std::fmt::Debug for InMemoryWalletRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryWalletRuntime")
            .field("connectors", &self.connector_ids())
            .field("status", &self.status())
            .finish()
    }
}

impl InMemoryWalletRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connectors(connectors: Vec<Arc<dyn Connector>>) -> Self {
        Self {
            connectors: RwLock::new(connectors),
            active: RwLock::new(None),
        }
    }

    /// Announce a connector, replacing one with the same id
    pub fn register(&self, connector: Arc<dyn Connector>) {
        let mut guard = self.connectors.write().unwrap_or_else(PoisonError::into_inner);
        guard.retain(|existing| existing.id() != connector.id());
        guard.push(connector);
    }

    /// Withdraw a connector; an active session through it ends
    pub fn unregister(&self, connector_id: &str) {
        self.connectors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|existing| existing.id() != connector_id);

        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        if active
            .as_ref()
            .is_some_and(|connection| connection.connector.id() == connector_id)
        {
            *active = None;
        }
    }

    pub fn connector_ids(&self) -> Vec<String> {
        self.connectors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|connector| connector.id().to_string())
            .collect()
    }

    fn active_session(&self) -> Option<(Arc<dyn Connector>, Address)> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|connection| (connection.connector.clone(), connection.account.address))
    }
}

#[async_trait]
impl WalletRuntime for InMemoryWalletRuntime {
    fn connectors(&self) -> Vec<Arc<dyn Connector>> {
        self.connectors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn status(&self) -> ConnectionStatus {
        match self
            .active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(connection) => ConnectionStatus::Connected {
                address: connection.account.address,
                chain_id: connection.account.chain_id,
                connector_id: connection.connector.id().to_string(),
            },
            None => ConnectionStatus::Disconnected,
        }
    }

    fn active_connector(&self) -> Option<Arc<dyn Connector>> {
        self.active_session().map(|(connector, _)| connector)
    }

    async fn request_connect(
        &self,
        connector: Arc<dyn Connector>,
        chain_id: ChainId,
    ) -> Result<Account, ConnectorError> {
        debug!(connector = connector.id(), "requesting wallet connection");
        let connected = connector.connect().await?;
        let account = Account::new(connected.address, connected.chain_id.unwrap_or(chain_id));

        let previous = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(ActiveConnection {
                connector,
                account: account.clone(),
            });
        if let Some(previous) = previous {
            debug!(
                connector = previous.connector.id(),
                "replaced existing wallet connection"
            );
        }
        Ok(account)
    }

    async fn request_disconnect(&self) {
        let previous = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(previous) = previous {
            if let Err(err) = previous.connector.disconnect().await {
                warn!(connector = previous.connector.id(), error = %err, "wallet disconnect failed");
            }
        }
    }

    async fn request_sign(&self, message: &str) -> Result<String, ConnectorError> {
        let (connector, address) = self.active_session().ok_or(ConnectorError::NotConnected)?;
        debug!(connector = connector.id(), %address, "requesting message signature");
        connector.sign_message(address, message).await
    }
}

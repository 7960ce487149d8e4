/*
[INPUT]:  Wallet key selected by the user, wallet registry, wallet runtime
[OUTPUT]: Connected account on the required chain, or a typed failure
[POS]:    Auth layer - wallet discovery and connection
[UPDATE]: When connector matching or connection ordering changes
*/

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{AuthError, Capability, ConnectorError, Result};
use crate::registry::{WalletDescriptor, WalletKey, WalletRegistry};
use crate::types::Account;
use crate::wallet::{Connector, WalletRuntime};

use super::ChainGuard;

/// Whether a known wallet is present in the runtime
#[derive(Debug, Clone)]
pub struct WalletAvailability {
    pub descriptor: WalletDescriptor,
    pub installed: bool,
}

/// Matches registry entries to runtime connectors and connects them
pub struct ConnectionManager {
    registry: Arc<WalletRegistry>,
    runtime: Arc<dyn WalletRuntime>,
    guard: ChainGuard,
}

impl ConnectionManager {
    pub fn new(
        registry: Arc<WalletRegistry>,
        runtime: Arc<dyn WalletRuntime>,
        guard: ChainGuard,
    ) -> Self {
        Self {
            registry,
            runtime,
            guard,
        }
    }

    pub fn registry(&self) -> &WalletRegistry {
        &self.registry
    }

    /// Runtime connector whose id matches the wallet's stable id
    pub fn find_connector(&self, key: WalletKey) -> Option<Arc<dyn Connector>> {
        let stable_id = self.registry.resolve(key).stable_id;
        self.runtime
            .connectors()
            .into_iter()
            .find(|connector| connector.id() == stable_id)
    }

    pub fn available_wallets(&self) -> Vec<WalletAvailability> {
        let connectors = self.runtime.connectors();
        self.registry
            .descriptors()
            .map(|descriptor| WalletAvailability {
                descriptor: descriptor.clone(),
                installed: connectors
                    .iter()
                    .any(|connector| connector.id() == descriptor.stable_id),
            })
            .collect()
    }

    /// Connect the wallet behind `key` on the required chain
    ///
    /// The chain switch runs first; if it fails no connection is attempted.
    /// A wallet that still reports another chain after connecting is
    /// disconnected again before the error is returned.
    pub async fn connect(&self, key: WalletKey) -> Result<Account> {
        let descriptor = self.registry.resolve(key);
        let Some(connector) = self.find_connector(key) else {
            warn!(wallet = %key, stable_id = descriptor.stable_id, "wallet not found");
            return Err(AuthError::WalletNotFound {
                wallet: key,
                stable_id: descriptor.stable_id.to_string(),
                download_url: descriptor.download_url.map(str::to_string),
            });
        };

        self.guard.ensure_chain(connector.as_ref()).await?;

        let target = match &descriptor.connector_factory {
            Some(factory) => {
                debug!(wallet = %key, "using custom connector factory");
                factory()
            }
            None => connector,
        };
        if !target.capabilities().connect {
            return Err(ConnectorError::Unsupported(Capability::Connect).into());
        }

        let account = self
            .runtime
            .request_connect(target, self.guard.required_chain())
            .await?;

        if let Err(err) = self.guard.check_account(Some(account.chain_id)) {
            warn!(wallet = %key, chain_id = account.chain_id, "connected on wrong chain, dropping connection");
            self.runtime.request_disconnect().await;
            return Err(err);
        }

        info!(wallet = %key, address = %account.checksum_address(), chain_id = account.chain_id, "wallet connected");
        Ok(account)
    }

    pub async fn disconnect(&self) {
        self.runtime.request_disconnect().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainSwitchReason;
    use crate::registry::ConnectorFactory;
    use crate::wallet::{Capabilities, InMemoryWalletRuntime, MOCK_ADDRESS, MockConnector, MockOutcome};
    use alloy_primitives::address;

    fn manager_with(
        connectors: Vec<Arc<dyn Connector>>,
        registry: WalletRegistry,
    ) -> (ConnectionManager, Arc<InMemoryWalletRuntime>) {
        let runtime = Arc::new(InMemoryWalletRuntime::with_connectors(connectors));
        let manager = ConnectionManager::new(Arc::new(registry), runtime.clone(), ChainGuard::new(97));
        (manager, runtime)
    }

    #[tokio::test]
    async fn test_connect_matching_connector() {
        let metamask = Arc::new(MockConnector::new("io.metamask", "Metamask"));
        let (manager, runtime) = manager_with(vec![metamask.clone() as Arc<dyn Connector>], WalletRegistry::default());

        let account = manager.connect(WalletKey::Metamask).await.unwrap();
        assert_eq!(account.address, MOCK_ADDRESS);
        assert_eq!(account.chain_id, 97);
        assert!(runtime.status().is_connected());
        assert_eq!(metamask.calls().switch_chain(), 1);
        assert_eq!(metamask.calls().connect(), 1);
    }

    #[tokio::test]
    async fn test_connect_missing_wallet() {
        let metamask = Arc::new(MockConnector::new("io.metamask", "Metamask"));
        let (manager, runtime) = manager_with(vec![metamask.clone() as Arc<dyn Connector>], WalletRegistry::default());

        let err = manager.connect(WalletKey::Coinbase).await.unwrap_err();
        assert!(err.prompts_install());
        assert_eq!(err.download_url(), Some("https://www.coinbase.com/wallet"));
        assert!(!runtime.status().is_connected());
        assert_eq!(metamask.calls().connect(), 0);
    }

    #[tokio::test]
    async fn test_chain_switch_failure_skips_connect() {
        let metamask = Arc::new(
            MockConnector::new("io.metamask", "Metamask")
                .with_chain(Some(1))
                .with_switch_outcome(MockOutcome::Reject),
        );
        let (manager, runtime) = manager_with(vec![metamask.clone() as Arc<dyn Connector>], WalletRegistry::default());

        let err = manager.connect(WalletKey::Metamask).await.unwrap_err();
        assert!(err.is_user_rejection());
        assert_eq!(metamask.calls().connect(), 0);
        assert!(!runtime.status().is_connected());
    }

    #[tokio::test]
    async fn test_connect_rejection_leaves_runtime_disconnected() {
        let metamask = Arc::new(
            MockConnector::new("io.metamask", "Metamask").with_connect_outcome(MockOutcome::Reject),
        );
        let (manager, runtime) = manager_with(vec![metamask as Arc<dyn Connector>], WalletRegistry::default());

        let err = manager.connect(WalletKey::Metamask).await.unwrap_err();
        assert!(matches!(err, AuthError::UserRejected));
        assert!(!runtime.status().is_connected());
    }

    #[tokio::test]
    async fn test_wrong_chain_without_switch_is_dropped() {
        let metamask = Arc::new(
            MockConnector::new("io.metamask", "Metamask")
                .with_chain(Some(56))
                .with_capabilities(Capabilities {
                    switch_chain: false,
                    ..Capabilities::ALL
                }),
        );
        let (manager, runtime) = manager_with(vec![metamask.clone() as Arc<dyn Connector>], WalletRegistry::default());

        let err = manager.connect(WalletKey::Metamask).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::ChainSwitchFailed {
                reason: ChainSwitchReason::ChainMismatch { actual: 56 },
                ..
            }
        ));
        assert!(!runtime.status().is_connected());
        assert_eq!(metamask.calls().disconnect(), 1);
    }

    #[tokio::test]
    async fn test_custom_factory_replaces_runtime_connector() {
        let custom_address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
        let factory: ConnectorFactory = Arc::new(move || {
            Arc::new(MockConnector::new("io.metamask", "Metamask SDK").with_address(custom_address))
                as Arc<dyn Connector>
        });
        let registry = WalletRegistry::default().with_connector_factory(WalletKey::Metamask, factory);
        let injected = Arc::new(MockConnector::new("io.metamask", "Metamask"));
        let (manager, _runtime) = manager_with(vec![injected.clone() as Arc<dyn Connector>], registry);

        let account = manager.connect(WalletKey::Metamask).await.unwrap();
        assert_eq!(account.address, custom_address);
        // the chain switch still goes through the discovered connector
        assert_eq!(injected.calls().switch_chain(), 1);
        assert_eq!(injected.calls().connect(), 0);
    }

    #[test]
    fn test_available_wallets() {
        let (manager, _runtime) = manager_with(
            vec![Arc::new(MockConnector::new("com.coinbase.wallet", "Coinbase")) as Arc<dyn Connector>],
            WalletRegistry::default(),
        );
        let wallets = manager.available_wallets();
        assert_eq!(wallets.len(), 2);
        assert!(!wallets[0].installed);
        assert_eq!(wallets[0].descriptor.key, WalletKey::Metamask);
        assert!(wallets[1].installed);
    }
}

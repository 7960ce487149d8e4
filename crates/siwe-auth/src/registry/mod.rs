/*
[INPUT]:  Supported wallet keys and optional connector factories
[OUTPUT]: Wallet descriptors resolved by key or stable identifier
[POS]:    Registry layer - static catalogue of known wallet providers
[UPDATE]: When adding a supported wallet provider
*/

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::wallet::Connector;

/// Supported wallet providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKey {
    Metamask,
    Coinbase,
}

impl WalletKey {
    pub const ALL: [WalletKey; 2] = [WalletKey::Metamask, WalletKey::Coinbase];

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKey::Metamask => "metamask",
            WalletKey::Coinbase => "coinbase",
        }
    }

    fn index(self) -> usize {
        match self {
            WalletKey::Metamask => 0,
            WalletKey::Coinbase => 1,
        }
    }
}

impl fmt::Display for WalletKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalletKey {
    type Err = AuthError;

    /// Accepts the key itself or the provider's stable identifier
    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "metamask" | METAMASK_ID => Ok(WalletKey::Metamask),
            "coinbase" | COINBASE_ID => Ok(WalletKey::Coinbase),
            other => Err(AuthError::Config(format!("unknown wallet '{other}'"))),
        }
    }
}

/// Builds a connector that replaces the runtime-discovered one at connect time
pub type ConnectorFactory = Arc<dyn Fn() -> Arc<dyn Connector> + Send + Sync>;

/// Display and connection metadata for one wallet provider
#[derive(Clone)]
pub struct WalletDescriptor {
    pub key: WalletKey,
    /// Reverse-domain identifier matched against runtime connectors
    pub stable_id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub connector_factory: Option<ConnectorFactory>,
    pub download_url: Option<&'static str>,
}

impl fmt::Debug for WalletDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletDescriptor")
            .field("key", &self.key)
            .field("stable_id", &self.stable_id)
            .field("label", &self.label)
            .field("icon", &self.icon)
            .field("connector_factory", &self.connector_factory.is_some())
            .field("download_url", &self.download_url)
            .finish()
    }
}

const METAMASK_ID: &str = "io.metamask";
const COINBASE_ID: &str = "com.coinbase.wallet";

fn metamask() -> WalletDescriptor {
    WalletDescriptor {
        key: WalletKey::Metamask,
        stable_id: METAMASK_ID,
        label: "Metamask",
        icon: "/images/marketplace/wallet/metamask.png",
        connector_factory: None,
        download_url: Some("https://metamask.io/download/"),
    }
}

fn coinbase() -> WalletDescriptor {
    WalletDescriptor {
        key: WalletKey::Coinbase,
        stable_id: COINBASE_ID,
        label: "Coinbase Wallet",
        icon: "/images/marketplace/wallet/coinbase.svg",
        connector_factory: None,
        download_url: Some("https://www.coinbase.com/wallet"),
    }
}

/// Closed set of known wallets, indexed by `WalletKey`
#[derive(Debug, Clone)]
pub struct WalletRegistry {
    descriptors: [WalletDescriptor; 2],
}

impl Default for WalletRegistry {
    fn default() -> Self {
        Self {
            descriptors: [metamask(), coinbase()],
        }
    }
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a custom connector factory for one wallet
    pub fn with_connector_factory(mut self, key: WalletKey, factory: ConnectorFactory) -> Self {
        self.descriptors[key.index()].connector_factory = Some(factory);
        self
    }

    pub fn resolve(&self, key: WalletKey) -> &WalletDescriptor {
        &self.descriptors[key.index()]
    }

    pub fn find_by_stable_id(&self, stable_id: &str) -> Option<&WalletDescriptor> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.stable_id == stable_id)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &WalletDescriptor> {
        self.descriptors.iter()
    }
}

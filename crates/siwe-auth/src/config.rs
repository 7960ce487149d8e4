/*
[INPUT]:  Application origin, required chain and optional verifier endpoint
[OUTPUT]: Validated auth configuration
[POS]:    Configuration layer - settings shared by all auth components
[UPDATE]: When adding new configuration options
*/

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AuthError, Result};
use crate::siwe::NoncePolicy;
use crate::types::{BSC_TESTNET_CHAIN_ID, ChainId};

/// Settings for the sign-in flow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Host that requests the signature, e.g. "app.example.com"
    pub domain: String,
    /// Origin the message is bound to, e.g. "https://app.example.com"
    pub uri: String,
    /// The single chain wallets must be on
    #[serde(default = "default_chain_id")]
    pub chain_id: ChainId,
    #[serde(default)]
    pub nonce_policy: NoncePolicy,
    /// Optional lifetime written as `Expiration Time`
    #[serde(default)]
    pub expiration_secs: Option<u64>,
    #[serde(default)]
    pub verifier: Option<VerifierConfig>,
}

/// Backend endpoint that checks submitted signatures
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerifierConfig {
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl VerifierConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Longest accepted message lifetime (one year)
pub const MAX_EXPIRATION_SECS: u64 = 365 * 24 * 60 * 60;

fn default_chain_id() -> ChainId {
    BSC_TESTNET_CHAIN_ID
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl AuthConfig {
    pub fn new(domain: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            uri: uri.into(),
            chain_id: default_chain_id(),
            nonce_policy: NoncePolicy::default(),
            expiration_secs: None,
            verifier: None,
        }
    }

    /// Domain and URI taken from an origin such as "https://app.example.com"
    pub fn from_origin(origin: &str) -> Result<Self> {
        let url = Url::parse(origin)?;
        let host = url
            .host_str()
            .ok_or_else(|| AuthError::Config(format!("origin '{origin}' has no host")))?;
        let domain = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Ok(Self::new(domain, url.origin().ascii_serialization()))
    }

    pub fn with_nonce_policy(mut self, policy: NoncePolicy) -> Self {
        self.nonce_policy = policy;
        self
    }

    pub fn with_chain_id(mut self, chain_id: ChainId) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(AuthError::Config("domain must not be empty".to_string()));
        }
        Url::parse(&self.uri)?;
        if self.chain_id == 0 {
            return Err(AuthError::Config("chain_id must be non-zero".to_string()));
        }
        match self.expiration_secs {
            Some(0) => {
                return Err(AuthError::Config(
                    "expiration_secs must be positive when set".to_string(),
                ));
            }
            Some(secs) if secs > MAX_EXPIRATION_SECS => {
                return Err(AuthError::Config(format!(
                    "expiration_secs must not exceed {MAX_EXPIRATION_SECS}"
                )));
            }
            _ => {}
        }
        if let Some(verifier) = &self.verifier {
            Url::parse(&verifier.endpoint)?;
        }
        Ok(())
    }
}

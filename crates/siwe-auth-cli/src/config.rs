/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed sign-in and local wallet configuration
[POS]:    Configuration layer - CLI setup
[UPDATE]: When adding new configuration options
*/

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use siwe_auth::{AuthConfig, ChainId, WalletKey};

/// Top-level configuration for the sign-in CLI
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    /// Origin, chain and verifier settings for the sign-in flow
    pub auth: AuthConfig,
    /// Local-key wallets exposed to the wallet runtime
    #[serde(default)]
    pub wallets: Vec<LocalWalletConfig>,
}

/// One wallet backed by a private key on disk
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalWalletConfig {
    /// Registry key or stable id, e.g. "metamask" or "io.metamask"
    pub wallet: String,
    /// Display name; the registry label when omitted
    #[serde(default)]
    pub name: Option<String>,
    /// EVM private key (hex encoded)
    pub private_key: String,
    /// Chain the wallet starts on; the required chain when omitted
    #[serde(default)]
    pub chain_id: Option<ChainId>,
    /// Chains the wallet may switch to; only the required chain when empty
    #[serde(default)]
    pub supported_chains: Vec<ChainId>,
    /// Whether the wallet offers chain switching at all
    #[serde(default = "default_switch_chain")]
    pub switch_chain: bool,
    /// Approve every wallet prompt without asking
    #[serde(default)]
    pub auto_approve: bool,
}

impl LocalWalletConfig {
    pub fn key(&self) -> Result<WalletKey> {
        WalletKey::from_str(&self.wallet).with_context(|| format!("wallet '{}'", self.wallet))
    }
}

fn default_switch_chain() -> bool {
    true
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            auth: AuthConfig::new("localhost:3000", "http://localhost:3000"),
            wallets: Vec::new(),
        }
    }
}

impl CliConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("parse config yaml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.auth.validate().context("invalid auth section")?;

        let mut seen = Vec::new();
        for wallet in &self.wallets {
            let key = wallet.key()?;
            if seen.contains(&key) {
                bail!("wallet '{key}' configured more than once");
            }
            seen.push(key);
        }
        Ok(())
    }
}

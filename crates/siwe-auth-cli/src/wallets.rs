/*
[INPUT]:  Local wallet configuration entries
[OUTPUT]: In-memory wallet runtime exposing local-key connectors
[POS]:    Wallet wiring - terminal stand-in for browser wallet providers
[UPDATE]: When wallet configuration or approval prompts change
*/

use std::sync::Arc;

use anyhow::{Context, Result};
use siwe_auth::wallet::{ApprovalRequest, Approver};
use siwe_auth::{Connector, InMemoryWalletRuntime, LocalKeyConnector, WalletRegistry};
use tracing::info;

use crate::config::CliConfig;

/// Build one connector per configured wallet
///
/// Wallets without `auto_approve` route every prompt through `approver`.
pub fn build_runtime(config: &CliConfig, approver: Approver) -> Result<InMemoryWalletRuntime> {
    let registry = WalletRegistry::default();
    let required = config.auth.chain_id;
    let runtime = InMemoryWalletRuntime::new();

    for wallet in &config.wallets {
        let descriptor = registry.resolve(wallet.key()?);
        let name = wallet.name.as_deref().unwrap_or(descriptor.label);
        let supported = if wallet.supported_chains.is_empty() {
            vec![required]
        } else {
            wallet.supported_chains.clone()
        };

        let mut connector = LocalKeyConnector::new(
            descriptor.stable_id,
            name,
            &wallet.private_key,
            wallet.chain_id.unwrap_or(required),
            supported,
        )
        .with_context(|| format!("wallet '{}'", wallet.wallet))?;
        if !wallet.switch_chain {
            connector = connector.without_chain_switch();
        }
        if !wallet.auto_approve {
            connector = connector.with_approver(approver.clone());
        }

        info!(
            wallet = descriptor.stable_id,
            address = %connector.address().to_checksum(None),
            chain_id = connector.chain_id(),
            "wallet registered"
        );
        runtime.register(Arc::new(connector) as Arc<dyn Connector>);
    }

    Ok(runtime)
}

/// One-line description of a wallet prompt
pub fn describe(request: &ApprovalRequest) -> String {
    match request {
        ApprovalRequest::Connect { address } => {
            format!("Connect account {}?", address.to_checksum(None))
        }
        ApprovalRequest::SwitchChain { chain_id } => format!("Switch to chain {chain_id}?"),
        ApprovalRequest::SignMessage { address, .. } => {
            format!("Sign the message above with {}?", address.to_checksum(None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siwe_auth::WalletRuntime;
    use tokio_test::assert_ok;

    const YAML: &str = r#"
auth: { domain: app.example.com, uri: "https://app.example.com" }
wallets:
  - wallet: coinbase
    name: Test Coinbase
    private_key: "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
    switch_chain: false
"#;

    #[test]
    fn test_runtime_exposes_configured_wallets() {
        let config = assert_ok!(CliConfig::from_yaml(YAML));
        let runtime = assert_ok!(build_runtime(&config, Arc::new(|_: &ApprovalRequest| true)));

        let connectors = runtime.connectors();
        assert_eq!(connectors.len(), 1);
        assert_eq!(connectors[0].id(), "com.coinbase.wallet");
        assert_eq!(connectors[0].name(), "Test Coinbase");
        assert!(!connectors[0].capabilities().switch_chain);
    }

    #[test]
    fn test_bad_private_key_is_reported() {
        let yaml = YAML.replace("ac0974", "zz0974");
        let config = assert_ok!(CliConfig::from_yaml(&yaml));
        let err = build_runtime(&config, Arc::new(|_: &ApprovalRequest| true)).unwrap_err();
        assert!(format!("{err:#}").contains("wallet 'coinbase'"));
    }

    #[test]
    fn test_describe_prompts() {
        assert_eq!(
            describe(&ApprovalRequest::SwitchChain { chain_id: 97 }),
            "Switch to chain 97?"
        );
    }
}

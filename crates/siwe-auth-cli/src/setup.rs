/*
[INPUT]:  Parsed CLI configuration and a wallet prompt approver
[OUTPUT]: Auth state machine and signature verifier ready for commands
[POS]:    Wiring layer - assembles core components from configuration
[UPDATE]: When the core construction API changes
*/

use std::sync::Arc;

use anyhow::{Context, Result};
use siwe_auth::wallet::Approver;
use siwe_auth::{AuthStateMachine, HttpVerifier, LocalVerifier, SignatureVerifier, WalletRegistry};
use tracing::info;

use crate::config::CliConfig;
use crate::wallets::build_runtime;

pub fn build_machine(config: &CliConfig, approver: Approver) -> Result<AuthStateMachine> {
    let runtime = build_runtime(config, approver)?;
    AuthStateMachine::new(config.auth.clone(), WalletRegistry::default(), Arc::new(runtime))
        .context("create auth state machine")
}

/// HTTP verifier when an endpoint is configured, otherwise in-process checks
pub fn build_verifier(config: &CliConfig) -> Result<Box<dyn SignatureVerifier>> {
    match &config.auth.verifier {
        Some(verifier) => {
            info!(endpoint = %verifier.endpoint, "using remote verifier");
            let verifier = HttpVerifier::new(verifier).context("create http verifier")?;
            Ok(Box::new(verifier))
        }
        None => {
            info!("no verifier endpoint configured, verifying locally");
            Ok(Box::new(LocalVerifier::new(
                config.auth.domain.clone(),
                config.auth.chain_id,
            )))
        }
    }
}

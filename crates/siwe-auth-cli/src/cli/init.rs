/*
[INPUT]:  Interactive user input via CLI
[OUTPUT]: Generated YAML configuration file
[POS]:    CLI initialization layer
[UPDATE]: When CliConfig schema changes
*/

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password, Select, theme::ColorfulTheme};
use std::path::PathBuf;

use siwe_auth::{AuthConfig, NoncePolicy, VerifierConfig, WalletKey};
use siwe_auth_cli::config::{CliConfig, LocalWalletConfig};

pub fn run_init(output: PathBuf) -> Result<()> {
    println!("{}", style("Welcome to the Sign-In with Ethereum CLI").bold().cyan());
    println!(
        "{}",
        style("This will guide you through creating a new configuration.").dim()
    );

    let theme = ColorfulTheme::default();

    println!("\n{}", style("--- Application ---").bold());
    let origin: String = Input::with_theme(&theme)
        .with_prompt("Origin (e.g., https://app.example.com)")
        .default("http://localhost:3000".to_string())
        .interact_text()?;
    let mut auth = AuthConfig::from_origin(&origin).context("parse origin")?;

    let chain_id: u64 = Input::with_theme(&theme)
        .with_prompt("Required chain id")
        .default(auth.chain_id)
        .interact_text()?;
    auth = auth.with_chain_id(chain_id);

    let policies = ["lenient", "strict"];
    let policy = Select::with_theme(&theme)
        .with_prompt("Nonce policy")
        .items(&policies)
        .default(0)
        .interact()?;
    if policy == 1 {
        auth = auth.with_nonce_policy(NoncePolicy::Strict);
    }

    let endpoint: String = Input::with_theme(&theme)
        .with_prompt("Verifier endpoint (empty to verify locally)")
        .allow_empty(true)
        .interact_text()?;
    if !endpoint.trim().is_empty() {
        auth.verifier = Some(VerifierConfig::new(endpoint.trim()));
    }

    println!("\n{}", style("--- Wallet ---").bold());
    let wallets: Vec<&str> = WalletKey::ALL.iter().map(WalletKey::as_str).collect();
    let wallet = Select::with_theme(&theme)
        .with_prompt("Wallet to emulate")
        .items(&wallets)
        .default(0)
        .interact()?;

    let private_key = Password::with_theme(&theme)
        .with_prompt("EVM private key (hex)")
        .interact()?;

    let auto_approve = Confirm::with_theme(&theme)
        .with_prompt("Approve wallet prompts automatically?")
        .default(false)
        .interact()?;

    let config = CliConfig {
        auth,
        wallets: vec![LocalWalletConfig {
            wallet: wallets[wallet].to_string(),
            name: None,
            private_key,
            chain_id: None,
            supported_chains: Vec::new(),
            switch_chain: true,
            auto_approve,
        }],
    };
    config.validate()?;

    let yaml = serde_yaml::to_string(&config).context("failed to serialize config to YAML")?;

    std::fs::write(&output, yaml)
        .context(format!("failed to write config to {}", output.display()))?;

    println!("\n{}", style("SUCCESS!").bold().green());
    println!(
        "Configuration written to: {}",
        style(output.display()).cyan()
    );

    Ok(())
}

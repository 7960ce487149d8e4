/*
[INPUT]:  Wallet key, nonce and verify flag from the command line
[OUTPUT]: Signed SIWE message and signature on stdout
[POS]:    CLI one-shot sign-in command
[UPDATE]: When the login command options change
*/

use std::str::FromStr;

use anyhow::{Context, Result, bail};
use console::style;
use siwe_auth::{AuthStateMachine, WalletKey};
use siwe_auth_cli::{CliConfig, build_verifier};
use tracing::info;

pub struct LoginArgs {
    pub wallet: String,
    pub nonce: String,
    pub verify: bool,
}

pub async fn run_login(machine: &AuthStateMachine, config: &CliConfig, args: LoginArgs) -> Result<()> {
    let key = WalletKey::from_str(&args.wallet).context("select wallet")?;

    let account = machine.connect(key).await.context("connect wallet")?;
    info!(address = %account.checksum_address(), "connected");

    machine.enter_nonce(args.nonce).context("enter nonce")?;
    let signature = machine
        .generate_signature()
        .await
        .context("generate signature")?;

    println!("{}", signature.message_text);
    println!();
    println!("{} {}", style("Address:").bold(), account.checksum_address());
    println!("{} {}", style("Signature:").bold(), signature.signature_hex);

    if args.verify {
        let verifier = build_verifier(config)?;
        let verified = machine
            .verify(verifier.as_ref())
            .await
            .context("verify signature")?;
        if !verified {
            bail!("signature was not accepted by the verifier");
        }
        println!("{} {}", style("Verified:").bold(), style("yes").green());
    }

    machine.disconnect().await;
    Ok(())
}

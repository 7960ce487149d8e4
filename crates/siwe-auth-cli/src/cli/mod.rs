/*
[INPUT]:  Terminal user input and auth state machine results
[OUTPUT]: Prompts, status lines and command outcomes on the terminal
[POS]:    CLI presentation layer
[UPDATE]: When adding CLI commands or changing terminal output
*/

pub mod init;
pub mod interactive;
pub mod login;

use std::sync::Arc;

use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};
use siwe_auth::wallet::{ApprovalRequest, Approver};
use siwe_auth::{AuthError, AuthSession, AuthState, WalletAvailability};
use siwe_auth_cli::wallets::describe;

/// Ask on the terminal before a wallet connects, switches chain or signs
pub fn terminal_approver() -> Approver {
    Arc::new(|request: &ApprovalRequest| {
        if let ApprovalRequest::SignMessage { message, .. } = request {
            println!("\n{}\n", style(message).dim());
        }
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(describe(request))
            .default(true)
            .interact()
            .unwrap_or(false)
    })
}

pub fn print_session(session: &AuthSession) {
    let state = match session.state() {
        AuthState::Disconnected => style("disconnected").red(),
        AuthState::Connected => style("connected").yellow(),
        AuthState::Authenticated => style("authenticated").green(),
    };
    println!("{} {}", style("State:").bold(), state);

    if let Some(account) = session.account() {
        println!("  Address:  {}", account.checksum_address());
        println!("  Chain ID: {}", account.chain_id);
    }
    if let Some(nonce) = session.nonce_input() {
        println!("  Nonce:    {nonce}");
    }
    if let Some(signature) = session.signature() {
        println!("  Signature: {}", signature.signature_hex);
        let verified = if session.is_server_verified() {
            style("yes").green()
        } else {
            style("no").dim()
        };
        println!("  Server verified: {verified}");
    }
}

pub fn print_wallets(wallets: &[WalletAvailability]) {
    for wallet in wallets {
        let descriptor = &wallet.descriptor;
        let marker = if wallet.installed {
            style("available").green()
        } else {
            style("not installed").dim()
        };
        println!(
            "{:<16} {:<22} {}",
            descriptor.label, descriptor.stable_id, marker
        );
        if !wallet.installed {
            if let Some(url) = descriptor.download_url {
                println!("{:<16} {}", "", style(url).underlined());
            }
        }
    }
}

/// Error line for a failed command; the session continues afterwards
pub fn print_error(err: &AuthError) {
    println!("{} {}", style("✗").red().bold(), style(err).red());
    if let Some(url) = err.download_url() {
        println!("  Install it from {}", style(url).underlined());
    } else if err.is_retryable() {
        println!("  {}", style("You can try again.").dim());
    }
}

/*
[INPUT]:  User menu selections via CLI
[OUTPUT]: Sign-in commands dispatched to the auth state machine
[POS]:    CLI interactive flow
[UPDATE]: When auth commands or menu entries change
*/

use anyhow::Result;
use console::style;
use dialoguer::{Input, Select, theme::ColorfulTheme};
use siwe_auth::{AuthState, AuthStateMachine, SignatureVerifier};

use super::{print_error, print_session, print_wallets};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Connect,
    EnterNonce,
    GenerateSignature,
    Verify,
    Disconnect,
    Status,
    Exit,
}

impl Action {
    fn label(&self) -> &'static str {
        match self {
            Action::Connect => "Connect wallet",
            Action::EnterNonce => "Enter nonce",
            Action::GenerateSignature => "Generate signature",
            Action::Verify => "Verify signature",
            Action::Disconnect => "Disconnect",
            Action::Status => "Show status",
            Action::Exit => "Exit",
        }
    }
}

/// Menu entries that make sense in `state`
fn actions_for(state: AuthState) -> Vec<Action> {
    match state {
        AuthState::Disconnected => vec![Action::Connect, Action::Status, Action::Exit],
        AuthState::Connected => vec![
            Action::EnterNonce,
            Action::GenerateSignature,
            Action::Disconnect,
            Action::Status,
            Action::Exit,
        ],
        AuthState::Authenticated => vec![
            Action::Verify,
            Action::Disconnect,
            Action::Status,
            Action::Exit,
        ],
    }
}

pub async fn run_interactive(
    machine: &AuthStateMachine,
    verifier: &dyn SignatureVerifier,
) -> Result<()> {
    let theme = ColorfulTheme::default();
    println!("{}", style("Sign-In with Ethereum").bold().cyan());
    println!(
        "{}",
        style(format!(
            "{} on chain {}",
            machine.config().domain,
            machine.config().chain_id
        ))
        .dim()
    );

    loop {
        if machine.sync_with_runtime() {
            println!("{}", style("Wallet changed, session reset.").yellow());
        }

        let actions = actions_for(machine.state());
        let labels: Vec<&str> = actions.iter().map(Action::label).collect();
        let selection = Select::with_theme(&theme)
            .with_prompt("Select action")
            .items(&labels)
            .default(0)
            .interact()?;

        match actions[selection] {
            Action::Connect => connect(machine, &theme).await?,
            Action::EnterNonce => {
                let nonce: String = Input::with_theme(&theme)
                    .with_prompt("Nonce")
                    .allow_empty(true)
                    .interact_text()?;
                if let Err(err) = machine.enter_nonce(nonce) {
                    print_error(&err);
                }
            }
            Action::GenerateSignature => match machine.generate_signature().await {
                Ok(signature) => {
                    println!("{} {}", style("✓ Signed").green().bold(), signature.signature_hex);
                }
                Err(err) => print_error(&err),
            },
            Action::Verify => match machine.verify(verifier).await {
                Ok(true) => println!("{}", style("✓ Signature verified").green().bold()),
                Ok(false) => println!("{}", style("Signature was not accepted").yellow()),
                Err(err) => print_error(&err),
            },
            Action::Disconnect => {
                machine.disconnect().await;
                println!("{}", style("Disconnected").dim());
            }
            Action::Status => print_session(&machine.session()),
            Action::Exit => {
                machine.disconnect().await;
                return Ok(());
            }
        }
    }
}

async fn connect(machine: &AuthStateMachine, theme: &ColorfulTheme) -> Result<()> {
    let wallets = machine.available_wallets();
    print_wallets(&wallets);

    let labels: Vec<&str> = wallets.iter().map(|w| w.descriptor.label).collect();
    let selection = Select::with_theme(theme)
        .with_prompt("Select wallet")
        .items(&labels)
        .default(0)
        .interact()?;

    match machine.connect(wallets[selection].descriptor.key).await {
        Ok(account) => println!(
            "{} {} (chain {})",
            style("✓ Connected").green().bold(),
            account.checksum_address(),
            account.chain_id
        ),
        Err(err) => print_error(&err),
    }
    Ok(())
}

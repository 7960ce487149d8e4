/*
[INPUT]:  CLI arguments, YAML configuration file, terminal input
[OUTPUT]: Sign-in session driven from the terminal
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, subcommands, or startup flow
*/

mod cli;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use siwe_auth_cli::{CliConfig, build_machine, build_verifier};

use crate::cli::login::{LoginArgs, run_login};

#[derive(Parser, Debug)]
#[command(name = "siwe-auth", version, about = "Sign-In with Ethereum from the terminal")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long = "dry-run")]
    dry_run: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Menu-driven sign-in session (default)
    Interactive,
    /// Connect, sign one nonce and print the signature
    Login {
        #[arg(long, default_value = "metamask")]
        wallet: String,
        #[arg(long)]
        nonce: String,
        /// Submit the signature to the verifier afterwards
        #[arg(long)]
        verify: bool,
    },
    /// List known wallets and whether they are configured
    Wallets,
    /// Write a configuration file interactively
    Init {
        #[arg(long, value_name = "PATH", default_value = "siwe-auth.yaml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    if let Some(Command::Init { output }) = &args.command {
        return cli::init::run_init(output.clone());
    }

    let config = load_config(args.config_path.as_deref())?;
    info!(
        domain = %config.auth.domain,
        chain_id = config.auth.chain_id,
        wallet_count = config.wallets.len(),
        "configuration loaded"
    );

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let machine = build_machine(&config, cli::terminal_approver())?;

    match args.command.unwrap_or(Command::Interactive) {
        Command::Interactive => {
            let verifier = build_verifier(&config)?;
            cli::interactive::run_interactive(&machine, verifier.as_ref()).await
        }
        Command::Login {
            wallet,
            nonce,
            verify,
        } => {
            run_login(
                &machine,
                &config,
                LoginArgs {
                    wallet,
                    nonce,
                    verify,
                },
            )
            .await
        }
        Command::Wallets => {
            cli::print_wallets(&machine.available_wallets());
            Ok(())
        }
        Command::Init { .. } => Ok(()),
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => CliConfig::from_file(path).context("load config"),
        None => Ok(CliConfig::default()),
    }
}

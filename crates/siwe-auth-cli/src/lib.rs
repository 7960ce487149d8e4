/*
[INPUT]:  Public API exports for the siwe-auth-cli crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod setup;
pub mod wallets;

// Re-export main types for convenience
pub use config::{CliConfig, LocalWalletConfig};
pub use setup::{build_machine, build_verifier};
pub use wallets::build_runtime;

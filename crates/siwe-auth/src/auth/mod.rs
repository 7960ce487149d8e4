/*
[INPUT]:  Wallet registry, wallet runtime and auth configuration
[OUTPUT]: Connected accounts, signatures and auth state transitions
[POS]:    Auth layer - sign-in lifecycle from wallet selection to signature
[UPDATE]: When auth flow components change
*/

pub mod chain_guard;
pub mod connection;
pub mod machine;
pub mod session;
pub mod signing;

pub use chain_guard::ChainGuard;
pub use connection::{ConnectionManager, WalletAvailability};
pub use machine::AuthStateMachine;
pub use session::{AuthAction, AuthSession, AuthState, Operation};
pub use signing::SigningCoordinator;

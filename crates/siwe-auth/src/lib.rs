/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Sign-In with Ethereum client crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod config;
pub mod error;
pub mod registry;
pub mod siwe;
pub mod types;
pub mod verify;
pub mod wallet;

// Re-export commonly used types from auth
pub use auth::{
    AuthAction,
    AuthSession,
    AuthState,
    AuthStateMachine,
    Operation,
    WalletAvailability,
};

pub use config::{AuthConfig, VerifierConfig};

pub use error::{AuthError, ChainSwitchReason, ConnectorError, Result};

pub use registry::{WalletDescriptor, WalletKey, WalletRegistry};

pub use siwe::{NoncePolicy, SiweMessage};

// Re-export all types
pub use types::*;

pub use verify::{
    HttpVerifier,
    LocalVerifier,
    SignatureVerifier,
    VerificationRequest,
    VerificationResponse,
};

pub use wallet::{
    Connector,
    InMemoryWalletRuntime,
    LocalKeyConnector,
    WalletRuntime,
};

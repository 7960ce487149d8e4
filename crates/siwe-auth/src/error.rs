/*
[INPUT]:  Error sources (wallet runtime, chain switch, message building, HTTP, serialization)
[OUTPUT]: Structured error types with recovery hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or changing recovery semantics
*/

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

use crate::registry::WalletKey;
use crate::types::ChainId;

/// Optional wallet capability, used in connector-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Connect,
    SwitchChain,
    SignMessage,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Connect => "connect",
            Capability::SwitchChain => "switchChain",
            Capability::SignMessage => "signMessage",
        };
        f.write_str(name)
    }
}

/// Errors raised by a wallet connector or the wallet runtime
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// The user dismissed or declined the wallet prompt
    #[error("user rejected the request")]
    UserRejected,

    /// The wallet cannot switch to the requested chain
    #[error("chain {0} is not supported by the wallet")]
    UnsupportedChain(ChainId),

    /// The connector does not expose the capability
    #[error("connector does not support {0}")]
    Unsupported(Capability),

    /// No wallet session is active in the runtime
    #[error("no active wallet connection")]
    NotConnected,

    /// Any other wallet runtime fault
    #[error("{0}")]
    Internal(String),
}

/// Why a chain switch did not happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainSwitchReason {
    UserRejected,
    UnsupportedChain,
    /// The wallet connected but reports another chain
    ChainMismatch { actual: ChainId },
    Connector(String),
}

impl fmt::Display for ChainSwitchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainSwitchReason::UserRejected => f.write_str("user rejected the switch"),
            ChainSwitchReason::UnsupportedChain => f.write_str("chain not supported by wallet"),
            ChainSwitchReason::ChainMismatch { actual } => {
                write!(f, "wallet is on chain {actual}")
            }
            ChainSwitchReason::Connector(message) => write!(f, "connector error: {message}"),
        }
    }
}

/// Main error type for the SIWE auth core
#[derive(Error, Debug)]
pub enum AuthError {
    /// No runtime connector matches the wallet; the host should offer installation
    #[error("Wallet not found: {wallet} ({stable_id})")]
    WalletNotFound {
        wallet: WalletKey,
        stable_id: String,
        download_url: Option<String>,
    },

    /// The wallet could not be moved to the required chain
    #[error("Chain switch to {chain_id} failed: {reason}")]
    ChainSwitchFailed {
        chain_id: ChainId,
        reason: ChainSwitchReason,
    },

    /// The user declined connection or signing
    #[error("User rejected the request")]
    UserRejected,

    /// Nonce missing or not acceptable
    #[error("Invalid nonce: {0}")]
    InvalidNonce(String),

    /// Unexpected wallet runtime fault
    #[error("Connector error: {0}")]
    ConnectorError(String),

    /// Operation requires a connected wallet
    #[error("No wallet connected")]
    NotConnected,

    /// Operation not allowed from the current auth state
    #[error("Invalid transition: {from:?} -> {action:?}")]
    InvalidTransition {
        from: crate::auth::AuthState,
        action: crate::auth::AuthAction,
    },

    /// Another suspending operation is still pending
    #[error("{0} already in progress")]
    OperationInProgress(crate::auth::Operation),

    /// The session was reset while the operation was pending
    #[error("Session was disconnected while {0} was pending")]
    Superseded(crate::auth::Operation),

    /// SIWE message fields or text are malformed
    #[error("Invalid SIWE message: {0}")]
    InvalidMessage(String),

    /// Signature verification failed locally
    #[error("Verification failed: {0}")]
    Verification(String),

    /// Verification endpoint returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Check if the user can simply try the same action again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthError::UserRejected
                | AuthError::ChainSwitchFailed { .. }
                | AuthError::InvalidNonce(_)
                | AuthError::ConnectorError(_)
                | AuthError::OperationInProgress(_)
                | AuthError::Superseded(_)
                | AuthError::Http(_)
        ) || matches!(self, AuthError::Api { code, .. } if *code >= 500)
    }

    /// Check if the error came from the user declining a wallet prompt
    pub fn is_user_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::UserRejected
                | AuthError::ChainSwitchFailed {
                    reason: ChainSwitchReason::UserRejected,
                    ..
                }
        )
    }

    /// Check if the host should show the wallet install flow
    pub fn prompts_install(&self) -> bool {
        matches!(self, AuthError::WalletNotFound { .. })
    }

    /// Download link for the missing wallet, if any
    pub fn download_url(&self) -> Option<&str> {
        match self {
            AuthError::WalletNotFound { download_url, .. } => download_url.as_deref(),
            _ => None,
        }
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        AuthError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

impl From<ConnectorError> for AuthError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::UserRejected => AuthError::UserRejected,
            ConnectorError::NotConnected => AuthError::NotConnected,
            other => AuthError::ConnectorError(other.to_string()),
        }
    }
}

/// Result type alias for auth operations
pub type Result<T> = std::result::Result<T, AuthError>;

/*
[INPUT]:  Connection and signing outcomes
[OUTPUT]: Validated auth state transitions and the session working state
[POS]:    Auth layer - state model for the sign-in lifecycle
[UPDATE]: When auth states, actions or session fields change
*/

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::types::{Account, SignatureResult};

/// Where the user is in the sign-in flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthState {
    Disconnected,
    Connected,
    Authenticated,
}

/// Events that drive auth state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    ConnectSucceeded,
    ConnectFailed,
    NonceEntered,
    SignSucceeded,
    SignFailed,
    Verified,
    Disconnect,
}

/// Suspending operations guarded against re-entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Connect,
    Sign,
    Verify,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Connect => "connect",
            Operation::Sign => "sign",
            Operation::Verify => "verify",
        };
        f.write_str(name)
    }
}

impl AuthState {
    pub fn can_transition(&self, action: &AuthAction) -> bool {
        matches!(
            (self, action),
            (AuthState::Disconnected, AuthAction::ConnectSucceeded)
                | (AuthState::Disconnected, AuthAction::ConnectFailed)
                | (AuthState::Connected, AuthAction::NonceEntered)
                | (AuthState::Connected, AuthAction::SignSucceeded)
                | (AuthState::Connected, AuthAction::SignFailed)
                | (AuthState::Authenticated, AuthAction::Verified)
                | (_, AuthAction::Disconnect)
        )
    }

    /// State after `action`, or `InvalidTransition`
    pub fn transition(self, action: AuthAction) -> Result<AuthState> {
        if !self.can_transition(&action) {
            return Err(AuthError::InvalidTransition { from: self, action });
        }

        let next = match (self, &action) {
            (AuthState::Disconnected, AuthAction::ConnectSucceeded) => AuthState::Connected,
            (AuthState::Disconnected, AuthAction::ConnectFailed) => AuthState::Disconnected,
            (AuthState::Connected, AuthAction::NonceEntered) => AuthState::Connected,
            (AuthState::Connected, AuthAction::SignSucceeded) => AuthState::Authenticated,
            (AuthState::Connected, AuthAction::SignFailed) => AuthState::Connected,
            (AuthState::Authenticated, AuthAction::Verified) => AuthState::Authenticated,
            (_, AuthAction::Disconnect) => AuthState::Disconnected,
            // All other valid transitions are covered above
            _ => unreachable!(),
        };
        Ok(next)
    }
}

/// Working state of one user session
///
/// Fields are only changed through methods that keep the invariants:
/// `authenticated` implies an account, a signature implies an account, and
/// `server_verified` implies `authenticated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    id: Uuid,
    account: Option<Account>,
    signature: Option<SignatureResult>,
    authenticated: bool,
    server_verified: bool,
    nonce_input: Option<String>,
    last_message: Option<String>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            account: None,
            signature: None,
            authenticated: false,
            server_verified: false,
            nonce_input: None,
            last_message: None,
        }
    }
}

impl AuthSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> AuthState {
        match (&self.account, self.authenticated) {
            (None, _) => AuthState::Disconnected,
            (Some(_), false) => AuthState::Connected,
            (Some(_), true) => AuthState::Authenticated,
        }
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn signature(&self) -> Option<&SignatureResult> {
        self.signature.as_ref()
    }

    /// Holds a signature, not necessarily checked by a server
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_server_verified(&self) -> bool {
        self.server_verified
    }

    pub fn nonce_input(&self) -> Option<&str> {
        self.nonce_input.as_deref()
    }

    /// Text of the most recently built message
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    pub(crate) fn apply(&mut self, action: AuthAction) -> Result<AuthState> {
        self.state().transition(action)
    }

    pub(crate) fn connected(&mut self, account: Account) -> Result<()> {
        self.apply(AuthAction::ConnectSucceeded)?;
        self.account = Some(account);
        Ok(())
    }

    pub(crate) fn set_nonce_input(&mut self, nonce: String) -> Result<()> {
        self.apply(AuthAction::NonceEntered)?;
        self.nonce_input = Some(nonce);
        Ok(())
    }

    pub(crate) fn take_nonce_input(&mut self) -> Option<String> {
        self.nonce_input.take()
    }

    pub(crate) fn message_built(&mut self, text: String) {
        self.last_message = Some(text);
    }

    pub(crate) fn signed(&mut self, signature: SignatureResult) -> Result<()> {
        self.apply(AuthAction::SignSucceeded)?;
        self.signature = Some(signature);
        self.authenticated = true;
        self.server_verified = false;
        Ok(())
    }

    pub(crate) fn verified(&mut self, verified: bool) -> Result<()> {
        self.apply(AuthAction::Verified)?;
        self.server_verified = verified;
        Ok(())
    }

    /// Drop account, signature and flags; a fresh session id is issued
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

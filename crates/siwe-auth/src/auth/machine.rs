/*
[INPUT]:  User commands (connect, nonce, sign, verify, disconnect)
[OUTPUT]: Auth state transitions over one owned session
[POS]:    Auth layer - controller for the sign-in lifecycle
[UPDATE]: When controller operations or their ordering change
*/

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::registry::{WalletKey, WalletRegistry};
use crate::siwe;
use crate::types::{Account, Clock, SignatureResult, system_clock};
use crate::verify::{SignatureVerifier, VerificationRequest};
use crate::wallet::{ConnectionStatus, WalletRuntime};

use super::{
    AuthAction, AuthSession, AuthState, ChainGuard, ConnectionManager, Operation,
    SigningCoordinator, WalletAvailability,
};

/// Owns the session and serializes the suspending operations on it
///
/// Only one of connect, sign or verify may be pending at a time. `disconnect`
/// is always accepted; it advances the session epoch so a result arriving for
/// an older epoch is dropped with `Superseded`.
pub struct AuthStateMachine {
    config: AuthConfig,
    runtime: Arc<dyn WalletRuntime>,
    connections: ConnectionManager,
    signing: SigningCoordinator,
    clock: Clock,
    session: Mutex<AuthSession>,
    in_flight: Mutex<Option<Operation>>,
    epoch: AtomicU64,
}

/// Clears the in-flight slot when the operation ends, however it ends
struct InFlight<'a> {
    slot: &'a Mutex<Option<Operation>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl AuthStateMachine {
    pub fn new(
        config: AuthConfig,
        registry: WalletRegistry,
        runtime: Arc<dyn WalletRuntime>,
    ) -> Result<Self> {
        config.validate()?;
        let guard = ChainGuard::new(config.chain_id);
        let connections = ConnectionManager::new(Arc::new(registry), runtime.clone(), guard);
        let signing = SigningCoordinator::new(runtime.clone());

        Ok(Self {
            config,
            runtime,
            connections,
            signing,
            clock: system_clock(),
            session: Mutex::new(AuthSession::default()),
            in_flight: Mutex::new(None),
            epoch: AtomicU64::new(0),
        })
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn state(&self) -> AuthState {
        self.lock_session().state()
    }

    /// Snapshot of the current session
    pub fn session(&self) -> AuthSession {
        self.lock_session().clone()
    }

    /// Operation currently pending, if any
    pub fn in_flight(&self) -> Option<Operation> {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn available_wallets(&self) -> Vec<WalletAvailability> {
        self.connections.available_wallets()
    }

    /// Connect the wallet behind `key`; only allowed while disconnected
    pub async fn connect(&self, key: WalletKey) -> Result<Account> {
        let _in_flight = self.begin(Operation::Connect)?;
        self.sync_with_runtime();

        let epoch = {
            let session = self.lock_session();
            let state = session.state();
            if !state.can_transition(&AuthAction::ConnectSucceeded) {
                return Err(AuthError::InvalidTransition {
                    from: state,
                    action: AuthAction::ConnectSucceeded,
                });
            }
            self.current_epoch()
        };

        let result = self.connections.connect(key).await;
        if self.current_epoch() != epoch {
            if result.is_ok() {
                warn!(wallet = %key, "session reset while connecting, releasing connection");
                self.runtime.request_disconnect().await;
            }
            return Err(AuthError::Superseded(Operation::Connect));
        }

        match result {
            Ok(account) => {
                let session_id = {
                    let mut session = self.lock_session();
                    session.connected(account.clone())?;
                    session.id()
                };
                debug!(session_id = %session_id, "session connected");
                Ok(account)
            }
            Err(err) => {
                warn!(wallet = %key, error = %err, "connect failed");
                Err(err)
            }
        }
    }

    /// Store the nonce the user typed; it is consumed by the next signing attempt
    pub fn enter_nonce(&self, nonce: impl Into<String>) -> Result<()> {
        self.lock_session().set_nonce_input(nonce.into())
    }

    /// Build the SIWE message from the stored nonce and have the wallet sign it
    ///
    /// The nonce input is cleared on every attempt. On failure the state stays
    /// `Connected` and no signature is recorded.
    pub async fn generate_signature(&self) -> Result<SignatureResult> {
        let _in_flight = self.begin(Operation::Sign)?;

        let (account, text, epoch) = {
            let mut session = self.lock_session();
            let account = match session.state() {
                AuthState::Disconnected => return Err(AuthError::NotConnected),
                AuthState::Authenticated => {
                    return Err(AuthError::InvalidTransition {
                        from: AuthState::Authenticated,
                        action: AuthAction::SignSucceeded,
                    });
                }
                AuthState::Connected => session.account().cloned().ok_or(AuthError::NotConnected)?,
            };
            let issued_at = (self.clock)();
            let expires_at = self.expiration_for(issued_at)?;

            let nonce = session.take_nonce_input().unwrap_or_default();
            self.config.nonce_policy.validate(&nonce)?;

            let mut message = siwe::build(
                &nonce,
                account.address,
                self.config.chain_id,
                &self.config.uri,
                &self.config.domain,
                issued_at,
            )?;
            if let Some(expires_at) = expires_at {
                message = message.with_expiration_time(expires_at);
            }

            let text = message.prepare_message();
            session.message_built(text.clone());
            (account, text, self.current_epoch())
        };

        debug!(address = %account.checksum_address(), "message built, awaiting signature");
        let result = self.signing.sign(&text, &account).await;
        if self.current_epoch() != epoch {
            return Err(AuthError::Superseded(Operation::Sign));
        }

        let signature = match result {
            Ok(signature) => signature,
            Err(err) => {
                warn!(address = %account.checksum_address(), error = %err, "signing failed");
                return Err(err);
            }
        };
        let session_id = {
            let mut session = self.lock_session();
            session.signed(signature.clone())?;
            session.id()
        };
        info!(session_id = %session_id, address = %account.checksum_address(), "signed in");
        Ok(signature)
    }

    /// Submit the recorded signature and store the verdict as `server_verified`
    pub async fn verify(&self, verifier: &dyn SignatureVerifier) -> Result<bool> {
        let _in_flight = self.begin(Operation::Verify)?;

        let (request, epoch) = {
            let session = self.lock_session();
            let signature = match session.state() {
                AuthState::Disconnected => return Err(AuthError::NotConnected),
                AuthState::Connected => {
                    return Err(AuthError::InvalidTransition {
                        from: AuthState::Connected,
                        action: AuthAction::Verified,
                    });
                }
                AuthState::Authenticated => session.signature().ok_or(AuthError::NotConnected)?,
            };
            (VerificationRequest::from(signature), self.current_epoch())
        };

        let response = verifier.verify(&request).await?;
        if self.current_epoch() != epoch {
            return Err(AuthError::Superseded(Operation::Verify));
        }

        self.lock_session().verified(response.authenticated)?;
        info!(address = %request.address, verified = response.authenticated, "verification finished");
        Ok(response.authenticated)
    }

    /// End the session; safe to call in any state and any number of times
    pub async fn disconnect(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let (session_id, previous) = {
            let mut session = self.lock_session();
            let ended = (session.id(), session.state());
            session.reset();
            ended
        };
        self.connections.disconnect().await;
        info!(session_id = %session_id, previous = ?previous, "disconnected");
    }

    /// Reset the session if the wallet went away or switched accounts outside
    /// this machine. Returns whether a reset happened.
    pub fn sync_with_runtime(&self) -> bool {
        let status = self.runtime.status();
        let mut session = self.lock_session();
        let stale = match (session.account(), &status) {
            (None, _) => return false,
            (Some(_), ConnectionStatus::Disconnected) => true,
            (Some(account), ConnectionStatus::Connected { address, .. }) => {
                account.address != *address
            }
        };
        if stale {
            info!(status = ?status, "wallet changed outside the session, resetting");
            self.epoch.fetch_add(1, Ordering::SeqCst);
            session.reset();
        }
        stale
    }

    fn begin(&self, operation: Operation) -> Result<InFlight<'_>> {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = *slot {
            debug!(requested = %operation, pending = %current, "operation rejected");
            return Err(AuthError::OperationInProgress(current));
        }
        *slot = Some(operation);
        Ok(InFlight {
            slot: &self.in_flight,
        })
    }

    /// `Expiration Time` for a message issued at `issued_at`, if configured
    fn expiration_for(&self, issued_at: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        let Some(secs) = self.config.expiration_secs else {
            return Ok(None);
        };
        i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .map(Some)
            .ok_or_else(|| AuthError::Config(format!("expiration_secs {secs} out of range")))
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn lock_session(&self) -> MutexGuard<'_, AuthSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/*
[INPUT]:  Mock and local-key wallets behind an in-memory runtime
[OUTPUT]: Test results for the sign-in lifecycle
[POS]:    Integration tests - auth state machine
[UPDATE]: When auth commands or transitions change
*/

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{machine_with, metamask_local_key, metamask_mock, test_config, test_issued_at};
use siwe_auth::wallet::{Capabilities, MockOutcome};
use siwe_auth::{
    AuthError, AuthState, Connector, LocalVerifier, NoncePolicy, WalletKey, WalletRegistry,
    WalletRuntime, fixed_clock,
};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_full_sign_in_then_disconnect() {
    let connector = metamask_mock();
    let calls = connector.calls();
    let address = connector.address();
    let (machine, runtime) = machine_with(test_config(), vec![Arc::new(connector) as Arc<dyn Connector>]);

    let account = assert_ok!(machine.connect(WalletKey::Metamask).await);
    assert_eq!(account.address, address);
    assert_eq!(machine.state(), AuthState::Connected);

    assert_ok!(machine.enter_nonce("abcdefgh"));
    let signature = assert_ok!(machine.generate_signature().await);
    assert_eq!(machine.state(), AuthState::Authenticated);

    let expected = format!(
        "app.example.com wants you to sign in with your Ethereum account:\n\
         {}\n\
         \n\
         Sign in with Ethereum\n\
         \n\
         URI: https://app.example.com\n\
         Version: 1\n\
         Chain ID: 97\n\
         Nonce: abcdefgh\n\
         Issued At: 2024-05-01T12:00:00.000Z",
        address.to_checksum(None)
    );
    assert_eq!(signature.message_text, expected);
    assert_eq!(calls.signed_messages(), vec![expected]);

    machine.disconnect().await;
    let session = machine.session();
    assert_eq!(session.state(), AuthState::Disconnected);
    assert!(session.account().is_none());
    assert!(session.signature().is_none());
    assert!(!runtime.status().is_connected());
    assert_eq!(calls.disconnect(), 1);
}

#[tokio::test]
async fn test_whitespace_nonce_is_rejected() {
    let (machine, _runtime) = machine_with(test_config(), vec![Arc::new(metamask_mock()) as Arc<dyn Connector>]);
    assert_ok!(machine.connect(WalletKey::Metamask).await);

    assert_ok!(machine.enter_nonce("   "));
    let err = assert_err!(machine.generate_signature().await);
    assert!(matches!(err, AuthError::InvalidNonce(_)));
    assert_eq!(machine.state(), AuthState::Connected);

    // the failed attempt cleared the input, a retry with a real nonce succeeds
    assert!(machine.session().nonce_input().is_none());
    assert_ok!(machine.enter_nonce("abcdefgh"));
    assert_ok!(machine.generate_signature().await);
}

#[tokio::test]
async fn test_strict_nonce_policy() {
    let config = test_config().with_nonce_policy(NoncePolicy::Strict);
    let (machine, _runtime) = machine_with(config, vec![Arc::new(metamask_mock()) as Arc<dyn Connector>]);
    assert_ok!(machine.connect(WalletKey::Metamask).await);

    assert_ok!(machine.enter_nonce("short"));
    assert!(matches!(
        machine.generate_signature().await,
        Err(AuthError::InvalidNonce(_))
    ));

    assert_ok!(machine.enter_nonce("Nonce1234"));
    assert_ok!(machine.generate_signature().await);
}

#[tokio::test]
async fn test_wallet_not_installed() {
    let (machine, _runtime) = machine_with(test_config(), vec![Arc::new(metamask_mock()) as Arc<dyn Connector>]);

    let err = assert_err!(machine.connect(WalletKey::Coinbase).await);
    match &err {
        AuthError::WalletNotFound { wallet, stable_id, .. } => {
            assert_eq!(*wallet, WalletKey::Coinbase);
            assert_eq!(stable_id, "com.coinbase.wallet");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.prompts_install());
    assert_eq!(machine.state(), AuthState::Disconnected);

    let wallets = machine.available_wallets();
    assert_eq!(wallets.len(), 2);
    assert!(wallets.iter().any(|w| w.descriptor.key == WalletKey::Metamask && w.installed));
    assert!(wallets.iter().any(|w| w.descriptor.key == WalletKey::Coinbase && !w.installed));
}

#[tokio::test]
async fn test_connector_without_chain_switch() {
    let connector = metamask_mock()
        .with_chain(None)
        .with_capabilities(Capabilities {
            switch_chain: false,
            ..Capabilities::ALL
        });
    let (machine, runtime) = machine_with(test_config(), vec![Arc::new(connector) as Arc<dyn Connector>]);

    let account = assert_ok!(machine.connect(WalletKey::Metamask).await);
    assert_eq!(account.chain_id, 97);
    assert!(runtime.status().is_connected());
}

#[tokio::test]
async fn test_wrong_chain_after_connect_is_dropped() {
    let connector = metamask_mock().with_chain(Some(56)).with_capabilities(Capabilities {
        switch_chain: false,
        ..Capabilities::ALL
    });
    let (machine, runtime) = machine_with(test_config(), vec![Arc::new(connector) as Arc<dyn Connector>]);

    let err = assert_err!(machine.connect(WalletKey::Metamask).await);
    assert!(matches!(err, AuthError::ChainSwitchFailed { chain_id: 97, .. }));
    assert_eq!(machine.state(), AuthState::Disconnected);
    assert!(!runtime.status().is_connected());
}

#[tokio::test]
async fn test_connect_rejected_by_user() {
    let connector = metamask_mock().with_connect_outcome(MockOutcome::Reject);
    let (machine, _runtime) = machine_with(test_config(), vec![Arc::new(connector) as Arc<dyn Connector>]);

    let err = assert_err!(machine.connect(WalletKey::Metamask).await);
    assert!(err.is_user_rejection());
    assert_eq!(machine.state(), AuthState::Disconnected);
}

#[tokio::test]
async fn test_local_key_sign_in_verifies_locally() {
    let wallet = metamask_local_key();
    let address = wallet.address();
    let (machine, _runtime) = machine_with(test_config(), vec![Arc::new(wallet) as Arc<dyn Connector>]);

    assert_ok!(machine.connect(WalletKey::Metamask).await);
    assert_ok!(machine.enter_nonce("abcdefgh"));
    let signature = assert_ok!(machine.generate_signature().await);
    assert_eq!(signature.address, address);
    assert!(signature.signature_hex.starts_with("0x"));
    assert_eq!(signature.signature_hex.len(), 132);

    let verifier = LocalVerifier::new("app.example.com", 97).with_clock(fixed_clock(test_issued_at()));
    assert!(assert_ok!(machine.verify(&verifier).await));
    assert!(machine.session().is_server_verified());

    // a verifier expecting another domain says no, local auth stays
    let other = LocalVerifier::new("other.example.com", 97).with_clock(fixed_clock(test_issued_at()));
    assert!(!assert_ok!(machine.verify(&other).await));
    assert!(machine.session().is_authenticated());
    assert!(!machine.session().is_server_verified());
}

#[test]
fn test_registry_stable_ids_are_unique() {
    let registry = WalletRegistry::default();
    let ids: HashSet<_> = registry.descriptors().map(|d| d.stable_id).collect();
    assert_eq!(ids.len(), WalletKey::ALL.len());
}

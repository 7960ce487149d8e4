/*
[INPUT]:  Local EVM key standing in for a browser wallet
[OUTPUT]: Signed SIWE message and its local verification
[POS]:    Examples - sign-in flow demonstration
[UPDATE]: When auth flow changes
*/

use std::sync::Arc;

use siwe_auth::*;

/// Example: Sign-in flow
///
/// This example demonstrates the complete sign-in flow:
/// 1. Expose a wallet connector through the wallet runtime
/// 2. Create the auth state machine
/// 3. Connect the wallet (switching to the required chain)
/// 4. Enter a nonce and sign the SIWE message
/// 5. Verify the signature
#[tokio::main]
async fn main() {
    println!("=== Sign-In with Ethereum Example ===\n");

    // Step 1: Wallet runtime with a MetaMask stand-in on mainnet
    let wallet = match LocalKeyConnector::new(
        "io.metamask",
        "Metamask",
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        1,
        vec![1, 97],
    ) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Failed to load wallet: {}", e);
            return;
        }
    };
    let runtime = Arc::new(InMemoryWalletRuntime::with_connectors(vec![
        Arc::new(wallet) as Arc<dyn Connector>,
    ]));
    println!("✓ Wallet runtime ready");

    // Step 2: State machine for http://localhost:3000 on BSC testnet
    let config = match AuthConfig::from_origin("http://localhost:3000") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid origin: {}", e);
            return;
        }
    };
    let machine = match AuthStateMachine::new(config, WalletRegistry::default(), runtime) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to create state machine: {}", e);
            return;
        }
    };

    // Step 3: Connect
    match machine.connect(WalletKey::Metamask).await {
        Ok(account) => println!(
            "✓ Connected {} on chain {}",
            account.checksum_address(),
            account.chain_id
        ),
        Err(e) => {
            eprintln!("Connect failed: {}", e);
            return;
        }
    }

    // Step 4: Nonce and signature
    if let Err(e) = machine.enter_nonce("abcdefgh") {
        eprintln!("Nonce rejected: {}", e);
        return;
    }
    let signature = match machine.generate_signature().await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Signing failed: {}", e);
            return;
        }
    };
    println!("\n{}\n", signature.message_text);
    println!("✓ Signature: {}", signature.signature_hex);

    // Step 5: Verify
    let verifier = LocalVerifier::new("localhost:3000", BSC_TESTNET_CHAIN_ID);
    match machine.verify(&verifier).await {
        Ok(verified) => println!("✓ Verified: {}", verified),
        Err(e) => eprintln!("Verification failed: {}", e),
    }

    machine.disconnect().await;
    println!("\n✓ Sign-in example complete");
}

/*
[INPUT]:  Signed SIWE text, EIP-191 signature, claimed address
[OUTPUT]: Verdict from re-parsing the message and recovering the signer
[POS]:    Verification layer - in-process verifier
[UPDATE]: When message checks or signature recovery change
*/

use std::str::FromStr;

use alloy_primitives::{Address, Signature};
use async_trait::async_trait;
use tracing::debug;

use crate::error::{AuthError, Result};
use crate::siwe::SiweMessage;
use crate::types::{ChainId, Clock, system_clock};

use super::{SignatureVerifier, VerificationRequest, VerificationResponse};

/// Checks a signed message without a backend
///
/// The message must parse, name the expected domain and chain, be inside its
/// time window, and the signature must recover to the claimed address.
pub struct LocalVerifier {
    domain: String,
    chain_id: ChainId,
    clock: Clock,
}

impl LocalVerifier {
    pub fn new(domain: impl Into<String>, chain_id: ChainId) -> Self {
        Self {
            domain: domain.into(),
            chain_id,
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn rejected(reason: &str) -> Result<VerificationResponse> {
        debug!(reason, "signature rejected");
        Ok(VerificationResponse {
            authenticated: false,
        })
    }
}

/// Address that produced an EIP-191 personal signature over `message`
pub fn recover_signer(message: &str, signature_hex: &str) -> Result<Address> {
    let digits = signature_hex.trim().trim_start_matches("0x");
    let bytes = hex::decode(digits)
        .map_err(|e| AuthError::Verification(format!("signature is not hex: {e}")))?;
    let signature = Signature::from_raw(&bytes)
        .map_err(|e| AuthError::Verification(format!("malformed signature: {e}")))?;
    signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|e| AuthError::Verification(format!("signer recovery failed: {e}")))
}

#[async_trait]
impl SignatureVerifier for LocalVerifier {
    async fn verify(&self, request: &VerificationRequest) -> Result<VerificationResponse> {
        let message = SiweMessage::from_str(&request.message)?;
        let claimed = Address::from_str(request.address.trim())
            .map_err(|e| AuthError::Verification(format!("invalid address: {e}")))?;

        if message.domain != self.domain {
            return Self::rejected("domain mismatch");
        }
        if message.chain_id != self.chain_id {
            return Self::rejected("chain mismatch");
        }
        if message.address != claimed {
            return Self::rejected("address mismatch");
        }
        if !message.is_valid_at((self.clock)()) {
            return Self::rejected("outside validity window");
        }

        let signer = recover_signer(&request.message, &request.signature)?;
        if signer != claimed {
            return Self::rejected("signer mismatch");
        }
        Ok(VerificationResponse {
            authenticated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    use crate::siwe;
    use crate::types::fixed_clock;
    use crate::wallet::{Connector, LocalKeyConnector};

    const PK: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn issued_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    async fn signed_request(message: &SiweMessage) -> VerificationRequest {
        let wallet = LocalKeyConnector::new("io.metamask", "Metamask", PK, 97, vec![97]).unwrap();
        let text = message.prepare_message();
        let signature = wallet.sign_message(wallet.address(), &text).await.unwrap();
        VerificationRequest {
            message: text,
            signature,
            address: wallet.address().to_checksum(None),
        }
    }

    fn message() -> SiweMessage {
        let wallet = LocalKeyConnector::new("io.metamask", "Metamask", PK, 97, vec![97]).unwrap();
        siwe::build(
            "abcdefgh",
            wallet.address(),
            97,
            "https://app.example.com",
            "app.example.com",
            issued_at(),
        )
        .unwrap()
    }

    fn verifier() -> LocalVerifier {
        LocalVerifier::new("app.example.com", 97).with_clock(fixed_clock(issued_at()))
    }

    #[tokio::test]
    async fn test_valid_signature_authenticates() {
        let request = signed_request(&message()).await;
        assert_eq!(
            recover_signer(&request.message, &request.signature)
                .unwrap()
                .to_checksum(None),
            request.address
        );
        let response = verifier().verify(&request).await.unwrap();
        assert!(response.authenticated);
    }

    #[tokio::test]
    async fn test_tampered_message_is_rejected() {
        let mut request = signed_request(&message()).await;
        request.message = request.message.replace("Nonce: abcdefgh", "Nonce: abcdefgi");
        let response = verifier().verify(&request).await.unwrap();
        assert!(!response.authenticated);
    }

    #[tokio::test]
    async fn test_wrong_domain_or_chain_is_rejected() {
        let request = signed_request(&message()).await;
        let other_domain = LocalVerifier::new("evil.example.com", 97).with_clock(fixed_clock(issued_at()));
        assert!(!other_domain.verify(&request).await.unwrap().authenticated);
        let other_chain = LocalVerifier::new("app.example.com", 56).with_clock(fixed_clock(issued_at()));
        assert!(!other_chain.verify(&request).await.unwrap().authenticated);
    }

    #[tokio::test]
    async fn test_expired_message_is_rejected() {
        let message = message().with_expiration_time(issued_at() + Duration::minutes(5));
        let request = signed_request(&message).await;
        let later = LocalVerifier::new("app.example.com", 97)
            .with_clock(fixed_clock(issued_at() + Duration::minutes(10)));
        assert!(!later.verify(&request).await.unwrap().authenticated);
        assert!(verifier().verify(&request).await.unwrap().authenticated);
    }

    #[tokio::test]
    async fn test_malformed_signature_is_an_error() {
        let mut request = signed_request(&message()).await;
        request.signature = "0x1234".to_string();
        let err = verifier().verify(&request).await.unwrap_err();
        assert!(matches!(err, AuthError::Verification(_)));
    }
}

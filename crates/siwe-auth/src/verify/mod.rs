/*
[INPUT]:  Signed SIWE text, signature and signer address
[OUTPUT]: Server-side authentication verdict
[POS]:    Verification layer - consumed backend interface and its implementations
[UPDATE]: When the verification contract changes
*/

pub mod http;
pub mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::SignatureResult;

pub use http::HttpVerifier;
pub use local::LocalVerifier;

/// Payload submitted for verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub message: String,
    pub signature: String,
    pub address: String,
}

impl From<&SignatureResult> for VerificationRequest {
    fn from(result: &SignatureResult) -> Self {
        Self {
            message: result.message_text.clone(),
            signature: result.signature_hex.clone(),
            address: result.address.to_checksum(None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub authenticated: bool,
}

/// Something that decides whether a signed message authenticates its signer
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn verify(&self, request: &VerificationRequest) -> Result<VerificationResponse>;
}

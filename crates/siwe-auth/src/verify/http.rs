/*
[INPUT]:  Verifier endpoint configuration (URL, timeouts)
[OUTPUT]: Verification verdicts from the backend over HTTP
[POS]:    Verification layer - reqwest client for the verify endpoint
[UPDATE]: When the verify endpoint contract or client behavior changes
*/

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::config::VerifierConfig;
use crate::error::{AuthError, Result};

use super::{SignatureVerifier, VerificationRequest, VerificationResponse};

/// Posts signed messages to a backend verify endpoint
///
/// POST {endpoint}  body: `{message, signature, address}`  →  `{authenticated}`
#[derive(Debug, Clone)]
pub struct HttpVerifier {
    http_client: Client,
    endpoint: Url,
}

impl HttpVerifier {
    pub fn new(config: &VerifierConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            http_client,
            endpoint: Url::parse(&config.endpoint)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SignatureVerifier for HttpVerifier {
    async fn verify(&self, request: &VerificationRequest) -> Result<VerificationResponse> {
        debug!(endpoint = %self.endpoint, address = %request.address, "submitting signature for verification");
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "verification endpoint returned an error");
            return Err(AuthError::api_error(status, body));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

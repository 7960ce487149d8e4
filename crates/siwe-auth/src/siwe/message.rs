/*
[INPUT]:  Nonce, account address, chain id, origin URI, domain, issue time
[OUTPUT]: EIP-4361 message value and its canonical plaintext
[POS]:    SIWE layer - message construction and parsing
[UPDATE]: When message fields or the text layout change
*/

use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;
use chrono::{DateTime, SecondsFormat, Utc};
use url::Url;

use crate::error::{AuthError, Result};
use crate::types::ChainId;

use super::NoncePolicy;

pub const SIWE_VERSION: &str = "1";
pub const DEFAULT_STATEMENT: &str = "Sign in with Ethereum";

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";
const URI_TAG: &str = "URI: ";
const VERSION_TAG: &str = "Version: ";
const CHAIN_TAG: &str = "Chain ID: ";
const NONCE_TAG: &str = "Nonce: ";
const ISSUED_AT_TAG: &str = "Issued At: ";
const EXPIRATION_TAG: &str = "Expiration Time: ";
const NOT_BEFORE_TAG: &str = "Not Before: ";
const REQUEST_ID_TAG: &str = "Request ID: ";
const RESOURCES_TAG: &str = "Resources:";

/// RFC 3339 instant that keeps the text it was written with
///
/// Parsed messages must re-serialize to the exact bytes that were signed,
/// so the original rendering is kept next to the instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    instant: DateTime<Utc>,
    text: String,
}

impl Timestamp {
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            text: instant.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl FromStr for Timestamp {
    type Err = AuthError;

    fn from_str(text: &str) -> Result<Self> {
        let instant = DateTime::parse_from_rfc3339(text)
            .map_err(|e| AuthError::InvalidMessage(format!("invalid timestamp '{text}': {e}")))?
            .with_timezone(&Utc);
        Ok(Self {
            instant,
            text: text.to_string(),
        })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Structured Sign-In with Ethereum message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiweMessage {
    pub domain: String,
    pub address: Address,
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: ChainId,
    pub nonce: String,
    pub issued_at: Timestamp,
    pub expiration_time: Option<Timestamp>,
    pub not_before: Option<Timestamp>,
    pub request_id: Option<String>,
    pub resources: Vec<String>,
}

/// Build the sign-in message for one signing attempt
///
/// Only rejects an empty (or whitespace-only) nonce; stricter nonce rules
/// belong to the caller. Identical inputs always give identical text.
pub fn build(
    nonce: &str,
    address: Address,
    chain_id: ChainId,
    origin_uri: &str,
    domain: &str,
    issued_at: DateTime<Utc>,
) -> Result<SiweMessage> {
    NoncePolicy::Lenient.validate(nonce)?;
    if domain.trim().is_empty() {
        return Err(AuthError::InvalidMessage("domain is required".to_string()));
    }
    Url::parse(origin_uri)
        .map_err(|e| AuthError::InvalidMessage(format!("invalid uri '{origin_uri}': {e}")))?;

    Ok(SiweMessage {
        domain: domain.to_string(),
        address,
        statement: Some(DEFAULT_STATEMENT.to_string()),
        uri: origin_uri.to_string(),
        version: SIWE_VERSION.to_string(),
        chain_id,
        nonce: nonce.to_string(),
        issued_at: Timestamp::from(issued_at),
        expiration_time: None,
        not_before: None,
        request_id: None,
        resources: Vec::new(),
    })
}

impl SiweMessage {
    pub fn with_expiration_time(mut self, at: DateTime<Utc>) -> Self {
        self.expiration_time = Some(Timestamp::from(at));
        self
    }

    pub fn with_not_before(mut self, at: DateTime<Utc>) -> Self {
        self.not_before = Some(Timestamp::from(at));
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources = resources;
        self
    }

    /// Canonical plaintext handed to the wallet for signing
    pub fn prepare_message(&self) -> String {
        self.to_string()
    }

    /// Check the time window at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let not_expired = self
            .expiration_time
            .as_ref()
            .is_none_or(|expiry| now < expiry.instant());
        let started = self
            .not_before
            .as_ref()
            .is_none_or(|start| now >= start.instant());
        not_expired && started
    }
}

impl fmt::Display for SiweMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}{HEADER_SUFFIX}", self.domain)?;
        writeln!(f, "{}", self.address.to_checksum(None))?;
        match &self.statement {
            Some(statement) => write!(f, "\n{statement}\n\n")?,
            None => f.write_str("\n\n")?,
        }
        writeln!(f, "{URI_TAG}{}", self.uri)?;
        writeln!(f, "{VERSION_TAG}{}", self.version)?;
        writeln!(f, "{CHAIN_TAG}{}", self.chain_id)?;
        writeln!(f, "{NONCE_TAG}{}", self.nonce)?;
        write!(f, "{ISSUED_AT_TAG}{}", self.issued_at)?;
        if let Some(expiration_time) = &self.expiration_time {
            write!(f, "\n{EXPIRATION_TAG}{expiration_time}")?;
        }
        if let Some(not_before) = &self.not_before {
            write!(f, "\n{NOT_BEFORE_TAG}{not_before}")?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, "\n{REQUEST_ID_TAG}{request_id}")?;
        }
        if !self.resources.is_empty() {
            write!(f, "\n{RESOURCES_TAG}")?;
            for resource in &self.resources {
                write!(f, "\n- {resource}")?;
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> AuthError {
    AuthError::InvalidMessage(reason.into())
}

fn tagged<'a>(line: Option<&'a str>, tag: &str) -> Result<&'a str> {
    line.and_then(|line| line.strip_prefix(tag))
        .ok_or_else(|| invalid(format!("expected '{}' line", tag.trim_end())))
}

impl FromStr for SiweMessage {
    type Err = AuthError;

    /// Parse canonical plaintext back into its fields
    fn from_str(text: &str) -> Result<Self> {
        let mut lines = text.split('\n').peekable();

        let domain = lines
            .next()
            .and_then(|line| line.strip_suffix(HEADER_SUFFIX))
            .filter(|domain| !domain.is_empty())
            .ok_or_else(|| invalid("missing header line"))?
            .to_string();

        let address_line = lines.next().ok_or_else(|| invalid("missing address"))?;
        let address = Address::parse_checksummed(address_line, None)
            .map_err(|e| invalid(format!("invalid address '{address_line}': {e}")))?;

        if lines.next() != Some("") {
            return Err(invalid("expected blank line after address"));
        }
        let statement = match lines.next() {
            Some("") => None,
            Some(statement) => {
                if lines.next() != Some("") {
                    return Err(invalid("expected blank line after statement"));
                }
                Some(statement.to_string())
            }
            None => return Err(invalid("message ends after address")),
        };

        let uri = tagged(lines.next(), URI_TAG)?.to_string();
        let version = tagged(lines.next(), VERSION_TAG)?.to_string();
        if version != SIWE_VERSION {
            return Err(invalid(format!("unsupported version '{version}'")));
        }
        let chain_id = tagged(lines.next(), CHAIN_TAG)?
            .parse::<ChainId>()
            .map_err(|e| invalid(format!("invalid chain id: {e}")))?;
        let nonce = tagged(lines.next(), NONCE_TAG)?.to_string();
        if nonce.trim().is_empty() {
            return Err(AuthError::InvalidNonce("nonce is required".to_string()));
        }
        let issued_at = tagged(lines.next(), ISSUED_AT_TAG)?.parse::<Timestamp>()?;

        let mut message = SiweMessage {
            domain,
            address,
            statement,
            uri,
            version,
            chain_id,
            nonce,
            issued_at,
            expiration_time: None,
            not_before: None,
            request_id: None,
            resources: Vec::new(),
        };

        if let Some(value) = lines.next_if(|line| line.starts_with(EXPIRATION_TAG)) {
            message.expiration_time = Some(tagged(Some(value), EXPIRATION_TAG)?.parse()?);
        }
        if let Some(value) = lines.next_if(|line| line.starts_with(NOT_BEFORE_TAG)) {
            message.not_before = Some(tagged(Some(value), NOT_BEFORE_TAG)?.parse()?);
        }
        if let Some(value) = lines.next_if(|line| line.starts_with(REQUEST_ID_TAG)) {
            message.request_id = Some(tagged(Some(value), REQUEST_ID_TAG)?.to_string());
        }
        if lines.next_if_eq(&RESOURCES_TAG).is_some() {
            while let Some(resource) = lines.next_if(|line| line.starts_with("- ")) {
                message.resources.push(resource[2..].to_string());
            }
        }

        if let Some(extra) = lines.next() {
            return Err(invalid(format!("unexpected line '{extra}'")));
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::MOCK_ADDRESS;

    fn issued_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn sample() -> SiweMessage {
        build(
            "abcdefgh",
            MOCK_ADDRESS,
            97,
            "https://app.example.com",
            "app.example.com",
            issued_at(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_canonical_text() {
        let expected = "app.example.com wants you to sign in with your Ethereum account:\n\
0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266\n\
\n\
Sign in with Ethereum\n\
\n\
URI: https://app.example.com\n\
Version: 1\n\
Chain ID: 97\n\
Nonce: abcdefgh\n\
Issued At: 2024-05-01T12:00:00.000Z";
        assert_eq!(sample().prepare_message(), expected);
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(sample().prepare_message(), sample().prepare_message());
        assert_eq!(sample(), sample());
    }

    #[test]
    fn test_build_rejects_blank_nonce() {
        for nonce in ["", " ", "\t\n"] {
            let err = build(nonce, MOCK_ADDRESS, 97, "https://a.b", "a.b", issued_at()).unwrap_err();
            assert!(matches!(err, AuthError::InvalidNonce(_)), "nonce {nonce:?}");
        }
    }

    #[test]
    fn test_build_rejects_nonce_with_line_break() {
        let err = build(
            "abcdefgh\nResources:\n- https://evil.example",
            MOCK_ADDRESS,
            97,
            "https://a.b",
            "a.b",
            issued_at(),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::InvalidNonce(_)));
    }

    #[test]
    fn test_build_rejects_bad_uri_and_domain() {
        let err = build("abcdefgh", MOCK_ADDRESS, 97, "not a uri", "a.b", issued_at()).unwrap_err();
        assert!(matches!(err, AuthError::InvalidMessage(_)));
        let err = build("abcdefgh", MOCK_ADDRESS, 97, "https://a.b", "", issued_at()).unwrap_err();
        assert!(matches!(err, AuthError::InvalidMessage(_)));
    }

    #[test]
    fn test_short_nonce_is_accepted_by_builder() {
        let message = build("1", MOCK_ADDRESS, 97, "https://a.b", "a.b", issued_at()).unwrap();
        assert_eq!(message.nonce, "1");
    }

    #[test]
    fn test_parse_inverts_prepare() {
        let text = sample().prepare_message();
        let parsed: SiweMessage = text.parse().unwrap();
        assert_eq!(parsed, sample());
        assert_eq!(parsed.prepare_message(), text);
    }

    #[test]
    fn test_parse_keeps_optional_fields_and_timestamp_text() {
        let message = sample()
            .with_expiration_time(issued_at() + chrono::Duration::minutes(10))
            .with_request_id("req-1")
            .with_resources(vec![
                "ipfs://bafybeiemxf5abjwjbikoz4mc3a3dla6ual3jsgpdr4cjr3oz3evfyavhwq".to_string(),
                "https://example.com/terms".to_string(),
            ]);
        let text = message.prepare_message();
        assert!(text.ends_with("Resources:\n- ipfs://bafybeiemxf5abjwjbikoz4mc3a3dla6ual3jsgpdr4cjr3oz3evfyavhwq\n- https://example.com/terms"));
        assert_eq!(text.parse::<SiweMessage>().unwrap(), message);

        // seconds precision survives a parse/print cycle
        let seconds = text.replace("Issued At: 2024-05-01T12:00:00.000Z", "Issued At: 2024-05-01T12:00:00Z");
        let reparsed: SiweMessage = seconds.parse().unwrap();
        assert_eq!(reparsed.issued_at.as_str(), "2024-05-01T12:00:00Z");
        assert_eq!(reparsed.prepare_message(), seconds);
    }

    #[test]
    fn test_message_without_statement() {
        let mut message = sample();
        message.statement = None;
        let text = message.prepare_message();
        assert!(text.contains("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266\n\n\nURI: "));
        assert_eq!(text.parse::<SiweMessage>().unwrap(), message);
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        let text = sample().prepare_message();
        assert!("".parse::<SiweMessage>().is_err());
        assert!(text.replace("Version: 1", "Version: 2").parse::<SiweMessage>().is_err());
        assert!(text.replace("Chain ID: 97", "Chain ID: x").parse::<SiweMessage>().is_err());
        assert!(format!("{text}\ntrailing").parse::<SiweMessage>().is_err());
        // wrong EIP-55 casing
        let bad_checksum = text.replace("0xf39Fd6e5", "0xF39Fd6e5");
        assert!(bad_checksum.parse::<SiweMessage>().is_err());
    }

    #[test]
    fn test_time_window() {
        let start = issued_at();
        let message = sample()
            .with_not_before(start)
            .with_expiration_time(start + chrono::Duration::minutes(5));
        assert!(!message.is_valid_at(start - chrono::Duration::seconds(1)));
        assert!(message.is_valid_at(start));
        assert!(!message.is_valid_at(start + chrono::Duration::minutes(5)));
        assert!(sample().is_valid_at(start - chrono::Duration::days(1)));
    }
}

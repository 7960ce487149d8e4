/*
[INPUT]:  Raw nonce text entered by the user
[OUTPUT]: Accepted nonce or InvalidNonce
[POS]:    SIWE layer - caller-level nonce rules
[UPDATE]: When nonce acceptance rules change
*/

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

pub const STRICT_MIN_NONCE_LEN: usize = 8;

/// How strictly a typed nonce is checked before a message is built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoncePolicy {
    /// Any non-blank single-line text
    #[default]
    Lenient,
    /// At least 8 ASCII letters or digits, nothing else
    Strict,
}

impl NoncePolicy {
    pub fn validate(&self, nonce: &str) -> Result<()> {
        if nonce.trim().is_empty() {
            return Err(AuthError::InvalidNonce("nonce is required".to_string()));
        }
        // the nonce must stay on its own line of the signed text
        if nonce.chars().any(char::is_control) {
            return Err(AuthError::InvalidNonce(
                "nonce must not contain line breaks or control characters".to_string(),
            ));
        }
        if *self == NoncePolicy::Lenient {
            return Ok(());
        }
        if nonce.len() < STRICT_MIN_NONCE_LEN {
            return Err(AuthError::InvalidNonce(format!(
                "nonce must be at least {STRICT_MIN_NONCE_LEN} characters"
            )));
        }
        if !nonce.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AuthError::InvalidNonce(
                "nonce may only contain letters and digits".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abcdefgh", true)]
    #[case("12345678", true)]
    #[case("a1b2c3d4e5", true)]
    #[case("abc", false)]
    #[case("abcd efgh", false)]
    #[case("abcdefg!", false)]
    #[case("", false)]
    fn test_strict_policy(#[case] nonce: &str, #[case] accepted: bool) {
        assert_eq!(NoncePolicy::Strict.validate(nonce).is_ok(), accepted);
    }

    #[rstest]
    #[case("x", true)]
    #[case("has space", true)]
    #[case("", false)]
    #[case("   ", false)]
    #[case("abcdefgh\nURI: https://evil.example", false)]
    #[case("abcdefgh\r", false)]
    #[case("abc\tdef", false)]
    #[case("abc\u{0}", false)]
    fn test_lenient_policy(#[case] nonce: &str, #[case] accepted: bool) {
        assert_eq!(NoncePolicy::Lenient.validate(nonce).is_ok(), accepted);
    }
}

//! GitHub webhook signature verification.
//!
//! GitHub signs the raw request body with HMAC-SHA256 and sends the digest in
//! `X-Hub-Signature-256` as `sha256=<hex>`.
//! Reference: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// The only accepted digest prefix.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Signature header problems that prevent verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("X-Hub-Signature-256 header missing")]
    Missing,

    #[error("invalid signature format, must start with sha256=")]
    Format,
}

/// Compute the `sha256=<hex>` signature of `body`.
pub fn sign_payload(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);

    Some(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Verify a GitHub webhook signature.
///
/// # Arguments
///
/// * `secret` - The shared webhook secret
/// * `body` - The request body exactly as received
/// * `signature` - The `X-Hub-Signature-256` header value, if present
///
/// # Returns
///
/// `Ok(true)` when the signature matches, `Ok(false)` on a digest mismatch,
/// and an error when the header is missing or not a `sha256=` digest.
pub fn verify_github_signature(
    secret: &str,
    body: &[u8],
    signature: Option<&str>,
) -> Result<bool, SignatureError> {
    let signature = signature.ok_or(SignatureError::Missing)?;

    if !signature.starts_with(SIGNATURE_PREFIX) {
        return Err(SignatureError::Format);
    }

    let expected = match sign_payload(secret, body) {
        Some(expected) => expected,
        None => {
            warn!("github_signature_invalid_key");
            return Ok(false);
        }
    };
    let valid = constant_time_compare(expected.as_bytes(), signature.as_bytes());

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = signature.len(),
            "github_signature_mismatch"
        );
    }

    Ok(valid)
}

/// Constant-time comparison; buffers of different length never match.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

/// Check if signature verification is enabled.
pub fn is_signature_verification_enabled(secret: &Option<String>) -> bool {
    secret
        .as_ref()
        .map(|k| !k.is_empty())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";
    const BODY: &[u8] = br#"{"repository":{"owner":{"login":"acme"},"name":"widgets"},"action":"opened"}"#;

    #[test]
    fn test_verify_signature_valid() {
        let signature = sign_payload(SECRET, BODY).unwrap();

        assert_eq!(verify_github_signature(SECRET, BODY, Some(&signature)), Ok(true));
    }

    #[test]
    fn test_verify_signature_wrong_secret() {
        let signature = sign_payload(SECRET, BODY).unwrap();

        assert_eq!(
            verify_github_signature("other-secret", BODY, Some(&signature)),
            Ok(false)
        );
    }

    #[test]
    fn test_verify_signature_any_byte_mutation() {
        let signature = sign_payload(SECRET, BODY).unwrap();

        for i in 0..BODY.len() {
            let mut mutated = BODY.to_vec();
            mutated[i] ^= 0x01;
            assert_eq!(
                verify_github_signature(SECRET, &mutated, Some(&signature)),
                Ok(false),
                "mutation at byte {i}"
            );
        }
    }

    #[test]
    fn test_verify_signature_reserialized_body_fails() {
        let signature = sign_payload(SECRET, b"{\"a\": 1}").unwrap();

        assert_eq!(verify_github_signature(SECRET, b"{\"a\":1}", Some(&signature)), Ok(false));
    }

    #[test]
    fn test_verify_signature_missing() {
        assert_eq!(verify_github_signature(SECRET, BODY, None), Err(SignatureError::Missing));
    }

    #[test]
    fn test_verify_signature_bad_prefix() {
        let digest = sign_payload(SECRET, BODY).unwrap();
        let sha1_style = digest.replacen("sha256=", "sha1=", 1);

        for header in ["invalid-format", "", "SHA256=abc", sha1_style.as_str()] {
            assert_eq!(
                verify_github_signature(SECRET, BODY, Some(header)),
                Err(SignatureError::Format),
                "{header}"
            );
        }
    }

    #[test]
    fn test_verify_signature_wrong_length() {
        assert_eq!(
            verify_github_signature(SECRET, BODY, Some("sha256=invalid-signature")),
            Ok(false)
        );
    }

    #[test]
    fn test_sign_payload_known_vector() {
        // Example delivery from the GitHub documentation.
        assert_eq!(
            sign_payload("It's a Secret to Everybody", b"Hello, World!").unwrap(),
            "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17"
        );
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"abc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"abd"));
        assert!(!constant_time_compare(b"abc", b"abcd"));
    }

    #[test]
    fn test_is_signature_verification_enabled() {
        assert!(!is_signature_verification_enabled(&None));
        assert!(!is_signature_verification_enabled(&Some("".to_string())));
        assert!(is_signature_verification_enabled(&Some("   ".to_string())));
        assert!(is_signature_verification_enabled(&Some("key123".to_string())));
    }
}

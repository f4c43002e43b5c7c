//! Webhook Signature Verification
//!
//! HMAC-SHA256 over the raw request body, compared against the
//! `sha256=<hex>` header value in constant time.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::constants::webhook;
use crate::types::{CostwiseError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Constant-time comparison to prevent timing attacks
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Verifies webhook payloads against a shared secret.
pub struct SignatureVerifier {
    secret: SecretString,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl SignatureVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Create from the `WEBHOOK_SECRET` environment variable.
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("WEBHOOK_SECRET")
            .map_err(|_| CostwiseError::Config("WEBHOOK_SECRET not set".to_string()))?;
        Ok(Self::new(SecretString::from(secret)))
    }

    /// Compute the expected header value for a body: `sha256=<hex digest>`.
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(body);
        format!(
            "{}{}",
            webhook::SIGNATURE_PREFIX,
            hex::encode(mac.finalize().into_bytes())
        )
    }

    /// Verify a signature header against the raw body.
    ///
    /// Rejects when the secret is unconfigured, the header is missing, or
    /// the digest does not match.
    pub fn verify(&self, signature: Option<&str>, body: &[u8]) -> Result<()> {
        if self.secret.expose_secret().is_empty() {
            return Err(CostwiseError::Signature(
                "webhook secret is not configured".to_string(),
            ));
        }

        let signature = signature.ok_or_else(|| {
            CostwiseError::Signature("missing signature header".to_string())
        })?;

        let expected = self.sign(body);
        if !constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
            return Err(CostwiseError::Signature("invalid signature".to_string()));
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier(secret: &str) -> SignatureVerifier {
        SignatureVerifier::new(SecretString::from(secret))
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_valid_signature_accepted() {
        let v = verifier("topsecret");
        let body = br#"{"action":"opened"}"#;
        let signature = v.sign(body);
        assert!(signature.starts_with("sha256="));
        assert!(v.verify(Some(&signature), body).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = br#"{"action":"opened"}"#;
        let signature = verifier("wrong-secret").sign(body);

        let err = verifier("topsecret")
            .verify(Some(&signature), body)
            .unwrap_err();
        assert!(matches!(err, CostwiseError::Signature(_)));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let v = verifier("topsecret");
        let signature = v.sign(b"original body");
        assert!(v.verify(Some(&signature), b"tampered body").is_err());
    }

    #[test]
    fn test_missing_signature_rejected() {
        let err = verifier("topsecret").verify(None, b"{}").unwrap_err();
        assert!(err.to_string().contains("missing signature"));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let v = verifier("");
        let signature = v.sign(b"{}");
        assert!(v.verify(Some(&signature), b"{}").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", verifier("topsecret"));
        assert!(!debug.contains("topsecret"));
    }
}

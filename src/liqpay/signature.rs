//! Callback and checkout signatures.
//!
//! The provider signs every message as `base64(sha1(private_key + data + private_key))`
//! where `data` is the already base64-encoded payload string.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

/// Computes the provider signature for an encoded payload.
pub fn sign(private_key: &str, data: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(private_key.as_bytes());
    hasher.update(data.as_bytes());
    hasher.update(private_key.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Returns `true` only when `signature` was produced by [`sign`] with the same key.
///
/// A missing key is never authentic. The comparison runs in constant time over
/// the encoded digests.
pub fn verify(private_key: &str, data: &str, signature: &str) -> bool {
    if private_key.is_empty() {
        return false;
    }

    let expected = sign(private_key, data);
    let expected_bytes = expected.as_bytes();
    let provided_bytes = signature.as_bytes();

    if expected_bytes.len() != provided_bytes.len() {
        return false;
    }

    expected_bytes.ct_eq(provided_bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "sandbox_private_key";

    #[test]
    fn test_sign_is_deterministic_base64_sha1() {
        let a = sign(KEY, "eyJzdGF0dXMiOiJzdWNjZXNzIn0=");
        let b = sign(KEY, "eyJzdGF0dXMiOiJzdWNjZXNzIn0=");

        assert_eq!(a, b);
        // 20 byte digest -> 28 base64 chars
        assert_eq!(a.len(), 28);
        assert!(STANDARD.decode(&a).is_ok());
    }

    #[test]
    fn test_sign_matches_manual_concatenation() {
        let data = "payload";
        let digest = Sha1::digest(format!("{KEY}{data}{KEY}").as_bytes());
        assert_eq!(sign(KEY, data), STANDARD.encode(digest));
    }

    #[test]
    fn test_verify_accepts_own_signature() {
        let data = "eyJvcmRlcl9pZCI6ImZ1c2FmX2Nfcl8xIn0=";
        let signature = sign(KEY, data);
        assert!(verify(KEY, data, &signature));
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let signature = sign(KEY, "original");
        assert!(!verify(KEY, "tampered", &signature));
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let signature = sign("other_key", "payload");
        assert!(!verify(KEY, "payload", &signature));
    }

    #[test]
    fn test_verify_rejects_arbitrary_strings() {
        for forged in ["", "forged", "AAAAAAAAAAAAAAAAAAAAAAAAAAA=", "not base64 at all!!"] {
            assert!(!verify(KEY, "payload", forged));
        }
    }

    #[test]
    fn test_verify_requires_exact_signature() {
        let signature = sign(KEY, "payload");
        for padded in [
            format!(" {signature}"),
            format!("{signature}\n"),
            format!("\t{signature} "),
        ] {
            assert!(!verify(KEY, "payload", &padded));
        }
    }

    #[test]
    fn test_verify_without_key_is_never_authentic() {
        let signature = sign("", "payload");
        assert!(!verify("", "payload", &signature));
    }
}

//! Cryptographic primitives for magic-link codes
//!
//! Codes are HMAC-SHA256 digests rendered as lower-case hex. Presented codes
//! arrive from untrusted requests, so every comparison against a recomputed
//! digest goes through [`constant_time_compare`] rather than `==`.
//!
//! See: <https://cheatsheetseries.owasp.org/cheatsheets/Authentication_Cheat_Sheet.html#compare-password-hashes-using-safe-functions>

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// A keyed HMAC-SHA256 instance.
///
/// The key schedule is computed once; every signature clones the keyed state
/// and feeds it a message.
#[derive(Clone)]
pub struct HmacKey {
    mac: HmacSha256,
}

impl HmacKey {
    /// Build a signer from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKey`] if `key` is empty.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.is_empty() {
            return Err(CryptoError::InvalidKey(
                "key must not be empty".to_string(),
            ));
        }

        let mac = HmacSha256::new_from_slice(key)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        Ok(Self { mac })
    }

    /// Sign `message` and return the digest as 64 lower-case hex characters.
    pub fn sign_hex(&self, message: &[u8]) -> String {
        let mut mac = self.mac.clone();
        mac.update(message);
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacKey").finish_non_exhaustive()
    }
}

/// Perform constant-time comparison of two byte slices.
///
/// The length check leaks only the length, which is public for hex digests.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

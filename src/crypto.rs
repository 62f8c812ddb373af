//! At-rest sealing of token material with AES-256-GCM.
//!
//! The sealing key is derived once by hashing an application-embedded
//! secret with SHA-256. Each seal draws a fresh random nonce, which is
//! prepended to the ciphertext so it can be recovered on open. Sealing
//! failures always surface as errors; there is no plaintext fallback.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

const NONCE_LENGTH: usize = 12;

/// Symmetric sealer for token strings.
pub struct TokenSealer {
    key: [u8; 32],
}

impl std::fmt::Debug for TokenSealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSealer")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl TokenSealer {
    /// Derive the sealing key from `secret` via SHA-256.
    pub fn new(secret: &str) -> Self {
        Self {
            key: Sha256::digest(secret.as_bytes()).into(),
        }
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }

    /// Encrypt `plaintext` and encode nonce + ciphertext as base64.
    pub fn seal(&self, plaintext: &str) -> Result<String, AuthError> {
        let mut nonce = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher()
            .encrypt(&Nonce::from(nonce), plaintext.as_bytes())
            .map_err(|e| AuthError::Storage(format!("token sealing failed: {e}")))?;

        let mut payload = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(payload))
    }

    /// Decode a sealed payload and decrypt it back to the original string.
    pub fn open(&self, sealed: &str) -> Result<String, AuthError> {
        let payload = BASE64
            .decode(sealed)
            .map_err(|e| AuthError::Storage(format!("sealed token is not valid base64: {e}")))?;
        if payload.len() < NONCE_LENGTH {
            return Err(AuthError::Storage(
                "sealed token payload is too short".to_string(),
            ));
        }

        let (nonce, ciphertext) = payload.split_at(NONCE_LENGTH);
        let nonce: [u8; NONCE_LENGTH] = nonce
            .try_into()
            .map_err(|_| AuthError::Storage("invalid nonce length".to_string()))?;
        let plaintext = self
            .cipher()
            .decrypt(&Nonce::from(nonce), ciphertext)
            .map_err(|e| AuthError::Storage(format!("token unsealing failed: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| AuthError::Storage(format!("unsealed token is not valid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_round_trip() {
        let sealer = TokenSealer::new("unit-test-secret");
        let sealed = sealer.seal("access-token-123").unwrap();
        assert_eq!(sealer.open(&sealed).unwrap(), "access-token-123");
    }

    #[test]
    fn seal_produces_distinct_ciphertexts_per_call() {
        let sealer = TokenSealer::new("unit-test-secret");
        let a = sealer.seal("same-token").unwrap();
        let b = sealer.seal("same-token").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn sealed_payload_does_not_contain_plaintext() {
        let sealer = TokenSealer::new("unit-test-secret");
        let sealed = sealer.seal("very-secret-token").unwrap();
        assert!(!sealed.contains("very-secret-token"));
    }

    #[test]
    fn open_rejects_tampered_ciphertext() {
        let sealer = TokenSealer::new("unit-test-secret");
        let sealed = sealer.seal("access-token-123").unwrap();
        let mut bytes = BASE64.decode(&sealed).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let tampered = BASE64.encode(bytes);
        assert!(matches!(
            sealer.open(&tampered),
            Err(AuthError::Storage(_))
        ));
    }

    #[test]
    fn open_rejects_wrong_key() {
        let sealed = TokenSealer::new("key-a").seal("token").unwrap();
        assert!(TokenSealer::new("key-b").open(&sealed).is_err());
    }

    #[test]
    fn open_rejects_garbage_input() {
        let sealer = TokenSealer::new("unit-test-secret");
        assert!(sealer.open("not base64 at all!!!").is_err());
        assert!(sealer.open("AAAA").is_err());
    }
}

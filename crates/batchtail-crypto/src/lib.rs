//! Access-token encryption
//!
//! AES-256-GCM wrapper with environment-based key loading, used to protect
//! access tokens at rest. The cipher is an explicitly constructed value:
//! build one [`TokenCipher`] at startup and pass it by reference, so a
//! missing or malformed key fails fast instead of at first use.
//!
//! Wire format: `base64(nonce || ciphertext)` with a fresh 96-bit random
//! nonce per encryption.

use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use std::env;
use thiserror::Error;

/// Environment variable holding the base64-encoded 256-bit key.
pub const KEY_ENV_VAR: &str = "ENCRYPTION_KEY";

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("{0} environment variable not set")]
    MissingKey(&'static str),
    #[error("encryption key must be 32 bytes of base64")]
    InvalidKey,
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed (wrong key or corrupted token)")]
    Decrypt,
    #[error("malformed encrypted token")]
    Format,
}

/// Symmetric cipher for access tokens.
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl TokenCipher {
    /// Build a cipher from a base64-encoded 256-bit key.
    pub fn from_key(key_b64: &str) -> Result<Self, CryptoError> {
        let key_bytes = B64
            .decode(key_b64.trim())
            .map_err(|_| CryptoError::InvalidKey)?;
        if key_bytes.len() != 32 {
            return Err(CryptoError::InvalidKey);
        }
        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Build a cipher from the `ENCRYPTION_KEY` environment variable.
    pub fn from_env() -> Result<Self, CryptoError> {
        Self::from_env_var(KEY_ENV_VAR)
    }

    fn from_env_var(name: &'static str) -> Result<Self, CryptoError> {
        let key = env::var(name).map_err(|_| CryptoError::MissingKey(name))?;
        Self::from_key(&key)
    }

    /// Encrypt a token. Empty input stays empty without touching the cipher.
    pub fn encrypt(&self, token: &str) -> Result<String, CryptoError> {
        if token.is_empty() {
            return Ok(String::new());
        }

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, token.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&ciphertext);
        Ok(B64.encode(out))
    }

    /// Decrypt a token produced by [`TokenCipher::encrypt`]. Empty input
    /// stays empty.
    pub fn decrypt(&self, encrypted: &str) -> Result<String, CryptoError> {
        if encrypted.is_empty() {
            return Ok(String::new());
        }

        let bytes = B64.decode(encrypted).map_err(|_| CryptoError::Format)?;
        if bytes.len() <= NONCE_LEN {
            return Err(CryptoError::Format);
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::Format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";
    const OTHER_KEY: &str = "BwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwc=";

    #[test]
    fn test_round_trip() {
        let cipher = TokenCipher::from_key(KEY).unwrap();
        let token = "ghp_1234567890abcdef";

        let encrypted = cipher.encrypt(token).unwrap();
        assert_ne!(encrypted, token);
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), token);
    }

    #[test]
    fn test_empty_passthrough() {
        let cipher = TokenCipher::from_key(KEY).unwrap();
        assert_eq!(cipher.encrypt("").unwrap(), "");
        assert_eq!(cipher.decrypt("").unwrap(), "");
    }

    #[test]
    fn test_fresh_nonce_per_encryption() {
        let cipher = TokenCipher::from_key(KEY).unwrap();
        let a = cipher.encrypt("token").unwrap();
        let b = cipher.encrypt("token").unwrap();
        assert_ne!(a, b);
        assert_eq!(cipher.decrypt(&a).unwrap(), cipher.decrypt(&b).unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let cipher = TokenCipher::from_key(KEY).unwrap();
        let other = TokenCipher::from_key(OTHER_KEY).unwrap();

        let encrypted = cipher.encrypt("secret").unwrap();
        assert!(matches!(
            other.decrypt(&encrypted),
            Err(CryptoError::Decrypt)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let cipher = TokenCipher::from_key(KEY).unwrap();
        let encrypted = cipher.encrypt("secret").unwrap();

        let mut bytes = B64.decode(&encrypted).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = B64.encode(bytes);

        assert!(matches!(cipher.decrypt(&tampered), Err(CryptoError::Decrypt)));
    }

    #[test]
    fn test_malformed_input() {
        let cipher = TokenCipher::from_key(KEY).unwrap();
        assert!(matches!(
            cipher.decrypt("not base64 at all!!!"),
            Err(CryptoError::Format)
        ));
        // Too short to even contain a nonce.
        assert!(matches!(cipher.decrypt("AAAA"), Err(CryptoError::Format)));
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(matches!(
            TokenCipher::from_key("dG9vIHNob3J0"),
            Err(CryptoError::InvalidKey)
        ));
        assert!(matches!(
            TokenCipher::from_key("%%% not base64 %%%"),
            Err(CryptoError::InvalidKey)
        ));
    }

    #[test]
    fn test_missing_env_var() {
        assert!(matches!(
            TokenCipher::from_env_var("BATCHTAIL_TEST_KEY_THAT_IS_NOT_SET"),
            Err(CryptoError::MissingKey(_))
        ));
    }
}

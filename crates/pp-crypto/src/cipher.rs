//! Authenticated encryption of message text.
//!
//! Secretbox-style construction: XChaCha20 stream cipher with a Poly1305
//! MAC and a 24-byte random nonce per call. Nonce and ciphertext are
//! base64 strings so the envelope codec can embed them in JSON untouched.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};

use crate::agreement::SharedSecretKey;

/// Byte length of the per-message random nonce.
pub const NONCE_LEN: usize = 24;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("encryption failed")]
    EncryptFailed,
    #[error("decryption failed")]
    DecryptFailed,
}

/// Output of [`encrypt_text`]: base64 nonce and base64 ciphertext+tag.
#[derive(Debug, Clone)]
pub struct SealedText {
    pub nonce: String,
    pub cipher: String,
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// Non-deterministic: every call draws a new 24-byte nonce, so a given
/// (key, nonce) pair is never reused.
pub fn encrypt_text(plaintext: &str, key: &SharedSecretKey) -> Result<SealedText, CipherError> {
    let mut nonce = [0u8; NONCE_LEN];
    getrandom::getrandom(&mut nonce).map_err(|_| CipherError::EncryptFailed)?;

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let ct = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| CipherError::EncryptFailed)?;

    Ok(SealedText {
        nonce: B64.encode(nonce),
        cipher: B64.encode(ct),
    })
}

/// Decrypt one sealed message.
///
/// All-or-nothing: a tag mismatch, malformed base64, a wrong-length nonce,
/// or non-UTF-8 output all fail without returning any bytes. Pure function
/// of its three inputs.
pub fn decrypt_text(
    nonce_b64: &str,
    cipher_b64: &str,
    key: &SharedSecretKey,
) -> Result<String, CipherError> {
    let nonce = B64.decode(nonce_b64).map_err(|_| CipherError::DecryptFailed)?;
    if nonce.len() != NONCE_LEN {
        return Err(CipherError::DecryptFailed);
    }
    let ct = B64.decode(cipher_b64).map_err(|_| CipherError::DecryptFailed)?;

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let pt = cipher
        .decrypt(XNonce::from_slice(&nonce), ct.as_slice())
        .map_err(|_| CipherError::DecryptFailed)?;

    String::from_utf8(pt).map_err(|_| CipherError::DecryptFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agreement::{derive_shared_secret_key, SharedSecretKey};
    use crate::identity::IdentityKeypair;

    fn test_key() -> SharedSecretKey {
        let alice = IdentityKeypair::generate();
        let bob = IdentityKeypair::generate();
        derive_shared_secret_key(alice.secret(), &bob.public_key())
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let key = test_key();
        let sealed = encrypt_text("hello", &key).expect("encrypt");

        let plaintext = decrypt_text(&sealed.nonce, &sealed.cipher, &key).expect("decrypt");
        assert_eq!(plaintext, "hello");
    }

    #[test]
    fn test_round_trip_empty_string() {
        let key = test_key();
        let sealed = encrypt_text("", &key).expect("encrypt");

        let plaintext = decrypt_text(&sealed.nonce, &sealed.cipher, &key).expect("decrypt");
        assert_eq!(plaintext, "");
    }

    #[test]
    fn test_round_trip_non_ascii() {
        let key = test_key();
        let message = "grüße aus münchen 🔐";
        let sealed = encrypt_text(message, &key).expect("encrypt");

        let plaintext = decrypt_text(&sealed.nonce, &sealed.cipher, &key).expect("decrypt");
        assert_eq!(plaintext, message);
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let key = test_key();
        let first = encrypt_text("same message", &key).expect("encrypt");
        let second = encrypt_text("same message", &key).expect("encrypt");

        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.cipher, second.cipher);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = test_key();
        let other_key = test_key();
        let sealed = encrypt_text("secret", &key).expect("encrypt");

        let result = decrypt_text(&sealed.nonce, &sealed.cipher, &other_key);
        assert!(matches!(result, Err(CipherError::DecryptFailed)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key();
        let sealed = encrypt_text("secret", &key).expect("encrypt");

        let mut ct = B64.decode(&sealed.cipher).expect("decode");
        ct[0] ^= 0x01;
        let tampered = B64.encode(ct);

        let result = decrypt_text(&sealed.nonce, &tampered, &key);
        assert!(matches!(result, Err(CipherError::DecryptFailed)));
    }

    #[test]
    fn test_tampered_nonce_fails() {
        let key = test_key();
        let sealed = encrypt_text("secret", &key).expect("encrypt");

        let mut nonce = B64.decode(&sealed.nonce).expect("decode");
        nonce[0] ^= 0x01;
        let tampered = B64.encode(nonce);

        let result = decrypt_text(&tampered, &sealed.cipher, &key);
        assert!(matches!(result, Err(CipherError::DecryptFailed)));
    }

    #[test]
    fn test_wrong_length_nonce_fails() {
        let key = test_key();
        let sealed = encrypt_text("secret", &key).expect("encrypt");

        let short_nonce = B64.encode([0u8; 12]);
        let result = decrypt_text(&short_nonce, &sealed.cipher, &key);
        assert!(matches!(result, Err(CipherError::DecryptFailed)));
    }

    #[test]
    fn test_malformed_base64_fails() {
        let key = test_key();

        let result = decrypt_text("!!!", "also not base64", &key);
        assert!(matches!(result, Err(CipherError::DecryptFailed)));
    }
}

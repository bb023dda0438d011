//! Identity keypair management for PeerPost users.
//!
//! Provides X25519 keypair generation, the base64 public-key form exchanged
//! through the key directory, and the stored-record codec used by the
//! identity keystore. Key material is zeroized on drop.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Byte length of X25519 public and secret keys.
pub const KEY_LEN: usize = 32;

/// Error type for key material handling.
#[derive(Debug, thiserror::Error)]
pub enum KeyMaterialError {
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("invalid key encoding: {0}")]
    InvalidEncoding(String),
    #[error("stored keypair record is inconsistent")]
    RecordMismatch,
}

/// Stored form of a keypair, as persisted by the identity keystore.
///
/// The secret never leaves the device; this record only ever travels to
/// local storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredKeypairV1 {
    /// Base64 X25519 public key
    pub public: String,
    /// Base64 X25519 secret key
    pub secret: String,
}

/// A user's X25519 identity keypair.
///
/// Holds the private scalar and derives the public key on demand. The
/// secret is securely zeroized when the keypair is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct IdentityKeypair {
    /// X25519 key exchange private key
    #[zeroize(skip)] // StaticSecret implements Zeroize internally
    secret: StaticSecret,
}

impl IdentityKeypair {
    /// Generate a new random keypair using a secure random source.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        Self { secret }
    }

    /// Rebuild a keypair from its 32 secret bytes.
    pub fn from_secret_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            secret: StaticSecret::from(bytes),
        }
    }

    /// The X25519 public key for this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(&self.secret)
    }

    /// The base64 public key, as published to the key directory.
    pub fn public_key_b64(&self) -> String {
        encode_public_key(&self.public_key())
    }

    /// Reference to the private scalar for key agreement.
    pub fn secret(&self) -> &StaticSecret {
        &self.secret
    }

    /// Raw secret bytes. Exposed only so the keystore can build the
    /// stored record; never send these anywhere else.
    pub fn secret_bytes(&self) -> [u8; KEY_LEN] {
        self.secret.to_bytes()
    }

    /// Serialize into the JSON record persisted by the identity keystore.
    pub fn to_stored_record(&self) -> String {
        let record = StoredKeypairV1 {
            public: self.public_key_b64(),
            secret: B64.encode(self.secret_bytes()),
        };
        serde_json::to_string(&record).unwrap() // plain string fields, infallible
    }

    /// Rebuild a keypair from a stored record.
    ///
    /// A record whose public half does not match its secret is corrupt;
    /// using it anyway would silently break every conversation with this
    /// user, so it is rejected instead.
    pub fn from_stored_record(json: &str) -> Result<Self, KeyMaterialError> {
        let record: StoredKeypairV1 =
            serde_json::from_str(json).map_err(|e| KeyMaterialError::InvalidEncoding(e.to_string()))?;
        let secret_bytes = decode_key_bytes(&record.secret)?;
        let keypair = Self::from_secret_bytes(secret_bytes);
        if keypair.public_key_b64() != record.public {
            return Err(KeyMaterialError::RecordMismatch);
        }
        Ok(keypair)
    }
}

/// Decode a base64 X25519 public key, as fetched from the key directory.
///
/// Length is checked before the bytes are ever used as a curve point, so
/// malformed directory data fails here rather than producing a garbage
/// shared key.
pub fn decode_public_key(b64: &str) -> Result<PublicKey, KeyMaterialError> {
    Ok(PublicKey::from(decode_key_bytes(b64)?))
}

/// Encode an X25519 public key for publication to the key directory.
pub fn encode_public_key(key: &PublicKey) -> String {
    B64.encode(key.as_bytes())
}

fn decode_key_bytes(b64: &str) -> Result<[u8; KEY_LEN], KeyMaterialError> {
    let bytes = B64
        .decode(b64)
        .map_err(|e| KeyMaterialError::InvalidEncoding(e.to_string()))?;
    let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|v: Vec<u8>| KeyMaterialError::InvalidLength {
        expected: KEY_LEN,
        got: v.len(),
    })?;
    Ok(arr)
}

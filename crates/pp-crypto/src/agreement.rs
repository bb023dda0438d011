//! Shared-key derivation between two PeerPost users.
//!
//! X25519 scalar multiplication followed by a minimal hash KDF: the 32-byte
//! shared point is hashed with SHA-512 and the first 32 bytes of the digest
//! become the symmetric message key. Both directions of a conversation must
//! derive the same key; everything else in the scheme rests on that.

use constant_time_eq::constant_time_eq;
use sha2::{Digest, Sha512};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Byte length of derived symmetric keys.
pub const SHARED_KEY_LEN: usize = 32;

/// A derived 32-byte symmetric key.
///
/// Never persisted; lives for the duration of one encrypt or decrypt call
/// and is zeroized on drop. Equality is constant-time.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecretKey([u8; SHARED_KEY_LEN]);

impl SharedSecretKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; SHARED_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; SHARED_KEY_LEN] {
        &self.0
    }
}

impl PartialEq for SharedSecretKey {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl Eq for SharedSecretKey {}

/// Derive the symmetric key shared between `my_secret` and `their_public`.
///
/// `derive(A.priv, B.pub)` equals `derive(B.priv, A.pub)` for any two
/// independently generated keypairs A and B. Key material is validated at
/// parse time (see [`crate::identity`]); by the time values reach this
/// function they are well-formed curve points.
pub fn derive_shared_secret_key(
    my_secret: &StaticSecret,
    their_public: &PublicKey,
) -> SharedSecretKey {
    let shared_point = my_secret.diffie_hellman(their_public);
    let digest = Sha512::digest(shared_point.as_bytes());
    let mut key = [0u8; SHARED_KEY_LEN];
    key.copy_from_slice(&digest[..SHARED_KEY_LEN]);
    SharedSecretKey(key)
}

//! Unified error taxonomy for PeerPost messaging operations.

use thiserror::Error;

use pp_crypto::cipher::CipherError;
use pp_crypto::identity::KeyMaterialError;

use crate::directory::DirectoryError;
use crate::store::StoreError;

/// Errors surfaced by the messaging layer.
///
/// Every fallible operation in this crate reports one of these categories,
/// so callers can decide what to show the user without inspecting backend
/// detail. Derivation and decryption failures always propagate; silently
/// substituting a default would either leak plaintext or corrupt a
/// conversation.
#[derive(Debug, Error)]
pub enum E2eeError {
    #[error("keypair storage failed: {0}")]
    StorageUnavailable(#[from] StoreError),

    #[error("malformed key material: {0}")]
    MalformedKeyMaterial(#[from] KeyMaterialError),

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("unable to unpack encrypted payload")]
    UnpackFailed,

    #[error("key directory request failed: {0}")]
    NetworkFailure(#[from] DirectoryError),
}

impl From<CipherError> for E2eeError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::EncryptFailed => E2eeError::EncryptionFailed,
            CipherError::DecryptFailed => E2eeError::DecryptionFailed,
        }
    }
}

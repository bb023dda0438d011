//! Process-wide crypto provider handle and primitive self-test.
//!
//! The provider is initialized exactly once and shared by every caller;
//! the self-test runs at most once per process and memoizes its verdict.
//! A failing self-test logs a warning and keeps the application alive: a
//! primitive regression belongs in CI, not in front of end users.

use std::sync::OnceLock;

use constant_time_eq::constant_time_eq;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::agreement::{derive_shared_secret_key, SharedSecretKey};
use crate::cipher::{decrypt_text, encrypt_text, CipherError, SealedText};
use crate::identity::IdentityKeypair;

static PROVIDER: OnceLock<CryptoProvider> = OnceLock::new();
static SELF_TEST: OnceLock<bool> = OnceLock::new();

/// Handle to the cryptographic primitives.
///
/// [`init_crypto_provider`] builds it exactly once; all callers share the
/// same `'static` instance. Orchestration goes through this seam rather
/// than reaching into the primitive modules directly.
#[derive(Debug)]
pub struct CryptoProvider;

impl CryptoProvider {
    /// Verdict of the one-time primitive self-test, running the test on
    /// first query.
    pub fn self_test_passed(&self) -> bool {
        self_test()
    }

    /// Generate a fresh identity keypair.
    pub fn generate_keypair(&self) -> IdentityKeypair {
        IdentityKeypair::generate()
    }

    /// Derive the symmetric key shared with a peer.
    pub fn derive_shared_secret_key(
        &self,
        my_secret: &StaticSecret,
        their_public: &PublicKey,
    ) -> SharedSecretKey {
        derive_shared_secret_key(my_secret, their_public)
    }

    /// Encrypt message text under a derived key.
    pub fn encrypt_text(
        &self,
        plaintext: &str,
        key: &SharedSecretKey,
    ) -> Result<SealedText, CipherError> {
        encrypt_text(plaintext, key)
    }

    /// Decrypt sealed message text under a derived key.
    pub fn decrypt_text(
        &self,
        nonce_b64: &str,
        cipher_b64: &str,
        key: &SharedSecretKey,
    ) -> Result<String, CipherError> {
        decrypt_text(nonce_b64, cipher_b64, key)
    }
}

/// Initialize (once) and return the shared crypto provider.
///
/// Every caller receives the same `'static` handle. The self-test is not
/// triggered here; query [`CryptoProvider::self_test_passed`] or call
/// [`self_test`] to run it.
pub fn init_crypto_provider() -> &'static CryptoProvider {
    PROVIDER.get_or_init(|| CryptoProvider)
}

/// Run the primitive self-test at most once per process.
///
/// Later calls return the memoized verdict without re-running anything.
pub fn self_test() -> bool {
    *SELF_TEST.get_or_init(run_self_test)
}

const SELF_TEST_PROBE: &str = "peerpost encryption self-test";

fn run_self_test() -> bool {
    let a = IdentityKeypair::generate();
    let b = IdentityKeypair::generate();

    // Raw scalar-mult symmetry, checked before any hashing
    let ab = a.secret().diffie_hellman(&b.public_key());
    let ba = b.secret().diffie_hellman(&a.public_key());
    if !constant_time_eq(ab.as_bytes(), ba.as_bytes()) {
        tracing::warn!("crypto self-test failed: scalar multiplication is not symmetric");
        return false;
    }

    let key_a = derive_shared_secret_key(a.secret(), &b.public_key());
    let key_b = derive_shared_secret_key(b.secret(), &a.public_key());
    if key_a != key_b {
        tracing::warn!("crypto self-test failed: derived keys differ");
        return false;
    }

    let sealed = match encrypt_text(SELF_TEST_PROBE, &key_a) {
        Ok(sealed) => sealed,
        Err(e) => {
            tracing::warn!(error = %e, "crypto self-test failed: encryption error");
            return false;
        }
    };

    match decrypt_text(&sealed.nonce, &sealed.cipher, &key_b) {
        Ok(plaintext) if plaintext == SELF_TEST_PROBE => {
            tracing::debug!("crypto self-test passed");
            true
        }
        Ok(_) => {
            tracing::warn!("crypto self-test failed: decrypted text differs from probe");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "crypto self-test failed: decryption error");
            false
        }
    }
}

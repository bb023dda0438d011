//! Message-level orchestration: identity lookup, key agreement, sealing,
//! and the wire codec composed into send/receive operations.
//!
//! The transport underneath carries opaque string bodies and also delivers
//! plain unencrypted messages, so the inbound path distinguishes the two
//! instead of assuming every body is an envelope.

use std::sync::Arc;

use tracing::debug;

use pp_crypto::envelope::{
    is_encrypted_body, pack_encrypted_payload, unpack_encrypted_payload, EncryptedEnvelope,
};
use pp_crypto::identity::decode_public_key;
use pp_crypto::provider::{init_crypto_provider, CryptoProvider};

use crate::config::CoreConfig;
use crate::directory::KeyDirectory;
use crate::errors::E2eeError;
use crate::keystore::{normalize_owner_id, IdentityKeyStore};
use crate::store::KeyValueStore;

/// Outcome of processing one inbound message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundText {
    /// The body carried no envelope; it is a legacy plaintext message.
    Plaintext(String),
    /// The body was an envelope and decrypted successfully.
    Decrypted(String),
}

impl InboundText {
    /// The displayable message text, however it arrived.
    pub fn text(&self) -> &str {
        match self {
            InboundText::Plaintext(text) | InboundText::Decrypted(text) => text,
        }
    }

    /// Whether the message arrived end-to-end encrypted.
    pub fn was_encrypted(&self) -> bool {
        matches!(self, InboundText::Decrypted(_))
    }
}

/// Composes the keystore, key directory, and crypto primitives into
/// per-message encrypt/decrypt operations.
///
/// Shared secrets are rederived for every message and never cached; each
/// derivation is a microsecond-scale computation.
#[derive(Clone)]
pub struct Messenger {
    provider: &'static CryptoProvider,
    keystore: IdentityKeyStore,
    directory: Arc<dyn KeyDirectory>,
}

impl Messenger {
    /// Build a messenger over the given storage and directory backends.
    pub fn new(
        config: CoreConfig,
        store: Arc<dyn KeyValueStore>,
        directory: Arc<dyn KeyDirectory>,
    ) -> Self {
        let provider = init_crypto_provider();
        // Trigger the one-time primitive self-test; the provider logs any
        // failure and the application keeps running.
        if config.self_test_on_init {
            let _ = provider.self_test_passed();
        }
        Self {
            provider,
            keystore: IdentityKeyStore::new(store, config.storage_namespace),
            directory,
        }
    }

    /// Ensure `owner_id` has an identity keypair and publish its public key
    /// to the directory. Returns the published base64 public key.
    pub async fn register_identity(&self, owner_id: &str) -> Result<String, E2eeError> {
        let owner = normalize_owner_id(owner_id);
        let keypair = self.keystore.get_or_create_identity_keypair(&owner).await?;
        let public_key_b64 = keypair.public_key_b64();
        self.directory.upsert_public_key(&owner, &public_key_b64).await?;
        debug!(owner = %owner, "published public key to directory");
        Ok(public_key_b64)
    }

    /// Encrypt `plaintext` from `sender_id` to `recipient_id` and pack it
    /// into the wire body handed to the transport.
    ///
    /// A missing or malformed recipient key fails the call; plaintext is
    /// never handed to the transport as a fallback.
    pub async fn encrypt_outbound(
        &self,
        sender_id: &str,
        recipient_id: &str,
        plaintext: &str,
    ) -> Result<String, E2eeError> {
        let sender = normalize_owner_id(sender_id);
        let recipient = normalize_owner_id(recipient_id);

        let my_keypair = self.keystore.get_or_create_identity_keypair(&sender).await?;
        let their_key_b64 = self.directory.fetch_public_key(&recipient).await?;
        let their_public = decode_public_key(&their_key_b64)?;

        let shared = self
            .provider
            .derive_shared_secret_key(my_keypair.secret(), &their_public);
        let sealed = self.provider.encrypt_text(plaintext, &shared)?;
        let body = pack_encrypted_payload(&EncryptedEnvelope::new(sealed));

        debug!(from = %sender, to = %recipient, "encrypted outbound message");
        Ok(body)
    }

    /// Process one inbound message body addressed to `recipient_id`.
    ///
    /// Bodies without the envelope prefix pass through as legacy plaintext.
    /// Bodies with the prefix must unpack and decrypt; a prefixed body that
    /// cannot be decoded is reported as [`E2eeError::UnpackFailed`] so the
    /// UI can render an "unable to decrypt" state instead of base64 noise.
    pub async fn decrypt_inbound(
        &self,
        recipient_id: &str,
        sender_id: &str,
        body: &str,
    ) -> Result<InboundText, E2eeError> {
        if !is_encrypted_body(body) {
            return Ok(InboundText::Plaintext(body.to_string()));
        }

        let envelope = unpack_encrypted_payload(body).ok_or(E2eeError::UnpackFailed)?;

        let recipient = normalize_owner_id(recipient_id);
        let sender = normalize_owner_id(sender_id);

        let my_keypair = self.keystore.get_or_create_identity_keypair(&recipient).await?;
        let their_key_b64 = self.directory.fetch_public_key(&sender).await?;
        let their_public = decode_public_key(&their_key_b64)?;

        let shared = self
            .provider
            .derive_shared_secret_key(my_keypair.secret(), &their_public);
        let plaintext = self
            .provider
            .decrypt_text(&envelope.nonce, &envelope.cipher, &shared)?;

        debug!(from = %sender, to = %recipient, "decrypted inbound message");
        Ok(InboundText::Decrypted(plaintext))
    }
}

//! Identity keypair lifecycle: lookup, generation, and persistence.
//!
//! Each owner identifier maps to exactly one persisted keypair. First use
//! generates and persists the keypair; every later call returns the same
//! one for as long as storage survives.

use std::sync::Arc;

use tracing::{debug, info};

use pp_crypto::identity::IdentityKeypair;

use crate::errors::E2eeError;
use crate::store::{KeyValueStore, StoreError};

/// Case-fold and trim an owner identifier so lookups are stable across
/// cosmetic variations of the same id.
pub fn normalize_owner_id(owner_id: &str) -> String {
    owner_id.trim().to_lowercase()
}

/// Generates and persists one asymmetric keypair per owner.
#[derive(Clone)]
pub struct IdentityKeyStore {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl IdentityKeyStore {
    /// Create a keystore over the given backend. `namespace` prefixes every
    /// storage key so the identity records can share a database with other
    /// application data.
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Storage key for an owner's identity record.
    fn record_key(&self, owner: &str) -> String {
        format!("{}/identity/{}", self.namespace, owner)
    }

    /// Look up the persisted keypair for `owner_id`, generating and
    /// persisting a fresh one on first use.
    ///
    /// Concurrent first use races are settled by the store's atomic
    /// create-if-absent: every caller returns the winner's keypair, so at
    /// most one keypair is ever authoritative per owner.
    ///
    /// Storage failures surface as errors rather than falling back to an
    /// ephemeral keypair. Regenerating on every call would hand out a
    /// different key each time and break all existing conversations.
    pub async fn get_or_create_identity_keypair(
        &self,
        owner_id: &str,
    ) -> Result<IdentityKeypair, E2eeError> {
        let owner = normalize_owner_id(owner_id);
        let key = self.record_key(&owner);

        if let Some(record) = self.store.get(&key).await? {
            let keypair = IdentityKeypair::from_stored_record(&record)?;
            debug!(owner = %owner, "loaded existing identity keypair");
            return Ok(keypair);
        }

        let keypair = IdentityKeypair::generate();
        if self.store.set_if_absent(&key, &keypair.to_stored_record()).await? {
            info!(
                owner = %owner,
                public_key = %fingerprint(&keypair),
                "generated identity keypair"
            );
            return Ok(keypair);
        }

        // Another caller created the record first; adopt the winner's keypair.
        match self.store.get(&key).await? {
            Some(record) => {
                let keypair = IdentityKeypair::from_stored_record(&record)?;
                debug!(owner = %owner, "adopted concurrently created identity keypair");
                Ok(keypair)
            }
            None => Err(E2eeError::StorageUnavailable(StoreError::OperationFailed(
                "identity record disappeared during concurrent creation".to_string(),
            ))),
        }
    }
}

/// Short public-key fingerprint for logs. Never log key material itself.
fn fingerprint(keypair: &IdentityKeypair) -> String {
    hex::encode(&keypair.public_key().as_bytes()[..4])
}

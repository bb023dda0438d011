//! Public-key directory abstraction.
//!
//! The directory is an external collaborator: an unauthenticated mapping
//! from owner identifier to published public key. This module defines the
//! trait the messaging layer consumes plus an in-memory implementation for
//! tests and single-process demos.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during directory operations.
#[derive(Debug, Error, Clone)]
pub enum DirectoryError {
    #[error("no public key published for {0}")]
    NotFound(String),

    #[error("directory unreachable: {0}")]
    Unreachable(String),
}

// ============================================================================
// Directory Trait
// ============================================================================

/// Public-key directory consumed by the messaging layer.
///
/// Fetched keys are used as-is: nothing here verifies that a published key
/// really belongs to the claimed owner, so a compromised directory can hand
/// out substituted keys. Callers that need sender authenticity have to layer
/// a verification scheme on top.
#[async_trait]
pub trait KeyDirectory: Send + Sync {
    /// Fetch the base64-encoded public key published for `owner_id`.
    ///
    /// # Returns
    /// * `Ok(key)` if a key is published
    /// * `Err(DirectoryError::NotFound)` if no key is published
    /// * `Err(DirectoryError::Unreachable)` if the directory cannot be reached
    async fn fetch_public_key(&self, owner_id: &str) -> Result<String, DirectoryError>;

    /// Publish the base64-encoded public key for `owner_id`, replacing any
    /// previously published key.
    async fn upsert_public_key(
        &self,
        owner_id: &str,
        public_key_b64: &str,
    ) -> Result<(), DirectoryError>;
}

// ============================================================================
// In-Memory Directory Implementation
// ============================================================================

/// Thread-safe in-memory directory for testing and single-process demos.
#[derive(Default, Clone)]
pub struct InMemoryDirectory {
    keys: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryDirectory {
    /// Create a new empty in-memory directory.
    pub fn new() -> Self {
        Self {
            keys: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new in-memory directory wrapped in an Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl KeyDirectory for InMemoryDirectory {
    async fn fetch_public_key(&self, owner_id: &str) -> Result<String, DirectoryError> {
        let keys = self.keys.read().await;
        keys.get(owner_id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(owner_id.to_string()))
    }

    async fn upsert_public_key(
        &self,
        owner_id: &str,
        public_key_b64: &str,
    ) -> Result<(), DirectoryError> {
        let mut keys = self.keys.write().await;
        keys.insert(owner_id.to_string(), public_key_b64.to_string());
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

//! Storage abstraction for PeerPost identity records.
//!
//! This module defines the `KeyValueStore` trait and provides an in-memory
//! implementation for testing and single-process use. Durable backends
//! (see `sqlite_store`) implement the same trait.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during store operations.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage operation failed: {0}")]
    OperationFailed(String),
}

// ============================================================================
// Store Trait
// ============================================================================

/// Storage abstraction for PeerPost persistence.
///
/// Identity keypairs are stored as string values under string keys, so any
/// backend that can hold a key/value pair (SQLite, Redis, a settings table in
/// an existing application database) can implement this trait.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieve the value stored under `key`.
    ///
    /// # Returns
    /// * `Ok(Some(value))` if found
    /// * `Ok(None)` if not found
    /// * `Err(StoreError)` if the backend fails
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any existing value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the value stored under `key`.
    ///
    /// # Returns
    /// * `Ok(())` on success (even if the key didn't exist)
    /// * `Err(StoreError)` if the backend fails
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Store `value` under `key` only if the key is currently absent.
    ///
    /// This is the only compound operation backends must make atomic: when
    /// several processes race to create the same record, exactly one caller
    /// observes `true` and every other caller observes `false` with the
    /// winner's value left in place.
    ///
    /// # Returns
    /// * `Ok(true)` if the value was written
    /// * `Ok(false)` if another value was already present
    /// * `Err(StoreError)` if the backend fails
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError>;
}

// ============================================================================
// In-Memory Store Implementation
// ============================================================================

/// Thread-safe in-memory store implementation for testing and single-process use.
///
/// Uses `RwLock` for concurrent access with multiple readers or single writer.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new in-memory store wrapped in an Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        // Holding the write lock across the check and the insert makes the
        // pair atomic with respect to every other store operation.
        let mut entries = self.entries.write().await;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

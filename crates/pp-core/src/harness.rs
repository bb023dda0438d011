//! Test harness for PeerPost messaging flows.
//!
//! This module provides helpers that wire up simulated user agents (each
//! with its own private local store) around a shared key directory, plus a
//! complete message exchange used by tests and the demo binary.

use std::sync::Arc;

use crate::config::CoreConfig;
use crate::directory::{InMemoryDirectory, KeyDirectory};
use crate::errors::E2eeError;
use crate::messaging::{InboundText, Messenger};
use crate::store::{InMemoryStore, KeyValueStore};

/// One simulated user agent: a messenger over its own local store, sharing
/// the common key directory with every other agent.
pub struct UserAgent {
    pub owner_id: String,
    pub messenger: Messenger,
}

impl UserAgent {
    /// Create this agent's identity and publish its public key.
    pub async fn register(&self) -> Result<String, E2eeError> {
        self.messenger.register_identity(&self.owner_id).await
    }

    /// Encrypt a message from this agent to `recipient_id`.
    pub async fn send(&self, recipient_id: &str, plaintext: &str) -> Result<String, E2eeError> {
        self.messenger
            .encrypt_outbound(&self.owner_id, recipient_id, plaintext)
            .await
    }

    /// Process a message body delivered to this agent from `sender_id`.
    pub async fn receive(&self, sender_id: &str, body: &str) -> Result<InboundText, E2eeError> {
        self.messenger
            .decrypt_inbound(&self.owner_id, sender_id, body)
            .await
    }
}

/// Build a user agent with a fresh in-memory local store.
pub fn make_user_agent(owner_id: &str, directory: Arc<dyn KeyDirectory>) -> UserAgent {
    make_user_agent_with_store(owner_id, InMemoryStore::new_shared(), directory)
}

/// Build a user agent over an explicit local store backend.
pub fn make_user_agent_with_store(
    owner_id: &str,
    store: Arc<dyn KeyValueStore>,
    directory: Arc<dyn KeyDirectory>,
) -> UserAgent {
    UserAgent {
        owner_id: owner_id.to_string(),
        messenger: Messenger::new(CoreConfig::default(), store, directory),
    }
}

/// Run a complete encrypted exchange between two fresh users.
///
/// 1. Both users create identities and publish their public keys
/// 2. The sender encrypts and packs a message for the recipient
/// 3. The recipient unpacks and decrypts the wire body
///
/// Asserts the recipient reads exactly what the sender wrote.
pub async fn run_message_exchange(
    sender_id: &str,
    recipient_id: &str,
    plaintext: &str,
) -> Result<(), E2eeError> {
    let directory = InMemoryDirectory::new_shared();

    let sender = make_user_agent(sender_id, directory.clone());
    let recipient = make_user_agent(recipient_id, directory);

    sender.register().await?;
    recipient.register().await?;

    let wire = sender.send(recipient_id, plaintext).await?;
    assert!(pp_crypto::envelope::is_encrypted_body(&wire));

    let inbound = recipient.receive(sender_id, &wire).await?;
    assert_eq!(inbound, InboundText::Decrypted(plaintext.to_string()));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_message_exchange() {
        run_message_exchange("alice", "bob", "hello")
            .await
            .expect("message exchange should succeed");
    }

    #[tokio::test]
    async fn test_exchange_in_both_directions() {
        let directory = InMemoryDirectory::new_shared();
        let alice = make_user_agent("alice", directory.clone());
        let bob = make_user_agent("bob", directory);

        alice.register().await.unwrap();
        bob.register().await.unwrap();

        let to_bob = alice.send("bob", "ping").await.unwrap();
        let at_bob = bob.receive("alice", &to_bob).await.unwrap();
        assert_eq!(at_bob.text(), "ping");

        let to_alice = bob.send("alice", "pong").await.unwrap();
        let at_alice = alice.receive("bob", &to_alice).await.unwrap();
        assert_eq!(at_alice.text(), "pong");
    }

    #[tokio::test]
    async fn test_mixed_plaintext_and_encrypted_traffic() {
        let directory = InMemoryDirectory::new_shared();
        let alice = make_user_agent("alice", directory.clone());
        let bob = make_user_agent("bob", directory);

        alice.register().await.unwrap();
        bob.register().await.unwrap();

        // An older client on the same channel still sends bare text.
        let legacy = bob.receive("alice", "sent before the upgrade").await.unwrap();
        assert!(!legacy.was_encrypted());

        let wire = alice.send("bob", "sent after the upgrade").await.unwrap();
        let upgraded = bob.receive("alice", &wire).await.unwrap();
        assert!(upgraded.was_encrypted());
        assert_eq!(upgraded.text(), "sent after the upgrade");
    }

    #[tokio::test]
    async fn test_identity_survives_simulated_restart() {
        let directory = InMemoryDirectory::new_shared();
        let store = InMemoryStore::new_shared();

        let before = make_user_agent_with_store("alice", store.clone(), directory.clone());
        let key_before = before.register().await.unwrap();
        drop(before);

        // A fresh agent over the surviving store, as after a process restart.
        let after = make_user_agent_with_store("alice", store, directory);
        let key_after = after.register().await.unwrap();

        assert_eq!(key_before, key_after);
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_old_messages_decrypt_after_restart() {
        use crate::sqlite_store::SqliteStore;

        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("peerpost.db");
        let directory = InMemoryDirectory::new_shared();

        let alice = make_user_agent("alice", directory.clone());
        alice.register().await.unwrap();

        // Bob runs over a durable store, receives a message, then restarts.
        let wire = {
            let store = Arc::new(SqliteStore::new(&db_path).unwrap());
            let bob = make_user_agent_with_store("bob", store, directory.clone());
            bob.register().await.unwrap();
            alice.send("bob", "before restart").await.unwrap()
        };

        let store = Arc::new(SqliteStore::new(&db_path).unwrap());
        let bob = make_user_agent_with_store("bob", store, directory);
        let inbound = bob.receive("alice", &wire).await.unwrap();

        assert_eq!(inbound, InboundText::Decrypted("before restart".to_string()));
    }
}

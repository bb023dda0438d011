//! PeerPost core - end-to-end encrypted messaging over an untrusted transport.
//!
//! This crate implements:
//! - Identity keypair lifecycle over pluggable key-value storage
//! - Public-key directory abstraction
//! - Message-level encrypt/decrypt orchestration on top of pp-crypto
//! - Configuration loading
//! - A harness wiring simulated user agents together for tests and demos

#![forbid(unsafe_code)]

// Core messaging
pub mod keystore;
pub mod messaging;

// Services
pub mod directory;

// Infrastructure
pub mod store;

// Supporting modules
pub mod config;
pub mod errors;
pub mod harness;

// Optional storage implementations
#[cfg(feature = "sqlite")]
pub mod sqlite_store;

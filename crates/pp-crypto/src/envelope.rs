//! Versioned wire envelope for encrypted message bodies.
//!
//! An encrypted message travels as `pp_e2ee_v1:` + base64(JSON envelope),
//! sharing the transport with ordinary plaintext bodies. Unpacking never
//! panics: anything that is not a well-formed v1 envelope comes back as
//! `None` so message rendering stays alive.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::cipher::SealedText;

/// Literal tag distinguishing encrypted bodies from plaintext ones.
pub const WIRE_PREFIX: &str = "pp_e2ee_v1:";

/// Version written by this codec and the only one it accepts.
pub const ENVELOPE_VERSION: u32 = 1;

/// One encrypted message as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    /// Format version; any future revision bumps this
    pub v: u32,
    /// Base64 24-byte nonce
    pub nonce: String,
    /// Base64 ciphertext + tag
    pub cipher: String,
}

impl EncryptedEnvelope {
    /// Build a current-version envelope from sealed message text.
    pub fn new(sealed: SealedText) -> Self {
        Self {
            v: ENVELOPE_VERSION,
            nonce: sealed.nonce,
            cipher: sealed.cipher,
        }
    }
}

/// Serialize an envelope into the opaque transport body.
pub fn pack_encrypted_payload(envelope: &EncryptedEnvelope) -> String {
    let json = serde_json::to_vec(envelope).unwrap(); // integer + string fields, infallible
    format!("{}{}", WIRE_PREFIX, B64.encode(json))
}

/// Parse a transport body back into an envelope.
///
/// Returns `None` for bodies without the prefix (plaintext is legitimate
/// on this channel) and for anything malformed behind the prefix: bad
/// base64, bad JSON, or an unrecognized version. The version check comes
/// before the envelope body is looked at; unknown versions are rejected,
/// never best-effort parsed.
pub fn unpack_encrypted_payload(body: &str) -> Option<EncryptedEnvelope> {
    let encoded = body.strip_prefix(WIRE_PREFIX)?;
    let json = B64.decode(encoded).ok()?;
    let envelope: EncryptedEnvelope = serde_json::from_slice(&json).ok()?;
    if envelope.v != ENVELOPE_VERSION {
        tracing::debug!(version = envelope.v, "dropping envelope with unsupported version");
        return None;
    }
    Some(envelope)
}

/// Cheap prefix check used to branch rendering without a full decode.
pub fn is_encrypted_body(body: &str) -> bool {
    body.starts_with(WIRE_PREFIX)
}

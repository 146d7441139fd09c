//! # SHA-256 Hashing
//!
//! The sole hash primitive in this system: block hashes and the state
//! commitment are both SHA-256 over a [`chain_types::canon`] encoding.
//!
//! Reference: System.md Section 4.2 (Hash & Signature).

use chain_types::Hash;
use sha2::{Digest, Sha256};

/// Hashes raw bytes with SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// Hashes raw bytes with SHA-256 and returns the lowercase hex digest,
/// matching the wire format used for block hashes and state commitments.
pub fn sha256_hex(data: &[u8]) -> String {
    chain_types::to_hex(&sha256(data))
}

//! Transaction records.
//!
//! A transaction is a single key/value write, authorized by its sender and
//! ordered per-sender by `nonce`. See [`crate::error`] for reconstruction
//! failures and [`chain_state`] for replay/ownership enforcement.

use chain_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, CTX_TX};
use chain_types::CanonValue;
use serde::{Deserialize, Serialize};

/// A signed key/value write.
///
/// Invariant: `key` must begin with `sender` (ownership), enforced by the
/// state machine, not by this type — a `Transaction` here is just a
/// well-formed, possibly-unauthorized record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Hex-encoded Ed25519 public key of the sender.
    pub sender: String,
    /// The key being written. Must be prefixed by `sender`.
    pub key: String,
    /// The value being written.
    pub value: String,
    /// Strictly increasing per-sender sequence number.
    pub nonce: u64,
    /// Hex-encoded Ed25519 signature over the payload below.
    pub signature: String,
}

impl Transaction {
    /// Builds an unsigned draft; call [`Transaction::sign`] or assign
    /// `signature` directly to finish it.
    pub fn new_unsigned(sender: String, key: String, value: String, nonce: u64) -> Self {
        Self {
            sender,
            key,
            value,
            nonce,
            signature: String::new(),
        }
    }

    /// The signed payload: every field except `signature`.
    pub fn signed_payload(&self) -> CanonValue {
        CanonValue::map([
            ("sender".to_string(), CanonValue::from(self.sender.as_str())),
            ("key".to_string(), CanonValue::from(self.key.as_str())),
            ("value".to_string(), CanonValue::from(self.value.as_str())),
            ("nonce".to_string(), CanonValue::from(self.nonce)),
        ])
    }

    /// Signs this transaction in place under the transaction context.
    pub fn sign(&mut self, keypair: &Ed25519KeyPair) {
        let sig = keypair.sign_with_context(CTX_TX, &self.signed_payload());
        self.signature = sig.to_hex();
    }

    /// Verifies the signature against the declared sender, under the
    /// transaction context. Does not check ownership or nonce ordering —
    /// those are state-machine policy.
    pub fn validate_signature(&self) -> bool {
        let Ok(pubkey) = Ed25519PublicKey::from_hex(&self.sender) else {
            return false;
        };
        let Ok(sig) = Ed25519Signature::from_hex(&self.signature) else {
            return false;
        };
        pubkey
            .verify_with_context(CTX_TX, &self.signed_payload(), &sig)
            .is_ok()
    }
}

//! Block records, and the header/body split used for two-phase dissemination.

use crate::transaction::Transaction;
use chain_crypto::{sha256_hex, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, CTX_HEADER};
use chain_types::CanonValue;
use serde::{Deserialize, Serialize};

/// The literal parent hash of the height-1 block; there is no height 0.
pub const GENESIS_HASH: &str = "GENESIS_HASH";

/// A proposed block: an ordered list of transactions plus the proposer's
/// claim about the resulting state commitment.
///
/// The block's signature authenticates the header fields only — `height`,
/// `parent_hash`, `state_hash`, `proposer`, `timestamp` — never the
/// transaction list itself. This is what lets a receiver verify a block's
/// authenticity from its header alone, before the (potentially large) body
/// of transactions has arrived; see [`Block::header_payload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Height this block occupies; heights start at 1.
    pub height: u64,
    /// Hash of the block at `height - 1`, or [`GENESIS_HASH`] at height 1.
    pub parent_hash: String,
    /// Transactions, in application order.
    pub txs: Vec<Transaction>,
    /// The proposer's claimed post-application state commitment.
    pub state_hash: String,
    /// Hex-encoded Ed25519 public key of the proposer.
    pub proposer: String,
    /// Virtual simulation time at proposal, truncated to an integer.
    pub timestamp: u64,
    /// Hex-encoded Ed25519 signature over [`Block::header_payload`].
    pub signature: String,
}

impl Block {
    /// Builds an unsigned draft.
    #[allow(clippy::too_many_arguments)]
    pub fn new_unsigned(
        height: u64,
        parent_hash: String,
        txs: Vec<Transaction>,
        state_hash: String,
        proposer: String,
        timestamp: u64,
    ) -> Self {
        Self {
            height,
            parent_hash,
            txs,
            state_hash,
            proposer,
            timestamp,
            signature: String::new(),
        }
    }

    /// The signed payload: header fields only, with `txs` always encoded as
    /// an empty sequence. A full block and its header therefore always sign
    /// and verify identically, regardless of how many transactions it
    /// carries.
    pub fn header_payload(&self) -> CanonValue {
        CanonValue::map([
            ("height".to_string(), CanonValue::from(self.height)),
            ("parent_hash".to_string(), CanonValue::from(self.parent_hash.as_str())),
            ("txs".to_string(), CanonValue::Seq(Vec::new())),
            ("state_hash".to_string(), CanonValue::from(self.state_hash.as_str())),
            ("proposer".to_string(), CanonValue::from(self.proposer.as_str())),
            ("timestamp".to_string(), CanonValue::from(self.timestamp)),
        ])
    }

    /// Signs this block in place under the header context.
    pub fn sign(&mut self, keypair: &Ed25519KeyPair) {
        let sig = keypair.sign_with_context(CTX_HEADER, &self.header_payload());
        self.signature = sig.to_hex();
    }

    /// Verifies the signature against the declared proposer.
    pub fn validate_signature(&self) -> bool {
        let Ok(pubkey) = Ed25519PublicKey::from_hex(&self.proposer) else {
            return false;
        };
        let Ok(sig) = Ed25519Signature::from_hex(&self.signature) else {
            return false;
        };
        pubkey
            .verify_with_context(CTX_HEADER, &self.header_payload(), &sig)
            .is_ok()
    }

    /// The full record, including signature and the real transaction list —
    /// the input to [`Block::hash`].
    fn full_payload(&self) -> CanonValue {
        let txs = self
            .txs
            .iter()
            .map(|tx| {
                CanonValue::map([
                    ("sender".to_string(), CanonValue::from(tx.sender.as_str())),
                    ("key".to_string(), CanonValue::from(tx.key.as_str())),
                    ("value".to_string(), CanonValue::from(tx.value.as_str())),
                    ("nonce".to_string(), CanonValue::from(tx.nonce)),
                    ("signature".to_string(), CanonValue::from(tx.signature.as_str())),
                ])
            })
            .collect();

        CanonValue::map([
            ("height".to_string(), CanonValue::from(self.height)),
            ("parent_hash".to_string(), CanonValue::from(self.parent_hash.as_str())),
            ("txs".to_string(), CanonValue::Seq(txs)),
            ("state_hash".to_string(), CanonValue::from(self.state_hash.as_str())),
            ("proposer".to_string(), CanonValue::from(self.proposer.as_str())),
            ("timestamp".to_string(), CanonValue::from(self.timestamp)),
            ("signature".to_string(), CanonValue::from(self.signature.as_str())),
        ])
    }

    /// SHA-256 of the canonical encoding of the full record, including the
    /// signature and every transaction. This is the block's identity, used
    /// as the correlation key between header and body, and as the hash
    /// voted on by consensus.
    pub fn hash(&self) -> String {
        sha256_hex(&chain_types::encode(&self.full_payload()))
    }

    /// Splits this block into its wire-level header, for two-phase
    /// dissemination.
    pub fn to_header(&self) -> BlockHeader {
        BlockHeader {
            block_hash: self.hash(),
            height: self.height,
            parent_hash: self.parent_hash.clone(),
            state_hash: self.state_hash.clone(),
            proposer: self.proposer.clone(),
            timestamp: self.timestamp,
            signature: self.signature.clone(),
        }
    }

    /// Splits this block into its wire-level body, for two-phase
    /// dissemination.
    pub fn to_body(&self) -> BlockBody {
        BlockBody {
            block_hash: self.hash(),
            txs: self.txs.clone(),
        }
    }

    /// Reassembles a full block from a matched header/body pair. The caller
    /// is responsible for having matched them by `block_hash`.
    pub fn from_header_and_body(header: BlockHeader, body: BlockBody) -> Self {
        Self {
            height: header.height,
            parent_hash: header.parent_hash,
            txs: body.txs,
            state_hash: header.state_hash,
            proposer: header.proposer,
            timestamp: header.timestamp,
            signature: header.signature,
        }
    }
}

/// The header half of a two-phase block send: every field except the
/// transaction list, plus the block's hash as a correlation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Correlates this header with its matching [`BlockBody`].
    pub block_hash: String,
    /// Height this block occupies.
    pub height: u64,
    /// Hash of the parent block, or [`GENESIS_HASH`].
    pub parent_hash: String,
    /// The proposer's claimed post-application state commitment.
    pub state_hash: String,
    /// Hex-encoded Ed25519 public key of the proposer.
    pub proposer: String,
    /// Virtual simulation time at proposal.
    pub timestamp: u64,
    /// Hex-encoded Ed25519 signature, identical to the full block's.
    pub signature: String,
}

impl BlockHeader {
    /// Rebuilds the payload that was signed, for independent verification
    /// before the body has arrived.
    pub fn signed_payload(&self) -> CanonValue {
        CanonValue::map([
            ("height".to_string(), CanonValue::from(self.height)),
            ("parent_hash".to_string(), CanonValue::from(self.parent_hash.as_str())),
            ("txs".to_string(), CanonValue::Seq(Vec::new())),
            ("state_hash".to_string(), CanonValue::from(self.state_hash.as_str())),
            ("proposer".to_string(), CanonValue::from(self.proposer.as_str())),
            ("timestamp".to_string(), CanonValue::from(self.timestamp)),
        ])
    }

    /// Verifies the header's signature against its declared proposer.
    pub fn validate_signature(&self) -> bool {
        let Ok(pubkey) = Ed25519PublicKey::from_hex(&self.proposer) else {
            return false;
        };
        let Ok(sig) = Ed25519Signature::from_hex(&self.signature) else {
            return false;
        };
        pubkey
            .verify_with_context(CTX_HEADER, &self.signed_payload(), &sig)
            .is_ok()
    }
}

/// The body half of a two-phase block send: the transaction list, keyed by
/// the block hash it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    /// Correlates this body with its matching [`BlockHeader`].
    pub block_hash: String,
    /// Transactions, in application order.
    pub txs: Vec<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_block(kp: &Ed25519KeyPair, height: u64, txs: Vec<Transaction>) -> Block {
        let mut block = Block::new_unsigned(height, GENESIS_HASH.to_string(), txs, "deadbeef".to_string(), kp.public_key().to_hex(), 7);
        block.sign(kp);
        block
    }

    #[test]
    fn signature_survives_header_body_split_with_nonempty_txs() {
        let proposer = Ed25519KeyPair::generate();
        let sender = Ed25519KeyPair::generate();
        let mut tx = Transaction::new_unsigned(sender.public_key().to_hex(), format!("{}/k", sender.public_key().to_hex()), "v".to_string(), 0);
        tx.sign(&sender);

        let block = signed_block(&proposer, 1, vec![tx]);
        let header = block.to_header();
        assert!(header.validate_signature());

        let body = block.to_body();
        let rebuilt = Block::from_header_and_body(header, body);
        assert!(rebuilt.validate_signature());
        assert_eq!(rebuilt.hash(), block.hash());
    }

    #[test]
    fn tampering_a_field_invalidates_signature() {
        let kp = Ed25519KeyPair::generate();
        let mut block = signed_block(&kp, 1, vec![]);
        block.state_hash = "tampered".to_string();
        assert!(!block.validate_signature());
    }

    #[test]
    fn hash_changes_when_signature_or_txs_change() {
        let kp = Ed25519KeyPair::generate();
        let block = signed_block(&kp, 1, vec![]);
        let mut other = block.clone();
        other.signature = "00".repeat(64);
        assert_ne!(block.hash(), other.hash());
    }
}

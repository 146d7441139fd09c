//! # Chain State
//!
//! The replicated state machine: a `key -> value` store plus a
//! `sender -> last-applied-nonce` map used purely for replay rejection.
//!
//! The nonce map is deliberately excluded from the state commitment (see
//! [`StateMachine::state_hash`]) — two histories that differ only in nonce
//! progression hash identically. That is a preserved property of this
//! system, not an oversight; it trades nonce auditability for a smaller
//! commitment surface.

use chain_entities::{Block, Transaction};
use chain_types::CanonValue;
use std::collections::BTreeMap;

/// Applies transactions and exposes the commitment hash blocks are checked
/// against.
///
/// Every sender owns a namespace: a transaction's `key` must begin with its
/// `sender`. This is enforced here, not on [`Transaction`] itself, since a
/// transaction is well-formed independent of who owns what.
#[derive(Debug, Default, Clone)]
pub struct StateMachine {
    data: BTreeMap<String, String>,
    nonces: BTreeMap<String, u64>,
}

impl StateMachine {
    /// An empty state machine.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last nonce applied for `sender`, if any has ever been applied.
    pub fn last_nonce(&self, sender: &str) -> Option<u64> {
        self.nonces.get(sender).copied()
    }

    /// Current value for `key`, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Succeeds iff the signature verifies under the transaction context,
    /// `key` is owned by `sender` (begins with it), and `nonce` strictly
    /// exceeds the sender's last applied nonce (absent senders start below
    /// every nonce, so their first transaction always clears this check).
    pub fn validate_transaction(&self, tx: &Transaction) -> bool {
        if !tx.validate_signature() {
            return false;
        }
        if !tx.key.starts_with(&tx.sender) {
            return false;
        }
        match self.last_nonce(&tx.sender) {
            Some(last) => tx.nonce > last,
            None => true,
        }
    }

    /// Applies `tx` iff it validates; otherwise a no-op. Returns whether it
    /// was applied.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> bool {
        if !self.validate_transaction(tx) {
            return false;
        }
        self.data.insert(tx.key.clone(), tx.value.clone());
        self.nonces.insert(tx.sender.clone(), tx.nonce);
        true
    }

    /// Applies every transaction in `block.txs`, in order, each best-effort
    /// (an invalid transaction is skipped, not fatal to the block). After
    /// the full pass, the resulting commitment must match `block.state_hash`
    /// for the block to be accepted — this is the block's sole acceptance
    /// criterion at the state layer.
    ///
    /// Nonces applied by a block that ultimately fails the commitment check
    /// are not rolled back: callers only ever apply a block once it is
    /// already finalized, so this asymmetry is never observed in practice.
    pub fn apply_block(&mut self, block: &Block) -> bool {
        for tx in &block.txs {
            self.apply_transaction(tx);
        }
        let actual = self.state_hash();
        if actual != block.state_hash {
            tracing::debug!(height = block.height, expected = %block.state_hash, actual = %actual, "state commitment mismatch");
        }
        actual == block.state_hash
    }

    /// The state commitment: SHA-256 hex of the canonical encoding of
    /// `data` alone. `nonces` never enters this hash.
    pub fn state_hash(&self) -> String {
        let entries = self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), CanonValue::from(v.as_str())));
        chain_crypto::sha256_hex(&chain_types::encode(&CanonValue::map(entries)))
    }
}

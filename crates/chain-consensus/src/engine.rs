//! The vote tally.

use crate::error::{ConsensusError, ConsensusResult};
use chain_entities::VotePhase;
use chain_types::threshold_for;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Tallies votes by `(height, phase, block_hash)` against a fixed
/// validator set, and answers quorum queries.
///
/// Membership is checked by declared public key against the validator
/// list passed at construction; this engine never verifies signatures.
/// Storage is a set per `(height, phase, block_hash)`, so re-adding the
/// same voter is a no-op — duplicate votes need no separate dedup layer
/// here (the Node still dedups before calling in, to avoid re-deriving
/// the tally key on every retry of a broadcast message).
pub struct ConsensusEngine {
    validators: HashSet<String>,
    threshold: usize,
    tally: Mutex<HashMap<(u64, VotePhase, String), HashSet<String>>>,
}

impl ConsensusEngine {
    /// Builds an engine over a fixed validator set, identified by
    /// hex-encoded public key. The validator set's length determines the
    /// quorum threshold for the lifetime of this engine.
    ///
    /// Fails iff `validators` is empty — no threshold is ever reachable
    /// over an empty set, so this is rejected at construction rather than
    /// silently producing an engine no quorum can ever cross.
    pub fn new(validators: Vec<String>) -> ConsensusResult<Self> {
        if validators.is_empty() {
            return Err(ConsensusError::EmptyValidatorSet);
        }
        let threshold = threshold_for(validators.len());
        Ok(Self {
            validators: validators.into_iter().collect(),
            threshold,
            tally: Mutex::new(HashMap::new()),
        })
    }

    /// The quorum size for this engine's validator set.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Whether `pubkey` is a member of the validator set.
    pub fn is_validator(&self, pubkey: &str) -> bool {
        self.validators.contains(pubkey)
    }

    /// Records `voter`'s vote for `(height, phase, block_hash)`. Returns
    /// `true` iff the voter is a validator (whether or not this is the
    /// first time this exact vote has been seen — storage is idempotent
    /// either way).
    pub fn add_vote(&self, phase: VotePhase, height: u64, block_hash: String, voter: String) -> bool {
        if !self.is_validator(&voter) {
            return false;
        }
        self.tally
            .lock()
            .entry((height, phase, block_hash))
            .or_default()
            .insert(voter);
        true
    }

    /// Number of distinct validators who have voted for
    /// `(height, phase, block_hash)` so far.
    pub fn vote_count(&self, height: u64, phase: VotePhase, block_hash: &str) -> usize {
        self.tally
            .lock()
            .get(&(height, phase, block_hash.to_string()))
            .map_or(0, HashSet::len)
    }

    /// Whether `(height, phase, block_hash)` has reached quorum.
    pub fn check_threshold(&self, height: u64, phase: VotePhase, block_hash: &str) -> bool {
        self.vote_count(height, phase, block_hash) >= self.threshold
    }
}

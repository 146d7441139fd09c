//! Error types for the consensus engine.

use thiserror::Error;

/// Fatal misconfiguration, detected at startup — never at runtime. The
/// engine itself is otherwise defensive: a vote from a non-validator is
/// simply not tallied, never an error.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// The validator set was empty; no quorum is ever reachable.
    #[error("validator set is empty")]
    EmptyValidatorSet,
}

/// Result alias for consensus engine construction.
pub type ConsensusResult<T> = Result<T, ConsensusError>;

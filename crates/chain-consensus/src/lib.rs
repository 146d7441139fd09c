//! # Chain Consensus
//!
//! Tallies votes by `(height, phase, block_hash)` and answers quorum
//! queries. This engine trusts its callers: it does not verify signatures
//! (the [`Node`](../chain_node/index.html) does that before calling
//! [`ConsensusEngine::add_vote`]) and holds no per-node locking state —
//! "has this node already precommitted" lives on the Node, not here.
//!
//! ## Quorum
//!
//! For `n` validators, a quorum is `threshold = floor(2n/3) + 1` distinct
//! voters. Two quorums over the same validator set always intersect, which
//! is what rules out two conflicting precommit quorums at the same height
//! in the absence of equivocation.

pub mod engine;
pub mod error;

pub use engine::ConsensusEngine;
pub use error::{ConsensusError, ConsensusResult};

//! # Chain Entities
//!
//! Typed wire records — [`Transaction`], [`Block`], [`Vote`] — each able to
//! rebuild its own signed payload and verify itself under the right
//! domain-separation context. Entities never mutate after construction:
//! tampering with any field invalidates the signature on the next check.

pub mod block;
pub mod transaction;
pub mod vote;

pub use block::{Block, BlockBody, BlockHeader, GENESIS_HASH};
pub use transaction::Transaction;
pub use vote::{Vote, VotePhase};

//! Timed events and the min-heap ordering that makes replaying them
//! deterministic.

use chain_entities::{BlockBody, BlockHeader, Transaction, Vote};

/// What got scheduled — mirrors the three sends a [`crate::Simulator`]
/// exposes to nodes.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum Payload {
    /// A transaction or vote, delivered whole.
    Message(EnvelopeMessage),
    /// The header half of a two-phase block send.
    Header(BlockHeader),
    /// The body half of a two-phase block send.
    Body(BlockBody),
}

/// The single-phase message kinds a node can send.
#[derive(Debug, Clone)]
pub enum EnvelopeMessage {
    /// A gossiped client transaction.
    Transaction(Transaction),
    /// A prevote or precommit.
    Vote(Vote),
}

/// A scheduled delivery.
///
/// Ordering is by `delivery_time` first, then by `seq` — a monotonically
/// increasing insertion counter — so that two events scheduled for the
/// same instant still pop in the order they were inserted. Without a
/// stable tie-break, [`std::collections::BinaryHeap`]'s pop order between
/// equal keys is unspecified, which would break the determinism contract.
#[derive(Debug, Clone)]
pub struct Event {
    pub delivery_time: f64,
    pub seq: u64,
    pub sender: String,
    pub receiver: String,
    pub payload: Payload,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.delivery_time == other.delivery_time && self.seq == other.seq
    }
}
impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    /// Reversed against `(delivery_time, seq)` so that a
    /// [`std::collections::BinaryHeap`] — a max-heap — pops the
    /// earliest-scheduled, earliest-inserted event first.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .delivery_time
            .total_cmp(&self.delivery_time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

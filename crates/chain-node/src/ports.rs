//! The outbound port a [`crate::Node`] uses to reach the network.
//!
//! A Node never owns or imports the simulator; it only ever sees
//! `&mut dyn NetworkPort`. This keeps the Node <-> Simulator relationship
//! acyclic: the simulator owns nodes and calls into them directly, while
//! nodes call back out through this trait object rather than holding a
//! handle to the simulator's internals.

use chain_entities::{Block, BlockBody, BlockHeader, Transaction, Vote};

/// A message sent through the single-phase path (`send_message`): either a
/// transaction or a vote. Blocks always go through the two-phase
/// header/body path instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A client transaction, gossiped to admit it into peers' mempools.
    Transaction(Transaction),
    /// A prevote or precommit.
    Vote(Vote),
}

/// Everything a Node needs from its transport.
pub trait NetworkPort {
    /// Sends a single-phase message from `sender` to `receiver`.
    fn send_message(&mut self, sender: &str, receiver: &str, message: Message);

    /// Sends the header half of a two-phase block send.
    fn send_header(&mut self, sender: &str, receiver: &str, header: BlockHeader);

    /// Sends the body half of a two-phase block send.
    fn send_body(&mut self, sender: &str, receiver: &str, body: BlockBody);

    /// Registers that `receiver` has accepted the header for `block_hash`,
    /// releasing any body that was parked waiting for it.
    fn accept_header(&mut self, receiver: &str, block_hash: &str);

    /// The simulator's current virtual time, used as a block's timestamp.
    fn current_time(&self) -> f64;
}

/// Broadcasts `block` via the two-phase header/body path, and `message` via
/// the single-phase path, to every peer, each repeated `retry_count` times.
/// Free function rather than a `NetworkPort` method: it is pure orchestration
/// over the trait, not a transport primitive.
pub fn broadcast_message(net: &mut dyn NetworkPort, sender: &str, peers: &[String], message: Message, retry_count: u32) {
    for peer in peers {
        for _ in 0..retry_count {
            net.send_message(sender, peer, message.clone());
        }
    }
}

/// Broadcasts a block's header then body to every peer, each repeated
/// `retry_count` times, per [`crate::Node::create_and_propose_block`].
pub fn broadcast_block(net: &mut dyn NetworkPort, sender: &str, peers: &[String], block: &Block, retry_count: u32) {
    let header = block.to_header();
    let body = block.to_body();
    for peer in peers {
        for _ in 0..retry_count {
            net.send_header(sender, peer, header.clone());
            net.send_body(sender, peer, body.clone());
        }
    }
}

//! # Chain Node
//!
//! Per-validator orchestration: propose when leader, process incoming
//! blocks/votes/transactions, and drive the
//! propose -> prevote -> precommit -> finalize progression for one height
//! at a time.
//!
//! A [`Node`] never touches the network directly — every outbound action
//! goes through [`ports::NetworkPort`], which the simulator (or a test
//! harness) implements. This keeps Node free of any dependency on how
//! messages are actually delivered.

pub mod error;
pub mod node;
pub mod ports;

pub use error::{NodeError, NodeResult};
pub use node::Node;
pub use ports::{broadcast_block, broadcast_message, Message, NetworkPort};

//! Error types for node construction.

use thiserror::Error;

/// Fatal misconfiguration, detected at startup. Once running, a Node is
/// fully defensive: bad incoming messages are logged and dropped, never
/// surfaced as errors (see the module-level docs on [`crate::Node`]).
#[derive(Debug, Error)]
pub enum NodeError {
    /// This node's own public key is absent from its validator set.
    #[error("node key is not a member of the validator set")]
    NotAValidator,
}

/// Result alias for node construction.
pub type NodeResult<T> = Result<T, NodeError>;

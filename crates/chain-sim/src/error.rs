//! Error types for simulator construction.

use thiserror::Error;

/// Fatal misconfiguration, detected before a run starts.
#[derive(Debug, Error)]
pub enum SimError {
    /// `nodes` was empty; there is no validator set to run consensus over.
    #[error("no nodes configured")]
    NoNodes,

    /// A node's own key ended up outside the validator set it was built
    /// with; this should never happen from [`Simulator::from_config`]
    /// since keys and the validator set are derived together, but is
    /// still a possible misuse of [`chain_node::Node::new`] directly.
    #[error(transparent)]
    Node(#[from] chain_node::NodeError),
}

/// Result alias for simulator construction.
pub type SimResult<T> = Result<T, SimError>;

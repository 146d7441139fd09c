//! Domain-separation context strings.
//!
//! Every signature in this system is computed over `context || canon(payload)`
//! rather than over the payload alone, so a signature produced for one
//! record kind can never be replayed as a valid signature for another.

/// Context for transaction signatures.
pub const CTX_TX: &str = "TX: CHAIN_2025";

/// Context for block header signatures. The constant name says "header",
/// matching what it signs; the wire value itself reads "HEADER".
pub const CTX_HEADER: &str = "HEADER: CHAIN_2025";

/// Context for vote signatures (prevote and precommit alike).
pub const CTX_VOTE: &str = "VOTE: CHAIN_2025";

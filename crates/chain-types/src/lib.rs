//! # Chain Types
//!
//! Shared primitives used by every other crate in the workspace: the
//! canonical encoding that underlies every hash and signature, the
//! `Hash`/key/signature type aliases, and the run configuration shape.
//!
//! Reference: System.md Section 3 (Data Model), Section 4.1 (Canonical
//! Encoder), Section 6 (External Interfaces).

pub mod canon;
pub mod config;
pub mod hash_types;

pub use canon::{encode, CanonValue};
pub use config::{threshold_for, ConsensusConfig, NetworkConfig, RateLimitConfig, RunConfig, SimulationConfig};
pub use hash_types::{from_hex, from_hex_fixed, to_hex, Hash, PublicKeyBytes, SignatureBytes};

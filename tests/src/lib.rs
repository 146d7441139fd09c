//! Cross-crate integration suite: scenarios that only make sense once
//! chain-sim, chain-node, chain-state, and chain-entities are wired
//! together, as opposed to each crate's own unit tests.

pub mod integration;

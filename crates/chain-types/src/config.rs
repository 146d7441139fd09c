//! # Run Configuration
//!
//! Every knob enumerated in System.md Section 6 (External Interfaces),
//! grouped the way the static configuration file on disk groups them.
//! Composing a run from a config file is an external collaborator's job
//! (see System.md Section 1); this module only defines the shape and the
//! defaults it falls back to when a field is absent.

use serde::{Deserialize, Serialize};

/// Unreliable-channel parameters for the network simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Minimum message delay, in virtual seconds.
    pub min_delay: f64,
    /// Maximum message delay, in virtual seconds.
    pub max_delay: f64,
    /// Probability in `[0, 1]` that a send is silently dropped.
    pub drop_prob: f64,
    /// Probability in `[0, 1]` that a send is additionally duplicated.
    pub duplicate_prob: f64,
    /// Per-directed-pair rate limiting.
    pub rate_limit: RateLimitConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            min_delay: 0.01,
            max_delay: 0.10,
            drop_prob: 0.1,
            duplicate_prob: 0.05,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Per-directed-pair message rate limiting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Messages allowed per rolling one-second window before blocking.
    pub max_messages_per_second: u32,
    /// Duration, in virtual seconds, that a pair stays blocked once tripped.
    pub block_duration: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_messages_per_second: 100,
            block_duration: 1.0,
        }
    }
}

/// Consensus-layer parameters.
///
/// `timeout_prevote` and `timeout_precommit` are reserved for a future
/// view-change mechanism (System.md Section 5) and are not consulted by
/// the single-round core in this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Reserved for view-change; unused by the current single-round core.
    pub timeout_prevote: f64,
    /// Reserved for view-change; unused by the current single-round core.
    pub timeout_precommit: f64,
    /// Number of times each broadcast is duplicated per peer.
    pub retry_count: u32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            timeout_prevote: 1.0,
            timeout_precommit: 1.0,
            retry_count: 4,
        }
    }
}

/// Overall simulation run parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Virtual seconds to run before the event loop halts.
    pub max_time: f64,
    /// Seed for the deterministic PRNG driving delay/drop/duplicate draws.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_time: 10.0,
            seed: 123_456,
        }
    }
}

/// The full run configuration: network behavior, consensus parameters,
/// the validator roster, and the simulation horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Unreliable-channel behavior.
    pub network: NetworkConfig,
    /// Consensus timeouts/retries.
    pub consensus: ConsensusConfig,
    /// Ordered validator identifiers; length is N, order fixes leader rotation.
    pub nodes: Vec<String>,
    /// Simulation horizon and seed.
    pub simulation: SimulationConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            consensus: ConsensusConfig::default(),
            nodes: (0..8).map(|i| format!("Node{i}")).collect(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parses a [`RunConfig`] from TOML text, falling back to field
    /// defaults for anything omitted.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Number of validators (`N`).
    pub fn n(&self) -> usize {
        self.nodes.len()
    }

    /// The BFT quorum threshold `⌊2N/3⌋ + 1`.
    pub fn threshold(&self) -> usize {
        threshold_for(self.n())
    }
}

/// The BFT quorum threshold `⌊2N/3⌋ + 1` for `n` validators.
pub fn threshold_for(n: usize) -> usize {
    (2 * n) / 3 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.network.min_delay, 0.01);
        assert_eq!(cfg.network.max_delay, 0.10);
        assert_eq!(cfg.network.drop_prob, 0.1);
        assert_eq!(cfg.network.duplicate_prob, 0.05);
        assert_eq!(cfg.network.rate_limit.max_messages_per_second, 100);
        assert_eq!(cfg.network.rate_limit.block_duration, 1.0);
        assert_eq!(cfg.consensus.retry_count, 4);
        assert_eq!(cfg.simulation.max_time, 10.0);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg = RunConfig::from_toml("[simulation]\nseed = 42\n").unwrap();
        assert_eq!(cfg.simulation.seed, 42);
        assert_eq!(cfg.simulation.max_time, 10.0);
        assert_eq!(cfg.network.drop_prob, 0.1);
    }

    #[test]
    fn threshold_matches_floor_two_thirds_plus_one() {
        assert_eq!(threshold_for(4), 3);
        assert_eq!(threshold_for(8), 6);
        assert_eq!(threshold_for(1), 1);
        assert_eq!(threshold_for(3), 3);
    }
}

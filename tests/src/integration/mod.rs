//! End-to-end scenarios run against a full [`chain_sim::Simulator`] cluster:
//! safety under packet loss and duplication, rejection of forged signatures
//! at the wire level, and determinism of repeated runs.

use chain_sim::Simulator;
use chain_types::RunConfig;

fn cluster_config(n: usize) -> RunConfig {
    let mut config = RunConfig::default();
    config.nodes = (0..n).map(|i| format!("Node{i}")).collect();
    config
}

fn finalized_block_1_hashes(sim: &Simulator) -> std::collections::HashSet<String> {
    sim.nodes()
        .values()
        .filter(|n| n.finalized_height >= 1)
        .filter_map(|n| n.block_at(1))
        .map(|b| b.hash())
        .collect()
}

#[test]
fn only_one_block_finalizes_per_height_with_a_clean_network() {
    let mut config = cluster_config(8);
    config.network.drop_prob = 0.0;
    config.simulation.max_time = 10.0;

    let mut sim = Simulator::from_config(&config).unwrap();
    sim.run(config.simulation.max_time);

    let hashes = finalized_block_1_hashes(&sim);
    assert_eq!(hashes.len(), 1, "more than one distinct block finalized at height 1");
}

#[test]
fn safety_holds_under_thirty_percent_drop_rate() {
    let mut config = cluster_config(8);
    config.network.drop_prob = 0.3;
    config.network.max_delay = 0.5;
    config.simulation.max_time = 30.0;

    let mut sim = Simulator::from_config(&config).unwrap();
    sim.run(config.simulation.max_time);

    let hashes = finalized_block_1_hashes(&sim);
    assert!(hashes.len() <= 1, "conflicting blocks finalized under packet loss");
}

#[test]
fn safety_holds_with_high_duplicate_rate() {
    let mut config = cluster_config(8);
    config.network.drop_prob = 0.0;
    config.network.duplicate_prob = 0.5;
    config.simulation.max_time = 10.0;

    let mut sim = Simulator::from_config(&config).unwrap();
    sim.run(config.simulation.max_time);

    let hashes = finalized_block_1_hashes(&sim);
    assert_eq!(hashes.len(), 1, "duplicate votes broke safety");
}

#[test]
fn safety_holds_under_high_latency() {
    let mut config = cluster_config(8);
    config.network.min_delay = 0.5;
    config.network.max_delay = 2.0;
    config.network.drop_prob = 0.0;
    config.simulation.max_time = 30.0;

    let mut sim = Simulator::from_config(&config).unwrap();
    sim.run(config.simulation.max_time);

    let hashes = finalized_block_1_hashes(&sim);
    assert!(hashes.len() <= 1, "high latency produced conflicting finalization");
}

#[test]
fn safety_holds_under_partial_partition() {
    let mut config = cluster_config(8);
    config.network.drop_prob = 0.4;
    config.network.max_delay = 0.3;
    config.simulation.max_time = 30.0;

    let mut sim = Simulator::from_config(&config).unwrap();
    sim.run(config.simulation.max_time);

    let hashes = finalized_block_1_hashes(&sim);
    assert!(hashes.len() <= 1, "partial partition produced a safety violation");
}

#[test]
fn eight_node_cluster_reaches_the_documented_threshold() {
    let mut config = cluster_config(8);
    config.network.drop_prob = 0.0;
    config.simulation.max_time = 10.0;

    assert_eq!(config.threshold(), 6);

    let mut sim = Simulator::from_config(&config).unwrap();
    sim.run(config.simulation.max_time);

    let finalized = sim.nodes().values().filter(|n| n.finalized_height >= 1).count();
    assert_eq!(finalized, 8, "not every node reached finality under a clean network");
}

#[test]
fn repeated_runs_with_the_same_seed_produce_identical_state_and_logs() {
    let mut config = cluster_config(8);
    config.simulation.seed = 999_999;
    config.simulation.max_time = 5.0;

    let run = || {
        let mut sim = Simulator::from_config(&config).unwrap();
        sim.run(config.simulation.max_time);
        let mut state_hashes: Vec<String> = sim.nodes().values().map(|n| n.state_hash()).collect();
        state_hashes.sort();
        (state_hashes, sim.log().to_text())
    };

    let (state_a, log_a) = run();
    let (state_b, log_b) = run();

    assert_eq!(state_a, state_b, "non-deterministic final state across identical runs");
    assert_eq!(log_a, log_b, "non-deterministic network log across identical runs");
}

mod signature_rejection {
    use chain_crypto::Ed25519KeyPair;
    use chain_entities::{Block, Transaction, Vote, VotePhase};
    use chain_state::StateMachine;

    #[test]
    fn forged_transaction_signature_is_rejected() {
        let alice = Ed25519KeyPair::generate();
        let bob = Ed25519KeyPair::generate();
        let key = format!("{}/test", alice.public_key().to_hex());

        let mut genuine = Transaction::new_unsigned(alice.public_key().to_hex(), key.clone(), "value".to_string(), 0);
        genuine.sign(&alice);
        assert!(genuine.validate_signature());

        let mut forged = Transaction::new_unsigned(alice.public_key().to_hex(), key, "hacked".to_string(), 0);
        forged.sign(&bob);
        assert!(!forged.validate_signature());
    }

    #[test]
    fn forged_vote_signature_is_rejected() {
        let alice = Ed25519KeyPair::generate();
        let bob = Ed25519KeyPair::generate();

        let mut vote = Vote::new_unsigned(VotePhase::Prevote, 1, "fake_block_hash".to_string(), alice.public_key().to_hex());
        vote.sign(&bob);
        assert!(!vote.validate_signature());
    }

    #[test]
    fn forged_block_signature_is_rejected() {
        let alice = Ed25519KeyPair::generate();
        let bob = Ed25519KeyPair::generate();

        let mut block = Block::new_unsigned(1, "parent_hash".to_string(), vec![], "state_hash".to_string(), alice.public_key().to_hex(), 0);
        block.sign(&bob);
        assert!(!block.validate_signature());
    }

    #[test]
    fn replayed_nonce_is_rejected_by_the_state_machine() {
        let alice = Ed25519KeyPair::generate();
        let mut sm = StateMachine::new();
        let key = format!("{}/a", alice.public_key().to_hex());

        let mut first = Transaction::new_unsigned(alice.public_key().to_hex(), key.clone(), "100".to_string(), 0);
        first.sign(&alice);
        assert!(sm.apply_transaction(&first));

        let mut replay = Transaction::new_unsigned(alice.public_key().to_hex(), key.clone(), "999".to_string(), 0);
        replay.sign(&alice);
        assert!(!sm.apply_transaction(&replay));
        assert_eq!(sm.get(&key), Some("100"));
    }
}

//! Ties transport ([`NetCore`]) and validator state ([`chain_node::Node`])
//! together and drives the event loop.

use crate::error::{SimError, SimResult};
use crate::event::{EnvelopeMessage, Payload};
use crate::log::EventLog;
use crate::net_core::NetCore;
use chain_crypto::Ed25519KeyPair;
use chain_node::{Message, Node};
use chain_types::RunConfig;
use std::collections::HashMap;

/// A full deterministic run: one [`NetCore`] and a cluster of [`Node`]s,
/// addressed by node id.
///
/// `nodes` and `net` are kept as sibling fields rather than nested inside
/// one another, precisely so the event loop can hold `&mut` to one while
/// handing the other a `&mut dyn NetworkPort` — a single struct containing
/// both behind one `&mut self` would make that borrow impossible.
pub struct Simulator {
    nodes: HashMap<String, Node>,
    net: NetCore,
}

impl Simulator {
    /// Builds a cluster from a [`RunConfig`]: one [`Node`] per configured
    /// id, keyed off a per-node seed string `node_{index}_{seed}` so that a
    /// run's keys are fully determined by its config and seed alone.
    pub fn from_config(config: &RunConfig) -> SimResult<Self> {
        if config.nodes.is_empty() {
            return Err(SimError::NoNodes);
        }

        let keypairs: Vec<Ed25519KeyPair> = config
            .nodes
            .iter()
            .enumerate()
            .map(|(i, _)| Ed25519KeyPair::from_seed_string(&format!("node_{i}_{}", config.simulation.seed)))
            .collect();
        let validators: Vec<String> = keypairs.iter().map(|kp| kp.public_key().to_hex()).collect();

        let mut nodes = HashMap::with_capacity(config.nodes.len());
        for (i, id) in config.nodes.iter().enumerate() {
            let peers: Vec<String> = config.nodes.iter().filter(|p| *p != id).cloned().collect();
            let node = Node::new(id.clone(), keypairs[i].clone(), peers, validators.clone(), config.consensus.retry_count)?;
            nodes.insert(id.clone(), node);
        }

        Ok(Self {
            nodes,
            net: NetCore::new(&config.network, config.simulation.seed),
        })
    }

    /// The node with the given id, if present.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Every node in the cluster.
    pub fn nodes(&self) -> &HashMap<String, Node> {
        &self.nodes
    }

    /// The network event log accumulated so far.
    pub fn log(&self) -> &EventLog {
        &self.net.log
    }

    /// Has leader for the current configured height propose a block, then
    /// runs the event loop until `max_time` (virtual seconds) or the event
    /// queue drains, whichever comes first.
    ///
    /// Proposing is driven externally, one height at a time, matching the
    /// reference scenarios this crate is grounded on: nothing here
    /// auto-advances to height 2 once height 1 finalizes.
    pub fn run(&mut self, max_time: f64) {
        self.start_round();
        self.drain_until(max_time);
    }

    /// Has whichever node is leader for its own `current_height` propose,
    /// without advancing the clock or draining the queue. Exposed
    /// separately from [`Simulator::run`] so callers can drive several
    /// heights in sequence.
    pub fn start_round(&mut self) {
        let ids: Vec<String> = self.nodes.keys().cloned().collect();
        for id in ids {
            let mut net = NetHandle(&mut self.net);
            let node = self.nodes.get_mut(&id).expect("id came from self.nodes.keys()");
            node.start_consensus(&mut net);
        }
    }

    /// Pops and dispatches events until the queue is empty or the next
    /// event would land after `max_time`.
    pub fn drain_until(&mut self, max_time: f64) {
        while let Some(event) = self.net.pop_next(max_time) {
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: crate::event::Event) {
        let crate::event::Event { sender, receiver, payload, .. } = event;
        let Some(node) = self.nodes.get_mut(&receiver) else {
            return;
        };
        let mut net = NetHandle(&mut self.net);
        let time = net.0.current_time();

        match payload {
            Payload::Message(EnvelopeMessage::Transaction(tx)) => {
                node.handle_transaction(tx);
                net.0.log.record(time, "RECV", &sender, &receiver);
            }
            Payload::Message(EnvelopeMessage::Vote(vote)) => {
                node.handle_vote(vote, &mut net);
                net.0.log.record(time, "RECV", &sender, &receiver);
            }
            Payload::Header(header) => {
                node.receive_header(header, &mut net);
                net.0.log.record(time, "RECV_HEADER", &sender, &receiver);
            }
            Payload::Body(body) => {
                node.receive_body(body, &mut net);
                net.0.log.record(time, "RECV_BODY", &sender, &receiver);
            }
        }
    }
}

/// Adapts `&mut NetCore` to `&mut dyn NetworkPort` at each dispatch site,
/// without giving a `Node` any way to reach `NetCore`'s own fields.
struct NetHandle<'a>(&'a mut NetCore);

impl chain_node::NetworkPort for NetHandle<'_> {
    fn send_message(&mut self, sender: &str, receiver: &str, message: Message) {
        self.0.send_message(sender, receiver, message);
    }

    fn send_header(&mut self, sender: &str, receiver: &str, header: chain_entities::BlockHeader) {
        self.0.send_header(sender, receiver, header);
    }

    fn send_body(&mut self, sender: &str, receiver: &str, body: chain_entities::BlockBody) {
        self.0.send_body(sender, receiver, body);
    }

    fn accept_header(&mut self, receiver: &str, block_hash: &str) {
        self.0.accept_header(receiver, block_hash);
    }

    fn current_time(&self) -> f64 {
        self.0.current_time()
    }
}

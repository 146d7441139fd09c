//! Per-validator orchestration.

use crate::ports::{broadcast_block, broadcast_message, Message, NetworkPort};
use chain_consensus::ConsensusEngine;
use chain_crypto::Ed25519KeyPair;
use chain_entities::{Block, BlockBody, BlockHeader, Transaction, Vote, VotePhase, GENESIS_HASH};
use chain_state::StateMachine;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A single validator: holds its own key, mempool, chain of finalized
/// blocks, and vote tally, and drives itself through
/// propose -> prevote -> precommit -> finalize each height.
///
/// Every Node tallies votes independently — there is no shared consensus
/// state across nodes. Two honest nodes reach the same answer only because
/// they observe (eventually) the same votes and apply the same rules, not
/// because they share memory.
pub struct Node {
    /// This node's identifier, as used for network addressing (e.g.
    /// `"Node0"`) — distinct from its public key, which is its consensus
    /// identity.
    pub id: String,
    keypair: Ed25519KeyPair,
    /// Every other node's identifier, for broadcast fan-out.
    peers: Vec<String>,
    /// Public keys of all validators, in round-robin / leader-election
    /// order. Also the membership list for [`ConsensusEngine`].
    validators: Vec<String>,
    retry_count: u32,

    /// Height this node is currently working on; starts at 1.
    pub current_height: u64,
    has_prevoted: bool,
    has_precommitted: bool,
    /// Highest height this node has finalized; 0 before any finalization.
    pub finalized_height: u64,

    mempool: Vec<Transaction>,
    blocks: BTreeMap<u64, Block>,
    seen_votes: HashSet<(VotePhase, u64, String, String)>,
    seen_tx_signatures: HashSet<String>,
    pending_headers: HashMap<String, BlockHeader>,
    received_bodies: HashMap<String, BlockBody>,

    consensus: ConsensusEngine,
    state: StateMachine,
}

impl Node {
    /// Builds a node. `validators` must be in the same order across every
    /// node in a run — that order is both the round-robin leader schedule
    /// and the consensus membership list.
    ///
    /// Fails iff `keypair`'s public key is not itself a member of
    /// `validators` — a node that isn't a validator could never finalize
    /// anything, which is always a misconfiguration rather than a
    /// meaningful observer role in this system.
    pub fn new(
        id: String,
        keypair: Ed25519KeyPair,
        peers: Vec<String>,
        validators: Vec<String>,
        retry_count: u32,
    ) -> crate::error::NodeResult<Self> {
        if !validators.contains(&keypair.public_key().to_hex()) {
            return Err(crate::error::NodeError::NotAValidator);
        }
        // validators is non-empty here: the contains() check above would
        // have already rejected an empty set (keypair can't be a member of it).
        let consensus = ConsensusEngine::new(validators.clone()).expect("validators is non-empty");
        Ok(Self {
            id,
            keypair,
            peers,
            validators,
            retry_count,
            current_height: 1,
            has_prevoted: false,
            has_precommitted: false,
            finalized_height: 0,
            mempool: Vec::new(),
            blocks: BTreeMap::new(),
            seen_votes: HashSet::new(),
            seen_tx_signatures: HashSet::new(),
            pending_headers: HashMap::new(),
            received_bodies: HashMap::new(),
            consensus,
            state: StateMachine::new(),
        })
    }

    /// This node's public key, hex-encoded — its consensus identity.
    pub fn pubkey(&self) -> String {
        self.keypair.public_key().to_hex()
    }

    /// The finalized block hash at `height`, if this node has one.
    pub fn block_at(&self, height: u64) -> Option<&Block> {
        self.blocks.get(&height)
    }

    /// The current state commitment.
    pub fn state_hash(&self) -> String {
        self.state.state_hash()
    }

    fn leader_for(&self, height: u64) -> &str {
        let idx = (height as usize - 1) % self.validators.len();
        &self.validators[idx]
    }

    /// Computes the leader for [`Node::current_height`]; proposes iff this
    /// node is it.
    pub fn start_consensus(&mut self, net: &mut dyn NetworkPort) {
        if self.validators.is_empty() {
            return;
        }
        if self.leader_for(self.current_height) == self.pubkey() {
            self.create_and_propose_block(net);
        }
    }

    /// Builds a block from the current mempool snapshot, signs it, and
    /// disseminates it header-first then body. Also delivers it to self
    /// directly — never through the network, so self-delivery costs no
    /// virtual time.
    pub fn create_and_propose_block(&mut self, net: &mut dyn NetworkPort) {
        let parent_hash = if self.current_height > 1 {
            self.blocks
                .get(&(self.current_height - 1))
                .map(|b| b.hash())
                .unwrap_or_else(|| GENESIS_HASH.to_string())
        } else {
            GENESIS_HASH.to_string()
        };

        let state_hash = self.state.state_hash();
        let txs = self.mempool.clone();
        let timestamp = net.current_time() as u64;

        let mut block = Block::new_unsigned(self.current_height, parent_hash, txs, state_hash, self.pubkey(), timestamp);
        block.sign(&self.keypair);

        broadcast_block(net, &self.id, &self.peers, &block, self.retry_count);
        self.handle_block(block, net);
    }

    /// Admits a client transaction to the mempool iff it validates against
    /// the current state and has not already been seen (deduped by
    /// signature). Does not broadcast — callers gossip via
    /// [`Node::submit_transaction`] when the transaction originates here.
    pub fn handle_transaction(&mut self, tx: Transaction) {
        if self.seen_tx_signatures.contains(&tx.signature) {
            return;
        }
        if !self.state.validate_transaction(&tx) {
            return;
        }
        self.seen_tx_signatures.insert(tx.signature.clone());
        self.mempool.push(tx);
    }

    /// Signs and submits a transaction as this node's own client, admitting
    /// it locally and gossiping it to every peer.
    pub fn submit_transaction(&mut self, key: String, value: String, net: &mut dyn NetworkPort) -> Transaction {
        let nonce = self.state.last_nonce(&self.pubkey()).map_or(0, |n| n + 1);
        let mut tx = Transaction::new_unsigned(self.pubkey(), key, value, nonce);
        tx.sign(&self.keypair);

        broadcast_message(net, &self.id, &self.peers, Message::Transaction(tx.clone()), self.retry_count);
        self.handle_transaction(tx.clone());
        tx
    }

    /// Accepts a fully assembled block (header + body merged, or delivered
    /// whole via self-delivery). Ignores it unless it targets the current
    /// height and its signature verifies; otherwise enters the prevote
    /// phase exactly once per height.
    pub fn handle_block(&mut self, block: Block, net: &mut dyn NetworkPort) {
        if block.height != self.current_height {
            return;
        }
        if !block.validate_signature() {
            tracing::debug!(node = %self.id, height = block.height, "dropping block with invalid signature");
            return;
        }

        let block_hash = block.hash();
        self.blocks.insert(block.height, block);

        if !self.has_prevoted {
            self.broadcast_vote(VotePhase::Prevote, block_hash, net);
            self.has_prevoted = true;
        }
    }

    /// Handles an inbound header: verifies it standalone, stores it as
    /// pending, and tells the network this receiver has accepted it (which
    /// releases any body that arrived first and was parked). If the body
    /// is already here too, assembles and dispatches the full block.
    pub fn receive_header(&mut self, header: BlockHeader, net: &mut dyn NetworkPort) {
        if header.height != self.current_height {
            return;
        }
        if !header.validate_signature() {
            tracing::debug!(node = %self.id, "dropping header with invalid signature");
            return;
        }

        let block_hash = header.block_hash.clone();
        self.pending_headers.insert(block_hash.clone(), header);
        net.accept_header(&self.id, &block_hash);

        if self.received_bodies.contains_key(&block_hash) {
            self.process_complete_block(&block_hash, net);
        }
    }

    /// Handles an inbound body: parks it, and assembles the full block
    /// immediately if its header already arrived.
    pub fn receive_body(&mut self, body: BlockBody, net: &mut dyn NetworkPort) {
        let block_hash = body.block_hash.clone();
        self.received_bodies.insert(block_hash.clone(), body);

        if self.pending_headers.contains_key(&block_hash) {
            self.process_complete_block(&block_hash, net);
        }
    }

    fn process_complete_block(&mut self, block_hash: &str, net: &mut dyn NetworkPort) {
        let (Some(header), Some(body)) = (
            self.pending_headers.remove(block_hash),
            self.received_bodies.remove(block_hash),
        ) else {
            return;
        };
        let block = Block::from_header_and_body(header, body);
        self.handle_block(block, net);
    }

    fn broadcast_vote(&mut self, phase: VotePhase, block_hash: String, net: &mut dyn NetworkPort) {
        let mut vote = Vote::new_unsigned(phase, self.current_height, block_hash, self.pubkey());
        vote.sign(&self.keypair);

        broadcast_message(net, &self.id, &self.peers, Message::Vote(vote.clone()), self.retry_count);
        self.handle_vote(vote, net);
    }

    /// Verifies and tallies an inbound vote, deduping by
    /// `(phase, height, block_hash, voter)`. Crosses into precommit on
    /// prevote quorum, and finalizes on precommit quorum.
    pub fn handle_vote(&mut self, vote: Vote, net: &mut dyn NetworkPort) {
        let key = vote.dedup_key();
        if self.seen_votes.contains(&key) {
            return;
        }
        if !vote.validate_signature() {
            tracing::debug!(node = %self.id, "dropping vote with invalid signature");
            return;
        }
        self.seen_votes.insert(key);

        if !self.consensus.add_vote(vote.phase, vote.height, vote.block_hash.clone(), vote.voter.clone()) {
            tracing::debug!(node = %self.id, voter = %vote.voter, "dropping vote from non-validator");
            return;
        }

        match vote.phase {
            VotePhase::Prevote => {
                if !self.has_precommitted
                    && vote.height == self.current_height
                    && self.consensus.check_threshold(vote.height, VotePhase::Prevote, &vote.block_hash)
                {
                    self.has_precommitted = true;
                    self.broadcast_vote(VotePhase::Precommit, vote.block_hash, net);
                }
            }
            VotePhase::Precommit => {
                if self.finalized_height < vote.height
                    && self.consensus.check_threshold(vote.height, VotePhase::Precommit, &vote.block_hash)
                {
                    self.finalize(vote.height, vote.block_hash);
                }
            }
        }
    }

    /// Commits `height` as finalized. If the locally stored block at that
    /// height matches `block_hash` and applies cleanly against the state
    /// machine, clears the mempool. `current_height` advances
    /// unconditionally afterward, even if the commitment check failed —
    /// this node still moves on; it just never reconciles that block's
    /// effects into its own state.
    fn finalize(&mut self, height: u64, block_hash: String) {
        self.finalized_height = height;

        if let Some(block) = self.blocks.get(&height) {
            if block.hash() == block_hash && self.state.apply_block(block) {
                self.mempool.clear();
            }
        }

        self.current_height += 1;
        self.has_prevoted = false;
        self.has_precommitted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default)]
    struct LoopbackNet {
        time: f64,
        inboxes: HashMap<String, VecDeque<Inbound>>,
    }

    enum Inbound {
        Message(String, Message),
        Header(String, BlockHeader),
        Body(String, BlockBody),
    }

    impl NetworkPort for Rc<RefCell<LoopbackNet>> {
        fn send_message(&mut self, _sender: &str, receiver: &str, message: Message) {
            self.borrow_mut()
                .inboxes
                .entry(receiver.to_string())
                .or_default()
                .push_back(Inbound::Message(receiver.to_string(), message));
        }

        fn send_header(&mut self, _sender: &str, receiver: &str, header: BlockHeader) {
            self.borrow_mut()
                .inboxes
                .entry(receiver.to_string())
                .or_default()
                .push_back(Inbound::Header(receiver.to_string(), header));
        }

        fn send_body(&mut self, _sender: &str, receiver: &str, body: BlockBody) {
            self.borrow_mut()
                .inboxes
                .entry(receiver.to_string())
                .or_default()
                .push_back(Inbound::Body(receiver.to_string(), body));
        }

        fn accept_header(&mut self, _receiver: &str, _block_hash: &str) {}

        fn current_time(&self) -> f64 {
            self.borrow().time
        }
    }

    fn drain(net: &Rc<RefCell<LoopbackNet>>, nodes: &mut HashMap<String, Node>) {
        loop {
            let next = {
                let mut n = net.borrow_mut();
                n.inboxes.iter_mut().find_map(|(id, q)| q.pop_front().map(|m| (id.clone(), m)))
            };
            let Some((id, inbound)) = next else { break };
            let node = nodes.get_mut(&id).unwrap();
            let mut net = net.clone();
            match inbound {
                Inbound::Message(_, Message::Transaction(tx)) => node.handle_transaction(tx),
                Inbound::Message(_, Message::Vote(vote)) => node.handle_vote(vote, &mut net),
                Inbound::Header(_, header) => node.receive_header(header, &mut net),
                Inbound::Body(_, body) => node.receive_body(body, &mut net),
            }
        }
    }

    fn make_cluster(n: usize) -> (Rc<RefCell<LoopbackNet>>, HashMap<String, Node>) {
        let ids: Vec<String> = (0..n).map(|i| format!("Node{i}")).collect();
        let keypairs: Vec<Ed25519KeyPair> = ids.iter().map(|id| Ed25519KeyPair::from_seed_string(id)).collect();
        let validators: Vec<String> = keypairs.iter().map(|kp| kp.public_key().to_hex()).collect();

        let mut nodes = HashMap::new();
        for (i, id) in ids.iter().enumerate() {
            let peers: Vec<String> = ids.iter().filter(|p| *p != id).cloned().collect();
            let node = Node::new(id.clone(), Ed25519KeyPair::from_seed_string(id), peers, validators.clone(), 1).unwrap();
            nodes.insert(id.clone(), node);
            let _ = i;
        }
        (Rc::new(RefCell::new(LoopbackNet::default())), nodes)
    }

    #[test]
    fn happy_path_all_nodes_finalize_same_block() {
        let (net, mut nodes) = make_cluster(4);
        let mut net0 = net.clone();
        let leader_id = "Node0".to_string();
        nodes.get_mut(&leader_id).unwrap().start_consensus(&mut net0);
        drain(&net, &mut nodes);

        let hashes: Vec<String> = nodes.values().map(|n| n.block_at(1).unwrap().hash()).collect();
        assert!(hashes.windows(2).all(|w| w[0] == w[1]));
        assert!(nodes.values().all(|n| n.finalized_height == 1));
    }

    #[test]
    fn non_leader_never_proposes() {
        let (net, mut nodes) = make_cluster(4);
        let mut net1 = net.clone();
        nodes.get_mut("Node1").unwrap().start_consensus(&mut net1);
        drain(&net, &mut nodes);
        assert!(nodes.values().all(|n| n.finalized_height == 0));
    }

    #[test]
    fn rejects_a_key_outside_the_validator_set() {
        let validators: Vec<String> = (0..4).map(|i| Ed25519KeyPair::from_seed_string(&format!("Node{i}")).public_key().to_hex()).collect();
        let outsider = Ed25519KeyPair::from_seed_string("NotAValidator");
        let result = Node::new("Node0".to_string(), outsider, vec![], validators, 1);
        assert!(matches!(result, Err(crate::error::NodeError::NotAValidator)));
    }
}

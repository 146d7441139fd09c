//! The transport half of the simulator: everything [`chain_node::NetworkPort`]
//! requires, minus node ownership (split out so the event loop can borrow
//! nodes and transport independently; see [`crate::simulator`]).

use crate::event::{EnvelopeMessage, Event, Payload};
use crate::log::EventLog;
use crate::rate_limit::{RateLimiter, Verdict};
use chain_entities::{BlockBody, BlockHeader};
use chain_node::{Message, NetworkPort};
use chain_types::NetworkConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Virtual clock, event heap, rate limiter, and two-phase dissemination
/// state. Implements [`NetworkPort`] so nodes can send through it without
/// knowing it is a simulation.
pub struct NetCore {
    rng: StdRng,
    heap: BinaryHeap<Event>,
    next_seq: u64,
    current_time: f64,

    min_delay: f64,
    max_delay: f64,
    drop_prob: f64,
    duplicate_prob: f64,
    rate_limiter: RateLimiter,

    accepted_headers: HashMap<String, HashSet<String>>,
    pending_bodies: HashMap<(String, String, String), BlockBody>,

    pub log: EventLog,
}

impl NetCore {
    /// Builds transport state from network config and a determinism seed.
    pub fn new(network: &NetworkConfig, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            heap: BinaryHeap::new(),
            next_seq: 0,
            current_time: 0.0,
            min_delay: network.min_delay,
            max_delay: network.max_delay,
            drop_prob: network.drop_prob,
            duplicate_prob: network.duplicate_prob,
            rate_limiter: RateLimiter::new(network.rate_limit.max_messages_per_second, network.rate_limit.block_duration),
            accepted_headers: HashMap::new(),
            pending_bodies: HashMap::new(),
            log: EventLog::new(),
        }
    }

    /// Pops the next event in delivery order, if any and within
    /// `max_time`, advancing the virtual clock to its delivery time.
    pub fn pop_next(&mut self, max_time: f64) -> Option<Event> {
        let event = self.heap.peek()?;
        if event.delivery_time > max_time {
            return None;
        }
        let event = self.heap.pop().expect("peeked Some above");
        self.current_time = event.delivery_time;
        Some(event)
    }

    /// Whether any event remains that could still be popped.
    pub fn is_idle(&self) -> bool {
        self.heap.is_empty()
    }

    fn draw_delay(&mut self) -> f64 {
        if self.max_delay <= self.min_delay {
            self.min_delay
        } else {
            self.rng.gen_range(self.min_delay..self.max_delay)
        }
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn schedule(&mut self, delivery_time: f64, sender: &str, receiver: &str, payload: Payload) {
        let seq = self.next_seq();
        self.heap.push(Event {
            delivery_time,
            seq,
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            payload,
        });
    }

    fn message_label(message: &Message) -> &'static str {
        match message {
            Message::Transaction(_) => "type=TX",
            Message::Vote(vote) => match vote.phase {
                chain_entities::VotePhase::Prevote => "type=PREVOTE",
                chain_entities::VotePhase::Precommit => "type=PRECOMMIT",
            },
        }
    }

    fn envelope(message: Message) -> EnvelopeMessage {
        match message {
            Message::Transaction(tx) => EnvelopeMessage::Transaction(tx),
            Message::Vote(vote) => EnvelopeMessage::Vote(vote),
        }
    }
}

impl NetworkPort for NetCore {
    fn send_message(&mut self, sender: &str, receiver: &str, message: Message) {
        match self.rate_limiter.check(sender, receiver, self.current_time) {
            Verdict::StillBlocked => {
                self.log.record_extra(self.current_time, "BLOCKED", sender, receiver, Some("(rate limit)"));
                return;
            }
            Verdict::NewlyBlocked { .. } => {
                self.log.record_extra(self.current_time, "BLOCK", sender, receiver, Some("(exceeded rate limit)"));
                return;
            }
            Verdict::JustUnblocked => {
                self.log.record(self.current_time, "UNBLOCK", sender, receiver);
            }
            Verdict::Allow => {}
        }

        let label = Self::message_label(&message);
        if self.rng.gen::<f64>() < self.drop_prob {
            self.log.record_extra(self.current_time, "DROP", sender, receiver, Some(label));
            return;
        }

        let delay = self.draw_delay();
        let delivery_time = self.current_time + delay;
        self.log.record_extra(self.current_time, "SEND", sender, receiver, Some(label));
        self.schedule(delivery_time, sender, receiver, Payload::Message(Self::envelope(message.clone())));

        if self.rng.gen::<f64>() < self.duplicate_prob {
            let extra_delay = self.draw_delay();
            self.log.record(self.current_time, "DUPLICATE", sender, receiver);
            self.schedule(delivery_time + extra_delay, sender, receiver, Payload::Message(Self::envelope(message)));
        }
    }

    fn send_header(&mut self, sender: &str, receiver: &str, header: BlockHeader) {
        match self.rate_limiter.check(sender, receiver, self.current_time) {
            Verdict::StillBlocked => {
                self.log.record_extra(self.current_time, "BLOCKED", sender, receiver, Some("(rate limit)"));
                return;
            }
            Verdict::NewlyBlocked { .. } => {
                self.log.record_extra(self.current_time, "BLOCK", sender, receiver, Some("(exceeded rate limit)"));
                return;
            }
            Verdict::JustUnblocked => {
                self.log.record(self.current_time, "UNBLOCK", sender, receiver);
            }
            Verdict::Allow => {}
        }

        if self.rng.gen::<f64>() < self.drop_prob {
            self.log.record(self.current_time, "DROP_HEADER", sender, receiver);
            return;
        }

        let delay = self.draw_delay();
        let delivery_time = self.current_time + delay;
        let extra = format!("height={}", header.height);
        self.log.record_extra(self.current_time, "SEND_HEADER", sender, receiver, Some(&extra));
        self.schedule(delivery_time, sender, receiver, Payload::Header(header.clone()));

        if self.rng.gen::<f64>() < self.duplicate_prob {
            let extra_delay = self.draw_delay();
            self.log.record(self.current_time, "DUPLICATE", sender, receiver);
            self.schedule(delivery_time + extra_delay, sender, receiver, Payload::Header(header));
        }
    }

    fn send_body(&mut self, sender: &str, receiver: &str, body: BlockBody) {
        match self.rate_limiter.check(sender, receiver, self.current_time) {
            Verdict::StillBlocked => {
                self.log.record_extra(self.current_time, "BLOCKED", sender, receiver, Some("(rate limit)"));
                return;
            }
            Verdict::NewlyBlocked { .. } => {
                self.log.record_extra(self.current_time, "BLOCK", sender, receiver, Some("(exceeded rate limit)"));
                return;
            }
            Verdict::JustUnblocked => {
                self.log.record(self.current_time, "UNBLOCK", sender, receiver);
            }
            Verdict::Allow => {}
        }

        let accepted = self
            .accepted_headers
            .get(receiver)
            .is_some_and(|set| set.contains(&body.block_hash));
        if !accepted {
            self.log.record_extra(self.current_time, "PENDING_BODY", sender, receiver, Some("(waiting for header)"));
            self.pending_bodies
                .insert((sender.to_string(), receiver.to_string(), body.block_hash.clone()), body);
            return;
        }

        if self.rng.gen::<f64>() < self.drop_prob {
            self.log.record(self.current_time, "DROP_BODY", sender, receiver);
            return;
        }

        let delay = self.draw_delay();
        let delivery_time = self.current_time + delay;
        self.log.record(self.current_time, "SEND_BODY", sender, receiver);
        self.schedule(delivery_time, sender, receiver, Payload::Body(body.clone()));

        if self.rng.gen::<f64>() < self.duplicate_prob {
            let extra_delay = self.draw_delay();
            self.log.record(self.current_time, "DUPLICATE", sender, receiver);
            self.schedule(delivery_time + extra_delay, sender, receiver, Payload::Body(body));
        }
    }

    fn accept_header(&mut self, receiver: &str, block_hash: &str) {
        self.accepted_headers
            .entry(receiver.to_string())
            .or_default()
            .insert(block_hash.to_string());

        let ready: Vec<(String, String, String)> = self
            .pending_bodies
            .keys()
            .filter(|(_, recv, hash)| recv == receiver && hash == block_hash)
            .cloned()
            .collect();

        for key in ready {
            if let Some(body) = self.pending_bodies.remove(&key) {
                let (sender, receiver, _) = key;
                self.send_body(&sender, &receiver, body);
            }
        }
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }
}

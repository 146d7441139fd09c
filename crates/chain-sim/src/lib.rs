//! Deterministic discrete-event network simulator: an unreliable-channel
//! transport ([`NetCore`]) plus the cluster wiring ([`Simulator`]) that
//! drives a validator set through it.

pub mod error;
pub mod event;
pub mod log;
pub mod net_core;
pub mod rate_limit;
pub mod simulator;

pub use error::{SimError, SimResult};
pub use event::{EnvelopeMessage, Event, Payload};
pub use log::EventLog;
pub use net_core::NetCore;
pub use rate_limit::{RateLimiter, Verdict};
pub use simulator::Simulator;

//! Per-directed-pair fixed-window rate limiting.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default)]
struct Window {
    count: u32,
    window_start: f64,
}

/// The outcome of a rate-limit check, carrying what should be logged.
pub enum Verdict {
    /// Sending is allowed this tick.
    Allow,
    /// Already blocked from a prior violation; still within the block
    /// window.
    StillBlocked,
    /// The block window just expired; the pair is unblocked and this send
    /// is allowed.
    JustUnblocked,
    /// This send pushed the pair over the limit; it is dropped and the
    /// pair is now blocked until `until`.
    NewlyBlocked { until: f64 },
}

/// Tracks, per `(sender, receiver)` pair, a fixed one-second counting
/// window and a block expiry. Mirrors the window semantics used across the
/// rest of the workspace for request throttling, simplified to a single
/// global threshold instead of per-tier quotas.
pub struct RateLimiter {
    max_messages_per_second: u32,
    block_duration: f64,
    windows: HashMap<(String, String), Window>,
    blocked_until: HashMap<(String, String), f64>,
}

impl RateLimiter {
    /// Builds a limiter with a fixed threshold and block duration.
    pub fn new(max_messages_per_second: u32, block_duration: f64) -> Self {
        Self {
            max_messages_per_second,
            block_duration,
            windows: HashMap::new(),
            blocked_until: HashMap::new(),
        }
    }

    /// Checks and updates state for a send attempt from `sender` to
    /// `receiver` at `current_time`.
    pub fn check(&mut self, sender: &str, receiver: &str, current_time: f64) -> Verdict {
        let pair = (sender.to_string(), receiver.to_string());

        let mut just_unblocked = false;
        if let Some(&until) = self.blocked_until.get(&pair) {
            if current_time < until {
                return Verdict::StillBlocked;
            }
            self.blocked_until.remove(&pair);
            just_unblocked = true;
        }

        let window = self.windows.entry(pair.clone()).or_default();
        if current_time - window.window_start >= 1.0 {
            window.count = 0;
            window.window_start = current_time;
        }
        window.count += 1;

        if window.count > self.max_messages_per_second {
            let until = current_time + self.block_duration;
            self.blocked_until.insert(pair, until);
            return Verdict::NewlyBlocked { until };
        }

        if just_unblocked {
            Verdict::JustUnblocked
        } else {
            Verdict::Allow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_under_threshold() {
        let mut rl = RateLimiter::new(3, 1.0);
        assert!(matches!(rl.check("a", "b", 0.0), Verdict::Allow));
        assert!(matches!(rl.check("a", "b", 0.0), Verdict::Allow));
        assert!(matches!(rl.check("a", "b", 0.0), Verdict::Allow));
    }

    #[test]
    fn blocks_after_exceeding_threshold() {
        let mut rl = RateLimiter::new(2, 1.0);
        assert!(matches!(rl.check("a", "b", 0.0), Verdict::Allow));
        assert!(matches!(rl.check("a", "b", 0.0), Verdict::Allow));
        assert!(matches!(rl.check("a", "b", 0.0), Verdict::NewlyBlocked { .. }));
        assert!(matches!(rl.check("a", "b", 0.1), Verdict::StillBlocked));
    }

    #[test]
    fn unblocks_after_duration_and_resets_window() {
        let mut rl = RateLimiter::new(1, 1.0);
        assert!(matches!(rl.check("a", "b", 0.0), Verdict::Allow));
        assert!(matches!(rl.check("a", "b", 0.0), Verdict::NewlyBlocked { .. }));
        assert!(matches!(rl.check("a", "b", 1.5), Verdict::JustUnblocked));
    }

    #[test]
    fn window_resets_after_one_second_elapses() {
        let mut rl = RateLimiter::new(1, 1.0);
        assert!(matches!(rl.check("a", "b", 0.0), Verdict::Allow));
        assert!(matches!(rl.check("a", "b", 1.0), Verdict::Allow));
    }

    #[test]
    fn distinct_pairs_have_independent_windows() {
        let mut rl = RateLimiter::new(1, 1.0);
        assert!(matches!(rl.check("a", "b", 0.0), Verdict::Allow));
        assert!(matches!(rl.check("a", "c", 0.0), Verdict::Allow));
    }
}

use std::time::{Duration, Instant};

/// Token bucket guarding one connection's inbound messages. The bucket
/// starts full so a fresh client can join and act immediately; sustained
/// spam drains it faster than it replenishes.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    capacity: u32,
    available: u32,
    replenish_every: Duration,
    replenished_at: Instant,
}

impl RateLimiter {
    pub fn new(capacity: u32, replenish_every: Duration) -> Self {
        Self {
            capacity,
            available: capacity,
            replenish_every,
            replenished_at: Instant::now(),
        }
    }

    /// Spends one token if the bucket has any. Returns false when the
    /// connection has exceeded its budget.
    pub fn allow(&mut self) -> bool {
        self.replenish();
        if self.available > 0 {
            self.available -= 1;
            true
        } else {
            false
        }
    }

    pub fn remaining(&mut self) -> u32 {
        self.replenish();
        self.available
    }

    fn replenish(&mut self) {
        let elapsed = self.replenished_at.elapsed();
        let earned = (elapsed.as_millis() / self.replenish_every.as_millis()) as u32;
        if earned == 0 {
            return;
        }
        self.available = (self.available + earned).min(self.capacity);
        // Advance by the whole tokens actually credited so partial progress
        // toward the next token is not thrown away.
        self.replenished_at += self.replenish_every * earned;
        if self.available == self.capacity {
            self.replenished_at = Instant::now();
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        // A round of Contact is chatty: clue typing, contact clicks and
        // updates all land within seconds of each other.
        Self::new(25, Duration::from_millis(500))
    }
}

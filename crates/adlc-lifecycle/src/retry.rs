use std::time::Duration;

/// Fixed backoff bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    floor: Duration,
    ceiling: Duration,
}

impl RetryPolicy {
    /// A ceiling below the floor is raised to the floor so `floor <= ceiling`
    /// always holds.
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        Self {
            floor,
            ceiling: ceiling.max(floor),
        }
    }

    pub fn floor(&self) -> Duration {
        self.floor
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(30))
    }
}

/// Per-kind backoff state.
///
/// Invariant: `floor <= current <= ceiling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    policy: RetryPolicy,
    current: Duration,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            current: policy.floor,
        }
    }

    /// Delay the next transient failure would be retried after.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Record a transient failure. Returns the delay to schedule the retry
    /// after, then doubles the stored delay, capped at the ceiling.
    pub fn on_transient_failure(&mut self) -> Duration {
        let scheduled = self.current;
        self.current = self
            .current
            .checked_mul(2)
            .unwrap_or(self.policy.ceiling)
            .min(self.policy.ceiling);
        scheduled
    }

    /// Back to the floor after a success or a non-transient failure.
    pub fn reset(&mut self) {
        self.current = self.policy.floor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_floor() {
        let r = RetryState::new(RetryPolicy::default());
        assert_eq!(r.current(), Duration::from_secs(2));
    }

    #[test]
    fn scheduled_delays_double_then_cap() {
        let mut r = RetryState::new(RetryPolicy::default());
        let seq: Vec<u64> = (0..6).map(|_| r.on_transient_failure().as_secs()).collect();
        assert_eq!(seq, vec![2, 4, 8, 16, 30, 30]);
        assert_eq!(r.current(), Duration::from_secs(30));
    }

    #[test]
    fn reset_returns_to_floor() {
        let mut r = RetryState::new(RetryPolicy::default());
        r.on_transient_failure();
        r.on_transient_failure();
        assert_eq!(r.current(), Duration::from_secs(8));
        r.reset();
        assert_eq!(r.current(), Duration::from_secs(2));
    }

    #[test]
    fn ceiling_below_floor_is_clamped() {
        let p = RetryPolicy::new(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(p.ceiling(), Duration::from_secs(5));
        let mut r = RetryState::new(p);
        assert_eq!(r.on_transient_failure(), Duration::from_secs(5));
        assert_eq!(r.current(), Duration::from_secs(5));
    }

    #[test]
    fn bounds_hold_over_long_runs() {
        let p = RetryPolicy::new(Duration::from_millis(1500), Duration::from_secs(20));
        let mut r = RetryState::new(p);
        for i in 0..50 {
            if i % 7 == 6 {
                r.reset();
            } else {
                r.on_transient_failure();
            }
            assert!(r.current() >= p.floor() && r.current() <= p.ceiling());
        }
    }
}

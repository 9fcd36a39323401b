use std::time::Duration;

use tokio::time::Instant;

/// Default first retry delay.
pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(100);

/// Default ceiling for a single retry delay.
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(5);

/// Default total time budget across all retries.
pub const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(30);

/// Exponential retry schedule bounded by total elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    initial_interval: Duration,
    multiplier: u32,
    max_interval: Duration,
    max_elapsed: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            multiplier: 2,
            max_interval: DEFAULT_MAX_INTERVAL,
            max_elapsed: DEFAULT_MAX_ELAPSED,
        }
    }
}

impl BackoffPolicy {
    /// Overrides the total retry budget.
    #[must_use]
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    /// Returns the total retry budget.
    #[must_use]
    pub fn max_elapsed(&self) -> Duration {
        self.max_elapsed
    }

    /// Starts a schedule whose elapsed-time budget begins now.
    #[must_use]
    pub fn start(&self) -> Backoff {
        Backoff {
            policy: *self,
            started_at: Instant::now(),
            next_interval: self.initial_interval,
        }
    }
}

/// Running retry schedule.
#[derive(Debug)]
pub struct Backoff {
    policy: BackoffPolicy,
    started_at: Instant,
    next_interval: Duration,
}

impl Backoff {
    /// Returns the delay before the next attempt, or `None` once the budget is spent.
    ///
    /// The last delay is shortened so no attempt starts after the budget ends.
    pub fn next_delay(&mut self) -> Option<Duration> {
        let remaining = self
            .policy
            .max_elapsed
            .checked_sub(self.started_at.elapsed())
            .filter(|remaining| !remaining.is_zero())?;

        let delay = self.next_interval.min(remaining);
        self.next_interval = self
            .next_interval
            .saturating_mul(self.policy.multiplier)
            .min(self.policy.max_interval);

        Some(delay)
    }
}

//! Retry policy — escalating backoff indexed by attempt number.

use chrono::Duration;
use leadpilot_core::config::RetryConfig;

/// Deterministic retry schedule. Failure classification is uniform: every
/// handler error is retryable until `max_attempts`, then the job is
/// quarantined in the DLQ.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    delays: Vec<Duration>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay_secs: &[u64]) -> Self {
        let delays = if delay_secs.is_empty() {
            vec![Duration::seconds(5)]
        } else {
            delay_secs
                .iter()
                .map(|s| Duration::seconds(*s as i64))
                .collect()
        };
        Self {
            max_attempts,
            delays,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, &config.backoff_secs)
    }

    /// Delay before the job becomes eligible again after its `attempt`-th
    /// failure (1-based). Attempts past the table clamp to the last entry.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let idx = (attempt.max(1) as usize - 1).min(self.delays.len() - 1);
        self.delays[idx]
    }

    /// Whether a job that has now failed `attempts` times is out of budget.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        let expected = [5, 20, 60, 180, 600];
        for (i, secs) in expected.iter().enumerate() {
            assert_eq!(policy.delay_for(i as u32 + 1).num_seconds(), *secs as i64);
        }
        // Clamped past the end of the table.
        assert_eq!(policy.delay_for(6).num_seconds(), 600);
        assert_eq!(policy.delay_for(100).num_seconds(), 600);
    }

    #[test]
    fn test_exhaustion_boundary() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_exhausted(4));
        assert!(policy.is_exhausted(5));
    }
}

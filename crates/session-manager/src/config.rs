//! Session configuration

use serde::{Deserialize, Serialize};

/// What a batch does when one frame fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop dispatching and surface the earliest failed frame
    #[default]
    FailFast,
    /// Drop failed frames from the aggregate and report them
    SkipAndContinue,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Worker count, one model handle per worker
    pub workers: usize,
    /// Per-frame failure handling inside a batch
    pub failure_policy: FailurePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .clamp(1, 4);

        Self {
            workers,
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

impl SessionConfig {
    /// One handle, frames run strictly one after another
    pub fn sequential() -> Self {
        Self {
            workers: 1,
            ..Default::default()
        }
    }

    /// Fixed-size worker pool
    pub fn parallel(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            ..Default::default()
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fail_fast() {
        let config = SessionConfig::default();
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert!((1..=4).contains(&config.workers));
    }

    #[test]
    fn test_parallel_has_at_least_one_worker() {
        assert_eq!(SessionConfig::parallel(0).workers, 1);
    }
}

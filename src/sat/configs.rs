//! Search budget for a single solver run.

use std::time::Duration;

/// Default wall-clock budget for one satisfiability query.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(10);

/// How long a solver may search before giving up with
/// [`SolveResult::Unknown`](crate::sat::solver::SolveResult::Unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverConfig {
    /// Wall-clock limit. `None` searches without one.
    pub time_limit: Option<Duration>,
    /// Limit on conflicts. `None` searches without one.
    pub conflict_limit: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Some(DEFAULT_TIME_LIMIT),
            conflict_limit: None,
        }
    }
}

impl SolverConfig {
    /// No limits at all.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            time_limit: None,
            conflict_limit: None,
        }
    }

    /// Replaces the time limit.
    #[must_use]
    pub const fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    /// Replaces the conflict limit.
    #[must_use]
    pub const fn with_conflict_limit(mut self, limit: Option<usize>) -> Self {
        self.conflict_limit = limit;
        self
    }

    /// `true` once either bound has been reached.
    #[must_use]
    pub fn exhausted(&self, conflicts: usize, elapsed: Duration) -> bool {
        self.conflict_limit.is_some_and(|limit| conflicts >= limit)
            || self.time_limit.is_some_and(|limit| elapsed >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted() {
        let config = SolverConfig::unbounded().with_conflict_limit(Some(3));
        assert!(!config.exhausted(2, Duration::from_secs(100)));
        assert!(config.exhausted(3, Duration::ZERO));

        let config = SolverConfig::default();
        assert!(config.exhausted(0, DEFAULT_TIME_LIMIT));
        assert!(!SolverConfig::unbounded().exhausted(usize::MAX, Duration::MAX));
    }
}

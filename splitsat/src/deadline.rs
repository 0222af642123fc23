//! Monotonic deadline tracking.
use std::time::{Duration, Instant};

use crate::error::SolverError;

/// A monotonic start instant with an optional time budget.
///
/// Every long-running loop of the partitioning core consults a deadline at its loop boundary,
/// and backends receive the remaining budget at every dispatch. Checking never suspends the
/// thread; the deadline is purely computational.
#[derive(Copy, Clone, Debug)]
pub struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    /// Starts the clock now, with an optional budget.
    pub fn start(budget: Option<Duration>) -> Deadline {
        Deadline {
            start: Instant::now(),
            budget,
        }
    }

    /// A deadline that never expires.
    pub fn unbounded() -> Deadline {
        Deadline::start(None)
    }

    /// Budget left, `None` when unbounded.
    ///
    /// Saturates at zero once the budget is spent.
    pub fn remaining(&self) -> Option<Duration> {
        self.budget
            .map(|budget| budget.saturating_sub(self.start.elapsed()))
    }

    /// Whether the budget is spent. Always false when unbounded.
    pub fn expired(&self) -> bool {
        match self.budget {
            None => false,
            Some(budget) => self.start.elapsed() >= budget,
        }
    }

    /// Fails with [`SolverError::DeadlineExceeded`] once the budget is spent.
    pub fn check(&self) -> Result<(), SolverError> {
        if self.expired() {
            Err(SolverError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}

//! Cooperative stop signal shared by the walker and the aggregation workers.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use blink_core::ScanError;

/// A cancellation token plus an optional deadline, polled between entries.
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint {
    token: CancellationToken,
    deadline: Option<(Instant, Duration)>,
}

impl Checkpoint {
    pub fn new(token: CancellationToken, budget: Option<Duration>, start: Instant) -> Self {
        Self {
            token,
            deadline: budget.map(|b| (start + b, b)),
        }
    }

    /// Whether the scan should stop.
    pub fn should_stop(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|(at, _)| Instant::now() >= at)
    }

    /// `Err` once the token fired or the deadline passed.
    pub fn check(&self) -> Result<(), ScanError> {
        if self.token.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        if let Some((at, budget)) = self.deadline {
            if Instant::now() >= at {
                return Err(ScanError::DeadlineExceeded { budget });
            }
        }
        Ok(())
    }
}

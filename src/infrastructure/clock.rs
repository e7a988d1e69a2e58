use crate::domain::loan::Timestamp;
use crate::domain::ports::Clock;
use crate::error::{LoanError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A clock driven by the caller, e.g. from block timestamps in an input stream.
///
/// Clones share the same time. It only moves forward.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start.0)),
        }
    }

    /// Moves the clock to `to`. Fails if that would move time backwards.
    pub fn set(&self, to: Timestamp) -> Result<()> {
        self.now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (to.0 >= current).then_some(to.0)
            })
            .map(|_| ())
            .map_err(|current| {
                LoanError::ValidationError(format!(
                    "time went backwards: {} is before {}",
                    to, current
                ))
            })
    }

    pub fn advance_days(&self, days: u64) -> Result<()> {
        self.set(self.now().plus_days(days)?)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}

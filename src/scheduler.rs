//! Coalescing of menu writes.
//!
//! Every mutation marks the tree dirty and pushes the deadline out by the
//! quiet period. The owner polls [`WriteScheduler::is_due`] from its event
//! loop and performs the write itself, synchronously, so a write always sees
//! a consistent tree and only one is ever in flight.

use std::time::{Duration, Instant};

use tracing::debug;

/// Debounces writes after bursts of mutations.
#[derive(Debug, Clone)]
pub struct WriteScheduler {
    quiet_period: Duration,
    deadline: Option<Instant>,
    revision: u64,
    in_flight: Option<u64>,
    written_revision: u64,
}

impl WriteScheduler {
    /// Scheduler that waits `quiet_period` after the last mutation.
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            deadline: None,
            revision: 0,
            in_flight: None,
            written_revision: 0,
        }
    }

    /// Records a mutation at `now`, superseding any pending deadline.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.revision += 1;
        self.deadline = Some(now + self.quiet_period);
    }

    /// Whether changes are waiting to be written.
    pub fn is_pending(&self) -> bool {
        self.revision != self.written_revision
    }

    /// Whether the quiet period has elapsed and no write is running.
    pub fn is_due(&self, now: Instant) -> bool {
        self.in_flight.is_none()
            && self.is_pending()
            && self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Marks the start of a write covering everything recorded so far.
    /// Returns `false` if a write is already running.
    pub fn begin_write(&mut self) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.in_flight = Some(self.revision);
        self.deadline = None;
        true
    }

    /// Ends the running write. On failure the changes stay pending and are
    /// retried after another quiet period.
    pub fn finish_write(&mut self, success: bool, now: Instant) {
        let Some(revision) = self.in_flight.take() else {
            return;
        };
        if success {
            self.written_revision = self.written_revision.max(revision);
            debug!("Menu revision {} written", revision);
        }
        if self.is_pending() && self.deadline.is_none() {
            self.deadline = Some(now + self.quiet_period);
        }
    }
}

impl Default for WriteScheduler {
    fn default() -> Self {
        Self::new(crate::config::Defaults::WRITE_QUIET_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_coalesces_into_one_write() {
        let start = Instant::now();
        let mut scheduler = WriteScheduler::new(Duration::from_millis(100));
        scheduler.mark_dirty(start);
        scheduler.mark_dirty(start + Duration::from_millis(50));
        assert!(!scheduler.is_due(start + Duration::from_millis(120)));
        assert!(scheduler.is_due(start + Duration::from_millis(150)));

        assert!(scheduler.begin_write());
        scheduler.finish_write(true, start + Duration::from_millis(160));
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn test_mutation_during_write_stays_pending() {
        let start = Instant::now();
        let mut scheduler = WriteScheduler::new(Duration::from_millis(10));
        scheduler.mark_dirty(start);
        assert!(scheduler.begin_write());
        assert!(!scheduler.begin_write());
        scheduler.mark_dirty(start + Duration::from_millis(5));
        scheduler.finish_write(true, start + Duration::from_millis(6));
        assert!(scheduler.is_pending());
        assert!(scheduler.is_due(start + Duration::from_millis(20)));
    }

    #[test]
    fn test_failed_write_is_retried() {
        let start = Instant::now();
        let mut scheduler = WriteScheduler::new(Duration::from_millis(10));
        scheduler.mark_dirty(start);
        scheduler.begin_write();
        scheduler.finish_write(false, start + Duration::from_millis(10));
        assert!(scheduler.is_pending());
        assert!(!scheduler.is_due(start + Duration::from_millis(15)));
        assert!(scheduler.is_due(start + Duration::from_millis(20)));
    }
}

use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Debouncer – latest request wins
// ---------------------------------------------------------------------------

/// Single-slot holder for a pending recompute.
///
/// Scheduling replaces whatever was pending and restarts the quiet period;
/// the request only comes back out of [`poll`](Self::poll) once no newer one
/// has arrived for `quiet`. Time is passed in so the UI loop (and tests)
/// decide what "now" is.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug)]
struct Pending<T> {
    request: T,
    due: Instant,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Debouncer {
            quiet,
            pending: None,
        }
    }

    /// Queue `request`, returning the one it superseded, if any.
    pub fn schedule(&mut self, request: T, now: Instant) -> Option<T> {
        let superseded = self.pending.replace(Pending {
            request,
            due: now + self.quiet,
        });
        if superseded.is_some() {
            log::trace!("pending recompute superseded");
        }
        superseded.map(|p| p.request)
    }

    /// Take the pending request if its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.pending.as_ref().is_some_and(|p| now >= p.due);
        if due {
            self.pending.take().map(|p| p.request)
        } else {
            None
        }
    }

    /// How long until the pending request becomes due; `None` when idle.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|p| p.due.saturating_duration_since(now))
    }

    /// Drop the pending request without running it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.request)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(300);

    #[test]
    fn fires_only_after_quiet_period() {
        let start = Instant::now();
        let mut d = Debouncer::new(QUIET);
        assert_eq!(d.schedule(1, start), None);
        assert_eq!(d.poll(start + Duration::from_millis(299)), None);
        assert!(d.is_pending());
        assert_eq!(d.poll(start + QUIET), Some(1));
        assert!(!d.is_pending());
        assert_eq!(d.poll(start + QUIET * 2), None);
    }

    #[test]
    fn newer_request_supersedes_and_restarts_timer() {
        let start = Instant::now();
        let mut d = Debouncer::new(QUIET);
        d.schedule("first", start);
        let later = start + Duration::from_millis(200);
        assert_eq!(d.schedule("second", later), Some("first"));
        // the first request's deadline has passed but it was replaced
        assert_eq!(d.poll(start + QUIET), None);
        assert_eq!(d.poll(later + QUIET), Some("second"));
    }

    #[test]
    fn reports_time_until_due() {
        let start = Instant::now();
        let mut d = Debouncer::new(QUIET);
        assert_eq!(d.time_until_due(start), None);
        d.schedule((), start);
        assert_eq!(
            d.time_until_due(start + Duration::from_millis(100)),
            Some(Duration::from_millis(200))
        );
        assert_eq!(d.time_until_due(start + QUIET * 2), Some(Duration::ZERO));
    }

    #[test]
    fn cancel_discards_pending() {
        let start = Instant::now();
        let mut d = Debouncer::new(QUIET);
        d.schedule(7, start);
        assert_eq!(d.cancel(), Some(7));
        assert_eq!(d.poll(start + QUIET), None);
    }
}

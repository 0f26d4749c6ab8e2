use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Remembers when each `(message, severity)` pair was last shown.
/// Expired entries are swept on every admission check.
pub struct NoticeLedger {
    window: Duration,
    clock: Arc<dyn Clock>,
    shown_at: DashMap<(String, Severity), Instant>,
}

impl NoticeLedger {
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            clock,
            shown_at: DashMap::new(),
        }
    }

    /// True when the notice has not been shown within the window; records it.
    /// A suppressed notice does not extend the window.
    pub fn admit(&self, notice: &Notice) -> bool {
        let now = self.clock.now();
        self.shown_at
            .retain(|_, shown_at| now.saturating_duration_since(*shown_at) < self.window);

        let mut admitted = false;
        self.shown_at
            .entry((notice.message.clone(), notice.severity))
            .or_insert_with(|| {
                admitted = true;
                now
            });
        admitted
    }

    pub fn len(&self) -> usize {
        self.shown_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shown_at.is_empty()
    }
}

/// Drops duplicate notices before they reach the real sink.
pub struct DebouncedNotificationSink {
    inner: Arc<dyn NotificationSink>,
    ledger: NoticeLedger,
}

impl DebouncedNotificationSink {
    pub fn new(inner: Arc<dyn NotificationSink>, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            ledger: NoticeLedger::new(window, clock),
        }
    }
}

impl NotificationSink for DebouncedNotificationSink {
    fn show(&self, notice: &Notice) {
        if self.ledger.admit(notice) {
            self.inner.show(notice);
        } else {
            debug!(message = %notice.message, "duplicate notice suppressed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_local::{ManualClock, RecordingNotificationSink};

    const WINDOW: Duration = Duration::from_secs(3);

    fn sink() -> (
        Arc<ManualClock>,
        Arc<RecordingNotificationSink>,
        DebouncedNotificationSink,
    ) {
        let clock = Arc::new(ManualClock::new());
        let recorder = Arc::new(RecordingNotificationSink::new());
        let sink = DebouncedNotificationSink::new(recorder.clone(), WINDOW, clock.clone());
        (clock, recorder, sink)
    }

    #[test]
    fn identical_errors_within_window_show_once() {
        let (clock, recorder, sink) = sink();
        let notice = Notice::error("Your session has expired. Please log in again.");

        sink.show(&notice);
        clock.advance(Duration::from_millis(200));
        sink.show(&notice);
        clock.advance(Duration::from_millis(300));
        sink.show(&notice);

        assert_eq!(recorder.shown().len(), 1);
    }

    #[test]
    fn identical_errors_after_window_show_again() {
        let (clock, recorder, sink) = sink();
        let notice = Notice::error("Trip not found");

        sink.show(&notice);
        clock.advance(WINDOW);
        sink.show(&notice);

        assert_eq!(recorder.count_of("Trip not found"), 2);
    }

    #[test]
    fn suppressed_notice_does_not_extend_window() {
        let (clock, recorder, sink) = sink();
        let notice = Notice::error("Network down");

        sink.show(&notice);
        clock.advance(Duration::from_secs(2));
        sink.show(&notice);
        clock.advance(Duration::from_secs(1));
        sink.show(&notice);

        assert_eq!(recorder.shown().len(), 2);
    }

    #[test]
    fn severity_is_part_of_the_key() {
        let (_, recorder, sink) = sink();

        sink.show(&Notice::error("Saved"));
        sink.show(&Notice::success("Saved"));
        sink.show(&Notice::error("Other"));

        assert_eq!(recorder.shown().len(), 3);
    }

    #[test]
    fn expired_entries_are_swept_lazily() {
        let clock = Arc::new(ManualClock::new());
        let ledger = NoticeLedger::new(WINDOW, clock.clone());

        assert!(ledger.admit(&Notice::error("a")));
        assert!(ledger.admit(&Notice::error("b")));
        assert_eq!(ledger.len(), 2);

        clock.advance(WINDOW + Duration::from_millis(1));
        assert!(ledger.admit(&Notice::error("c")));
        assert_eq!(ledger.len(), 1);
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Optional metrics for monitoring queue activity.
///
/// Counters are plain relaxed atomics: they observe the queue, they never
/// gate its behavior, so ordering between them and the data path is
/// irrelevant (SPEC_FULL.md §3.1's "supplemental feature" framing). Reading
/// a [`MetricsSnapshot`] takes a relaxed load of each counter; the numbers
/// can be mutually inconsistent by a handful of operations under concurrent
/// load, which is acceptable for a monitoring collaborator.
#[derive(Debug, Default)]
pub struct Metrics {
    offers_succeeded: AtomicU64,
    offers_failed: AtomicU64,
    polls_succeeded: AtomicU64,
    polls_failed: AtomicU64,
    drained: AtomicU64,
    filled: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_offer(&self, succeeded: bool) {
        if succeeded {
            self.offers_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.offers_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_poll(&self, succeeded: bool) {
        if succeeded {
            self.polls_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.polls_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_drained(&self, count: usize) {
        if count > 0 {
            self.drained.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_filled(&self, count: usize) {
        if count > 0 {
            self.filled.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    /// Takes a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            offers_succeeded: self.offers_succeeded.load(Ordering::Relaxed),
            offers_failed: self.offers_failed.load(Ordering::Relaxed),
            polls_succeeded: self.polls_succeeded.load(Ordering::Relaxed),
            polls_failed: self.polls_failed.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
            filled: self.filled.load(Ordering::Relaxed),
        }
    }
}

/// A consistent-enough-to-report copy of a [`Metrics`] at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub offers_succeeded: u64,
    pub offers_failed: u64,
    pub polls_succeeded: u64,
    pub polls_failed: u64,
    pub drained: u64,
    pub filled: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_events() {
        let m = Metrics::new();
        m.record_offer(true);
        m.record_offer(false);
        m.record_poll(true);
        m.record_drained(3);
        m.record_filled(2);

        let snap = m.snapshot();
        assert_eq!(snap.offers_succeeded, 1);
        assert_eq!(snap.offers_failed, 1);
        assert_eq!(snap.polls_succeeded, 1);
        assert_eq!(snap.polls_failed, 0);
        assert_eq!(snap.drained, 3);
        assert_eq!(snap.filled, 2);
    }
}

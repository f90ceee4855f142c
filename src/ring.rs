//! Bounded multi-producer multi-consumer ring buffer (RING, §4.2).
//!
//! A direct descendant of Dmitry Vyukov's bounded MPMC queue: each slot
//! carries its own sequence number, and a producer/consumer claims a slot by
//! winning a CAS on the shared index whose result matches that slot's
//! current sequence. No lock is ever taken; a failed CAS means some other
//! thread made progress, so the structure as a whole is always lock-free.

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::capabilities::{Consumer, ExitCondition, WaitStrategy};
use crate::config::Config;
use crate::error::QueueError;
use crate::invariants::{
    debug_assert_indices_ordered, debug_assert_monotonic, debug_assert_slot_published_once,
};
use crate::metrics::{Metrics, MetricsSnapshot};

struct Slot<T> {
    sequence: AtomicU64,
    value: UnsafeCell<Option<T>>,
}

// Slot is shared between whichever producer/consumer currently owns it per
// the sequence protocol; never two threads at once.
unsafe impl<T: Send> Sync for Slot<T> {}

/// A lock-free bounded queue safe for any number of concurrent producers and
/// consumers.
pub struct BoundedQueue<T> {
    buffer: Box<[Slot<T>]>,
    mask: u64,
    capacity: usize,
    producer_index: CachePadded<AtomicU64>,
    consumer_index: CachePadded<AtomicU64>,
    metrics: Option<Metrics>,
}

unsafe impl<T: Send> Send for BoundedQueue<T> {}
unsafe impl<T: Send> Sync for BoundedQueue<T> {}

impl<T> BoundedQueue<T> {
    /// Creates a queue with the given capacity (rounded up to a power of
    /// two, minimum 2). Fails with [`QueueError::InvalidCapacity`] if
    /// `capacity < 2`.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        Ok(Self::with_config(Config::new(capacity, false)?))
    }

    /// Creates a queue from an already-validated [`Config`].
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        let capacity = config.capacity();
        let buffer = (0..capacity)
            .map(|i| Slot {
                sequence: AtomicU64::new(i as u64),
                value: UnsafeCell::new(None),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        tracing::debug!(capacity, "bounded queue constructed");

        Self {
            buffer,
            mask: config.mask() as u64,
            capacity,
            producer_index: CachePadded::new(AtomicU64::new(0)),
            consumer_index: CachePadded::new(AtomicU64::new(0)),
            metrics: config.enable_metrics.then(Metrics::new),
        }
    }

    #[inline]
    fn slot(&self, index: u64) -> &Slot<T> {
        &self.buffer[(index & self.mask) as usize]
    }

    /// Offers `value`, returning `false` **iff** the queue is full at the
    /// instant of the call.
    pub fn offer(&self, value: T) -> bool {
        self.offer_inner(value, true)
    }

    /// Offers `value` without the extra confirmation read; may spuriously
    /// report the queue full under contention even when it has free slots.
    pub fn relaxed_offer(&self, value: T) -> bool {
        self.offer_inner(value, false)
    }

    fn offer_inner(&self, value: T, strict: bool) -> bool {
        let mut cached_consumer: Option<i64> = None;
        let result = loop {
            let p = self.producer_index.load(Ordering::Acquire);
            let slot = self.slot(p);
            let s = slot.sequence.load(Ordering::Acquire);
            let delta = s as i64 - p as i64;

            if delta == 0 {
                if self
                    .producer_index
                    .compare_exchange_weak(p, p + 1, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
                {
                    debug_assert_slot_published_once!(s, p);
                    debug_assert_monotonic!("ring offer", s, p + 1);
                    unsafe {
                        *slot.value.get() = Some(value);
                    }
                    slot.sequence.store(p + 1, Ordering::Release);
                    break true;
                }
            } else if delta < 0 {
                if !strict {
                    break false;
                }
                let first = cached_consumer.unwrap_or(i64::MAX);
                if (p as i64 - self.capacity as i64) >= first {
                    break false;
                }
                let fresh = self.consumer_index.load(Ordering::Acquire) as i64;
                if (p as i64 - self.capacity as i64) >= fresh {
                    break false;
                }
                cached_consumer = Some(fresh);
            }
            // delta > 0: another producer already reserved this slot; retry.
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_offer(result);
        }
        result
    }

    /// Polls one element, returning `None` **iff** the queue is empty at the
    /// instant of the call.
    pub fn poll(&self) -> Option<T> {
        self.poll_inner(true)
    }

    /// Polls one element without the extra confirmation read; may
    /// spuriously report empty under contention.
    pub fn relaxed_poll(&self) -> Option<T> {
        self.poll_inner(false)
    }

    fn poll_inner(&self, strict: bool) -> Option<T> {
        let result = loop {
            let c = self.consumer_index.load(Ordering::Acquire);
            let slot = self.slot(c);
            let s = slot.sequence.load(Ordering::Acquire);
            let delta = s as i64 - (c as i64 + 1);

            if delta == 0 {
                if self
                    .consumer_index
                    .compare_exchange_weak(c, c + 1, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
                {
                    let value = unsafe { (*slot.value.get()).take() };
                    debug_assert_monotonic!("ring poll", s, c + self.capacity as u64);
                    slot.sequence.store(c + self.capacity as u64, Ordering::Release);
                    debug_assert_indices_ordered!(
                        self.producer_index.load(Ordering::Relaxed),
                        c + 1,
                        self.capacity
                    );
                    break value;
                }
            } else if delta < 0 {
                if !strict {
                    break None;
                }
                let p = self.producer_index.load(Ordering::Acquire);
                if p == c {
                    break None;
                }
            }
            // delta > 0: another consumer already claimed this slot; retry.
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_poll(result.is_some());
        }
        result
    }

    /// Returns a clone of the next element without removing it, or `None`
    /// **iff** the queue is empty at the instant of the call.
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        loop {
            let c = self.consumer_index.load(Ordering::Acquire);
            let slot = self.slot(c);
            let s = slot.sequence.load(Ordering::Acquire);
            if s == c.wrapping_add(1) {
                let value = unsafe { (*slot.value.get()).clone() };
                if value.is_some() {
                    return value;
                }
            }
            if self.consumer_index.load(Ordering::Acquire) == self.producer_index.load(Ordering::Acquire) {
                return None;
            }
        }
    }

    /// A single unsynchronized-feeling read of the head slot; may return
    /// `None` even when the queue is non-empty.
    pub fn relaxed_peek(&self) -> Option<T>
    where
        T: Clone,
    {
        let c = self.consumer_index.load(Ordering::Relaxed);
        let slot = self.slot(c);
        let s = slot.sequence.load(Ordering::Acquire);
        if s == c.wrapping_add(1) {
            unsafe { (*slot.value.get()).clone() }
        } else {
            None
        }
    }

    /// Conservative snapshot of the element count; always within
    /// `[0, capacity]`.
    pub fn size(&self) -> usize {
        loop {
            let a = self.consumer_index.load(Ordering::Acquire);
            let p = self.producer_index.load(Ordering::Acquire);
            let a2 = self.consumer_index.load(Ordering::Acquire);
            if a == a2 {
                return (p - a2) as usize;
            }
        }
    }

    /// Conservative emptiness check (consumer index read first).
    pub fn is_empty(&self) -> bool {
        self.consumer_index.load(Ordering::Acquire) == self.producer_index.load(Ordering::Acquire)
    }

    /// Monotone snapshot of the producer index, for progress monitoring.
    pub fn current_producer_index(&self) -> u64 {
        self.producer_index.load(Ordering::Acquire)
    }

    /// Monotone snapshot of the consumer index, for progress monitoring.
    pub fn current_consumer_index(&self) -> u64 {
        self.consumer_index.load(Ordering::Acquire)
    }

    /// The fixed capacity this queue was constructed with.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Delivers up to `limit` elements to `consumer` via repeated
    /// `relaxed_poll` calls, stopping early on the first empty result.
    /// Returns the number delivered.
    pub fn drain(&self, consumer: &mut impl Consumer<T>, limit: usize) -> usize {
        let mut delivered = 0;
        while delivered < limit {
            match self.relaxed_poll() {
                Some(value) => {
                    consumer.accept(value);
                    delivered += 1;
                }
                None => break,
            }
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_drained(delivered);
        }
        delivered
    }

    /// Like [`Self::drain`], but idles via `wait` on empty and keeps going
    /// between iterations only while `exit.keep_running()` holds.
    pub fn drain_with(
        &self,
        consumer: &mut impl Consumer<T>,
        mut wait: impl WaitStrategy,
        mut exit: impl ExitCondition,
    ) -> usize {
        let mut delivered = 0;
        let mut idle_count = 0;
        while exit.keep_running() {
            match self.relaxed_poll() {
                Some(value) => {
                    consumer.accept(value);
                    delivered += 1;
                    idle_count = 0;
                }
                None => {
                    idle_count = wait.idle(idle_count);
                }
            }
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_drained(delivered);
        }
        delivered
    }

    /// Bounded MPMC does not support bulk `fill` from a [`crate::capabilities::Supplier`]:
    /// a failed `offer` partway through a bulk fill would silently discard a
    /// supplied element, so this core refuses the operation outright rather
    /// than inventing a retry policy.
    pub fn fill(&self, _supplier: &mut impl crate::capabilities::Supplier<T>, _limit: usize) -> Result<usize, QueueError> {
        Err(QueueError::Unsupported { operation: "fill" })
    }

    /// A point-in-time snapshot of this queue's metrics, or `None` if
    /// metrics were not enabled for this instance.
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.as_ref().map(Metrics::snapshot)
    }
}

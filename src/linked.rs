//! Unbounded multi-producer single-consumer intrusive queue (LINK, §4.3).
//!
//! Producers race on a single atomic exchange of the tail pointer; the
//! consumer (there may only ever be one at a time — see §5) walks the chain
//! starting from a movable stub node whose value is always the empty
//! sentinel. The window between a producer's exchange and its subsequent
//! `next` store is this structure's one unbounded-wait site: a consumer that
//! catches up to an in-flight producer spins until that producer publishes.

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

use crate::backoff::Backoff;
use crate::capabilities::{Consumer, ExitCondition, Supplier, WaitStrategy};
use crate::invariants::{debug_assert_next_not_yet_linked, debug_assert_stub_is_empty};
use crate::metrics::{Metrics, MetricsSnapshot};

/// Bulk `drain`/`fill` advance in chunks of this size between overflow-guard
/// checks (§4.3 "drain/fill (bulk)").
const BULK_CHUNK: usize = 4096;

/// `fill`/`drain` without an explicit limit stop once the running total
/// would exceed this many elements in one call, per the Open Question
/// decision recorded in DESIGN.md.
const BULK_GUARD: u64 = 1 << 31;

struct Node<T> {
    value: UnsafeCell<Option<T>>,
    next: AtomicPtr<Node<T>>,
}

impl<T> Node<T> {
    fn stub() -> *mut Self {
        Box::into_raw(Box::new(Self {
            value: UnsafeCell::new(None),
            next: AtomicPtr::new(ptr::null_mut()),
        }))
    }

    fn holding(value: T) -> *mut Self {
        Box::into_raw(Box::new(Self {
            value: UnsafeCell::new(Some(value)),
            next: AtomicPtr::new(ptr::null_mut()),
        }))
    }
}

/// A lock-free unbounded queue safe for any number of concurrent producers
/// and exactly one consumer at a time. Calling `poll`, `peek`, `drain`, or
/// the relaxed variants from more than one thread concurrently is a
/// violation of the MPSC contract and is not checked at runtime.
pub struct UnboundedQueue<T> {
    producer_node: CachePadded<AtomicPtr<Node<T>>>,
    consumer_node: CachePadded<UnsafeCell<*mut Node<T>>>,
    /// Monotone count of successful offers/polls since construction; a
    /// chain has no rotating index like the ring's, but §4.4 asks every
    /// `MessageQueue` for a progress snapshot, so these play that role.
    producer_count: AtomicU64,
    consumer_count: AtomicU64,
    metrics: Metrics,
}

unsafe impl<T: Send> Send for UnboundedQueue<T> {}
unsafe impl<T: Send> Sync for UnboundedQueue<T> {}

impl<T> Default for UnboundedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> UnboundedQueue<T> {
    /// Creates an empty queue, seeded with a single stub node.
    #[must_use]
    pub fn new() -> Self {
        let stub = Node::stub();
        debug_assert_stub_is_empty!(unsafe { (*(*stub).value.get()).is_some() });
        tracing::debug!("unbounded queue constructed");
        Self {
            producer_node: CachePadded::new(AtomicPtr::new(stub)),
            consumer_node: CachePadded::new(UnsafeCell::new(stub)),
            producer_count: AtomicU64::new(0),
            consumer_count: AtomicU64::new(0),
            metrics: Metrics::new(),
        }
    }

    /// Appends `value` to the tail of the queue. Always succeeds: an
    /// unbounded queue has no "full" state.
    pub fn offer(&self, value: T) -> bool {
        self.offer_with_hook(value, || {})
    }

    /// Same protocol as [`Self::offer`], but runs `between` after the
    /// producer wins the exchange and before it publishes `next` — the
    /// disconnected window described in spec.md §4.3 step 3→4. Exposed only
    /// so tests can deterministically land a consumer inside that window;
    /// not part of the public contract.
    #[cfg(any(test, feature = "test-util"))]
    #[doc(hidden)]
    pub fn offer_with_hook(&self, value: T, between: impl FnOnce()) -> bool {
        self.offer_with_hook_inner(value, between)
    }

    #[cfg(not(any(test, feature = "test-util")))]
    fn offer_with_hook(&self, value: T, between: impl FnOnce()) -> bool {
        self.offer_with_hook_inner(value, between)
    }

    fn offer_with_hook_inner(&self, value: T, between: impl FnOnce()) -> bool {
        let node = Node::holding(value);
        let prev = self.producer_node.swap(node, Ordering::AcqRel);
        between();
        unsafe {
            debug_assert_next_not_yet_linked!(
                (*prev).next.load(Ordering::Relaxed).is_null()
            );
            (*prev).next.store(node, Ordering::Release);
        }
        self.producer_count.fetch_add(1, Ordering::Relaxed);
        self.metrics.record_offer(true);
        true
    }

    /// Identical to [`Self::offer`] — the producer side is already
    /// wait-free beyond the exchange, so there is no relaxed fast path to
    /// take instead.
    pub fn relaxed_offer(&self, value: T) -> bool {
        self.offer(value)
    }

    /// Polls one element. Returns `None` **iff** the queue is truly empty;
    /// otherwise spins on an in-flight producer's pending link before giving
    /// up. Must only be called from one thread at a time.
    pub fn poll(&self) -> Option<T> {
        let result = self.poll_inner(true);
        self.metrics.record_poll(result.is_some());
        result
    }

    /// Polls one element without spinning on an in-flight producer; returns
    /// `None` whenever `next` is currently null, even if an offer is
    /// mid-flight.
    pub fn relaxed_poll(&self) -> Option<T> {
        let result = self.poll_inner(false);
        self.metrics.record_poll(result.is_some());
        result
    }

    fn poll_inner(&self, strict: bool) -> Option<T> {
        let curr = unsafe { *self.consumer_node.get() };
        let mut next = unsafe { (*curr).next.load(Ordering::Acquire) };
        if next.is_null() {
            if !strict || self.producer_node.load(Ordering::Acquire) == curr {
                return None;
            }
            let mut backoff = Backoff::new();
            loop {
                next = unsafe { (*curr).next.load(Ordering::Acquire) };
                if !next.is_null() {
                    break;
                }
                backoff.snooze();
            }
        }
        let value = unsafe { (*next).value.get().as_mut().unwrap().take() };
        unsafe {
            *self.consumer_node.get() = next;
            drop(Box::from_raw(curr));
        }
        self.consumer_count.fetch_add(1, Ordering::Relaxed);
        value
    }

    /// Returns a clone of the next element without removing it; same
    /// empty/spin rule as [`Self::poll`].
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.peek_inner(true)
    }

    /// Like [`Self::peek`] but without the spin on an in-flight producer.
    pub fn relaxed_peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.peek_inner(false)
    }

    fn peek_inner(&self, strict: bool) -> Option<T>
    where
        T: Clone,
    {
        let curr = unsafe { *self.consumer_node.get() };
        let mut next = unsafe { (*curr).next.load(Ordering::Acquire) };
        if next.is_null() {
            if !strict || self.producer_node.load(Ordering::Acquire) == curr {
                return None;
            }
            let mut backoff = Backoff::new();
            loop {
                next = unsafe { (*curr).next.load(Ordering::Acquire) };
                if !next.is_null() {
                    break;
                }
                backoff.snooze();
            }
        }
        unsafe { (*(*next).value.get()).clone() }
    }

    /// Conservative element count: walks the chain from the consumer stub.
    /// `O(n)` and intended for monitoring, not the hot path.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut curr = unsafe { *self.consumer_node.get() };
        loop {
            let next = unsafe { (*curr).next.load(Ordering::Acquire) };
            if next.is_null() {
                break count;
            }
            count += 1;
            curr = next;
        }
    }

    /// Conservative emptiness check.
    pub fn is_empty(&self) -> bool {
        let curr = unsafe { *self.consumer_node.get() };
        unsafe { (*curr).next.load(Ordering::Acquire).is_null() }
    }

    /// Monotone snapshot of the number of successful offers since
    /// construction, for progress monitoring (spec.md §4.4).
    pub fn current_producer_index(&self) -> u64 {
        self.producer_count.load(Ordering::Acquire)
    }

    /// Monotone snapshot of the number of successful polls since
    /// construction, for progress monitoring (spec.md §4.4).
    pub fn current_consumer_index(&self) -> u64 {
        self.consumer_count.load(Ordering::Acquire)
    }

    /// There is no fixed capacity for an unbounded queue; callers that need
    /// a uniform `capacity()` across both queue kinds should treat `None`
    /// as "unbounded" (see [`crate::facade::MessageQueue`]).
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        None
    }

    /// Delivers up to `limit` elements to `consumer`, advancing a local
    /// cursor through `next`; stops early on the first null `next`. The
    /// consumer-side cursor is written back after each accepted element so
    /// an external observer sees monotonic progress.
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
        self.metrics.record_drained(delivered);
        delivered
    }

    /// Drains the whole queue in chunks of [`BULK_CHUNK`], stopping once a
    /// chunk returns fewer than requested or the running total would exceed
    /// [`BULK_GUARD`] (the bounded interpretation of the integer-overflow
    /// guard documented in DESIGN.md).
    pub fn drain_all(&self, consumer: &mut impl Consumer<T>) -> usize {
        let mut total = 0usize;
        loop {
            if total as u64 + BULK_CHUNK as u64 > BULK_GUARD {
                break total;
            }
            let delivered = self.drain(consumer, BULK_CHUNK);
            total += delivered;
            if delivered < BULK_CHUNK {
                break total;
            }
        }
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
        self.metrics.record_drained(delivered);
        delivered
    }

    /// Offers up to `limit` elements drawn from `supplier`.
    pub fn fill(&self, supplier: &mut impl Supplier<T>, limit: usize) -> usize {
        for _ in 0..limit {
            self.offer(supplier.get());
        }
        self.metrics.record_filled(limit);
        limit
    }

    /// Fills the queue in chunks of [`BULK_CHUNK`] under the same overflow
    /// guard as [`Self::drain_all`]. Since `offer` never fails on an
    /// unbounded queue, this always runs to completion.
    pub fn fill_all(&self, supplier: &mut impl Supplier<T>) -> usize {
        let mut total = 0usize;
        loop {
            if total as u64 + BULK_CHUNK as u64 > BULK_GUARD {
                break total;
            }
            total += self.fill(supplier, BULK_CHUNK);
        }
    }

    /// Like [`Self::fill`], but consults `exit.keep_running()` between
    /// offers and `wait.idle` if a `relaxed_offer` ever reports failure
    /// (unreachable on this queue today, kept for interface parity with
    /// [`crate::ring::BoundedQueue::drain_with`]).
    pub fn fill_with(
        &self,
        supplier: &mut impl Supplier<T>,
        mut wait: impl WaitStrategy,
        mut exit: impl ExitCondition,
    ) -> usize {
        let mut filled = 0;
        let mut idle_count = 0;
        while exit.keep_running() {
            if self.relaxed_offer(supplier.get()) {
                filled += 1;
            } else {
                idle_count = wait.idle(idle_count);
            }
        }
        self.metrics.record_filled(filled);
        filled
    }

    /// A point-in-time snapshot of this queue's metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl<T> Drop for UnboundedQueue<T> {
    fn drop(&mut self) {
        let mut curr = unsafe { *self.consumer_node.get() };
        while !curr.is_null() {
            let next = unsafe { (*curr).next.load(Ordering::Relaxed) };
            unsafe {
                drop(Box::from_raw(curr));
            }
            curr = next;
        }
    }
}

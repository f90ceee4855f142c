//! The message-passing facade (MPQ, §4.4): the contract shared by
//! [`crate::ring::BoundedQueue`] and [`crate::linked::UnboundedQueue`] so
//! generic code can depend on either without naming the concrete type.

use crate::capabilities::Consumer;

/// Uniform queue contract. `capacity()` is `Some(n)` for bounded queues and
/// `None` for unbounded ones, standing in for spec.md's `unbounded` marker.
pub trait MessageQueue<T> {
    /// Offers `value`; `false` **iff** the queue is full at that instant
    /// (always `true` for an unbounded queue).
    fn offer(&self, value: T) -> bool;

    /// Weaker-guarantee offer; may spuriously report full under contention.
    fn relaxed_offer(&self, value: T) -> bool;

    /// Polls one element; `None` **iff** the queue is empty at that instant.
    fn poll(&self) -> Option<T>;

    /// Weaker-guarantee poll; may spuriously report empty under contention.
    fn relaxed_poll(&self) -> Option<T>;

    /// Conservative element count.
    fn size(&self) -> usize;

    /// Conservative emptiness check.
    fn is_empty(&self) -> bool;

    /// `Some(capacity)` for bounded queues, `None` for unbounded ones.
    fn capacity(&self) -> Option<usize>;

    /// Monotone snapshot of the producer side's progress, for monitoring.
    fn current_producer_index(&self) -> u64;

    /// Monotone snapshot of the consumer side's progress, for monitoring.
    fn current_consumer_index(&self) -> u64;

    /// Delivers up to `limit` elements to `consumer`. Returns the number
    /// delivered.
    fn drain<C: Consumer<T>>(&self, consumer: &mut C, limit: usize) -> usize;
}

impl<T> MessageQueue<T> for crate::ring::BoundedQueue<T> {
    fn offer(&self, value: T) -> bool {
        Self::offer(self, value)
    }

    fn relaxed_offer(&self, value: T) -> bool {
        Self::relaxed_offer(self, value)
    }

    fn poll(&self) -> Option<T> {
        Self::poll(self)
    }

    fn relaxed_poll(&self) -> Option<T> {
        Self::relaxed_poll(self)
    }

    fn size(&self) -> usize {
        Self::size(self)
    }

    fn is_empty(&self) -> bool {
        Self::is_empty(self)
    }

    fn capacity(&self) -> Option<usize> {
        Some(Self::capacity(self))
    }

    fn current_producer_index(&self) -> u64 {
        Self::current_producer_index(self)
    }

    fn current_consumer_index(&self) -> u64 {
        Self::current_consumer_index(self)
    }

    fn drain<C: Consumer<T>>(&self, consumer: &mut C, limit: usize) -> usize {
        Self::drain(self, consumer, limit)
    }
}

impl<T> MessageQueue<T> for crate::linked::UnboundedQueue<T> {
    fn offer(&self, value: T) -> bool {
        Self::offer(self, value)
    }

    fn relaxed_offer(&self, value: T) -> bool {
        Self::relaxed_offer(self, value)
    }

    fn poll(&self) -> Option<T> {
        Self::poll(self)
    }

    fn relaxed_poll(&self) -> Option<T> {
        Self::relaxed_poll(self)
    }

    fn size(&self) -> usize {
        Self::size(self)
    }

    fn is_empty(&self) -> bool {
        Self::is_empty(self)
    }

    fn capacity(&self) -> Option<usize> {
        Self::capacity(self)
    }

    fn current_producer_index(&self) -> u64 {
        Self::current_producer_index(self)
    }

    fn current_consumer_index(&self) -> u64 {
        Self::current_consumer_index(self)
    }

    fn drain<C: Consumer<T>>(&self, consumer: &mut C, limit: usize) -> usize {
        Self::drain(self, consumer, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linked::UnboundedQueue;
    use crate::ring::BoundedQueue;

    fn exercise(q: &impl MessageQueue<i32>) {
        assert!(q.is_empty());
        assert_eq!(MessageQueue::current_producer_index(q), 0);
        assert_eq!(MessageQueue::current_consumer_index(q), 0);
        assert!(q.offer(1));
        assert!(q.offer(2));
        assert_eq!(q.size(), 2);
        assert_eq!(MessageQueue::current_producer_index(q), 2);
        assert_eq!(q.poll(), Some(1));
        assert_eq!(q.poll(), Some(2));
        assert_eq!(q.poll(), None);
        assert_eq!(MessageQueue::current_consumer_index(q), 2);
    }

    #[test]
    fn bounded_queue_satisfies_the_facade() {
        let q = BoundedQueue::new(4).unwrap();
        exercise(&q);
        assert_eq!(MessageQueue::capacity(&q), Some(4));
    }

    #[test]
    fn unbounded_queue_satisfies_the_facade() {
        let q = UnboundedQueue::new();
        exercise(&q);
        assert_eq!(MessageQueue::capacity(&q), None);
    }
}

use thiserror::Error;

/// Errors surfaced by the queue constructors and the strict bulk-transfer paths.
///
/// These are the "programming error" class from spec.md §7: raised eagerly,
/// never retried, and never produced by the CAS retry loops themselves.
/// Transient contention (a full ring, an empty queue) is never an error —
/// it is expressed as `false`/`None` from `offer`/`poll`, per spec.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// `offer`/`relaxed_offer` was asked to store the empty sentinel.
    ///
    /// In idiomatic Rust a generic `T` has no implicit null, so this variant
    /// is structurally unreachable from the public API of [`crate::BoundedQueue`]
    /// and [`crate::UnboundedQueue`] — it is preserved only so the error enum
    /// matches spec.md §6 in full. See DESIGN.md for the rationale.
    #[error("element is the empty sentinel and cannot be offered")]
    InvalidElement,

    /// Construction was asked for a bounded queue with capacity < 2.
    #[error("capacity {capacity} is invalid; bounded queues require capacity >= 2")]
    InvalidCapacity {
        /// The capacity that was requested.
        capacity: usize,
    },

    /// A bulk operation that this queue variant does not implement was called.
    ///
    /// Currently only `BoundedQueue::fill` with a `Supplier`, per spec.md §4.2's
    /// "Unsupported MPMC fill with Supplier" design note.
    #[error("{operation} is not supported on this queue")]
    Unsupported {
        /// Name of the unsupported operation.
        operation: &'static str,
    },
}

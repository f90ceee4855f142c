//! Debug assertion macros for the RING and LINK protocols.
//!
//! These checks run only in debug builds (`debug_assert!` is a no-op under
//! `--release`), so the hot offer/poll paths carry zero overhead once the
//! algorithms are trusted. Used by [`crate::ring`] and [`crate::linked`].

// =============================================================================
// index ordering and bounded count
// =============================================================================

/// `0 <= consumer_index <= producer_index` and `producer_index - consumer_index <= capacity`.
macro_rules! debug_assert_indices_ordered {
    ($producer:expr, $consumer:expr, $capacity:expr) => {
        debug_assert!(
            $consumer <= $producer,
            "consumer_index {} exceeds producer_index {}",
            $consumer,
            $producer
        );
        debug_assert!(
            $producer - $consumer <= $capacity as u64,
            "producer_index {} is more than capacity {} ahead of consumer_index {}",
            $producer,
            $capacity,
            $consumer
        );
    };
}

// =============================================================================
// sequence monotonicity per slot
// =============================================================================

/// A slot's sequence number only ever increases.
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "{} sequence decreased from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

// =============================================================================
// slot publication state
// =============================================================================

/// A slot's sequence must encode either "empty, awaiting producer `k`"
/// (`sequence == k`) or "full, awaiting consumer `k`" (`sequence == k + 1`),
/// never anything else, for the reservation `k` that touched it.
macro_rules! debug_assert_slot_published_once {
    ($sequence:expr, $reserved:expr) => {
        debug_assert!(
            $sequence == $reserved || $sequence == $reserved + 1,
            "slot sequence {} is not consistent with reservation {}",
            $sequence,
            $reserved
        )
    };
}

// =============================================================================
// chain shape and stub placement
// =============================================================================

/// The consumer-local stub never carries a real element.
macro_rules! debug_assert_stub_is_empty {
    ($has_value:expr) => {
        debug_assert!(!$has_value, "consumer stub holds a value")
    };
}

// =============================================================================
// a node's `next` transitions from null to non-null exactly once
// =============================================================================

/// The exchanged-out previous tail must not already have had a successor.
macro_rules! debug_assert_next_not_yet_linked {
    ($was_null:expr) => {
        debug_assert!($was_null, "node already had a successor before being linked")
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_indices_ordered;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_next_not_yet_linked;
pub(crate) use debug_assert_slot_published_once;
pub(crate) use debug_assert_stub_is_empty;

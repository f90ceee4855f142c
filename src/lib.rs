//! vyukov-rs — lock-free in-process message queues
//!
//! Two independent cores:
//!
//! - [`ring::BoundedQueue`]: a bounded multi-producer multi-consumer ring
//!   buffer, one sequence number per slot (Vyukov's bounded MPMC queue).
//! - [`linked::UnboundedQueue`]: an unbounded multi-producer single-consumer
//!   intrusive linked queue, an atomic exchange on the producer tail
//!   (Vyukov's MPSC queue).
//!
//! Both implement [`facade::MessageQueue`], the shared offer/poll/peek/
//! drain contract, so generic code can depend on either without naming the
//! concrete type.
//!
//! # Example
//!
//! ```
//! use vyukov_rs::BoundedQueue;
//!
//! let queue = BoundedQueue::new(16).unwrap();
//! assert!(queue.offer(42));
//! assert_eq!(queue.poll(), Some(42));
//! ```

mod backoff;
mod capabilities;
mod config;
mod error;
mod facade;
mod invariants;
mod linked;
mod metrics;
mod ring;

pub use backoff::Backoff;
pub use capabilities::{AlwaysRunning, Consumer, ExitCondition, SpinWait, Supplier, WaitStrategy};
pub use config::Config;
pub use error::QueueError;
pub use facade::MessageQueue;
pub use linked::UnboundedQueue;
pub use metrics::{Metrics, MetricsSnapshot};
pub use ring::BoundedQueue;

//! Promise/A+ deferred values on a single thread.
//!
//! A [`Promise`] settles once, fulfilled or rejected, and hands its outcome
//! to every waiter registered with [`Promise::then`]. Waiters never run on
//! the stack that registered them or settled the promise. They run on later
//! turns of a [`Scheduler`] supplied by the host, such as [`TaskQueue`].
//!
//! ```
//! use promise_aplus::{Outcome, Promise, Resolution, TaskQueue};
//!
//! let queue = TaskQueue::new();
//! let doubled = Promise::<i32, String>::fulfilled(&queue, 21)
//!     .and_then(|v| Ok(Resolution::Value(v * 2)));
//! assert_eq!(doubled.outcome(), None);
//! queue.run();
//! assert_eq!(doubled.outcome(), Some(Outcome::Fulfilled(42)));
//! ```
//!
pub mod capability;
pub mod combinators;
pub mod deferred;
pub mod promise;
pub mod resolution;
pub mod scheduler;
pub mod settled;
mod teardown;

pub use capability::{Fulfiller, Rejecter};
pub use deferred::Deferred;
pub use promise::{HandlerResult, Outcome, Promise, Status};
pub use resolution::{Resolution, Thenable};
pub use scheduler::{QueueSpawner, Scheduler, Task, TaskQueue};
pub use settled::Settled;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    Argument(String),
    #[error("chaining cycle detected: a promise cannot be resolved with itself")]
    Cycle,
}

/// Lets plain `String` reasons carry the crate's errors.
impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

//! Settling a promise from outside its executor.
//!
use crate::{
    capability::{self, Fulfiller, Rejecter},
    promise::Promise,
    resolution::Resolution,
    scheduler::Scheduler,
    Error,
};

/// A promise together with the capabilities that settle it, for callers
/// that settle it from outside an executor.
///
/// The `Deferred` owns both capabilities. Dropping it without settling
/// leaves the promise pending.
///
/// # Examples
///
/// ```
/// use promise_aplus::{Deferred, Outcome, Promise, TaskQueue};
///
/// let queue = TaskQueue::new();
/// let deferred: Deferred<String, String> = Promise::deferred(&queue);
/// let promise = deferred.promise();
/// deferred.fulfill("🍓".into());
/// queue.run();
/// assert_eq!(promise.outcome(), Some(Outcome::Fulfilled("🍓".into())));
/// ```
#[derive(Debug)]
pub struct Deferred<T: 'static, E: 'static> {
    promise: Promise<T, E>,
    fulfiller: Fulfiller<T, E>,
    rejecter: Rejecter<T, E>,
}

impl<T, E> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + From<Error> + 'static,
{
    /// A pending promise whose capabilities are handed back to the caller.
    pub fn deferred<S>(scheduler: &S) -> Deferred<T, E>
    where
        S: Scheduler + ?Sized,
    {
        let promise = Promise::pending(scheduler.handle());
        let (fulfiller, rejecter) = capability::pair(&promise);
        Deferred {
            promise,
            fulfiller,
            rejecter,
        }
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone + 'static,
    E: Clone + From<Error> + 'static,
{
    /// Another handle to the deferred promise.
    pub fn promise(&self) -> Promise<T, E> {
        self.promise.clone()
    }

    pub fn fulfill(&self, value: T) {
        self.fulfiller.fulfill(value)
    }

    pub fn resolve(&self, resolution: Resolution<T, E>) {
        self.fulfiller.resolve(resolution)
    }

    pub fn reject(&self, reason: E) {
        self.rejecter.reject(reason)
    }

    pub fn into_parts(self) -> (Promise<T, E>, Fulfiller<T, E>, Rejecter<T, E>) {
        (self.promise, self.fulfiller, self.rejecter)
    }
}

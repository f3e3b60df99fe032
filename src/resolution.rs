//! The promise resolution procedure.
//!
//! Anything that settles a promise through [`Fulfiller::resolve`] or a
//! `then` handler is a [`Resolution`]: a plain value, another promise of
//! this crate, or a foreign [`Thenable`]. Promises and thenables are
//! adopted. Their eventual outcome becomes the target's outcome.
//!
use crate::{
    capability::{self, Fulfiller, Rejecter},
    promise::{Outcome, Promise},
    Error,
};
use std::fmt;

/// A foreign deferred value that can report its outcome through a pair of
/// callbacks.
///
/// `then` may call `resolve` and `reject` any number of times, now or
/// later. Only the first call counts. Returning `Err` counts as a
/// rejection unless a callback already ran.
///
/// Closures taking the two callbacks implement `Thenable`:
///
/// ```
/// use promise_aplus::{Outcome, Promise, Resolution, TaskQueue};
///
/// let queue = TaskQueue::new();
/// let promise = Promise::<u8, String>::resolve(
///     &queue,
///     Resolution::from_fn(|resolve, _reject| {
///         resolve.fulfill(3);
///         Ok(())
///     }),
/// );
/// queue.run();
/// assert_eq!(promise.outcome(), Some(Outcome::Fulfilled(3)));
/// ```
pub trait Thenable<T: 'static, E: 'static> {
    fn then(self: Box<Self>, resolve: Fulfiller<T, E>, reject: Rejecter<T, E>) -> Result<(), E>;
}

impl<T: 'static, E: 'static, F> Thenable<T, E> for F
where
    F: FnOnce(Fulfiller<T, E>, Rejecter<T, E>) -> Result<(), E>,
{
    fn then(self: Box<Self>, resolve: Fulfiller<T, E>, reject: Rejecter<T, E>) -> Result<(), E> {
        (*self)(resolve, reject)
    }
}

/// A value a promise can be resolved with.
pub enum Resolution<T: 'static, E: 'static> {
    /// Fulfill with this value.
    Value(T),
    /// Adopt this promise's outcome.
    Promise(Promise<T, E>),
    /// Adopt whatever this thenable reports.
    Thenable(Box<dyn Thenable<T, E>>),
}

impl<T: 'static, E: 'static> Resolution<T, E> {
    pub fn thenable(thenable: impl Thenable<T, E> + 'static) -> Self {
        Resolution::Thenable(Box::new(thenable))
    }

    /// A thenable built from a closure over the two callbacks.
    pub fn from_fn<F>(then: F) -> Self
    where
        F: FnOnce(Fulfiller<T, E>, Rejecter<T, E>) -> Result<(), E> + 'static,
    {
        Resolution::Thenable(Box::new(then))
    }
}

impl<T: 'static, E: 'static> From<Promise<T, E>> for Resolution<T, E> {
    fn from(promise: Promise<T, E>) -> Self {
        Resolution::Promise(promise)
    }
}

impl<T: fmt::Debug + 'static, E: 'static> fmt::Debug for Resolution<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Resolution::Promise(promise) => f.debug_tuple("Promise").field(promise).finish(),
            Resolution::Thenable(_) => f.write_str("Thenable(..)"),
        }
    }
}

/// Settles `target` from `x`, adopting promises and thenables.
pub(crate) fn resolve_promise<T, E>(target: &Promise<T, E>, x: Resolution<T, E>)
where
    T: Clone + 'static,
    E: Clone + From<Error> + 'static,
{
    match x {
        Resolution::Promise(promise) if promise.ptr_eq(target) => {
            tracing::debug!("promise resolved with itself, rejecting");
            target.settle(Outcome::Rejected(Error::Cycle.into()));
        }
        Resolution::Promise(promise) => match promise.outcome() {
            Some(outcome) => target.settle(outcome),
            None => {
                let (fulfilled, rejected) = (target.clone(), target.clone());
                promise.subscribe(
                    Box::new(move |value| fulfilled.settle(Outcome::Fulfilled(value))),
                    Box::new(move |reason| rejected.settle(Outcome::Rejected(reason))),
                );
            }
        },
        Resolution::Thenable(thenable) => {
            let (resolve, reject) = capability::pair(target);
            let on_error = reject.clone();
            if let Err(reason) = thenable.then(resolve, reject) {
                on_error.reject(reason);
            }
        }
        Resolution::Value(value) => target.settle(Outcome::Fulfilled(value)),
    }
}

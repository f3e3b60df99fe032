//! The promise state machine and its chaining dispatcher.
//!
use crate::{
    capability::{self, Fulfiller, Rejecter},
    resolution::{self, Resolution},
    scheduler::Scheduler,
    teardown, Error,
};
use std::{cell::RefCell, fmt, mem, rc::Rc};

/// Where a promise is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Fulfilled,
    Rejected,
}

/// The fixed result of a settled promise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    Fulfilled(T),
    Rejected(E),
}

impl<T, E> Outcome<T, E> {
    pub fn status(&self) -> Status {
        match self {
            Outcome::Fulfilled(_) => Status::Fulfilled,
            Outcome::Rejected(_) => Status::Rejected,
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Fulfilled(value) => Ok(value),
            Outcome::Rejected(reason) => Err(reason),
        }
    }
}

/// What a `then` handler hands back: a resolution for the dependent
/// promise, or a reason to reject it.
pub type HandlerResult<U, E> = Result<Resolution<U, E>, E>;

type FulfilledWaiter<T> = Box<dyn FnOnce(T)>;
type RejectedWaiter<E> = Box<dyn FnOnce(E)>;

struct Inner<T: 'static, E: 'static> {
    outcome: Option<Outcome<T, E>>,
    fulfilled_waiters: Vec<FulfilledWaiter<T>>,
    rejected_waiters: Vec<RejectedWaiter<E>>,
}

impl<T: 'static, E: 'static> Drop for Inner<T, E> {
    fn drop(&mut self) {
        if self.fulfilled_waiters.is_empty() && self.rejected_waiters.is_empty() {
            return;
        }
        // Waiters own the promises they settle; park them so a long
        // unsettled chain is not torn down recursively.
        teardown::release(Box::new((
            mem::take(&mut self.fulfilled_waiters),
            mem::take(&mut self.rejected_waiters),
        )));
    }
}

/// A deferred value that settles once, either fulfilled with a `T` or
/// rejected with an `E`.
///
/// `Promise` is a handle: clones refer to the same promise. Every callback
/// runs on a later turn of the scheduler the promise was created with,
/// never on the stack that registered or settled it.
///
/// # Examples
///
/// ```
/// use promise_aplus::{Promise, Resolution, TaskQueue};
/// use std::{cell::Cell, rc::Rc};
///
/// let queue = TaskQueue::new();
/// let seen = Rc::new(Cell::new(0));
/// let sink = seen.clone();
/// Promise::<i32, String>::new(&queue, |fulfill, _reject| fulfill.fulfill(20))
///     .then(|v| Ok(Resolution::Value(v + 1)), Err)
///     .and_then(move |v| {
///         sink.set(v * 2);
///         Ok(Resolution::Value(()))
///     });
/// assert_eq!(seen.get(), 0);
/// queue.run();
/// assert_eq!(seen.get(), 42);
/// ```
pub struct Promise<T: 'static, E: 'static> {
    state: Rc<RefCell<Inner<T, E>>>,
    scheduler: Rc<dyn Scheduler>,
}

impl<T: 'static, E: 'static> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<T: 'static, E: 'static> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("status", &self.status())
            .finish()
    }
}

impl<T: 'static, E: 'static> Promise<T, E> {
    /// Whether both handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn status(&self) -> Status {
        match self.state.borrow().outcome {
            None => Status::Pending,
            Some(ref outcome) => outcome.status(),
        }
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + From<Error> + 'static,
{
    /// Creates a promise and runs `executor` right away with the two
    /// capabilities that settle it. Only the first capability call counts.
    pub fn new<S, F>(scheduler: &S, executor: F) -> Self
    where
        S: Scheduler + ?Sized,
        F: FnOnce(Fulfiller<T, E>, Rejecter<T, E>),
    {
        let promise = Self::pending(scheduler.handle());
        let (fulfiller, rejecter) = capability::pair(&promise);
        executor(fulfiller, rejecter);
        promise
    }

    pub(crate) fn pending(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            state: Rc::new(RefCell::new(Inner {
                outcome: None,
                fulfilled_waiters: vec![],
                rejected_waiters: vec![],
            })),
            scheduler,
        }
    }

    /// A copy of the outcome, or `None` while pending.
    pub fn outcome(&self) -> Option<Outcome<T, E>> {
        self.state.borrow().outcome.clone()
    }

    /// Schedules the transition to `outcome`. The transition is dropped if
    /// the promise has settled by the time it runs.
    pub(crate) fn settle(&self, outcome: Outcome<T, E>) {
        let promise = self.clone();
        self.scheduler
            .defer(Box::new(move || promise.transition(outcome)));
    }

    fn transition(&self, outcome: Outcome<T, E>) {
        let (fulfilled, rejected) = {
            let mut inner = self.state.borrow_mut();
            if inner.outcome.is_some() {
                tracing::debug!("ignoring settlement of an already settled promise");
                return;
            }
            inner.outcome = Some(outcome.clone());
            (
                mem::take(&mut inner.fulfilled_waiters),
                mem::take(&mut inner.rejected_waiters),
            )
        };
        match outcome {
            Outcome::Fulfilled(value) => {
                tracing::trace!(waiters = fulfilled.len(), "promise fulfilled");
                drop(rejected);
                for waiter in fulfilled {
                    waiter(value.clone());
                }
            }
            Outcome::Rejected(reason) => {
                tracing::trace!(waiters = rejected.len(), "promise rejected");
                drop(fulfilled);
                for waiter in rejected {
                    waiter(reason.clone());
                }
            }
        }
    }

    /// Registers a waiter pair. Exactly one of them runs, on a later turn.
    pub(crate) fn subscribe(
        &self,
        on_fulfilled: FulfilledWaiter<T>,
        on_rejected: RejectedWaiter<E>,
    ) {
        let outcome = self.outcome();
        match outcome {
            None => {
                let mut inner = self.state.borrow_mut();
                inner.fulfilled_waiters.push(on_fulfilled);
                inner.rejected_waiters.push(on_rejected);
            }
            Some(Outcome::Fulfilled(value)) => {
                self.scheduler.defer(Box::new(move || on_fulfilled(value)))
            }
            Some(Outcome::Rejected(reason)) => {
                self.scheduler.defer(Box::new(move || on_rejected(reason)))
            }
        }
    }

    /// Settles this promise from a handler's result.
    pub(crate) fn complete(&self, result: HandlerResult<T, E>) {
        match result {
            Ok(resolution) => resolution::resolve_promise(self, resolution),
            Err(reason) => self.settle(Outcome::Rejected(reason)),
        }
    }

    /// Returns a dependent promise settled from whichever handler runs.
    ///
    /// Handlers run on a later turn, never inside this call. A handler's
    /// `Ok` value goes through the resolution procedure, so returning
    /// [`Resolution::Promise`] adopts that promise. `Err` rejects the
    /// dependent promise.
    pub fn then<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> HandlerResult<U, E> + 'static,
        R: FnOnce(E) -> HandlerResult<U, E> + 'static,
    {
        let next = Promise::<U, E>::pending(self.scheduler.clone());
        let (fulfilled_next, rejected_next) = (next.clone(), next.clone());
        self.subscribe(
            Box::new(move |value| fulfilled_next.complete(on_fulfilled(value))),
            Box::new(move |reason| rejected_next.complete(on_rejected(reason))),
        );
        next
    }

    /// `then` with optional handlers. A missing fulfillment handler passes
    /// the value through, a missing rejection handler passes the reason on.
    pub fn then_optional<F, R>(&self, on_fulfilled: Option<F>, on_rejected: Option<R>) -> Self
    where
        F: FnOnce(T) -> HandlerResult<T, E> + 'static,
        R: FnOnce(E) -> HandlerResult<T, E> + 'static,
    {
        self.then(
            move |value| match on_fulfilled {
                Some(handler) => handler(value),
                None => Ok(Resolution::Value(value)),
            },
            move |reason| match on_rejected {
                Some(handler) => handler(reason),
                None => Err(reason),
            },
        )
    }

    /// `then` without a rejection handler.
    pub fn and_then<U, F>(&self, on_fulfilled: F) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> HandlerResult<U, E> + 'static,
    {
        self.then(on_fulfilled, Err)
    }

    /// `then` without a fulfillment handler.
    pub fn catch<R>(&self, on_rejected: R) -> Self
    where
        R: FnOnce(E) -> HandlerResult<T, E> + 'static,
    {
        self.then(|value| Ok(Resolution::Value(value)), on_rejected)
    }
}

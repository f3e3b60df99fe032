//! Awaiting a promise from async Rust.
//!
use crate::{
    promise::{Outcome, Promise},
    Error,
};
use std::{
    cell::RefCell,
    future::Future,
    mem,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

/// A `std::future::Future` that completes with the outcome of a promise.
///
/// It is only woken as the promise's scheduler runs, so something must keep
/// driving that scheduler. `Settled` may be cloned, and every clone
/// completes with the same outcome.
///
/// # Examples
///
/// ```
/// use futures::FutureExt;
/// use promise_aplus::{Promise, TaskQueue};
///
/// let queue = TaskQueue::new();
/// let settled = Promise::<i32, String>::fulfilled(&queue, 5).settled();
/// assert_eq!(settled.clone().now_or_never(), None);
/// queue.run();
/// assert_eq!(settled.now_or_never(), Some(Ok(5)));
/// ```
#[derive(Clone)]
pub struct Settled<T, E> {
    slot: Rc<RefCell<Slot<T, E>>>,
}

struct Slot<T, E> {
    outcome: Option<Outcome<T, E>>,
    wakers: Vec<Waker>,
}

fn fill<T, E>(slot: &RefCell<Slot<T, E>>, outcome: Outcome<T, E>) {
    let wakers = {
        let mut slot = slot.borrow_mut();
        slot.outcome = Some(outcome);
        mem::take(&mut slot.wakers)
    };
    for waker in wakers {
        waker.wake()
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + From<Error> + 'static,
{
    /// A future for this promise's outcome.
    pub fn settled(&self) -> Settled<T, E> {
        let slot = Rc::new(RefCell::new(Slot {
            outcome: None,
            wakers: vec![],
        }));
        let (fulfilled, rejected) = (slot.clone(), slot.clone());
        self.subscribe(
            Box::new(move |value| fill(&fulfilled, Outcome::Fulfilled(value))),
            Box::new(move |reason| fill(&rejected, Outcome::Rejected(reason))),
        );
        Settled { slot }
    }
}

impl<T: Clone, E: Clone> Future for Settled<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();
        if let Some(outcome) = slot.outcome.clone() {
            return Poll::Ready(outcome.into_result());
        }
        if !slot.wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
            slot.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

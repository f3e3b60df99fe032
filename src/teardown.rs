//! Iterative teardown of promise chains.
//!
//! A pending promise owns its waiters, and each waiter owns the promise it
//! settles. Dropping an unsettled chain would therefore recurse once per
//! link. Waiter lists are parked here instead, and the outermost drop on
//! the thread empties the list in a loop.
//!
use std::{
    any::Any,
    cell::{Cell, RefCell},
};

thread_local! {
    static PARKED: RefCell<Vec<Box<dyn Any>>> = const { RefCell::new(Vec::new()) };
    static DRAINING: Cell<bool> = const { Cell::new(false) };
}

/// Resets the draining flag even if a drop panics.
struct Draining;

impl Drop for Draining {
    fn drop(&mut self) {
        let _ = DRAINING.try_with(|draining| draining.set(false));
    }
}

/// Drops `garbage` without growing the stack per chained promise.
pub(crate) fn release(garbage: Box<dyn Any>) {
    let parked = PARKED.try_with(|parked| parked.borrow_mut().push(garbage));
    if parked.is_err() {
        // Thread-locals are gone at thread exit; `garbage` was dropped with
        // the closure that failed to run.
        return;
    }
    // An outer call is already draining, or the thread is exiting and
    // whatever was parked goes with the thread-local.
    if DRAINING
        .try_with(|draining| draining.replace(true))
        .unwrap_or(true)
    {
        return;
    }
    let _draining = Draining;
    let mut released = 0usize;
    loop {
        let next = PARKED.with(|parked| parked.borrow_mut().pop());
        match next {
            Some(garbage) => {
                drop(garbage);
                released += 1;
            }
            None => break,
        }
    }
    if released > 1 {
        tracing::trace!(released, "released parked waiters");
    }
}

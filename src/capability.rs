//! One-shot settlement capabilities.
//!
//! A [`Fulfiller`] and a [`Rejecter`] made together share a guard: whichever
//! is called first commits the promise, and every later call on either of
//! them is ignored. Both may be cloned and called any number of times.
//!
use crate::{
    promise::{Outcome, Promise},
    resolution::{self, Resolution},
    Error,
};
use std::{cell::Cell, fmt, rc::Rc};

pub struct Fulfiller<T: 'static, E: 'static> {
    target: Promise<T, E>,
    committed: Rc<Cell<bool>>,
}

pub struct Rejecter<T: 'static, E: 'static> {
    target: Promise<T, E>,
    committed: Rc<Cell<bool>>,
}

/// Makes a guarded capability pair aimed at `target`.
pub(crate) fn pair<T: 'static, E: 'static>(
    target: &Promise<T, E>,
) -> (Fulfiller<T, E>, Rejecter<T, E>) {
    let committed = Rc::new(Cell::new(false));
    (
        Fulfiller {
            target: target.clone(),
            committed: committed.clone(),
        },
        Rejecter {
            target: target.clone(),
            committed,
        },
    )
}

fn commit(committed: &Cell<bool>) -> bool {
    if committed.replace(true) {
        tracing::debug!("ignoring settlement capability called after commit");
        false
    } else {
        true
    }
}

impl<T, E> Fulfiller<T, E>
where
    T: Clone + 'static,
    E: Clone + From<Error> + 'static,
{
    /// Fulfills the promise with `value` on a later turn.
    pub fn fulfill(&self, value: T) {
        if commit(&self.committed) {
            self.target.settle(Outcome::Fulfilled(value));
        }
    }

    /// Runs `resolution` through the resolution procedure, so a promise or
    /// thenable is adopted rather than stored.
    pub fn resolve(&self, resolution: Resolution<T, E>) {
        if commit(&self.committed) {
            resolution::resolve_promise(&self.target, resolution);
        }
    }
}

impl<T, E> Rejecter<T, E>
where
    T: Clone + 'static,
    E: Clone + From<Error> + 'static,
{
    /// Rejects the promise with `reason` on a later turn.
    pub fn reject(&self, reason: E) {
        if commit(&self.committed) {
            self.target.settle(Outcome::Rejected(reason));
        }
    }
}

impl<T: 'static, E: 'static> Fulfiller<T, E> {
    /// Whether this capability or its partner has already been used.
    pub fn is_committed(&self) -> bool {
        self.committed.get()
    }
}

impl<T: 'static, E: 'static> Rejecter<T, E> {
    pub fn is_committed(&self) -> bool {
        self.committed.get()
    }
}

impl<T: 'static, E: 'static> Clone for Fulfiller<T, E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            committed: self.committed.clone(),
        }
    }
}

impl<T: 'static, E: 'static> Clone for Rejecter<T, E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            committed: self.committed.clone(),
        }
    }
}

impl<T: 'static, E: 'static> fmt::Debug for Fulfiller<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fulfiller")
            .field("committed", &self.committed.get())
            .finish()
    }
}

impl<T: 'static, E: 'static> fmt::Debug for Rejecter<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejecter")
            .field("committed", &self.committed.get())
            .finish()
    }
}

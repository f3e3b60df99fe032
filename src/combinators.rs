//! Constructors around an immediate settlement, and the `all`/`race`
//! aggregates.
//!
use crate::{
    promise::Promise,
    resolution::Resolution,
    scheduler::Scheduler,
    Error, Result,
};
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

/// Collects `promises`, refusing iterators with no upper size bound.
fn finite<I: IntoIterator>(promises: I, combinator: &str) -> Result<Vec<I::Item>> {
    let promises = promises.into_iter();
    if promises.size_hint().1.is_none() {
        tracing::debug!(combinator, "refusing an unbounded sequence of promises");
        return Err(Error::Argument(format!(
            "{combinator} expects a finite sequence of promises"
        )));
    }
    Ok(promises.collect())
}

impl<T, E> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + From<Error> + 'static,
{
    /// A promise resolved with `resolution`. Promises and thenables are
    /// adopted, not nested.
    pub fn resolve<S>(scheduler: &S, resolution: Resolution<T, E>) -> Self
    where
        S: Scheduler + ?Sized,
    {
        Self::new(scheduler, move |fulfill, _| fulfill.resolve(resolution))
    }

    /// A promise fulfilled with `value`.
    pub fn fulfilled<S>(scheduler: &S, value: T) -> Self
    where
        S: Scheduler + ?Sized,
    {
        Self::new(scheduler, move |fulfill, _| fulfill.fulfill(value))
    }

    /// A promise rejected with `reason`.
    pub fn reject<S>(scheduler: &S, reason: E) -> Self
    where
        S: Scheduler + ?Sized,
    {
        Self::new(scheduler, move |_, reject| reject.reject(reason))
    }

    /// Fulfills with every value, in input order, once all inputs fulfill.
    /// Rejects with the first rejection.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_aplus::{Outcome, Promise, TaskQueue};
    ///
    /// let queue = TaskQueue::new();
    /// let all = Promise::<i32, String>::all(
    ///     &queue,
    ///     vec![
    ///         Promise::fulfilled(&queue, 1),
    ///         Promise::fulfilled(&queue, 2),
    ///     ],
    /// )
    /// .unwrap();
    /// queue.run();
    /// assert_eq!(all.outcome(), Some(Outcome::Fulfilled(vec![1, 2])));
    /// ```
    pub fn all<S, I>(scheduler: &S, promises: I) -> Result<Promise<Vec<T>, E>>
    where
        S: Scheduler + ?Sized,
        I: IntoIterator<Item = Promise<T, E>>,
    {
        let promises = finite(promises, "all")?;
        Ok(Promise::new(scheduler, move |fulfill, reject| {
            if promises.is_empty() {
                fulfill.fulfill(vec![]);
                return;
            }
            let values: Rc<RefCell<Vec<Option<T>>>> =
                Rc::new(RefCell::new(vec![None; promises.len()]));
            let remaining = Rc::new(Cell::new(promises.len()));
            for (index, promise) in promises.into_iter().enumerate() {
                let (values, remaining) = (values.clone(), remaining.clone());
                let (fulfill, reject) = (fulfill.clone(), reject.clone());
                promise.subscribe(
                    Box::new(move |value| {
                        values.borrow_mut()[index] = Some(value);
                        remaining.set(remaining.get() - 1);
                        if remaining.get() == 0 {
                            let values = values.borrow_mut().drain(..).flatten().collect();
                            fulfill.fulfill(values);
                        }
                    }),
                    Box::new(move |reason| reject.reject(reason)),
                );
            }
        }))
    }

    /// Settles like whichever input settles first.
    ///
    /// When several inputs are already settled, a FIFO scheduler such as
    /// [`TaskQueue`](crate::TaskQueue) lets the earliest one in `promises`
    /// win. An empty input never settles.
    pub fn race<S, I>(scheduler: &S, promises: I) -> Result<Self>
    where
        S: Scheduler + ?Sized,
        I: IntoIterator<Item = Promise<T, E>>,
    {
        let promises = finite(promises, "race")?;
        Ok(Self::new(scheduler, move |fulfill, reject| {
            for promise in promises {
                let (fulfill, reject) = (fulfill.clone(), reject.clone());
                promise.subscribe(
                    Box::new(move |value| fulfill.fulfill(value)),
                    Box::new(move |reason| reject.reject(reason)),
                );
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Deferred, Error, Outcome, Promise, Resolution, TaskQueue};

    type P = Promise<i32, String>;

    #[test]
    fn test_resolve_adopts_promise() {
        let queue = TaskQueue::new();
        let inner = P::fulfilled(&queue, 3);
        let outer = P::resolve(&queue, Resolution::Promise(inner));
        queue.run();
        assert_eq!(outer.outcome(), Some(Outcome::Fulfilled(3)));
    }

    #[test]
    fn test_reject_rejects() {
        let queue = TaskQueue::new();
        let promise = P::reject(&queue, "nope".into());
        queue.run();
        assert_eq!(promise.outcome(), Some(Outcome::Rejected("nope".into())));
    }

    #[test]
    fn test_all_empty_fulfills_with_nothing() {
        let queue = TaskQueue::new();
        let all = P::all(&queue, vec![]).unwrap();
        queue.run();
        assert_eq!(all.outcome(), Some(Outcome::Fulfilled(vec![])));
    }

    #[test]
    fn test_all_keeps_input_order() {
        let queue = TaskQueue::new();
        let first: Deferred<i32, String> = Promise::deferred(&queue);
        let second: Deferred<i32, String> = Promise::deferred(&queue);
        let all = P::all(&queue, vec![first.promise(), second.promise()]).unwrap();
        second.fulfill(2);
        queue.run();
        assert_eq!(all.outcome(), None);
        first.fulfill(1);
        queue.run();
        assert_eq!(all.outcome(), Some(Outcome::Fulfilled(vec![1, 2])));
    }

    #[test]
    fn test_all_first_rejection_wins() {
        let queue = TaskQueue::new();
        let first: Deferred<i32, String> = Promise::deferred(&queue);
        let second: Deferred<i32, String> = Promise::deferred(&queue);
        let all = P::all(&queue, vec![first.promise(), second.promise()]).unwrap();
        second.reject("second failed".into());
        queue.run();
        first.reject("first failed".into());
        queue.run();
        assert_eq!(
            all.outcome(),
            Some(Outcome::Rejected("second failed".into()))
        );
        assert_eq!(
            first.promise().outcome(),
            Some(Outcome::Rejected("first failed".into()))
        );
    }

    #[test]
    fn test_unbounded_input_is_an_argument_error() {
        let queue = TaskQueue::new();
        let endless = std::iter::repeat_with(|| P::fulfilled(&queue, 0));
        assert!(matches!(P::all(&queue, endless), Err(Error::Argument(_))));
        let endless = std::iter::repeat(P::fulfilled(&queue, 0));
        assert!(matches!(P::race(&queue, endless), Err(Error::Argument(_))));
    }

    #[test]
    fn test_race_takes_first_settler() {
        let queue = TaskQueue::new();
        let slow: Deferred<i32, String> = Promise::deferred(&queue);
        let fast: Deferred<i32, String> = Promise::deferred(&queue);
        let race = P::race(&queue, [slow.promise(), fast.promise()]).unwrap();
        fast.reject("fast".into());
        queue.run();
        slow.fulfill(1);
        queue.run();
        assert_eq!(race.outcome(), Some(Outcome::Rejected("fast".into())));
    }

    #[test]
    fn test_race_presettled_uses_input_order() {
        let queue = TaskQueue::new();
        let a = P::fulfilled(&queue, 1);
        let b = P::fulfilled(&queue, 2);
        queue.run();
        let race = P::race(&queue, vec![b, a]).unwrap();
        queue.run();
        assert_eq!(race.outcome(), Some(Outcome::Fulfilled(2)));
    }

    #[test]
    fn test_race_empty_stays_pending() {
        let queue = TaskQueue::new();
        let race = P::race(&queue, Vec::new()).unwrap();
        queue.run();
        assert_eq!(race.outcome(), None);
    }
}

#[cfg(test)]
mod tests {
    use promise_aplus::{Deferred, Error, Outcome, Promise, Resolution, Status, TaskQueue};
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    type P = Promise<i32, String>;

    #[derive(Debug, Clone, PartialEq)]
    enum JobError {
        Promise(Error),
        Timeout,
    }

    impl From<Error> for JobError {
        fn from(err: Error) -> Self {
            JobError::Promise(err)
        }
    }

    #[test]
    fn test_resolve_then_runs_once_async() {
        let queue = TaskQueue::new();
        let calls = Rc::new(RefCell::new(vec![]));
        let sink = calls.clone();
        P::fulfilled(&queue, 42).and_then(move |v| {
            sink.borrow_mut().push(v);
            Ok(Resolution::Value(()))
        });
        assert!(calls.borrow().is_empty());
        queue.run();
        assert_eq!(*calls.borrow(), vec![42]);
    }

    #[test]
    fn test_handler_never_runs_before_then_returns() {
        let queue = TaskQueue::new();
        let promise = P::fulfilled(&queue, 1);
        queue.run();
        assert_eq!(promise.status(), Status::Fulfilled);

        let counter = Rc::new(Cell::new(0));
        let sink = counter.clone();
        promise.then(
            move |_| {
                sink.set(sink.get() + 1);
                Ok(Resolution::Value(()))
            },
            Err,
        );
        assert_eq!(counter.get(), 0);
        queue.run();
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_settle_twice_keeps_first() {
        let queue = TaskQueue::new();
        let deferred: Deferred<i32, String> = Promise::deferred(&queue);
        deferred.reject("first".into());
        queue.run();
        deferred.fulfill(2);
        deferred.reject("second".into());
        queue.run();
        assert_eq!(
            deferred.promise().outcome(),
            Some(Outcome::Rejected("first".into()))
        );
    }

    #[test]
    fn test_transitive_adoption() {
        let queue = TaskQueue::new();
        let third: Deferred<i32, String> = Promise::deferred(&queue);
        let second: Deferred<i32, String> = Promise::deferred(&queue);
        second.resolve(Resolution::Promise(third.promise()));

        let second_promise = second.promise();
        let chained = P::fulfilled(&queue, 0)
            .and_then(move |_| Ok(Resolution::Promise(second_promise)));
        queue.run();
        assert_eq!(chained.outcome(), None);

        third.fulfill(99);
        queue.run();
        assert_eq!(chained.outcome(), Some(Outcome::Fulfilled(99)));
    }

    #[test]
    fn test_adopted_rejection_propagates() {
        let queue = TaskQueue::new();
        let inner: Deferred<i32, String> = Promise::deferred(&queue);
        let inner_promise = inner.promise();
        let chained = P::fulfilled(&queue, 0)
            .and_then(move |_| Ok(Resolution::Promise(inner_promise)))
            .and_then(|v| Ok(Resolution::Value(v + 1)));
        queue.run();
        inner.reject("inner failed".into());
        queue.run();
        assert_eq!(
            chained.outcome(),
            Some(Outcome::Rejected("inner failed".into()))
        );
    }

    #[test]
    fn test_returning_dependent_promise_is_a_cycle() {
        let queue = TaskQueue::new();
        let slot: Rc<RefCell<Option<Promise<i32, JobError>>>> = Rc::new(RefCell::new(None));
        let source = Promise::<i32, JobError>::fulfilled(&queue, 1);
        let handle = slot.clone();
        let dependent = source.and_then(move |_| match handle.borrow_mut().take() {
            Some(me) => Ok(Resolution::Promise(me)),
            None => Ok(Resolution::Value(0)),
        });
        *slot.borrow_mut() = Some(dependent.clone());
        queue.run();
        assert_eq!(
            dependent.outcome(),
            Some(Outcome::Rejected(JobError::Promise(Error::Cycle)))
        );
    }

    #[test]
    fn test_all_rejects_with_first_rejection() {
        let queue = TaskQueue::new();
        let f1: Deferred<i32, String> = Promise::deferred(&queue);
        let f2: Deferred<i32, String> = Promise::deferred(&queue);
        let all = P::all(&queue, [f1.promise(), f2.promise()]).unwrap();
        f2.reject("f2".into());
        queue.run();
        f1.fulfill(1);
        queue.run();
        assert_eq!(all.outcome(), Some(Outcome::Rejected("f2".into())));
        assert_eq!(f1.promise().status(), Status::Fulfilled);
    }

    #[test]
    fn test_all_of_chains() {
        let queue = TaskQueue::new();
        let inputs = (1..=4)
            .map(|i| P::fulfilled(&queue, i).and_then(|v| Ok(Resolution::Value(v * 10))));
        let all = P::all(&queue, inputs).unwrap();
        queue.run();
        assert_eq!(all.outcome(), Some(Outcome::Fulfilled(vec![10, 20, 30, 40])));
    }

    #[test]
    fn test_race_against_timer_for_timeout() {
        let queue = TaskQueue::new();
        let job: Deferred<&'static str, JobError> = Promise::deferred(&queue);
        let timer: Deferred<&'static str, JobError> = Promise::deferred(&queue);
        let guarded = Promise::race(&queue, vec![job.promise(), timer.promise()]).unwrap();
        timer.reject(JobError::Timeout);
        queue.run();
        job.fulfill("done");
        queue.run();
        assert_eq!(guarded.outcome(), Some(Outcome::Rejected(JobError::Timeout)));
    }

    #[test]
    fn test_thenable_in_chain() {
        let queue = TaskQueue::new();
        let chained = P::fulfilled(&queue, 5).and_then(|v| {
            Ok(Resolution::from_fn(move |resolve, _| {
                resolve.fulfill(v * 3);
                Ok(())
            }))
        });
        queue.run();
        assert_eq!(chained.outcome(), Some(Outcome::Fulfilled(15)));
    }

    #[test]
    fn test_handler_can_chain_on_source() {
        let queue = TaskQueue::new();
        let source = P::fulfilled(&queue, 2);
        let log = Rc::new(RefCell::new(vec![]));
        let (again, sink) = (source.clone(), log.clone());
        source.and_then(move |v| {
            sink.borrow_mut().push(v);
            let sink = sink.clone();
            again.and_then(move |v| {
                sink.borrow_mut().push(v * 10);
                Ok(Resolution::Value(()))
            });
            Ok(Resolution::Value(()))
        });
        queue.run();
        assert_eq!(*log.borrow(), vec![2, 20]);
    }
}

//! The host task queue a promise defers its callbacks onto.
//!
//! Promises never run a waiter on the call stack that registered it or
//! settled it. Instead they hand a [`Task`] to a [`Scheduler`], and the host
//! runs it on a later turn. [`TaskQueue`] is a FIFO macrotask queue that
//! works as the host in tests and simple single-threaded programs.
//!
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    rc::{Rc, Weak},
};

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Something that can run a task on a later turn.
///
/// Implementations must not run `task` inside `defer` itself.
pub trait Scheduler {
    fn defer(&self, task: Task);

    /// The handle a promise keeps to schedule its own work. A scheduler
    /// whose queue owns the tasks should hand out a weak handle, or the
    /// queue and its queued promises keep each other alive.
    fn handle(&self) -> Rc<dyn Scheduler>;
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn defer(&self, task: Task) {
        (**self).defer(task)
    }

    fn handle(&self) -> Rc<dyn Scheduler> {
        (**self).handle()
    }
}

/// A single-threaded FIFO task queue.
///
/// Cloning the queue gives another handle onto the same tasks.
///
/// # Examples
///
/// ```
/// use promise_aplus::{Scheduler, TaskQueue};
/// use std::{cell::Cell, rc::Rc};
///
/// let queue = TaskQueue::new();
/// let hits = Rc::new(Cell::new(0));
/// let counter = hits.clone();
/// queue.defer(Box::new(move || counter.set(counter.get() + 1)));
/// assert_eq!(hits.get(), 0);
/// assert_eq!(queue.run(), 1);
/// assert_eq!(hits.get(), 1);
/// ```
#[derive(Clone, Default)]
pub struct TaskQueue {
    inner: Rc<Inner>,
}

#[derive(Default)]
struct Inner {
    tasks: RefCell<VecDeque<Task>>,
    turn_limit: Option<usize>,
    turns: Cell<u64>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue whose [`run`](TaskQueue::run) stops after `limit` tasks, even
    /// if more are waiting.
    pub fn with_turn_limit(limit: usize) -> Self {
        Self {
            inner: Rc::new(Inner {
                turn_limit: Some(limit),
                ..Inner::default()
            }),
        }
    }

    /// A handle that does not keep the queue alive.
    pub fn spawner(&self) -> QueueSpawner {
        QueueSpawner {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Runs the oldest queued task. Returns `false` if the queue was empty.
    pub fn run_once(&self) -> bool {
        // The borrow must end before the task runs: tasks schedule more tasks.
        let task = self.inner.tasks.borrow_mut().pop_front();
        match task {
            Some(task) => {
                let turn = self.inner.turns.get() + 1;
                self.inner.turns.set(turn);
                tracing::trace!(turn, "running deferred task");
                task();
                true
            }
            None => false,
        }
    }

    /// Runs tasks until the queue is empty or the turn limit is reached,
    /// including tasks scheduled while running. Returns how many ran.
    pub fn run(&self) -> usize {
        let mut ran = 0;
        while self.inner.turn_limit.map_or(true, |limit| ran < limit) && self.run_once() {
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(ran, pending = self.len(), "task queue drained");
        }
        ran
    }

    pub fn len(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.tasks.borrow().is_empty()
    }
}

impl Scheduler for TaskQueue {
    fn defer(&self, task: Task) {
        self.inner.tasks.borrow_mut().push_back(task);
    }

    fn handle(&self) -> Rc<dyn Scheduler> {
        Rc::new(self.spawner())
    }
}

/// A weak handle onto a [`TaskQueue`].
///
/// Tasks deferred after the queue is gone are dropped without running.
#[derive(Clone)]
pub struct QueueSpawner {
    inner: Weak<Inner>,
}

impl Scheduler for QueueSpawner {
    fn defer(&self, task: Task) {
        match self.inner.upgrade() {
            Some(inner) => inner.tasks.borrow_mut().push_back(task),
            None => tracing::trace!("task queue dropped, discarding task"),
        }
    }

    fn handle(&self) -> Rc<dyn Scheduler> {
        Rc::new(self.clone())
    }
}

impl fmt::Debug for QueueSpawner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueSpawner")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("len", &self.len())
            .field("turn_limit", &self.inner.turn_limit)
            .finish()
    }
}

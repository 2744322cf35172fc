//! Microtask Queue
//!
//! Deferred single-threaded callbacks, drained explicitly by the host loop.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Deferred callback
pub type Microtask = Box<dyn FnOnce()>;

/// Shared microtask queue. Clones refer to the same queue.
#[derive(Clone, Default)]
pub struct MicrotaskQueue {
    tasks: Rc<RefCell<VecDeque<Microtask>>>,
}

impl MicrotaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a microtask
    pub fn schedule(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Run microtasks until the queue is empty, including ones queued while draining.
    /// Returns how many ran.
    pub fn run_microtasks(&self) -> usize {
        let mut executed = 0;
        loop {
            // Release the borrow before running so tasks can schedule more work
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    executed += 1;
                }
                None => break,
            }
        }
        executed
    }

    /// Check if there's pending work
    pub fn has_pending(&self) -> bool {
        !self.tasks.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrotaskQueue")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_microtask_order() {
        let queue = MicrotaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            queue.schedule(move || log.borrow_mut().push(i));
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.run_microtasks(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(!queue.has_pending());
    }

    #[test]
    fn test_nested_scheduling_drains() {
        let queue = MicrotaskQueue::new();
        let hits = Rc::new(Cell::new(0));
        let inner_queue = queue.clone();
        let inner_hits = hits.clone();
        queue.schedule(move || {
            inner_hits.set(inner_hits.get() + 1);
            let hits = inner_hits.clone();
            inner_queue.schedule(move || hits.set(hits.get() + 1));
        });
        assert_eq!(queue.run_microtasks(), 2);
        assert_eq!(hits.get(), 2);
    }
}

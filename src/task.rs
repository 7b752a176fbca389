use crate::coroutine::Coroutine;
use crate::error::Result;
use crate::state::State;
use alloc::vec::Vec;

/// Round-robin scheduler over a list of owned coroutines.
///
/// Not thread-safe: the contract is one task runner per thread, matching the
/// single-threaded, cooperative nature of the coroutines it drives.
#[derive(Default)]
pub struct TaskRunner {
    tasks: Vec<Coroutine>,
}

impl TaskRunner {
    #[must_use]
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Appends a live coroutine to the end of the run queue.
    pub fn add(&mut self, coroutine: Coroutine) {
        #[cfg(feature = "tracing")]
        tracing::trace!(tasks = self.tasks.len() + 1, "task added");
        self.tasks.push(coroutine);
    }

    /// Returns the number of tasks currently owned by this runner.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Resumes each live task once, in insertion order, removing those that
    /// reach `Dead` during this step. Returns whether any live tasks remain.
    ///
    /// A non-transient error from any task aborts the step immediately; the
    /// offending coroutine is left in the queue, at the position it was at.
    pub fn step(&mut self) -> Result<bool> {
        let mut i = 0;
        while i < self.tasks.len() {
            match self.tasks[i].resume()? {
                State::Dead => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(task = i, "task completed");
                    self.tasks.remove(i);
                }
                _ => i += 1,
            }
        }
        Ok(!self.tasks.is_empty())
    }

    /// Steps repeatedly until no live tasks remain.
    pub fn run(&mut self) -> Result<()> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("task_runner::run", tasks = self.tasks.len()).entered();
        while self.step()? {}
        #[cfg(feature = "tracing")]
        tracing::debug!("all tasks completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StackSize, StorageSize};
    use crate::coroutine::Coroutine;

    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    #[test]
    fn round_robin_of_two_tasks() {
        let log: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));

        let log_a = log.clone();
        let task_a = Coroutine::from_fn(
            move |handle| {
                for phase in 0..3u32 {
                    log_a.borrow_mut().push(phase * 2 + 1);
                    handle.yield_now().unwrap();
                }
            },
            StackSize::default(),
            StorageSize::default(),
        )
        .unwrap();

        let log_b = log.clone();
        let task_b = Coroutine::from_fn(
            move |handle| {
                for phase in 0..3u32 {
                    log_b.borrow_mut().push(phase * 2 + 2);
                    handle.yield_now().unwrap();
                }
            },
            StackSize::default(),
            StorageSize::default(),
        )
        .unwrap();

        let mut runner = TaskRunner::new();
        runner.add(task_a);
        runner.add(task_b);
        runner.run().unwrap();

        assert_eq!(*log.borrow(), [1, 2, 3, 4, 5, 6]);
        assert!(runner.is_empty());
    }
}

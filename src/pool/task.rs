use std::fmt;

type Job<E> = Box<dyn FnOnce() -> std::result::Result<(), E> + Send + 'static>;

/// A unit of work for the pool.
///
/// A task either holds a closure or is empty. Empty tasks are rejected
/// at submission with [`PoolError::InvalidTask`](crate::PoolError::InvalidTask).
pub struct Task<E> {
    job: Option<Job<E>>,
}

impl<E> Task<E> {
    /// Wraps a closure into a task.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> std::result::Result<(), E> + Send + 'static,
    {
        Task {
            job: Some(Box::new(f)),
        }
    }

    /// Creates a task with no work attached.
    pub fn empty() -> Self {
        Task { job: None }
    }

    /// Returns `true` if the task carries no closure.
    pub fn is_empty(&self) -> bool {
        self.job.is_none()
    }

    /// Runs the task, consuming it. An empty task succeeds trivially.
    pub(crate) fn run(self) -> std::result::Result<(), E> {
        match self.job {
            Some(job) => job(),
            None => Ok(()),
        }
    }
}

impl<E> Default for Task<E> {
    fn default() -> Self {
        Task::empty()
    }
}

impl<E> fmt::Debug for Task<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("empty", &self.is_empty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_task_is_empty() {
        assert!(Task::<String>::empty().is_empty());
        assert!(Task::<String>::default().is_empty());
    }

    #[test]
    fn run_returns_closure_outcome() {
        let ok = Task::<String>::new(|| Ok(()));
        assert!(!ok.is_empty());
        assert_eq!(ok.run(), Ok(()));

        let failing = Task::new(|| Err("boom".to_owned()));
        assert_eq!(failing.run(), Err("boom".to_owned()));
    }
}

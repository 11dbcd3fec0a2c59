use std::fmt;
use std::io;

use thiserror::Error;

use crate::pool::Task;

/// Error type for worker pool operations.
///
/// Task failures never show up here; they are delivered on the
/// pool's results stream.
#[derive(Error, Debug)]
pub enum PoolError {
    /// The pool was configured with a non-positive worker count.
    #[error("invalid configuration: worker count must be positive, got {size}")]
    InvalidConfiguration {
        /// The rejected worker count.
        size: usize,
    },

    /// An empty task was submitted.
    #[error("invalid task")]
    InvalidTask,

    /// A task was submitted before the pool was started.
    #[error("pool not started")]
    NotStarted,

    /// A task was submitted after the intake was closed.
    #[error("pool intake closed")]
    Closed,

    /// A non-blocking submission found no idle worker.
    #[error("all workers busy")]
    Busy,

    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
}

/// Result type alias for worker pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

/// A task turned away by [`WorkerPool::try_submit`](crate::WorkerPool::try_submit).
///
/// The task comes back unexecuted so it can be resubmitted.
#[derive(Error)]
#[error("{error}")]
pub struct TrySubmitError<E> {
    error: PoolError,
    task: Task<E>,
}

impl<E> TrySubmitError<E> {
    pub(crate) fn new(error: PoolError, task: Task<E>) -> Self {
        TrySubmitError { error, task }
    }

    /// Why the task was rejected.
    pub fn error(&self) -> &PoolError {
        &self.error
    }

    /// Takes back the rejected task.
    pub fn into_task(self) -> Task<E> {
        self.task
    }

    /// Splits into the rejection reason and the task.
    pub fn into_parts(self) -> (PoolError, Task<E>) {
        (self.error, self.task)
    }
}

impl<E> fmt::Debug for TrySubmitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrySubmitError")
            .field("error", &self.error)
            .field("task", &self.task)
            .finish()
    }
}

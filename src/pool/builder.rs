use std::fmt;
use std::marker::PhantomData;

use super::worker::WorkerConfig;
use super::{BoxError, WorkerPool};
use crate::Result;

const DEFAULT_THREAD_NAME: &str = "workpool-worker";

/// Configures a [`WorkerPool`] before it is created.
///
/// ```
/// use workpool::{Builder, WorkerPool};
///
/// let pool: WorkerPool<String> = Builder::new()
///     .size(4)
///     .thread_name("fetcher")
///     .build()
///     .unwrap();
/// assert_eq!(pool.size(), 4);
/// ```
pub struct Builder<E = BoxError> {
    size: Option<usize>,
    thread_name: String,
    stack_size: Option<usize>,
    error: PhantomData<fn() -> E>,
}

impl<E> Builder<E> {
    /// Creates a builder with default settings: one worker per logical
    /// CPU, threads named `workpool-worker-{id}`, default stack size.
    pub fn new() -> Self {
        Builder {
            size: None,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            stack_size: None,
            error: PhantomData,
        }
    }

    /// Sets the number of worker threads.
    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the worker thread name prefix.
    pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = prefix.into();
        self
    }

    /// Sets the stack size of each worker thread, in bytes.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

impl<E: Send + 'static> Builder<E> {
    /// Creates the pool in the not-started state.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`](crate::PoolError::InvalidConfiguration)
    /// if the worker count is zero.
    pub fn build(self) -> Result<WorkerPool<E>> {
        let size = self.size.unwrap_or_else(num_cpus::get);
        WorkerPool::with_config(
            size,
            WorkerConfig {
                name_prefix: self.thread_name,
                stack_size: self.stack_size,
            },
        )
    }
}

impl<E> Default for Builder<E> {
    fn default() -> Self {
        Builder::new()
    }
}

impl<E> Clone for Builder<E> {
    fn clone(&self) -> Self {
        Builder {
            size: self.size,
            thread_name: self.thread_name.clone(),
            stack_size: self.stack_size,
            error: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Builder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("size", &self.size)
            .field("thread_name", &self.thread_name)
            .field("stack_size", &self.stack_size)
            .finish()
    }
}

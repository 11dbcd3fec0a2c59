use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Once, PoisonError};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use crossbeam::sync::WaitGroup;
use log::{error, info};

use crate::{PoolError, Result, TrySubmitError};

mod builder;
mod results;
mod task;
mod worker;

pub use self::builder::Builder;
pub use self::results::Results;
pub use self::task::Task;

use self::worker::WorkerConfig;

/// Error type used by a pool whose error type is not spelled out.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Channel ends handed to the workers on start.
struct Pending<E> {
    intake: Receiver<Task<E>>,
    results: Sender<E>,
}

/// A fixed-size pool of worker threads fed through a zero-capacity intake.
///
/// The pool is created idle. [`start`](WorkerPool::start) spawns the
/// workers once; after that [`submit`](WorkerPool::submit) hands a task to
/// the first idle worker, blocking until one is free. Tasks that return
/// `Err` have the error pushed onto the stream returned by
/// [`results`](WorkerPool::results). That stream closes once the intake is
/// closed (by [`close`](WorkerPool::close) or by dropping the pool) and
/// every worker has exited.
///
/// Pushing a failure blocks the worker until a reader takes it, so callers
/// that submit failing tasks must drain the results stream concurrently.
pub struct WorkerPool<E = BoxError> {
    size: usize,
    config: WorkerConfig,
    intake: Mutex<Option<Sender<Task<E>>>>,
    results: Receiver<E>,
    pending: Mutex<Option<Pending<E>>>,
    started: AtomicBool,
    start_guard: Once,
    start_failure: Mutex<Option<io::Error>>,
    panicked: Arc<AtomicUsize>,
}

impl<E: Send + 'static> WorkerPool<E> {
    /// Returns a [`Builder`] for configuring a pool.
    pub fn builder() -> Builder<E> {
        Builder::new()
    }

    /// Creates an idle pool of `size` workers.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] if `size` is zero.
    pub fn new(size: usize) -> Result<Self> {
        Builder::new().size(size).build()
    }

    pub(crate) fn with_config(size: usize, config: WorkerConfig) -> Result<Self> {
        if size == 0 {
            return Err(PoolError::InvalidConfiguration { size });
        }

        let (intake_tx, intake_rx) = channel::bounded(0);
        let (results_tx, results_rx) = channel::bounded(0);

        Ok(WorkerPool {
            size,
            config,
            intake: Mutex::new(Some(intake_tx)),
            results: results_rx,
            pending: Mutex::new(Some(Pending {
                intake: intake_rx,
                results: results_tx,
            })),
            started: AtomicBool::new(false),
            start_guard: Once::new(),
            start_failure: Mutex::new(None),
            panicked: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Spawns the workers. Only the first call has any effect; concurrent
    /// callers wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Spawn`] if a thread could not be created. The
    /// pool then stays not-started for good: its intake is closed, any
    /// workers that did spawn exit, and every later call returns the same
    /// error.
    pub fn start(&self) -> Result<()> {
        self.start_guard.call_once(|| {
            if let Err(err) = self.spawn_workers() {
                error!("Failed to start workers: {}", err);
                self.close();
                *lock(&self.start_failure) = Some(err);
            }
        });

        match lock(&self.start_failure).as_ref() {
            Some(err) => Err(PoolError::Spawn(io::Error::new(err.kind(), err.to_string()))),
            None => Ok(()),
        }
    }

    fn spawn_workers(&self) -> io::Result<()> {
        let Some(Pending { intake, results }) = lock(&self.pending).take() else {
            return Ok(());
        };

        info!("Starting {} workers", self.size);
        let barrier = WaitGroup::new();
        for id in 0..self.size {
            worker::spawn_worker(
                id,
                &self.config,
                intake.clone(),
                results.clone(),
                barrier.clone(),
                self.panicked.clone(),
            )?;
        }
        worker::spawn_coordinator(&self.config, barrier, results, self.size)?;

        self.started.store(true, Ordering::Release);
        Ok(())
    }

    /// Hands `task` to an idle worker, blocking until one accepts it.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidTask`] if `task` is empty.
    /// - [`PoolError::NotStarted`] if [`start`](WorkerPool::start) has not run.
    /// - [`PoolError::Closed`] if the intake has been closed.
    pub fn submit(&self, task: Task<E>) -> Result<()> {
        let intake = self.intake_for(&task)?;
        intake.send(task).map_err(|_| PoolError::Closed)
    }

    /// Wraps `f` in a [`Task`] and submits it.
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() -> std::result::Result<(), E> + Send + 'static,
    {
        self.submit(Task::new(f))
    }

    /// Hands `task` to a worker only if one is idle right now.
    ///
    /// # Errors
    ///
    /// Same reasons as [`submit`](WorkerPool::submit), plus
    /// [`PoolError::Busy`] if every worker is occupied. The rejected task is
    /// handed back inside the error.
    pub fn try_submit(&self, task: Task<E>) -> std::result::Result<(), TrySubmitError<E>> {
        let intake = match self.intake_for(&task) {
            Ok(intake) => intake,
            Err(err) => return Err(TrySubmitError::new(err, task)),
        };
        intake.try_send(task).map_err(|e| match e {
            TrySendError::Full(task) => TrySubmitError::new(PoolError::Busy, task),
            TrySendError::Disconnected(task) => TrySubmitError::new(PoolError::Closed, task),
        })
    }

    fn intake_for(&self, task: &Task<E>) -> Result<Sender<Task<E>>> {
        if task.is_empty() {
            return Err(PoolError::InvalidTask);
        }
        if !self.is_started() {
            return Err(PoolError::NotStarted);
        }
        // Cloned so that the lock is not held across a blocking handoff.
        lock(&self.intake).as_ref().cloned().ok_or(PoolError::Closed)
    }

    /// Returns a handle on the failure stream.
    pub fn results(&self) -> Results<E> {
        Results::new(self.results.clone())
    }

    /// Returns `true` once the workers have been spawned.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

impl<E> WorkerPool<E> {
    /// Returns the number of workers.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Closes the intake. Workers finish what they hold and exit, then the
    /// results stream closes. Calling it again has no effect.
    pub fn close(&self) {
        if lock(&self.intake).take().is_some() {
            info!("Intake closed");
        }
    }

    /// Returns `true` once [`close`](WorkerPool::close) has run.
    pub fn is_closed(&self) -> bool {
        lock(&self.intake).is_none()
    }

    /// Number of tasks that panicked instead of returning.
    ///
    /// Panics never reach the results stream; this counter is the only
    /// trace they leave besides the error log.
    pub fn panicked_tasks(&self) -> usize {
        self.panicked.load(Ordering::Acquire)
    }
}

impl<E> fmt::Debug for WorkerPool<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("started", &self.started.load(Ordering::Acquire))
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<E> Drop for WorkerPool<E> {
    fn drop(&mut self) {
        self.close();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_starts_idle() {
        let pool = WorkerPool::<String>::new(3).unwrap();
        assert_eq!(pool.size(), 3);
        assert!(!pool.is_started());
        assert!(!pool.is_closed());
    }

    #[test]
    fn unstarted_pool_drop_closes_results() {
        let pool = WorkerPool::<String>::new(2).unwrap();
        let results = pool.results();
        drop(pool);
        assert_eq!(results.recv(), None);
    }

    #[test]
    fn close_before_start_drains_immediately() {
        let pool = WorkerPool::<String>::new(2).unwrap();
        pool.close();
        pool.start().unwrap();
        assert!(pool.is_started());
        assert_eq!(pool.results().recv(), None);
    }

    #[test]
    fn builder_uses_default_error_type() {
        let pool: WorkerPool = WorkerPool::builder().size(1).build().unwrap();
        assert_eq!(
            format!("{pool:?}"),
            "WorkerPool { size: 1, started: false, closed: false }"
        );
        pool.start().unwrap();
        let results = pool.results();
        pool.execute(|| Err("boxed".into())).unwrap();
        pool.close();
        let err: BoxError = results.recv().unwrap();
        assert_eq!(err.to_string(), "boxed");
        assert!(results.recv().is_none());
    }

    #[test]
    fn failed_start_is_reported_on_every_call() {
        let pool: WorkerPool<String> = WorkerPool::builder()
            .size(2)
            .stack_size(1 << 46)
            .build()
            .unwrap();
        let results = pool.results();

        assert!(matches!(pool.start(), Err(PoolError::Spawn(_))));
        assert!(matches!(pool.start(), Err(PoolError::Spawn(_))));
        assert!(!pool.is_started());
        assert!(pool.is_closed());
        assert!(matches!(
            pool.execute(|| Ok(())),
            Err(PoolError::NotStarted)
        ));
        assert_eq!(results.recv(), None);
    }
}

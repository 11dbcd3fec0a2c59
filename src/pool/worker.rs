use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{Receiver, Sender};
use crossbeam::sync::WaitGroup;
use log::{debug, error, info, warn};

use super::Task;

/// Thread settings shared by every worker of a pool.
#[derive(Debug, Clone)]
pub(crate) struct WorkerConfig {
    pub(crate) name_prefix: String,
    pub(crate) stack_size: Option<usize>,
}

impl WorkerConfig {
    fn thread(&self, suffix: &str) -> thread::Builder {
        let builder = thread::Builder::new().name(format!("{}-{suffix}", self.name_prefix));
        match self.stack_size {
            Some(bytes) => builder.stack_size(bytes),
            None => builder,
        }
    }
}

/// Spawns a single worker thread that pulls tasks from `intake` until it
/// is closed and drained. Failures go to `results`; panics are logged,
/// counted in `panicked`, and the worker keeps serving.
///
/// The worker holds `token` until it exits.
pub(crate) fn spawn_worker<E: Send + 'static>(
    id: usize,
    config: &WorkerConfig,
    intake: Receiver<Task<E>>,
    results: Sender<E>,
    token: WaitGroup,
    panicked: Arc<AtomicUsize>,
) -> io::Result<()> {
    config.thread(&id.to_string()).spawn(move || {
        let _token = token;
        for task in intake.iter() {
            debug!("Worker {id} executing task");
            match panic::catch_unwind(AssertUnwindSafe(move || task.run())) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    debug!("Worker {id} task failed, reporting");
                    // Blocks until someone drains the results stream.
                    if results.send(err).is_err() {
                        warn!("Worker {id}: results stream has no reader, failure dropped");
                    }
                }
                Err(_) => {
                    panicked.fetch_add(1, Ordering::AcqRel);
                    error!("Worker {id} task panicked, continuing");
                }
            }
        }
        debug!("Worker {id}: intake closed, shutting down");
    })?;
    Ok(())
}

/// Spawns the thread that closes the results stream once every worker
/// holding a clone of `barrier` has exited.
pub(crate) fn spawn_coordinator<E: Send + 'static>(
    config: &WorkerConfig,
    barrier: WaitGroup,
    results: Sender<E>,
    workers: usize,
) -> io::Result<()> {
    config.thread("coordinator").spawn(move || {
        barrier.wait();
        drop(results);
        info!("All {workers} workers exited, results stream closed");
    })?;
    Ok(())
}

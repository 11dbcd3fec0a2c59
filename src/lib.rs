#![deny(missing_docs)]

//! A bounded-concurrency worker pool.
//!
//! A fixed number of worker threads pull tasks from a zero-capacity
//! intake, so every submission blocks until a worker is free to take it.
//! Tasks return `Result<(), E>`; only the failures are forwarded to a
//! results stream, which closes once the intake is closed and every
//! worker has exited.

mod error;
/// The worker pool, its tasks and its results stream.
pub mod pool;

pub use error::{PoolError, Result, TrySubmitError};
pub use pool::{BoxError, Builder, Results, Task, WorkerPool};

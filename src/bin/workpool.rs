use std::process::exit;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{error, info, warn};
use serde::Serialize;

use workpool::{Result, WorkerPool};

const DEFAULT_TASKS: usize = 100;
const DEFAULT_WORK_MS: u64 = 1;

#[derive(Parser)]
#[command(name = "workpool", version, about = "Drive a worker pool with synthetic tasks")]
struct Cli {
    /// Number of worker threads [default: number of logical CPUs]
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Number of tasks to submit
    #[arg(long, default_value_t = DEFAULT_TASKS, value_name = "N")]
    tasks: usize,

    /// Make every K-th task fail (0 disables failures)
    #[arg(long, default_value_t = 0, value_name = "K")]
    fail_every: usize,

    /// Simulated work per task, in milliseconds
    #[arg(long, default_value_t = DEFAULT_WORK_MS, value_name = "MS")]
    work_ms: u64,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

/// Outcome of one run.
#[derive(Debug, Serialize)]
struct Summary {
    workers: usize,
    submitted: usize,
    failed: usize,
    elapsed_ms: u128,
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{}", e);
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let workers = cli.workers.unwrap_or_else(num_cpus::get);
    let pool: WorkerPool<String> = WorkerPool::builder().size(workers).build()?;

    info!("workpool {}", env!("CARGO_PKG_VERSION"));
    info!("Running {} tasks on {} workers", cli.tasks, workers);

    let started = Instant::now();
    pool.start()?;
    let results = pool.results();

    let joined = thread::scope(|s| {
        let producer = s.spawn(|| submit_all(&pool, cli.tasks, cli.fail_every, cli.work_ms));

        let mut failed = 0;
        for err in &results {
            warn!("Task failed: {}", err);
            failed += 1;
        }
        producer.join().map(|submitted| (submitted, failed))
    });

    let (submitted, failed) = match joined {
        Ok((submitted, failed)) => (submitted?, failed),
        Err(_) => {
            error!("Producer thread panicked");
            exit(1);
        }
    };

    let summary = Summary {
        workers,
        submitted,
        failed,
        elapsed_ms: started.elapsed().as_millis(),
    };

    if cli.json {
        match serde_json::to_string(&summary) {
            Ok(line) => println!("{line}"),
            Err(e) => {
                error!("Failed to encode summary: {}", e);
                exit(1);
            }
        }
    } else {
        println!("submitted: {}", summary.submitted);
        println!("failed: {}", summary.failed);
        println!("elapsed_ms: {}", summary.elapsed_ms);
    }

    Ok(())
}

/// Submits `tasks` synthetic tasks, then closes the intake so the results
/// stream ends.
fn submit_all(
    pool: &WorkerPool<String>,
    tasks: usize,
    fail_every: usize,
    work_ms: u64,
) -> Result<usize> {
    let outcome = (1..=tasks).try_for_each(|n| {
        pool.execute(move || {
            thread::sleep(Duration::from_millis(work_ms));
            if fail_every != 0 && n % fail_every == 0 {
                Err(format!("task {n} failed"))
            } else {
                Ok(())
            }
        })
    });
    pool.close();
    outcome.map(|()| tasks)
}

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use crossbeam_utils::thread::scope;
use rand::prelude::*;
use workpool::WorkerPool;

const TASKS: usize = 1_000;

/// Spins for a pseudo-random number of iterations and fails one task in ten.
fn work(seed: u64) -> Result<(), u64> {
    let mut acc = seed;
    for i in 0..(seed % 512) {
        acc = acc.wrapping_mul(31).wrapping_add(i);
    }
    if seed % 10 == 0 {
        Err(acc)
    } else {
        Ok(())
    }
}

fn seeds() -> Vec<u64> {
    let mut rng = thread_rng();
    (0..TASKS).map(|_| rng.gen()).collect()
}

fn mixed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_workload");
    let threads = num_cpus::get();

    group.bench_function("workpool", |b| {
        b.iter_batched(
            seeds,
            |seeds| {
                let pool = WorkerPool::new(threads).unwrap();
                pool.start().unwrap();
                let results = pool.results();
                scope(|s| {
                    s.spawn(|_| {
                        for seed in seeds {
                            pool.execute(move || work(seed)).unwrap();
                        }
                        pool.close();
                    });
                    results.iter().count()
                })
                .unwrap()
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("rayon", |b| {
        b.iter_batched(
            seeds,
            |seeds| {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .unwrap();
                let (tx, rx) = crossbeam::channel::unbounded();
                pool.scope(|s| {
                    for seed in seeds {
                        let tx = tx.clone();
                        s.spawn(move |_| {
                            if let Err(e) = work(seed) {
                                tx.send(e).unwrap();
                            }
                        });
                    }
                });
                drop(tx);
                rx.iter().count()
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, mixed_workload);
criterion_main!(benches);

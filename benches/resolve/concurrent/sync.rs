#![allow(dead_code)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Barrier,
    },
    thread,
    time::{Duration, Instant},
};
use stevedore::{BuildContext, Container};

const THREADS: usize = 10;
const SCALING_THREADS: [usize; 5] = [1, 2, 4, 8, 12];

fn run_bench_threads<W, F>(threads: usize, mut make_test_fn: W, iters: u64) -> Duration
where
    W: FnMut() -> F,
    F: FnMut() + Send + 'static,
{
    let barrier = Arc::new(Barrier::new(threads + 1));
    let elapsed_handles = Arc::new((0..threads).map(|_| AtomicU64::default()).collect::<Box<[_]>>());

    thread::scope(|s| {
        for i in 0..threads {
            let barrier = barrier.clone();
            let elapsed_handles = elapsed_handles.clone();
            let mut test_fn = make_test_fn();

            s.spawn(move || {
                barrier.wait();
                let start = Instant::now();
                for _ in 0..iters {
                    test_fn();
                }
                elapsed_handles[i].store(start.elapsed().as_nanos() as u64, Ordering::Relaxed);
            });
        }

        barrier.wait();
    });

    let nanos = elapsed_handles.iter().map(|elapsed_handle| elapsed_handle.load(Ordering::Relaxed)).collect::<Vec<_>>();
    Duration::from_nanos(nanos.iter().sum::<u64>() / nanos.len() as u64)
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");
    group.sample_size(30);
    group.warm_up_time(Duration::from_secs(3));

    group.bench_function(BenchmarkId::new("get_single", THREADS), |b| {
        struct A;

        let container = Container::new();
        container.provide(|_| A);
        container.create_scope("app");

        b.iter_custom(|iters| {
            run_bench_threads(
                THREADS,
                || {
                    let container = container.clone();
                    let ctx = container.context().in_scope("app");
                    move || {
                        container.get::<A>("app", &ctx).unwrap();
                    }
                },
                iters.div_ceil(THREADS as u64),
            )
        });
    });

    group.bench_function(BenchmarkId::new("build_single", THREADS), |b| {
        struct A;

        let container = Container::new();
        container.provide(|_| A);

        b.iter_custom(|iters| {
            run_bench_threads(
                THREADS,
                || {
                    let container = container.clone();
                    let ctx = container.context();
                    move || {
                        container.build::<A>(&ctx).unwrap();
                    }
                },
                iters.div_ceil(THREADS as u64),
            )
        });
    });

    for thread_count in SCALING_THREADS {
        group.bench_with_input(BenchmarkId::new("scaling", thread_count), &thread_count, |b, thread_count| {
            struct A(Arc<B>);
            struct B(Arc<C>);
            struct C;

            let container = Container::new();
            container.provide(|_| C);
            container.provide(|ctx: &BuildContext| B(ctx.must_get().unwrap()));
            container.provide(|ctx: &BuildContext| A(ctx.must_get().unwrap()));
            container.create_scope("request");

            b.iter_custom(|iters| {
                run_bench_threads(
                    *thread_count,
                    || {
                        let container = container.clone();
                        let ctx = container.context().in_scope("request");
                        move || {
                            container.get::<A>("request", &ctx).unwrap();
                        }
                    },
                    iters.div_ceil(*thread_count as u64),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(concurrent_benches, criterion_benchmark);
criterion_main!(concurrent_benches);

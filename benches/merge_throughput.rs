//! Benchmark for merge throughput
//!
//! Diffs two in-memory sources of interleaved integers under different page
//! and buffer sizes, so fetch bookkeeping and the merge loop dominate.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pagediff::{collect_results, PaginationDiff, SourceConfig, VecPages};
use tokio::runtime::Runtime;

fn paginate(records: &[i64], page_size: usize) -> Vec<Vec<i64>> {
    records.chunks(page_size).map(<[i64]>::to_vec).collect()
}

fn create_sources(count: i64) -> (Vec<i64>, Vec<i64>) {
    // every third record differs between the two sides
    let a = (0..count).filter(|i| i % 3 != 1).collect();
    let b = (0..count).filter(|i| i % 3 != 2).collect();
    (a, b)
}

fn run_diff(runtime: &Runtime, a: &[i64], b: &[i64], page_size: usize, buffer_size: usize) -> usize {
    runtime.block_on(async {
        let diff = PaginationDiff::new(
            SourceConfig::new(VecPages::<i64, String>::new(paginate(a, page_size)), buffer_size),
            SourceConfig::new(VecPages::<i64, String>::new(paginate(b, page_size)), buffer_size),
            i64::cmp,
        );
        collect_results(diff.into_stream()).await.map(|changes| changes.len()).unwrap_or(0)
    })
}

fn bench_page_sizes(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let (a, b) = create_sources(30_000);
    let mut group = c.benchmark_group("page_size");

    for page_size in [10, 100, 1_000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(page_size),
            page_size,
            |bencher, &page_size| {
                bencher.iter(|| {
                    run_diff(
                        &runtime,
                        std::hint::black_box(&a),
                        std::hint::black_box(&b),
                        page_size,
                        page_size,
                    )
                })
            },
        );
    }

    group.finish();
}

fn bench_buffer_sizes(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let (a, b) = create_sources(30_000);
    let mut group = c.benchmark_group("buffer_size");

    for buffer_size in [1, 6, 500].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(buffer_size),
            buffer_size,
            |bencher, &buffer_size| {
                bencher.iter(|| {
                    run_diff(
                        &runtime,
                        std::hint::black_box(&a),
                        std::hint::black_box(&b),
                        100,
                        buffer_size,
                    )
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_page_sizes, bench_buffer_sizes);
criterion_main!(benches);

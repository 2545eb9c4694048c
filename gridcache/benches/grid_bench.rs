//! Grid index benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use gridcache::{BufferedDiskStorage, CollectingVisitor, GridSpatialIndex, MemoryStorage, Region};
use std::hint::black_box;
use tempfile::tempdir;

fn populated_index(size: u32) -> GridSpatialIndex {
    let universe = Region::new(&[0.0, 0.0], &[100.0, 100.0]);
    let mut index =
        GridSpatialIndex::new(universe, 100, Box::new(MemoryStorage::new()), 64).unwrap();
    for i in 0..size {
        let x = (i % 100) as f64;
        let y = ((i / 100) % 100) as f64;
        index
            .insert_data(&i.to_be_bytes(), &Region::new(&[x, y], &[x + 0.5, y + 0.5]))
            .unwrap();
    }
    index
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("GridSpatialIndex Insert");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_with_setup(
                || {
                    let universe = Region::new(&[0.0, 0.0], &[100.0, 100.0]);
                    GridSpatialIndex::new(universe, 100, Box::new(MemoryStorage::new()), 64)
                        .unwrap()
                },
                |mut index| {
                    for i in 0..size {
                        let x = (i % 100) as f64;
                        let y = ((i / 100) % 100) as f64;
                        index
                            .insert_data(
                                &(i as u32).to_be_bytes(),
                                &Region::new(&[x, y], &[x + 0.5, y + 0.5]),
                            )
                            .unwrap();
                    }
                    black_box(index.stats().data_count)
                },
            );
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("GridSpatialIndex Query");

    let mut index = populated_index(10000);

    group.bench_function("query_10k", |b| {
        b.iter(|| {
            let query = Region::new(&[25.0, 25.0], &[75.0, 75.0]);
            let mut visitor = CollectingVisitor::new();
            index.intersection_query(&query, &mut visitor).unwrap();
            black_box(visitor.entries.len())
        });
    });

    group.finish();
}

fn bench_disk_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("BufferedDiskStorage Flush");

    group.bench_function("flush_1k", |b| {
        b.iter_with_setup(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.grid");
                let storage = BufferedDiskStorage::create_with_buffer(&path, 64).unwrap();
                let universe = Region::new(&[0.0, 0.0], &[100.0, 100.0]);
                let mut index =
                    GridSpatialIndex::new(universe, 100, Box::new(storage), 64).unwrap();
                for i in 0..1000u32 {
                    let x = (i % 100) as f64;
                    let y = ((i / 100) % 100) as f64;
                    index
                        .insert_data(&i.to_be_bytes(), &Region::new(&[x, y], &[x + 0.5, y + 0.5]))
                        .unwrap();
                }
                (index, dir)
            },
            |(mut index, _dir)| {
                index.flush().unwrap();
                black_box(index.stats().node_count)
            },
        );
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_query, bench_disk_flush);
criterion_main!(benches);

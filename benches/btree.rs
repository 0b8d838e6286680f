//! B-tree benchmarks for stucktree
//!
//! Every operation records a fresh program and interprets it, so these
//! numbers are dominated by instruction count per operation:
//!
//! - put into a tree that keeps splitting (ascending keys)
//! - put of a permuted key set
//! - find over a populated tree

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stucktree::Btree;

fn tree(node_count: usize) -> Btree {
    Btree::builder()
        .node_count(node_count)
        .stuck_capacity(8)
        .bits_per_key(16)
        .bits_per_data(16)
        .build()
        .unwrap()
}

fn permuted(count: u64) -> Vec<u64> {
    // 7919 is prime, so the stride visits every residue
    (0..count).map(|i| (i * 7919) % count).collect()
}

fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_put");

    for count in [64u64, 256].iter() {
        group.throughput(Throughput::Elements(*count));
        group.bench_with_input(BenchmarkId::new("ascending", count), count, |b, &count| {
            b.iter_with_setup(
                || tree(count as usize),
                |mut tree| {
                    for key in 0..count {
                        tree.put(key, key + 1).unwrap();
                    }
                    tree
                },
            );
        });

        group.bench_with_input(BenchmarkId::new("permuted", count), count, |b, &count| {
            let keys = permuted(count);
            b.iter_with_setup(
                || tree(count as usize),
                |mut tree| {
                    for &key in &keys {
                        tree.put(key, key + 1).unwrap();
                    }
                    tree
                },
            );
        });
    }

    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_find");

    for count in [64u64, 256].iter() {
        let mut populated = tree(*count as usize);
        for key in permuted(*count) {
            populated.put(key, key + 1).unwrap();
        }

        group.throughput(Throughput::Elements(*count));
        group.bench_with_input(BenchmarkId::new("hit", count), count, |b, &count| {
            b.iter(|| {
                for key in 0..count {
                    black_box(populated.find(black_box(key)).unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_put, bench_find);
criterion_main!(benches);

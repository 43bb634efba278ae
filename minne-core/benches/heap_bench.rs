#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};

use minne_core::{Heap, Strategy};

const ARENA_LEN: usize = 64 * 1024;

fn churn(strategy: Strategy) -> usize {
    let mut heap = Heap::new(ARENA_LEN, strategy);
    let mut live = Vec::with_capacity(128);

    for i in 0..256usize {
        if let Ok(p) = heap.allocate(32 + (i % 13) * 24) {
            live.push(p);
        }
        if i % 3 == 0 {
            if !live.is_empty() {
                let p = live.swap_remove(i % live.len());
                heap.free(p);
            }
        }
    }
    for p in live.drain(..) {
        heap.free(p);
    }
    heap.free_bytes()
}

fn benchmark_first_fit_churn(c: &mut Criterion) {
    c.bench_function("first_fit_churn", |b| {
        b.iter(|| black_box(churn(Strategy::FirstFit)))
    });
}

fn benchmark_best_fit_churn(c: &mut Criterion) {
    c.bench_function("best_fit_churn", |b| {
        b.iter(|| black_box(churn(Strategy::BestFit)))
    });
}

fn benchmark_next_fit_churn(c: &mut Criterion) {
    c.bench_function("next_fit_churn", |b| {
        b.iter(|| black_box(churn(Strategy::NextFit)))
    });
}

fn benchmark_state_dump(c: &mut Criterion) {
    let mut heap = Heap::new(ARENA_LEN, Strategy::FirstFit);
    let mut live = Vec::new();
    for i in 0..128usize {
        if let Ok(p) = heap.allocate(48 + (i % 7) * 16) {
            live.push(p);
        }
    }
    for p in live.iter().step_by(2) {
        heap.free(*p);
    }

    c.bench_function("state_dump", |b| b.iter(|| black_box(heap.state_string())));
}

criterion_group!(
    benches,
    benchmark_first_fit_churn,
    benchmark_best_fit_churn,
    benchmark_next_fit_churn,
    benchmark_state_dump
);
criterion_main!(benches);

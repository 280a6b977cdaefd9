//! Benchmarks for weft-core
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use weft_core::dom::Node;
use weft_core::reactive::{batch, Effect, Memo, Scope, Signal};
use weft_core::render::{reconcile_keyed_list, reconcile_list};

// =============================================================================
// PROPAGATION BENCHMARKS
// =============================================================================

fn bench_signal_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_fan_out");
    for width in [10usize, 100, 1_000] {
        let source = Signal::new(0u64);
        let scope = Scope::root();
        scope.run(|| {
            for _ in 0..width {
                let s = source.clone();
                Effect::new(move || {
                    black_box(s.get());
                });
            }
        });

        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            let mut n = 0;
            b.iter(|| {
                n += 1;
                source.set(n);
            })
        });
        scope.dispose();
    }
    group.finish();
}

fn bench_batched_writes(c: &mut Criterion) {
    let a = Signal::new(0i32);
    let b_sig = Signal::new(0i32);
    let (a2, b2) = (a.clone(), b_sig.clone());
    let sum = Memo::new(move || a2.get() + b2.get());
    let s = sum.clone();
    let _effect = Effect::new(move || {
        black_box(s.get());
    });

    c.bench_function("batched_two_writes", |bench| {
        let mut n = 0;
        bench.iter(|| {
            n += 1;
            batch(|| {
                a.set(n);
                b_sig.set(-n);
            })
        })
    });
}

// =============================================================================
// LIST BENCHMARKS
// =============================================================================

fn rows(count: u32) -> Vec<u32> {
    (0..count).collect()
}

fn render_row(id: &u32, _: usize) -> Node {
    let tr = Node::element("tr");
    let _ = tr.set_text(id.to_string());
    tr
}

fn bench_keyed_reorder(c: &mut Criterion) {
    let items = Signal::new(rows(1_000));
    let i = items.clone();
    let list = reconcile_keyed_list(move || i.get(), render_row, |id, _| *id);

    c.bench_function("keyed_reverse_1k", |b| {
        b.iter(|| {
            items.update(|v| v.reverse());
        })
    });
    black_box(list.ok());
}

fn bench_keyed_swap(c: &mut Criterion) {
    let items = Signal::new(rows(1_000));
    let i = items.clone();
    let list = reconcile_keyed_list(move || i.get(), render_row, |id, _| *id);

    c.bench_function("keyed_swap_rows_1k", |b| {
        b.iter(|| {
            items.update(|v| v.swap(1, 998));
        })
    });
    black_box(list.ok());
}

fn bench_unkeyed_rebuild(c: &mut Criterion) {
    let items = Signal::new(rows(1_000));
    let i = items.clone();
    let list = reconcile_list(move || i.get(), render_row);

    c.bench_function("unkeyed_rebuild_1k", |b| {
        b.iter(|| {
            items.update(|v| v.rotate_left(1));
        })
    });
    black_box(list.ok());
}

criterion_group!(propagation_benches, bench_signal_fan_out, bench_batched_writes);
criterion_group!(list_benches, bench_keyed_reorder, bench_keyed_swap, bench_unkeyed_rebuild);
criterion_main!(propagation_benches, list_benches);

//! Benchmarks for swing extraction and formation detection.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use chartscan::prelude::*;

/// Generate a deterministic oscillating series
fn generate_bars(n: usize) -> Vec<Bar> {
  let mut bars = Vec::with_capacity(n);
  let mut price = 100.0;

  for i in 0..n {
    let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0; // Deterministic "random"
    let volatility = 2.0 + ((i * 3) % 10) as f64 / 5.0;

    let o = price;
    let c = (price + change).max(1.0);
    let h = o.max(c) + volatility * 0.5;
    let l = (o.min(c) - volatility * 0.5).max(0.5);
    let v = 1000.0 + ((i * 11) % 17) as f64 * 100.0;

    bars.push(Bar::new(i as i64 * 60, o, h, l, c, v));
    price = c;
  }

  bars
}

fn order() -> Period {
  Period::new(5).unwrap()
}

fn bench_swing_extraction(c: &mut Criterion) {
  let bars = generate_bars(1000);

  c.bench_function("extract_swings_1000_bars", |b| {
    b.iter(|| {
      let _ = black_box(extract(black_box(&bars), order()));
    })
  });
}

fn bench_single_pattern(c: &mut Criterion) {
  let bars = generate_bars(1000);

  let engine = EngineBuilder::new()
    .add(BuiltinDetector::HeadAndShoulders(HeadAndShouldersDetector::with_defaults()))
    .build()
    .unwrap();

  c.bench_function("evaluate_head_and_shoulders_1000_bars", |b| {
    b.iter(|| {
      let _ = black_box(engine.evaluate(black_box(&bars), order()));
    })
  });
}

fn bench_all_patterns(c: &mut Criterion) {
  let bars = generate_bars(1000);

  let engine = EngineBuilder::new().with_all_defaults().build().unwrap();

  c.bench_function("evaluate_all_patterns_1000_bars", |b| {
    b.iter(|| {
      let _ = black_box(engine.evaluate(black_box(&bars), order()));
    })
  });
}

fn bench_scaling(c: &mut Criterion) {
  let engine = EngineBuilder::new().with_all_defaults().build().unwrap();

  let mut group = c.benchmark_group("scaling");

  for size in [100, 500, 1000, 5000, 10000].iter() {
    let bars = generate_bars(*size);

    group.bench_with_input(BenchmarkId::new("evaluate", size), size, |b, _| {
      b.iter(|| {
        let _ = black_box(engine.evaluate(black_box(&bars), order()));
      })
    });
  }

  group.finish();
}

fn bench_parallel_evaluate(c: &mut Criterion) {
  let bars1 = generate_bars(1000);
  let bars2 = generate_bars(1000);
  let bars3 = generate_bars(1000);
  let bars4 = generate_bars(1000);

  let engine = EngineBuilder::new().with_all_defaults().build().unwrap();

  let instruments: Vec<(&str, &[Bar])> = vec![
    ("SYM1", bars1.as_slice()),
    ("SYM2", bars2.as_slice()),
    ("SYM3", bars3.as_slice()),
    ("SYM4", bars4.as_slice()),
  ];

  c.bench_function("parallel_evaluate_4_instruments", |b| {
    b.iter(|| {
      let _ = black_box(evaluate_parallel(
        black_box(&engine),
        black_box(instruments.clone()),
        order(),
      ));
    })
  });
}

fn bench_prepare(c: &mut Criterion) {
  let bars = generate_bars(1000);
  let config = OverlayConfig::default();

  c.bench_function("prepare_overlays_1000_bars", |b| {
    b.iter(|| {
      let _ = black_box(prepare(black_box(&bars), &config));
    })
  });
}

criterion_group!(
  benches,
  bench_swing_extraction,
  bench_single_pattern,
  bench_all_patterns,
  bench_scaling,
  bench_parallel_evaluate,
  bench_prepare,
);

criterion_main!(benches);

//! Benchmarks for the trend pipeline and its windowing scan

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use trendetect::{
    interpolation::interpolate_channel,
    pipeline::TrendPipeline,
    roles::Channel,
    table::{Frame, FrameTable, MarkerId, RoleFrame, RoleFrameTable},
    windowing::{collapse_windows, detect_windows},
};

const FPS: f64 = 30.0;

/// Session with a tibia dropout in the middle third and noisy hip markers
fn noisy_session(rows: usize) -> FrameTable {
    let mut rng = rand::thread_rng();
    let window = rows / 3..2 * rows / 3;
    let frames = (0..rows)
        .map(|row| {
            let index = row * 4;
            let mut frame = Frame::empty(index, index as f64 / FPS);
            if !window.contains(&row) && rng.gen_bool(0.97) {
                frame = frame.with(MarkerId(0), 125.0, 520.0);
            }
            let lift = if window.contains(&row) { 40.0 } else { 0.0 };
            let jitter = rng.gen_range(-0.5..0.5);
            frame
                .with(MarkerId(1), 40.0 + jitter, 300.0)
                .with(MarkerId(2), 130.0 + jitter, 300.0 - lift + jitter)
        })
        .collect();
    FrameTable::new(frames).unwrap_or_default()
}

fn benchmark_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let pipeline = TrendPipeline::default();

    for rows in [300, 3_000, 30_000] {
        let table = noisy_session(rows);
        group.bench_with_input(BenchmarkId::new("run", rows), &table, |b, table| {
            b.iter(|| black_box(pipeline.run(black_box(table), &mut |_| {})));
        });
    }

    group.finish();
}

fn benchmark_windowing(c: &mut Criterion) {
    let mut group = c.benchmark_group("windowing");
    let mut rng = rand::thread_rng();

    // Presence signal flickering on roughly every tenth frame
    let rows: Vec<RoleFrame> = (0..10_000)
        .map(|i| {
            let present = rng.gen_bool(0.9);
            RoleFrame::empty(i, i as f64 / FPS).with(Channel::REFERENCE, present.then_some(125.0))
        })
        .collect();
    let table = RoleFrameTable::from_rows(rows);
    let windows = detect_windows(&table);

    group.bench_function("detect_10000", |b| {
        b.iter(|| black_box(detect_windows(black_box(&table))));
    });

    for min_len in [2, 5, 20] {
        group.bench_with_input(BenchmarkId::new("collapse", min_len), &windows, |b, windows| {
            b.iter(|| black_box(collapse_windows(black_box(windows), min_len)));
        });
    }

    group.finish();
}

fn benchmark_interpolation(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let channel: Vec<Option<f64>> = (0..10_000)
        .map(|i| {
            let value = (i as f64 * 0.01).sin() * 50.0 + 300.0;
            (i == 0 || rng.gen_bool(0.8)).then_some(value)
        })
        .collect();

    c.bench_function("interpolate_channel_10000", |b| {
        b.iter(|| black_box(interpolate_channel(black_box(&channel))));
    });
}

criterion_group!(benches, benchmark_pipeline, benchmark_windowing, benchmark_interpolation);
criterion_main!(benches);

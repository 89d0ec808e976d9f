//! Benchmarks for the corrected channel view
//!
//! Measures a full post-processing pass over histories of increasing size,
//! the way a renderer refreshes after each notification.

use brainwave::decode::FrameDecoder;
use brainwave::process::{IirFilter, MaximEstimator, PostProcessor, spo2::heart_rate_and_spo2};
use brainwave::session::SampleHistory;
use brainwave::test_utils::FrameBuilder;
use brainwave::types::{Channel, ChannelScales};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn history(frames: usize) -> SampleHistory {
    let decoder = FrameDecoder::default();
    let mut history = SampleHistory::new();
    for n in 0..frames {
        let phase = n as f64 * 0.3;
        let mut builder = FrameBuilder::new()
            .temperature(4736 + (n % 16) as u16)
            .spo2((60_000.0 + phase.sin() * 2_000.0) as u32)
            .ppg_ir((80_000.0 + phase.cos() * 3_000.0) as u32)
            .counter(n as u8);
        for block in 0..10 {
            let value = ((phase + block as f64 * 0.1).sin() * 50_000.0) as i32;
            builder = builder.eeg(block, 1, value).eeg(block, 2, -value);
        }
        let frame = decoder.decode_at(&builder.build(), n as i64 * 50).expect("synthetic frame decodes");
        history.record_frame(&frame);
    }
    history
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_history");

    for frames in [10, 100, 600] {
        let history = history(frames);
        group.throughput(Throughput::Elements(history.sample_count() as u64));
        group.bench_with_input(BenchmarkId::new("no_estimator", frames), &history, |b, history| {
            let mut processor = PostProcessor::new(ChannelScales::default());
            b.iter(|| black_box(processor.process(black_box(history))))
        });
        group.bench_with_input(BenchmarkId::new("maxim", frames), &history, |b, history| {
            let mut processor = PostProcessor::new(ChannelScales::default()).with_estimator(MaximEstimator::new());
            b.iter(|| black_box(processor.process(black_box(history))))
        });
    }

    group.finish();
}

fn bench_iir(c: &mut Criterion) {
    let series: Vec<f32> = (0..6_000).map(|n| (n as f32 * 0.05).sin() * 1_000.0).collect();

    let mut group = c.benchmark_group("iir");
    group.throughput(Throughput::Elements(series.len() as u64));
    group.bench_function("filter_6000", |b| {
        b.iter(|| black_box(IirFilter::filter(black_box(&series).iter().copied())))
    });
    group.finish();
}

fn bench_spo2_window(c: &mut Criterion) {
    let history = history(600);
    let ir: Vec<i64> = history.channel(Channel::PpgIr).iter().take(500).map(|s| s.raw).collect();
    let red: Vec<i64> = history.channel(Channel::SpO2).iter().take(500).map(|s| s.raw).collect();

    c.bench_function("heart_rate_and_spo2_500", |b| {
        b.iter(|| black_box(heart_rate_and_spo2(black_box(&ir), black_box(&red))))
    });
}

criterion_group!(benches, bench_process, bench_iir, bench_spo2_window);
criterion_main!(benches);

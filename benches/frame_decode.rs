//! Benchmarks for notification decoding
//!
//! One notification arrives every 50ms, so decoding has plenty of headroom;
//! these track regressions in the byte and hex paths and in CRC checking.

use brainwave::config::{ChecksumPolicy, DecoderConfig};
use brainwave::decode::{FrameDecoder, crc16, parse_hex_frame};
use brainwave::test_utils::FrameBuilder;
use brainwave::types::ProtocolRevision;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn sample_frame(revision: ProtocolRevision) -> Vec<u8> {
    let mut builder = FrameBuilder::for_revision(revision)
        .header(0xAA)
        .kind(0x01)
        .temperature(4736)
        .spo2(98)
        .ppg_ir(77_881)
        .counter(7);
    for block in 0..10 {
        for channel in 1..=6 {
            builder = builder.eeg(block, channel, (block as i32 - 5) * 1_000 + channel as i32);
        }
    }
    builder.with_crc().build()
}

fn bench_decode_bytes(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_bytes");

    for revision in [ProtocolRevision::V1, ProtocolRevision::V2] {
        let buffer = sample_frame(revision);
        let decoder = FrameDecoder::for_revision(revision);
        group.throughput(Throughput::Bytes(buffer.len() as u64));
        group.bench_function(format!("{revision:?}"), |b| {
            b.iter(|| black_box(decoder.decode_at(black_box(&buffer), 0)))
        });
    }

    group.finish();
}

fn bench_checksum(c: &mut Criterion) {
    let buffer = sample_frame(ProtocolRevision::V1);
    let verifying = FrameDecoder::new(DecoderConfig {
        checksum_policy: ChecksumPolicy::Verify,
        ..Default::default()
    })
    .expect("valid config");

    let mut group = c.benchmark_group("checksum");
    group.bench_function("crc16", |b| b.iter(|| black_box(crc16(black_box(&buffer[..201])))));
    group.bench_function("decode_verified", |b| {
        b.iter(|| black_box(verifying.decode_at(black_box(&buffer), 0)))
    });
    group.finish();
}

fn bench_hex(c: &mut Criterion) {
    let buffer = sample_frame(ProtocolRevision::V1);
    let unbroken = hex::encode(&buffer);
    let separated = buffer.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(",");
    let decoder = FrameDecoder::default();

    let mut group = c.benchmark_group("hex");
    group.throughput(Throughput::Bytes(unbroken.len() as u64));
    group.bench_function("parse_unbroken", |b| b.iter(|| black_box(parse_hex_frame(black_box(&unbroken)))));
    group.bench_function("parse_separated", |b| b.iter(|| black_box(parse_hex_frame(black_box(&separated)))));
    group.bench_function("decode_hex", |b| b.iter(|| black_box(decoder.decode_hex_at(black_box(&separated), 0))));
    group.finish();
}

criterion_group!(benches, bench_decode_bytes, bench_checksum, bench_hex);
criterion_main!(benches);

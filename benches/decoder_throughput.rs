//! Benchmarks for stream reassembly and frame decoding
//!
//! Measures:
//! - Decoding a mixed stream submitted in one piece
//! - The same stream split into small chunks (worst case for reassembly)
//! - Resynchronisation through garbage between frames
//! - Signal strength conversion

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use reelgate::decoder::{RssiMode, decode_signal_strength};
use reelgate::providers::synthetic::{ANNOUNCE_FRAMES, TELEMETRY_FRAMES, detection_frames};
use reelgate::test_utils::detection_frame;
use reelgate::{Origin, StreamDispatcher, Timestamp};
use std::hint::black_box;

/// Announces, telemetry and `detections` rounds of the synthetic reel
fn mixed_stream(detections: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    for frame in ANNOUNCE_FRAMES.iter().chain(TELEMETRY_FRAMES.iter()) {
        stream.extend(hex::decode(frame).expect("canned frame is valid hex"));
    }
    for round in 0..detections {
        let rssi = (round % 18) as u8;
        let text = detection_frames([rssi, rssi, rssi, rssi]);
        stream.extend(hex::decode(text).expect("canned frame is valid hex"));
    }
    stream
}

fn bench_whole_stream(c: &mut Criterion) {
    let stream = mixed_stream(1_000);
    let origin = Origin::from("bench");

    let mut group = c.benchmark_group("decode_whole_stream");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    group.bench_function("mixed_frames", |b| {
        b.iter(|| {
            let mut dispatcher = StreamDispatcher::default();
            let frames = dispatcher.submit_bytes(&origin, black_box(&stream), Timestamp::default());
            black_box(frames)
        })
    });

    group.finish();
}

fn bench_chunked_stream(c: &mut Criterion) {
    let stream = mixed_stream(1_000);
    let origin = Origin::from("bench");

    let mut group = c.benchmark_group("decode_chunked_stream");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    for chunk_size in [1usize, 7, 64, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk_size), &chunk_size, |b, &size| {
            b.iter(|| {
                let mut dispatcher = StreamDispatcher::default();
                let mut decoded = 0usize;
                for chunk in stream.chunks(size) {
                    decoded += dispatcher.submit_bytes(&origin, black_box(chunk), Timestamp::default()).len();
                }
                black_box(decoded)
            })
        });
    }

    group.finish();
}

fn bench_resynchronisation(c: &mut Criterion) {
    // Every valid frame is preceded by noise and a marker with an unknown code
    let valid = detection_frame(&[0x01, 0x00, 0x00, 0x00], &[(0, 0x10), (2, 0x20)]);
    let mut stream = Vec::new();
    for _ in 0..1_000 {
        stream.extend_from_slice(&[0x13, 0x37, 0xAA, 0xAA, 0x00, 0x42, 0x42, 0x42]);
        stream.extend_from_slice(&valid);
    }
    let origin = Origin::from("bench");

    let mut group = c.benchmark_group("resynchronisation");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    group.bench_function("noise_between_frames", |b| {
        b.iter(|| {
            let mut dispatcher = StreamDispatcher::default();
            let frames = dispatcher.submit_bytes(&origin, black_box(&stream), Timestamp::default());
            black_box(frames)
        })
    });

    group.finish();
}

fn bench_signal_strength(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_strength");

    for (name, mode) in [("calibrated", RssiMode::Calibrated), ("legacy_wrap", RssiMode::LegacyWrap)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut sum = 0i32;
                for raw in 0..=u8::MAX {
                    sum += decode_signal_strength(black_box(raw), 20, mode).map_or(0, i32::from);
                }
                black_box(sum)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_whole_stream,
    bench_chunked_stream,
    bench_resynchronisation,
    bench_signal_strength
);
criterion_main!(benches);

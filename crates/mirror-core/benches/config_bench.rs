//! Criterion benchmarks for configuration-record parsing.
//!
//! A configuration packet arrives at stream start and on every rotation or
//! resolution change; parsing must stay well below one frame interval.
//!
//! Run with:
//! ```bash
//! cargo bench --package mirror-core --bench config_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mirror_core::protocol::video::VideoCodec;
use mirror_core::video::parse_configuration;

/// SPS + PPS of a 1920x1080 High@4.0 H.264 stream.
const H264_RECORD: &[u8] = &[
    0, 0, 0, 1, 0x67, 0x64, 0x00, 0x28, 0xAC, 0xD9, 0x40, 0x78, 0x02, 0x27, 0xE5, 0xC0, 0x44, 0x00,
    0x00, 0x03, 0x00, 0x04, 0x00, 0x00, 0x03, 0x00, 0xF0, 0x3C, 0x60, 0xC6, 0x58, 0, 0, 0, 1, 0x68,
    0xEB, 0xE3, 0xCB, 0x22, 0xC0,
];

/// SPS of a 1920x1080 Main@4.0 H.265 stream.
const H265_RECORD: &[u8] = &[
    0, 0, 0, 1, 0x42, 0x01, 0x01, 0x01, 0x60, 0x00, 0x00, 0x03, 0x00, 0x90, 0x00, 0x00, 0x03, 0x00,
    0x00, 0x03, 0x00, 0x78, 0xA0, 0x03, 0xC0, 0x80, 0x10, 0xE5, 0x96, 0x56, 0x69, 0x24, 0xCA, 0xE0,
    0x10, 0x00, 0x00, 0x03, 0x00, 0x10, 0x00, 0x00, 0x03, 0x01, 0xE0, 0x80,
];

fn bench_parse_configuration(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_configuration");

    group.bench_function("h264_1080p", |b| {
        b.iter(|| parse_configuration(VideoCodec::H264, black_box(H264_RECORD)))
    });

    group.bench_function("h265_1080p", |b| {
        b.iter(|| parse_configuration(VideoCodec::H265, black_box(H265_RECORD)))
    });

    group.finish();
}

criterion_group!(benches, bench_parse_configuration);
criterion_main!(benches);

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::cast_possible_truncation)] // Test parameters
#![allow(clippy::cast_possible_wrap)] // Test conversions
#![allow(clippy::semicolon_if_nothing_returned)] // Benchmark code formatting

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use daqlink::transport::{pipe, PipeReader, PipeWriter};
use daqlink::{AppMsg, DeviceChannel, HostChannel, MessageChannel, RingBuffer, RingStream};
use std::io::{self, Read};
use std::time::Duration;

// ============================================================================
// RingBuffer Benchmarks
// ============================================================================

/// Benchmark: push_back + pop_front on a warm ring
fn bench_ring_push_pop(c: &mut Criterion) {
    c.bench_function("ring_push_pop", |b| {
        let mut ring = RingBuffer::with_capacity(1024);
        for value in 0..512 {
            let _ = ring.push_back(value);
        }
        b.iter(|| {
            let _ = ring.push_back(black_box(7i32));
            black_box(ring.pop_front());
        })
    });
}

/// Benchmark: growth from an empty ring to 4096 elements
fn bench_ring_growth(c: &mut Criterion) {
    c.bench_function("ring_growth_4096", |b| {
        b.iter_batched(
            RingBuffer::<i32>::new,
            |mut ring| {
                for value in 0..4096 {
                    let _ = ring.push_back(value);
                }
                ring
            },
            BatchSize::SmallInput,
        )
    });
}

/// Benchmark: bulk point copy through a fixed RingStream (one 123-point batch)
fn bench_stream_batch_copy(c: &mut Criterion) {
    c.bench_function("stream_batch_copy_123", |b| {
        let mut stream = RingStream::<i32>::fixed(4096);
        let batch: Vec<i32> = (0..123).collect();
        let mut out = vec![0i32; 123];
        b.iter(|| {
            stream.write(black_box(&batch));
            stream.read(&mut out);
            black_box(&out);
        })
    });
}

/// Source that always fills the whole buffer.
struct Zeros;

impl Read for Zeros {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        buf.fill(0);
        Ok(buf.len())
    }
}

/// Benchmark: read_from + write_to of one 496-byte message
fn bench_stream_io(c: &mut Criterion) {
    c.bench_function("stream_io_496", |b| {
        let mut stream = RingStream::<u8>::with_capacity(4096);
        let mut sink = io::sink();
        b.iter(|| {
            stream.read_from(&mut Zeros, Some(496)).unwrap();
            stream.write_to(&mut sink, None).unwrap();
        })
    });
}

// ============================================================================
// Channel Benchmarks
// ============================================================================

/// Benchmark: send + receive of a full output batch over an in-process pipe
fn bench_channel_dac_batch(c: &mut Criterion) {
    let (to_device, device_in) = pipe();
    let (to_host, host_in) = pipe();
    let mut device: DeviceChannel<PipeReader, PipeWriter> =
        MessageChannel::new(device_in, to_host, 496);
    let mut host: HostChannel<PipeReader, PipeWriter> =
        MessageChannel::new(host_in, to_device, 496);
    let points: Vec<i32> = (0..123).collect();
    let timeout = Some(Duration::from_secs(1));

    c.bench_function("channel_dac_batch_123", |b| {
        b.iter(|| {
            host.send(&AppMsg::dac_data(black_box(&points)), timeout)
                .unwrap();
            black_box(device.receive(timeout).unwrap());
        })
    });
}

criterion_group!(
    benches,
    bench_ring_push_pop,
    bench_ring_growth,
    bench_stream_batch_copy,
    bench_stream_io,
    bench_channel_dac_batch
);
criterion_main!(benches);

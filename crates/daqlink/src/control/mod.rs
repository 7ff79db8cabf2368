// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! State shared between the sampling path and the controller.
//!
//! ```text
//!  sampling path --push--> adc[i] --drain--> send loop --> host
//!  host --> receive loop --write--> dac --pop--> sampling path
//! ```
//!
//! Every ring has exactly one producer and one consumer. Rings are fixed
//! capacity: a full ring drops the excess and the caller counts it, a
//! producer never waits for space.

pub mod stats;
pub mod wake;

pub use stats::{Statistics, StatsSnapshot, ValueSnapshot};
pub use wake::WorkSignal;

use crate::config::LinkConfig;
use crate::proto::Point;
use crate::ring::{RingBuffer, RingStream};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Fixed-capacity sample queue shared by one producer and one consumer.
///
/// The lock is held only for the duration of a copy.
#[derive(Debug)]
pub struct SampleRing {
    inner: Mutex<RingStream<Point>>,
    capacity: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RingStream::from_queue(RingBuffer::fixed(capacity))),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queued points.
    pub fn occupied(&self) -> usize {
        self.inner.lock().len()
    }

    /// Free slots.
    pub fn vacant(&self) -> usize {
        self.capacity - self.occupied()
    }

    /// Append as many points as fit; returns the count accepted.
    pub fn write(&self, points: &[Point]) -> usize {
        self.inner.lock().write(points)
    }

    /// Pop up to `dst.len()` points; returns the count moved.
    pub fn read(&self, dst: &mut [Point]) -> usize {
        self.inner.lock().read(dst)
    }

    pub fn push(&self, point: Point) -> bool {
        self.inner.lock().queue_mut().push_back(point).is_ok()
    }

    pub fn pop(&self) -> Option<Point> {
        self.inner.lock().queue_mut().pop_front()
    }

    /// Drop up to `count` points from the front; returns how many were dropped.
    pub fn skip(&self, count: usize) -> usize {
        self.inner.lock().queue_mut().skip_front(count)
    }

    pub fn clear(&self) {
        self.inner.lock().queue_mut().clear();
    }
}

/// Device-side buffers, digital I/O latches and the work signal.
#[derive(Debug)]
pub struct Control {
    adcs: Vec<SampleRing>,
    dac: SampleRing,
    dac_running: AtomicBool,
    dout: AtomicU8,
    dout_changed: AtomicBool,
    din: AtomicU8,
    adc_batch: usize,
    dac_batch: usize,
    signal: WorkSignal,
    stats: Statistics,
}

impl Control {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            adcs: (0..config.adc_channels)
                .map(|_| SampleRing::new(config.adc_buffer_capacity))
                .collect(),
            dac: SampleRing::new(config.dac_buffer_capacity),
            dac_running: AtomicBool::new(false),
            dout: AtomicU8::new(0),
            dout_changed: AtomicBool::new(false),
            din: AtomicU8::new(0),
            adc_batch: config.adc_batch,
            dac_batch: config.dac_batch,
            signal: WorkSignal::new(),
            stats: Statistics::new(config.adc_channels),
        }
    }

    pub fn adcs(&self) -> &[SampleRing] {
        &self.adcs
    }

    pub fn adc(&self, index: usize) -> Option<&SampleRing> {
        self.adcs.get(index)
    }

    pub fn dac(&self) -> &SampleRing {
        &self.dac
    }

    pub fn signal(&self) -> &WorkSignal {
        &self.signal
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Let the output path consume points.
    pub fn start_dac(&self) {
        self.dac_running.store(true, Ordering::Release);
    }

    /// Halt the output path and discard points queued for it.
    pub fn stop_dac(&self) {
        self.dac_running.store(false, Ordering::Release);
        self.dac.clear();
    }

    pub fn dac_running(&self) -> bool {
        self.dac_running.load(Ordering::Acquire)
    }

    /// Latch a new digital output value for the output path.
    pub fn set_dout(&self, value: u8) {
        self.dout.store(value, Ordering::Relaxed);
        self.dout_changed.store(true, Ordering::Release);
        self.signal.notify();
    }

    /// Latched value, if it changed since the last take.
    pub fn take_dout(&self) -> Option<u8> {
        self.dout_changed
            .swap(false, Ordering::Acquire)
            .then(|| self.dout.load(Ordering::Relaxed))
    }

    pub fn dout(&self) -> u8 {
        self.dout.load(Ordering::Relaxed)
    }

    /// Record a sampled digital input value; wakes the sender on change.
    pub fn set_din(&self, value: u8) {
        if self.din.swap(value, Ordering::AcqRel) != value {
            self.signal.notify();
        }
    }

    /// Latest sampled digital input value.
    pub fn din(&self) -> u8 {
        self.din.load(Ordering::Acquire)
    }

    pub fn adc_batch(&self) -> usize {
        self.adc_batch
    }

    pub fn dac_batch(&self) -> usize {
        self.dac_batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> LinkConfig {
        LinkConfig {
            adc_channels: 2,
            adc_buffer_capacity: 8,
            dac_buffer_capacity: 8,
            ..LinkConfig::default().with_max_message_len(20)
        }
    }

    #[test]
    fn test_sample_ring_drops_excess() {
        let ring = SampleRing::new(4);
        assert_eq!(ring.write(&[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(ring.vacant(), 0);
        assert!(!ring.push(7));

        let mut out = [0; 3];
        assert_eq!(ring.read(&mut out), 3);
        assert_eq!(out, [1, 2, 3]);
        assert_eq!(ring.occupied(), 1);
        assert_eq!(ring.skip(5), 1);
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn test_dout_latch_is_consumed_once() {
        let control = Control::new(&small_config());
        assert_eq!(control.take_dout(), None);
        control.set_dout(0x05);
        assert!(control.signal().check_and_clear());
        assert_eq!(control.take_dout(), Some(0x05));
        assert_eq!(control.take_dout(), None);
        assert_eq!(control.dout(), 0x05);
    }

    #[test]
    fn test_din_change_wakes_sender() {
        let control = Control::new(&small_config());
        control.set_din(0);
        assert!(!control.signal().check_and_clear());
        control.set_din(3);
        assert!(control.signal().check_and_clear());
        assert_eq!(control.din(), 3);
        control.set_din(3);
        assert!(!control.signal().check_and_clear());
        assert_eq!(control.din(), 3);
    }

    #[test]
    fn test_stop_dac_discards_queue() {
        let control = Control::new(&small_config());
        control.start_dac();
        control.dac().write(&[1, 2, 3]);
        control.stop_dac();
        assert!(!control.dac_running());
        assert_eq!(control.dac().occupied(), 0);
    }
}

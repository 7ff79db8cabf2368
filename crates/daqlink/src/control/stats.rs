// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Device statistics.
//!
//! Drops never surface as errors on the sample paths; they are counted
//! here instead and reported periodically.
//!
//! # Tracked Metrics
//!
//! - `sample_count`: sampling ticks performed
//! - `dac.lost_empty`: output ticks with no point to play
//! - `dac.lost_full`: received output points dropped on a full buffer
//! - `dac.req_exceed`: received output points beyond the granted credit
//! - `adc.lost_full`: input points dropped on a full buffer
//! - `link`: messages, connects and disconnects
//!
//! All counters use `Relaxed` ordering; snapshots are eventually consistent.

use crate::proto::Point;
use std::fmt;
use std::sync::atomic::{AtomicI32, AtomicI64, AtomicU64, Ordering};

/// Running min/max/last/average of one signal.
#[derive(Debug)]
pub struct ValueStats {
    sum: AtomicI64,
    count: AtomicU64,
    last: AtomicI32,
    min: AtomicI32,
    max: AtomicI32,
}

impl Default for ValueStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueStats {
    pub const fn new() -> Self {
        Self {
            sum: AtomicI64::new(0),
            count: AtomicU64::new(0),
            last: AtomicI32::new(0),
            min: AtomicI32::new(i32::MAX),
            max: AtomicI32::new(i32::MIN),
        }
    }

    #[inline]
    pub fn update(&self, value: Point) {
        self.min.fetch_min(value, Ordering::Relaxed);
        self.max.fetch_max(value, Ordering::Relaxed);
        self.last.store(value, Ordering::Relaxed);
        self.sum.fetch_add(i64::from(value), Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.sum.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
        self.last.store(0, Ordering::Relaxed);
        self.min.store(i32::MAX, Ordering::Relaxed);
        self.max.store(i32::MIN, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ValueSnapshot {
        let count = self.count.load(Ordering::Relaxed);
        if count == 0 {
            return ValueSnapshot::default();
        }
        let avg = self.sum.load(Ordering::Relaxed) / count as i64;
        ValueSnapshot {
            count,
            last: self.last.load(Ordering::Relaxed),
            min: self.min.load(Ordering::Relaxed),
            max: self.max.load(Ordering::Relaxed),
            avg: avg as Point,
        }
    }
}

/// Analog output counters.
#[derive(Debug, Default)]
pub struct DacStats {
    lost_empty: AtomicU64,
    lost_full: AtomicU64,
    req_exceed: AtomicU64,
    pub value: ValueStats,
}

impl DacStats {
    #[inline]
    pub fn report_lost_empty(&self, count: usize) {
        self.lost_empty.fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn report_lost_full(&self, count: usize) {
        self.lost_full.fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn report_req_exceed(&self, count: usize) {
        self.req_exceed.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn lost_empty(&self) -> u64 {
        self.lost_empty.load(Ordering::Relaxed)
    }

    pub fn lost_full(&self) -> u64 {
        self.lost_full.load(Ordering::Relaxed)
    }

    pub fn req_exceed(&self) -> u64 {
        self.req_exceed.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.lost_empty.store(0, Ordering::Relaxed);
        self.lost_full.store(0, Ordering::Relaxed);
        self.req_exceed.store(0, Ordering::Relaxed);
        self.value.reset();
    }
}

/// Analog input counters.
#[derive(Debug)]
pub struct AdcStats {
    lost_full: AtomicU64,
    values: Vec<ValueStats>,
}

impl AdcStats {
    fn new(channels: usize) -> Self {
        Self {
            lost_full: AtomicU64::new(0),
            values: (0..channels).map(|_| ValueStats::new()).collect(),
        }
    }

    #[inline]
    pub fn report_lost_full(&self, count: usize) {
        self.lost_full.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn lost_full(&self) -> u64 {
        self.lost_full.load(Ordering::Relaxed)
    }

    /// Per-channel value tracker.
    pub fn value(&self, channel: usize) -> Option<&ValueStats> {
        self.values.get(channel)
    }

    fn reset(&self) {
        self.lost_full.store(0, Ordering::Relaxed);
        self.values.iter().for_each(ValueStats::reset);
    }
}

/// Protocol counters.
#[derive(Debug, Default)]
pub struct LinkStats {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    connects: AtomicU64,
    disconnects: AtomicU64,
}

impl LinkStats {
    #[inline]
    pub fn inc_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_connects(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_disconnects(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.messages_sent.store(0, Ordering::Relaxed);
        self.messages_received.store(0, Ordering::Relaxed);
        self.connects.store(0, Ordering::Relaxed);
        self.disconnects.store(0, Ordering::Relaxed);
    }
}

/// All device counters.
#[derive(Debug)]
pub struct Statistics {
    sample_count: AtomicU64,
    dout_masked: AtomicU64,
    pub dac: DacStats,
    pub adc: AdcStats,
    pub link: LinkStats,
}

impl Statistics {
    pub fn new(adc_channels: usize) -> Self {
        Self {
            sample_count: AtomicU64::new(0),
            dout_masked: AtomicU64::new(0),
            dac: DacStats::default(),
            adc: AdcStats::new(adc_channels),
            link: LinkStats::default(),
        }
    }

    #[inline]
    pub fn report_sample(&self) {
        self.sample_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count.load(Ordering::Relaxed)
    }

    /// Digital output value arrived with bits above the port width.
    pub fn report_dout_masked(&self) {
        self.dout_masked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dout_masked(&self) -> u64 {
        self.dout_masked.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.sample_count.store(0, Ordering::Relaxed);
        self.dout_masked.store(0, Ordering::Relaxed);
        self.dac.reset();
        self.adc.reset();
        self.link.reset();
    }

    /// Get snapshot of current counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sample_count: self.sample_count(),
            dout_masked: self.dout_masked(),
            dac_lost_empty: self.dac.lost_empty(),
            dac_lost_full: self.dac.lost_full(),
            dac_req_exceed: self.dac.req_exceed(),
            dac_value: self.dac.value.snapshot(),
            adc_lost_full: self.adc.lost_full(),
            adc_values: self.adc.values.iter().map(ValueStats::snapshot).collect(),
            messages_sent: self.link.messages_sent.load(Ordering::Relaxed),
            messages_received: self.link.messages_received.load(Ordering::Relaxed),
            connects: self.link.connects.load(Ordering::Relaxed),
            disconnects: self.link.disconnects.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a [`ValueStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueSnapshot {
    pub count: u64,
    pub last: Point,
    pub min: Point,
    pub max: Point,
    pub avg: Point,
}

/// Point-in-time copy of [`Statistics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub sample_count: u64,
    pub dout_masked: u64,
    pub dac_lost_empty: u64,
    pub dac_lost_full: u64,
    pub dac_req_exceed: u64,
    pub dac_value: ValueSnapshot,
    pub adc_lost_full: u64,
    pub adc_values: Vec<ValueSnapshot>,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub connects: u64,
    pub disconnects: u64,
}

impl fmt::Display for ValueSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "count=0");
        }
        write!(
            f,
            "count={} last={:#010x} min={} max={} avg={}",
            self.count, self.last, self.min, self.max, self.avg
        )
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sample_count: {}", self.sample_count)?;
        writeln!(f, "dout_masked: {}", self.dout_masked)?;
        writeln!(
            f,
            "link: sent={} received={} connects={} disconnects={}",
            self.messages_sent, self.messages_received, self.connects, self.disconnects
        )?;
        writeln!(f, "dac:")?;
        writeln!(f, "  lost_empty: {}", self.dac_lost_empty)?;
        writeln!(f, "  lost_full: {}", self.dac_lost_full)?;
        writeln!(f, "  req_exceed: {}", self.dac_req_exceed)?;
        writeln!(f, "  value: {}", self.dac_value)?;
        writeln!(f, "adc:")?;
        writeln!(f, "  lost_full: {}", self.adc_lost_full)?;
        for (index, value) in self.adc_values.iter().enumerate() {
            writeln!(f, "  {index}: {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_tracking() {
        let value = ValueStats::new();
        assert_eq!(value.snapshot(), ValueSnapshot::default());
        for v in [5, -3, 10] {
            value.update(v);
        }
        let snap = value.snapshot();
        assert_eq!(snap.count, 3);
        assert_eq!(snap.min, -3);
        assert_eq!(snap.max, 10);
        assert_eq!(snap.last, 10);
        assert_eq!(snap.avg, 4);
    }

    #[test]
    fn test_counters_and_reset() {
        let stats = Statistics::new(2);
        stats.report_sample();
        stats.dac.report_lost_full(3);
        stats.dac.report_req_exceed(2);
        stats.adc.report_lost_full(1);
        stats.link.inc_connects();
        stats.report_dout_masked();

        let snap = stats.snapshot();
        assert_eq!(snap.sample_count, 1);
        assert_eq!(snap.dout_masked, 1);
        assert_eq!(snap.dac_lost_full, 3);
        assert_eq!(snap.dac_req_exceed, 2);
        assert_eq!(snap.adc_lost_full, 1);
        assert_eq!(snap.connects, 1);
        assert_eq!(snap.adc_values.len(), 2);

        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot {
            adc_values: vec![ValueSnapshot::default(); 2],
            ..StatsSnapshot::default()
        });
    }

    #[test]
    fn test_display_lists_channels() {
        let stats = Statistics::new(2);
        stats.adc.value(1).unwrap().update(7);
        let text = stats.snapshot().to_string();
        assert!(text.contains("req_exceed: 0"));
        assert!(text.contains("  1: count=1 last=0x00000007"));
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host side of the link.
//!
//! A [`HostSession`] performs the handshake, keeps the link alive, streams
//! exactly the analog output points the device grants, and collects what
//! the device reports. It runs on a single thread: every
//! [`poll`](HostSession::poll) sends whatever is due, then waits for one
//! device message until the next keep-alive is due.

use crate::channel::HostChannel;
use crate::config::LinkConfig;
use crate::error::{Error, Result};
use crate::proto::{AppMsg, McuMsg, Point};
use crate::ring::RingBuffer;
use crate::transport::{TransportRead, TransportWrite};
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Analog output signal shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Constant(Point),
    /// Adds `step` per point, wrapping on overflow
    Ramp { step: Point },
    /// `amplitude * sin(2 pi n / period)`
    Sine { amplitude: f64, period: u32 },
}

impl Default for Waveform {
    fn default() -> Self {
        Self::Sine {
            amplitude: 1_000_000.0,
            period: 1000,
        }
    }
}

impl Waveform {
    /// Value of the `n`-th point.
    pub fn sample(&self, n: u64) -> Point {
        match *self {
            Self::Constant(value) => value,
            Self::Ramp { step } => (n as Point).wrapping_mul(step),
            Self::Sine { amplitude, period } => {
                let period = u64::from(period.max(1));
                let phase = (n % period) as f64 / period as f64;
                (amplitude * (TAU * phase).sin()).round() as Point
            }
        }
    }
}

/// Counters collected by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostReport {
    pub dac_points_sent: u64,
    pub dac_points_granted: u64,
    pub adc_points_received: Vec<u64>,
    pub din: Option<u8>,
    pub device_errors: u64,
}

/// Single-threaded host peer.
pub struct HostSession<R, W> {
    channel: HostChannel<R, W>,
    config: LinkConfig,
    waveform: Waveform,
    next_point: u64,
    outstanding: usize,
    pending_dout: Option<u8>,
    last_keep_alive: Instant,
    retained: Vec<RingBuffer<Point>>,
    retain_limit: usize,
    scratch: Vec<Point>,
    report: HostReport,
}

impl<R: TransportRead, W: TransportWrite> HostSession<R, W> {
    pub fn new(channel: HostChannel<R, W>, config: LinkConfig, waveform: Waveform) -> Self {
        Self {
            retained: (0..config.adc_channels).map(|_| RingBuffer::new()).collect(),
            retain_limit: config.adc_buffer_capacity,
            scratch: Vec::with_capacity(config.dac_batch),
            report: HostReport {
                adc_points_received: vec![0; config.adc_channels],
                ..HostReport::default()
            },
            channel,
            config,
            waveform,
            next_point: 0,
            outstanding: 0,
            pending_dout: None,
            last_keep_alive: Instant::now(),
        }
    }

    /// Keep at most `limit` received points per channel for [`take_adc`](Self::take_adc).
    #[must_use]
    pub fn retain(mut self, limit: usize) -> Self {
        self.retain_limit = limit;
        self
    }

    /// Start a session. Outstanding credit from an earlier session is void.
    pub fn connect(&mut self) -> Result<()> {
        self.outstanding = 0;
        self.channel.send(&AppMsg::Connect, Some(self.config.send_timeout))?;
        self.last_keep_alive = Instant::now();
        log::info!("[host] connect sent");
        Ok(())
    }

    /// Queue a digital output update for the next poll.
    pub fn set_dout(&mut self, value: u8) {
        self.pending_dout = Some(value);
    }

    /// Latest digital input reported by the device.
    pub fn din(&self) -> Option<u8> {
        self.report.din
    }

    /// Output points granted but not yet sent.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn report(&self) -> &HostReport {
        &self.report
    }

    /// Remove and return the retained points of one input channel.
    pub fn take_adc(&mut self, channel: usize) -> Vec<Point> {
        self.retained
            .get_mut(channel)
            .map(|ring| ring.take().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Send what is due, then handle at most one device message.
    pub fn poll(&mut self) -> Result<()> {
        let timeout = Some(self.config.send_timeout);

        if self.last_keep_alive.elapsed() >= self.config.keep_alive_period {
            self.channel.send(&AppMsg::KeepAlive, timeout)?;
            self.last_keep_alive = Instant::now();
        }

        if let Some(value) = self.pending_dout.take() {
            self.channel.send(&AppMsg::DoutUpdate { value }, timeout)?;
        }

        self.stream_output()?;

        let wait = self
            .config
            .keep_alive_period
            .saturating_sub(self.last_keep_alive.elapsed())
            .max(Duration::from_millis(1));
        match self.channel.receive(Some(wait)) {
            Ok(msg) => {
                self.handle(&msg);
                self.channel.recycle(msg);
                Ok(())
            }
            Err(Error::Timeout) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Connect, then poll until `stop` is set.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<()> {
        self.connect()?;
        while !stop.load(Ordering::Acquire) {
            self.poll()?;
        }
        Ok(())
    }

    fn stream_output(&mut self) -> Result<()> {
        while self.outstanding > 0 {
            let count = self.outstanding.min(self.config.dac_batch);
            self.scratch.clear();
            for n in self.next_point..self.next_point + count as u64 {
                self.scratch.push(self.waveform.sample(n));
            }
            self.channel.send(
                &AppMsg::dac_data(&self.scratch),
                Some(self.config.send_timeout),
            )?;
            self.next_point += count as u64;
            self.outstanding -= count;
            self.report.dac_points_sent += count as u64;
        }
        Ok(())
    }

    fn handle(&mut self, msg: &McuMsg<'_>) {
        match msg {
            McuMsg::DinUpdate { value } => {
                log::debug!("[host] din {value:#04x}");
                self.report.din = Some(*value);
            }
            McuMsg::DacRequest { count } => {
                let count = *count as usize;
                if count % self.config.dac_batch != 0 {
                    log::warn!(
                        "[host] request for {count} points is not a multiple of {}",
                        self.config.dac_batch
                    );
                }
                self.outstanding += count;
                self.report.dac_points_granted += count as u64;
            }
            McuMsg::AdcData { index, points } => self.collect(usize::from(*index), points),
            McuMsg::Error { code, message } => {
                log::error!("[host] device error {code}: {message}");
                self.report.device_errors += 1;
            }
            McuMsg::Debug { message } => log::debug!("[host] device: {message}"),
        }
    }

    fn collect(&mut self, index: usize, points: &[Point]) {
        let Some(ring) = self.retained.get_mut(index) else {
            log::warn!("[host] input data for unknown channel {index}");
            return;
        };
        if points.len() != self.config.adc_batch {
            log::warn!(
                "[host] channel {index} batch of {} points, expected {}",
                points.len(),
                self.config.adc_batch
            );
        }
        self.report.adc_points_received[index] += points.len() as u64;

        for &point in points {
            if ring.len() >= self.retain_limit {
                ring.skip_front(1);
            }
            if self.retain_limit > 0 {
                // Growable ring: push cannot fail.
                let _ = ring.push_back(point);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveforms() {
        assert_eq!(Waveform::Constant(7).sample(99), 7);
        assert_eq!(Waveform::Ramp { step: 3 }.sample(4), 12);

        let sine = Waveform::Sine {
            amplitude: 100.0,
            period: 4,
        };
        let values: Vec<Point> = (0..4).map(|n| sine.sample(n)).collect();
        assert_eq!(values, vec![0, 100, 0, -100]);
    }
}

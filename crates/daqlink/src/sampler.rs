// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sampling path: moves points between the device buffers and the hardware.
//!
//! Each tick plays one output point, captures one point per input channel,
//! applies a changed digital output and samples the digital input. The
//! path never waits on the link: an empty output ring or a full input ring
//! is counted and the tick goes on.

use crate::config::LinkConfig;
use crate::control::Control;
use crate::error::Result;
use crate::proto::Point;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Converter hardware boundary.
pub trait SampleDevice: Send {
    /// Play `dac` (or hold the previous output when `None`) and capture
    /// one point per input channel into `adcs`.
    fn transfer(&mut self, dac: Option<Point>, adcs: &mut [Point]);

    fn read_din(&mut self) -> u8;

    fn write_dout(&mut self, value: u8);
}

/// Software stand-in for the converter board.
///
/// Channel 0 loops the analog output back, the other channels produce
/// sawtooth ramps of increasing slope, and the digital input counts up
/// every `din_period` ticks.
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    tick: u64,
    output: Point,
    dout: u8,
    din_period: u64,
}

impl SimulatedDevice {
    pub fn new(din_period: u64) -> Self {
        Self {
            tick: 0,
            output: 0,
            dout: 0,
            din_period: din_period.max(1),
        }
    }

    /// Value currently held on the analog output.
    pub fn output(&self) -> Point {
        self.output
    }

    /// Value last written to the digital output.
    pub fn dout(&self) -> u8 {
        self.dout
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl SampleDevice for SimulatedDevice {
    fn transfer(&mut self, dac: Option<Point>, adcs: &mut [Point]) {
        if let Some(point) = dac {
            self.output = point;
        }
        for (channel, value) in adcs.iter_mut().enumerate() {
            *value = if channel == 0 {
                self.output
            } else {
                let slope = channel as u64;
                ((self.tick.wrapping_mul(slope) % 0x1_0000) as Point) - 0x8000
            };
        }
        self.tick += 1;
    }

    fn read_din(&mut self) -> u8 {
        (self.tick / self.din_period) as u8
    }

    fn write_dout(&mut self, value: u8) {
        self.dout = value;
    }
}

/// Drives a [`SampleDevice`] against the shared buffers.
pub struct SamplingPath<D> {
    device: D,
    control: Arc<Control>,
    inputs: Vec<Point>,
    din_mask: u8,
}

impl<D: SampleDevice> SamplingPath<D> {
    /// Fails if `config` does not pass [`LinkConfig::validate`].
    pub fn new(device: D, control: Arc<Control>, config: &LinkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            device,
            inputs: vec![0; control.adcs().len()],
            control,
            din_mask: config.din_mask(),
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    /// Perform one tick.
    pub fn step(&mut self) {
        let control = &*self.control;
        let stats = control.stats();

        if let Some(value) = control.take_dout() {
            self.device.write_dout(value);
        }

        let mut output_freed = false;
        let dac = if control.dac_running() {
            match control.dac().pop() {
                Some(point) => {
                    stats.dac.value.update(point);
                    output_freed = true;
                    Some(point)
                }
                None => {
                    stats.dac.report_lost_empty(1);
                    None
                }
            }
        } else {
            None
        };

        self.device.transfer(dac, &mut self.inputs);

        let mut lost = 0;
        let mut batch_ready = false;
        for (index, (ring, &value)) in control.adcs().iter().zip(&self.inputs).enumerate() {
            if let Some(tracker) = stats.adc.value(index) {
                tracker.update(value);
            }
            if !ring.push(value) {
                lost += 1;
            }
            batch_ready |= ring.occupied() >= control.adc_batch();
        }
        if lost > 0 {
            stats.adc.report_lost_full(lost);
        }

        control.set_din(self.device.read_din() & self.din_mask);
        stats.report_sample();

        let credit_ready = output_freed
            && control.dac().vacant().checked_rem(control.dac_batch()) == Some(0);
        if batch_ready || credit_ready {
            control.signal().notify();
        }
    }

    /// Tick every `period` on a dedicated thread until `stop` is set.
    ///
    /// The thread hands the device back when it exits.
    pub fn spawn(mut self, period: Duration, stop: Arc<AtomicBool>) -> io::Result<JoinHandle<D>>
    where
        D: 'static,
    {
        thread::Builder::new()
            .name("daqlink-sampler".into())
            .spawn(move || {
                log::info!("[sampler] started, period {period:?}");
                let mut next = Instant::now();
                while !stop.load(Ordering::Acquire) {
                    self.step();
                    next += period;
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    } else {
                        // Fell behind; restart pacing from now.
                        next = now;
                    }
                }
                log::info!("[sampler] stopped");
                self.device
            })
    }
}

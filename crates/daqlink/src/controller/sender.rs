// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Paced send loop: input batches, digital input and output credit.

use super::LinkState;
use crate::channel::MessageSender;
use crate::config::LinkConfig;
use crate::control::Control;
use crate::error::{Error, Result};
use crate::proto::{McuMsg, Point};
use crate::transport::TransportWrite;
use std::sync::Arc;
use std::time::Duration;

/// Sending unit of work of a [`StreamingController`](super::StreamingController).
pub struct SendLoop<W> {
    channel: MessageSender<W>,
    control: Arc<Control>,
    state: Arc<LinkState>,
    adc_batch: usize,
    dac_batch: usize,
    send_timeout: Duration,
    fallback_timeout: Duration,
    scratch: Vec<Point>,
}

impl<W: TransportWrite> SendLoop<W> {
    pub(crate) fn new(
        channel: MessageSender<W>,
        control: Arc<Control>,
        state: Arc<LinkState>,
        config: &LinkConfig,
    ) -> Self {
        Self {
            channel,
            control,
            state,
            adc_batch: config.adc_batch,
            dac_batch: config.dac_batch,
            send_timeout: config.send_timeout,
            fallback_timeout: config.send_fallback_timeout,
            scratch: vec![0; config.adc_batch],
        }
    }

    /// Sleep until work is signalled (or the fallback timeout passes), then
    /// run one cycle, until shutdown.
    pub fn run(mut self) -> Result<()> {
        while !self.state.shutdown_requested() {
            if !self.control.signal().wait_timeout(self.fallback_timeout) {
                log::debug!(
                    "[controller] send loop idle for {:?}, running cycle anyway",
                    self.fallback_timeout
                );
            }
            if self.state.shutdown_requested() {
                break;
            }
            match self.cycle() {
                Ok(()) => {}
                Err(Error::Timeout) => {
                    log::warn!("[controller] send timed out, retrying next cycle");
                }
                Err(e) => {
                    log::error!("[controller] send loop stopped: {e}");
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// One pacing pass.
    ///
    /// While connected: report the digital input (changed or not), send
    /// every full input batch, then grant output credit. While disconnected: discard
    /// full input batches so nothing piles up.
    pub fn cycle(&mut self) -> Result<()> {
        if !self.state.is_alive() {
            self.discard_batches();
            return Ok(());
        }

        self.send(&McuMsg::DinUpdate {
            value: self.control.din(),
        })?;

        self.drain_adcs()?;
        self.grant_dac_credit()
    }

    fn send(&mut self, msg: &McuMsg<'_>) -> Result<()> {
        self.channel.send(msg, Some(self.send_timeout))?;
        self.control.stats().link.inc_sent();
        Ok(())
    }

    fn discard_batches(&self) {
        for adc in self.control.adcs() {
            let full = adc.occupied() / self.adc_batch * self.adc_batch;
            adc.skip(full);
        }
    }

    fn drain_adcs(&mut self) -> Result<()> {
        let control = Arc::clone(&self.control);
        for (index, adc) in control.adcs().iter().enumerate() {
            while adc.occupied() >= self.adc_batch {
                let batch = self.adc_batch;
                let taken = adc.read(&mut self.scratch[..batch]);
                assert_eq!(taken, batch, "input ring lost points under its single consumer");
                let points = std::mem::take(&mut self.scratch);
                let sent = self.send(&McuMsg::adc_data(index as u8, &points));
                self.scratch = points;
                sent?;
            }
        }
        Ok(())
    }

    fn grant_dac_credit(&mut self) -> Result<()> {
        // Read credit before space: points retire their credit only after
        // they occupy the ring, so a point in flight is counted, never missed.
        let requested = self.state.requested();
        let vacant = self.control.dac().vacant();
        let vacancy = vacant.saturating_sub(requested);
        if vacancy < self.dac_batch {
            return Ok(());
        }
        let grant = vacancy / self.dac_batch * self.dac_batch;
        // Grant before sending: the host may answer before send returns.
        self.state.grant_credit(grant);
        self.send(&McuMsg::DacRequest {
            count: grant as u32,
        })
    }

    pub fn state(&self) -> &Arc<LinkState> {
        &self.state
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receive loop: handshake, keep-alive supervision and host message handling.

use super::LinkState;
use crate::channel::MessageReceiver;
use crate::config::LinkConfig;
use crate::control::Control;
use crate::error::{Error, Result};
use crate::proto::{AppMsg, DecodeError, Point};
use crate::transport::TransportRead;
use std::sync::Arc;
use std::time::Duration;

/// Receiving unit of work of a [`StreamingController`](super::StreamingController).
pub struct ReceiveLoop<R> {
    channel: MessageReceiver<R, AppMsg<'static>>,
    control: Arc<Control>,
    state: Arc<LinkState>,
    keep_alive_timeout: Duration,
    dout_mask: u8,
    dout_bits: u32,
}

impl<R: TransportRead> ReceiveLoop<R> {
    pub(crate) fn new(
        channel: MessageReceiver<R, AppMsg<'static>>,
        control: Arc<Control>,
        state: Arc<LinkState>,
        config: &LinkConfig,
    ) -> Self {
        Self {
            channel,
            control,
            state,
            keep_alive_timeout: config.keep_alive_timeout,
            dout_mask: config.dout_mask(),
            dout_bits: config.dout_bits,
        }
    }

    /// Wait for the session handshake.
    ///
    /// Returns `Ok(false)` if shutdown was requested first. Any first
    /// message other than `Connect` is fatal.
    pub fn handshake(&mut self) -> Result<bool> {
        loop {
            if self.state.shutdown_requested() {
                return Ok(false);
            }
            match self.channel.receive(Some(self.keep_alive_timeout)) {
                Ok(AppMsg::Connect) => {
                    self.control.stats().link.inc_received();
                    self.connect();
                    return Ok(true);
                }
                Ok(other) => {
                    log::error!(
                        "[controller] handshake failed: expected Connect, received {}",
                        other.kind()
                    );
                    return Err(Error::Handshake {
                        found: other.kind(),
                    });
                }
                Err(Error::Timeout) => {}
                Err(e) => return Err(e),
            }
        }
    }

    /// Receive and apply one message, or handle one keep-alive timeout.
    pub fn step(&mut self) -> Result<()> {
        match self.channel.receive(Some(self.keep_alive_timeout)) {
            Ok(msg) => {
                self.control.stats().link.inc_received();
                self.apply(&msg);
                self.channel.recycle(msg);
                Ok(())
            }
            Err(Error::Timeout) => {
                self.keep_alive_expired();
                Ok(())
            }
            Err(Error::Decode(DecodeError::UnknownType(kind))) => {
                log::warn!("[controller] ignoring message of unknown type {kind}");
                Ok(())
            }
            Err(e) => {
                self.disconnect();
                Err(e)
            }
        }
    }

    /// Handshake, then apply messages until shutdown or a fatal error.
    pub fn run(mut self) -> Result<()> {
        if !self.handshake()? {
            return Ok(());
        }
        while !self.state.shutdown_requested() {
            self.step()?;
        }
        self.disconnect();
        Ok(())
    }

    /// Apply one host message.
    pub fn handle(&mut self, msg: AppMsg<'_>) {
        self.apply(&msg);
    }

    fn apply(&mut self, msg: &AppMsg<'_>) {
        if self.state.is_alive() {
            self.state.touch();
        }
        match msg {
            AppMsg::Connect => self.connect(),
            AppMsg::KeepAlive => {}
            AppMsg::DoutUpdate { value } => self.set_dout(*value),
            AppMsg::DacData { points } => self.write_dac(points),
        }
    }

    fn connect(&mut self) {
        self.state.reset_credit();
        self.control.start_dac();
        self.state.set_alive(true);
        self.state.touch();
        self.control.stats().link.inc_connects();
        self.control.signal().notify();
        log::info!("[controller] connected");
    }

    fn keep_alive_expired(&mut self) {
        if self.state.is_alive() {
            log::error!(
                "[controller] no message within {:?}, keep-alive lost",
                self.keep_alive_timeout
            );
            self.disconnect();
        }
    }

    fn disconnect(&mut self) {
        if self.state.is_alive() {
            self.control.stop_dac();
            self.state.set_alive(false);
            self.control.stats().link.inc_disconnects();
            log::info!("[controller] disconnected");
        }
    }

    fn set_dout(&mut self, value: u8) {
        let masked = value & self.dout_mask;
        if masked != value {
            self.control.stats().report_dout_masked();
            log::warn!(
                "[controller] dout value {value:#04x} exceeds {} bits, applying {masked:#04x}",
                self.dout_bits
            );
        }
        self.control.set_dout(masked);
    }

    /// Queue delivered points, then retire their credit.
    ///
    /// A delivered point is always visible to the send loop either as
    /// outstanding credit or as occupied space, never as neither.
    fn write_dac(&mut self, points: &[Point]) {
        let count = points.len();
        let written = self.control.dac().write(points);
        let credit = self.state.consume_credit(count);
        if count > credit {
            self.control.stats().dac.report_req_exceed(count - credit);
        }
        if written < count {
            self.control.stats().dac.report_lost_full(count - written);
        }
    }

    pub fn state(&self) -> &Arc<LinkState> {
        &self.state
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Link tunables.

use crate::error::{Error, Result};
use crate::proto;
use std::time::Duration;

/// Default maximum encoded message size, one shared-memory buffer minus its header.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 496;

/// Number of analog input channels on the reference board.
pub const DEFAULT_ADC_CHANNELS: usize = 6;

/// Digital input port width.
pub const DEFAULT_DIN_BITS: u32 = 8;

/// Digital output port width.
pub const DEFAULT_DOUT_BITS: u32 = 4;

/// Tunables shared by both ends of the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Largest encoded message, in bytes
    pub max_message_len: usize,
    /// Points per analog input message
    pub adc_batch: usize,
    /// Points per analog output message, and the credit granularity
    pub dac_batch: usize,
    /// Number of analog input channels
    pub adc_channels: usize,
    /// Digital input width in bits
    pub din_bits: u32,
    /// Digital output width in bits
    pub dout_bits: u32,
    /// Silence after which the device drops the connection
    pub keep_alive_timeout: Duration,
    /// Host keep-alive interval
    pub keep_alive_period: Duration,
    /// Analog output ring capacity, in points
    pub dac_buffer_capacity: usize,
    /// Per-channel analog input ring capacity, in points
    pub adc_buffer_capacity: usize,
    /// Longest the send loop sleeps without a work signal
    pub send_fallback_timeout: Duration,
    /// Deadline for a single outgoing message
    pub send_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        let keep_alive_timeout = Duration::from_millis(200);
        Self {
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            adc_batch: proto::adc_batch_for(DEFAULT_MAX_MESSAGE_LEN),
            dac_batch: proto::dac_batch_for(DEFAULT_MAX_MESSAGE_LEN),
            adc_channels: DEFAULT_ADC_CHANNELS,
            din_bits: DEFAULT_DIN_BITS,
            dout_bits: DEFAULT_DOUT_BITS,
            keep_alive_timeout,
            keep_alive_period: Duration::from_millis(100),
            dac_buffer_capacity: 4096,
            adc_buffer_capacity: 4096,
            send_fallback_timeout: Duration::from_secs(10),
            send_timeout: keep_alive_timeout,
        }
    }
}

impl LinkConfig {
    /// Set the message size bound and derive the largest batches that fit.
    #[must_use]
    pub fn with_max_message_len(mut self, max_message_len: usize) -> Self {
        self.max_message_len = max_message_len;
        self.adc_batch = proto::adc_batch_for(max_message_len);
        self.dac_batch = proto::dac_batch_for(max_message_len);
        self
    }

    /// Valid bits of the digital output port.
    pub fn dout_mask(&self) -> u8 {
        width_mask(self.dout_bits)
    }

    /// Valid bits of the digital input port.
    pub fn din_mask(&self) -> u8 {
        width_mask(self.din_bits)
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<()> {
        if self.adc_batch == 0 || self.dac_batch == 0 {
            return Err(Error::InvalidConfig("batch sizes must be non-zero".into()));
        }
        if self.adc_batch > proto::adc_batch_for(self.max_message_len) {
            return Err(Error::InvalidConfig(format!(
                "adc_batch {} does not fit a {}-byte message",
                self.adc_batch, self.max_message_len
            )));
        }
        if self.dac_batch > proto::dac_batch_for(self.max_message_len) {
            return Err(Error::InvalidConfig(format!(
                "dac_batch {} does not fit a {}-byte message",
                self.dac_batch, self.max_message_len
            )));
        }
        if self.adc_channels == 0 || self.adc_channels > usize::from(u8::MAX) + 1 {
            return Err(Error::InvalidConfig(format!(
                "adc_channels must be in 1..=256, got {}",
                self.adc_channels
            )));
        }
        if self.din_bits > 8 || self.dout_bits > 8 {
            return Err(Error::InvalidConfig(
                "digital port widths are limited to 8 bits".into(),
            ));
        }
        if self.adc_buffer_capacity < self.adc_batch {
            return Err(Error::InvalidConfig(format!(
                "adc_buffer_capacity {} is smaller than one batch ({})",
                self.adc_buffer_capacity, self.adc_batch
            )));
        }
        if self.dac_buffer_capacity < self.dac_batch {
            return Err(Error::InvalidConfig(format!(
                "dac_buffer_capacity {} is smaller than one batch ({})",
                self.dac_buffer_capacity, self.dac_batch
            )));
        }
        if self.keep_alive_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "keep_alive_timeout must be non-zero".into(),
            ));
        }
        if self.keep_alive_period >= self.keep_alive_timeout {
            return Err(Error::InvalidConfig(format!(
                "keep_alive_period {:?} must be shorter than keep_alive_timeout {:?}",
                self.keep_alive_period, self.keep_alive_timeout
            )));
        }
        Ok(())
    }
}

fn width_mask(bits: u32) -> u8 {
    ((1u16 << bits.min(8)) - 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LinkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dac_batch, 123);
        assert_eq!(config.adc_batch, 123);
        assert_eq!(config.send_timeout, config.keep_alive_timeout);
    }

    #[test]
    fn test_masks() {
        let config = LinkConfig::default();
        assert_eq!(config.dout_mask(), 0x0F);
        assert_eq!(config.din_mask(), 0xFF);
    }

    #[test]
    fn test_small_messages_derive_small_batches() {
        let config = LinkConfig::default().with_max_message_len(20);
        assert_eq!(config.adc_batch, 4);
        assert_eq!(config.dac_batch, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_oversized_batch() {
        let mut config = LinkConfig::default();
        config.adc_batch = 200;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_slow_keep_alive() {
        let mut config = LinkConfig::default();
        config.keep_alive_period = config.keep_alive_timeout;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_tiny_buffers() {
        let mut config = LinkConfig::default();
        config.dac_buffer_capacity = 10;
        assert!(config.validate().is_err());
    }
}

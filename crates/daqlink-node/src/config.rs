// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Node configuration.
//!
//! TOML file with `[link]`, `[device]`, `[host]` and `[loopback]` sections.
//! Every section is optional; durations are written in milliseconds.

use daqlink::{LinkConfig, Waveform};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Log filter (trace, debug, info, warn, error or an env-filter directive).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Statistics reporting interval (seconds, 0 to disable).
    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,

    #[serde(default)]
    pub link: LinkSection,

    #[serde(default)]
    pub device: DeviceSection,

    #[serde(default)]
    pub host: HostSection,

    #[serde(default)]
    pub loopback: LoopbackSection,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stats_interval() -> u64 {
    10
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            stats_interval_secs: default_stats_interval(),
            link: LinkSection::default(),
            device: DeviceSection::default(),
            host: HostSection::default(),
            loopback: LoopbackSection::default(),
        }
    }
}

/// Tunables shared by both ends of the link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSection {
    /// Largest encoded message; batch sizes are derived from it.
    pub max_message_len: usize,
    pub adc_channels: usize,
    pub din_bits: u32,
    pub dout_bits: u32,
    pub keep_alive_timeout_ms: u64,
    pub keep_alive_period_ms: u64,
    pub dac_buffer_capacity: usize,
    pub adc_buffer_capacity: usize,
    pub send_fallback_timeout_ms: u64,
}

impl Default for LinkSection {
    fn default() -> Self {
        let link = LinkConfig::default();
        Self {
            max_message_len: link.max_message_len,
            adc_channels: link.adc_channels,
            din_bits: link.din_bits,
            dout_bits: link.dout_bits,
            keep_alive_timeout_ms: millis(link.keep_alive_timeout),
            keep_alive_period_ms: millis(link.keep_alive_period),
            dac_buffer_capacity: link.dac_buffer_capacity,
            adc_buffer_capacity: link.adc_buffer_capacity,
            send_fallback_timeout_ms: millis(link.send_fallback_timeout),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Device end: where to listen and how fast to sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSection {
    pub listen: String,
    /// Sampling period in microseconds.
    pub sample_period_us: u64,
    /// Ticks between increments of the simulated digital input.
    pub din_period: u64,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:7400".to_string(),
            sample_period_us: 1000,
            din_period: 1000,
        }
    }
}

/// Host end: where to connect and what to play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSection {
    pub connect: String,
    /// Digital output value applied after connecting.
    pub dout: Option<u8>,
    /// Stop after this many seconds (0 runs until Ctrl+C).
    pub duration_secs: u64,
    /// Received input points kept per channel.
    pub retain_points: usize,
    pub waveform: WaveformConfig,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            connect: "127.0.0.1:7400".to_string(),
            dout: None,
            duration_secs: 0,
            retain_points: 4096,
            waveform: WaveformConfig::default(),
        }
    }
}

/// Analog output signal, as written in the file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaveformConfig {
    Constant { value: i32 },
    Ramp { step: i32 },
    Sine { amplitude: f64, period: u32 },
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self::from(Waveform::default())
    }
}

impl From<Waveform> for WaveformConfig {
    fn from(waveform: Waveform) -> Self {
        match waveform {
            Waveform::Constant(value) => Self::Constant { value },
            Waveform::Ramp { step } => Self::Ramp { step },
            Waveform::Sine { amplitude, period } => Self::Sine { amplitude, period },
        }
    }
}

impl From<WaveformConfig> for Waveform {
    fn from(config: WaveformConfig) -> Self {
        match config {
            WaveformConfig::Constant { value } => Self::Constant(value),
            WaveformConfig::Ramp { step } => Self::Ramp { step },
            WaveformConfig::Sine { amplitude, period } => Self::Sine { amplitude, period },
        }
    }
}

/// Both ends in one process over the slot transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopbackSection {
    /// Bytes per shared slot.
    pub slot_size: usize,
    /// Slots in the shared pool.
    pub slot_count: usize,
}

impl Default for LoopbackSection {
    fn default() -> Self {
        Self {
            slot_size: 512,
            slot_count: 64,
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.link_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.device.sample_period_us == 0 {
            return Err(ConfigError::Invalid(
                "device.sample_period_us must be non-zero".into(),
            ));
        }
        if self.loopback.slot_size == 0 || self.loopback.slot_count == 0 {
            return Err(ConfigError::Invalid(
                "loopback slots must have non-zero size and count".into(),
            ));
        }
        if let WaveformConfig::Sine { amplitude, period } = self.host.waveform {
            if period == 0 || !amplitude.is_finite() {
                return Err(ConfigError::Invalid(
                    "sine waveform needs a finite amplitude and a non-zero period".into(),
                ));
            }
        }
        Ok(())
    }

    /// Link tunables for both ends.
    pub fn link_config(&self) -> LinkConfig {
        let link = &self.link;
        let keep_alive_timeout = Duration::from_millis(link.keep_alive_timeout_ms);
        LinkConfig {
            adc_channels: link.adc_channels,
            din_bits: link.din_bits,
            dout_bits: link.dout_bits,
            keep_alive_timeout,
            keep_alive_period: Duration::from_millis(link.keep_alive_period_ms),
            dac_buffer_capacity: link.dac_buffer_capacity,
            adc_buffer_capacity: link.adc_buffer_capacity,
            send_fallback_timeout: Duration::from_millis(link.send_fallback_timeout_ms),
            send_timeout: keep_alive_timeout,
            ..LinkConfig::default().with_max_message_len(link.max_message_len)
        }
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_micros(self.device.sample_period_us)
    }

    /// How long the host end runs, `None` meaning until stopped.
    pub fn host_duration(&self) -> Option<Duration> {
        (self.host.duration_secs > 0).then(|| Duration::from_secs(self.host.duration_secs))
    }
}

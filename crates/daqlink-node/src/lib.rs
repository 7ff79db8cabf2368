// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! daqlink node service
//!
//! Runs the device end of a data-acquisition link (simulated converters,
//! streaming controller, TCP listener), the host end (waveform playback and
//! input collection), or both in one process over shared slots.
//!
//! # Quick Start
//!
//! ```bash
//! # Device end
//! daqlink-node device --listen 127.0.0.1:7400
//!
//! # Host end, for ten seconds
//! daqlink-node host --connect 127.0.0.1:7400 --duration 10
//!
//! # Both ends in one process
//! daqlink-node loopback --duration 5
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! log_level = "info"
//! stats_interval_secs = 10
//!
//! [link]
//! max_message_len = 496
//! keep_alive_timeout_ms = 200
//! keep_alive_period_ms = 100
//!
//! [device]
//! listen = "127.0.0.1:7400"
//! sample_period_us = 1000
//!
//! [host]
//! connect = "127.0.0.1:7400"
//!
//! [host.waveform]
//! kind = "sine"
//! amplitude = 1000000.0
//! period = 1000
//! ```

pub mod config;
pub mod node;

pub use config::{ConfigError, NodeConfig, WaveformConfig};
pub use node::{run_device, run_host, run_loopback, stop_on_ctrlc, NodeError};

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # daqlink - Data Acquisition Link
//!
//! Link layer between a sampling device and its host: circular buffers,
//! message framing over byte transports, and the device-side streaming
//! controller with connect/keep-alive supervision and credit-based
//! analog output flow control.
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------+
//! |  StreamingController / HostSession      |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  MessageChannel (framing, max length)   |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  RingStream / RingBufferView (ring)     |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  Transport (pipe / slot pool / TCP)     |
//! +-----------------------------------------+
//! ```
//!
//! The device side pairs a [`StreamingController`] with a
//! [`SamplingPath`](sampler::SamplingPath) over one shared
//! [`Control`](control::Control); the host side is a [`HostSession`].
//!
//! ## Logging
//!
//! Logs through the `log` facade with bracketed component prefixes
//! (`[controller]`, `[channel]`, `[sampler]`, `[host]`).

pub mod channel;
pub mod config;
pub mod control;
pub mod controller;
pub mod error;
pub mod host;
pub mod proto;
pub mod ring;
pub mod sampler;
pub mod transport;

pub use channel::{DeviceChannel, HostChannel, MessageChannel, MessageReceiver, MessageSender};
pub use config::LinkConfig;
pub use control::{Control, SampleRing, Statistics, StatsSnapshot};
pub use controller::{ControllerHandle, LinkState, LinkStatus, StreamingController};
pub use error::{Error, Result};
pub use host::{HostReport, HostSession, Waveform};
pub use proto::{AppMsg, McuMsg, Point};
pub use ring::{RingBuffer, RingBufferView, RingStream};
pub use sampler::{SampleDevice, SamplingPath, SimulatedDevice};

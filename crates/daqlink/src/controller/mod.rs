// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Device-side streaming controller.
//!
//! Two units of work share one [`LinkState`] and one [`Control`]:
//!
//! - [`ReceiveLoop`] applies host messages and owns every state transition
//! - [`SendLoop`] drains input batches and grants output credit
//!
//! # Flow Control
//!
//! The host may only send analog output points it was granted. The send
//! loop grants `floor(vacancy / batch) * batch` points whenever at least a
//! batch fits, where `vacancy` is the output ring's free space minus the
//! credit still outstanding. The grant is added to the credit before the
//! request leaves, and the receive loop subtracts delivered points before
//! writing them, so outstanding credit never exceeds free space.

pub mod receiver;
pub mod sender;

pub use receiver::ReceiveLoop;
pub use sender::SendLoop;

use crate::channel::DeviceChannel;
use crate::config::LinkConfig;
use crate::control::Control;
use crate::error::Result;
use crate::transport::{TransportRead, TransportWrite};
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Connection state as seen by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Disconnected,
    Connected,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// State shared by the receive and send loops.
///
/// `alive` and `last_activity` have a single writer (the receive loop).
/// The credit counter is written by both loops and only through atomic
/// read-modify-write operations.
#[derive(Debug, Default)]
pub struct LinkState {
    alive: AtomicBool,
    dac_requested: AtomicUsize,
    last_activity: Mutex<Option<Instant>>,
    shutdown: AtomicBool,
}

impl LinkState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> LinkStatus {
        if self.is_alive() {
            LinkStatus::Connected
        } else {
            LinkStatus::Disconnected
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Output points granted to the host and not yet received.
    #[inline]
    pub fn requested(&self) -> usize {
        self.dac_requested.load(Ordering::Acquire)
    }

    /// Time since the last message from the host, if one ever arrived.
    pub fn idle_for(&self) -> Option<Duration> {
        self.last_activity.lock().map(|at| at.elapsed())
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub(crate) fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Release);
    }

    fn touch(&self) {
        *self.last_activity.lock() = Some(Instant::now());
    }

    fn reset_credit(&self) {
        self.dac_requested.store(0, Ordering::Release);
    }

    fn grant_credit(&self, count: usize) {
        self.dac_requested.fetch_add(count, Ordering::AcqRel);
    }

    /// Subtract delivered points from the credit, saturating at zero.
    ///
    /// Returns the credit outstanding before the subtraction.
    fn consume_credit(&self, count: usize) -> usize {
        match self
            .dac_requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |r| {
                Some(r.saturating_sub(count))
            }) {
            Ok(previous) | Err(previous) => previous,
        }
    }
}

/// Device side of the link bound to one transport connection.
pub struct StreamingController<R, W> {
    receiver: ReceiveLoop<R>,
    sender: SendLoop<W>,
    state: Arc<LinkState>,
    control: Arc<Control>,
}

impl<R: TransportRead, W: TransportWrite> StreamingController<R, W> {
    /// Bind a channel to the shared device buffers.
    pub fn new(channel: DeviceChannel<R, W>, control: Arc<Control>, config: &LinkConfig) -> Result<Self> {
        config.validate()?;
        let state = Arc::new(LinkState::new());
        let (tx, rx) = channel.split();
        Ok(Self {
            receiver: ReceiveLoop::new(rx, Arc::clone(&control), Arc::clone(&state), config),
            sender: SendLoop::new(tx, Arc::clone(&control), Arc::clone(&state), config),
            state,
            control,
        })
    }

    pub fn state(&self) -> &Arc<LinkState> {
        &self.state
    }

    pub fn control(&self) -> &Arc<Control> {
        &self.control
    }

    /// Take the two loops apart to drive them by hand.
    pub fn into_loops(self) -> (ReceiveLoop<R>, SendLoop<W>) {
        (self.receiver, self.sender)
    }
}

impl<R, W> StreamingController<R, W>
where
    R: TransportRead + Send + 'static,
    W: TransportWrite + Send + 'static,
{
    /// Run both loops on dedicated threads.
    pub fn spawn(self) -> io::Result<ControllerHandle> {
        let Self {
            receiver,
            sender,
            state,
            control,
        } = self;

        let recv_stop = StopGuard::new(&state, &control);
        let receiver = thread::Builder::new()
            .name("daqlink-recv".into())
            .spawn(move || {
                let _stop = recv_stop;
                receiver.run()
            })?;

        let send_stop = StopGuard::new(&state, &control);
        let sender = thread::Builder::new()
            .name("daqlink-send".into())
            .spawn(move || {
                let _stop = send_stop;
                sender.run()
            })?;

        Ok(ControllerHandle {
            state,
            control,
            receiver,
            sender,
        })
    }
}

/// Stops the sibling loop when one loop exits, including by panic.
struct StopGuard {
    state: Arc<LinkState>,
    control: Arc<Control>,
}

impl StopGuard {
    fn new(state: &Arc<LinkState>, control: &Arc<Control>) -> Self {
        Self {
            state: Arc::clone(state),
            control: Arc::clone(control),
        }
    }
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        self.state.request_shutdown();
        self.control.signal().notify();
    }
}

/// Handle to a running controller.
pub struct ControllerHandle {
    state: Arc<LinkState>,
    control: Arc<Control>,
    receiver: JoinHandle<Result<()>>,
    sender: JoinHandle<Result<()>>,
}

impl ControllerHandle {
    pub fn status(&self) -> LinkStatus {
        self.state.status()
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_alive()
    }

    pub fn state(&self) -> &Arc<LinkState> {
        &self.state
    }

    /// True once both loops have exited.
    pub fn is_finished(&self) -> bool {
        self.receiver.is_finished() && self.sender.is_finished()
    }

    /// Ask both loops to stop.
    ///
    /// The send loop wakes at once; the receive loop notices within one
    /// keep-alive timeout.
    pub fn shutdown(&self) {
        self.state.request_shutdown();
        self.control.signal().notify();
    }

    /// Wait for both loops and report the first failure.
    ///
    /// A panicked loop re-raises its panic here.
    pub fn join(self) -> Result<()> {
        let received = self
            .receiver
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        let sent = self
            .sender
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        received.and(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_saturates_at_zero() {
        let state = LinkState::new();
        state.grant_credit(8);
        assert_eq!(state.consume_credit(3), 8);
        assert_eq!(state.requested(), 5);
        assert_eq!(state.consume_credit(9), 5);
        assert_eq!(state.requested(), 0);
    }

    #[test]
    fn test_status_follows_alive_flag() {
        let state = LinkState::new();
        assert_eq!(state.status(), LinkStatus::Disconnected);
        assert_eq!(state.idle_for(), None);
        state.set_alive(true);
        state.touch();
        assert_eq!(state.status(), LinkStatus::Connected);
        assert!(state.idle_for().is_some());
    }
}

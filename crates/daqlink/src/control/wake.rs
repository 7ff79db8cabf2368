// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Work signal for the paced send loop.
//!
//! # Architecture
//! - Atomic flag for lock-free raise and check
//! - Condvar for sleeping while idle
//!
//! Raising always takes the lock before signalling, and the waiter
//! re-checks the flag under the same lock, so a raise can never fall
//! between the check and the wait.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Coalescing wake-up flag: any number of raises before a wait count once.
#[derive(Debug, Default)]
pub struct WorkSignal {
    pending: AtomicBool,
    lock: Mutex<()>,
    condvar: Condvar,
}

impl WorkSignal {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark work as available and wake the waiter.
    pub fn notify(&self) {
        self.pending.store(true, Ordering::Release);
        let _guard = self.lock.lock();
        self.condvar.notify_all();
    }

    /// Consume a pending raise without blocking.
    #[inline]
    pub fn check_and_clear(&self) -> bool {
        self.pending.swap(false, Ordering::Acquire)
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Wait for a raise, at most `timeout`.
    ///
    /// Returns `true` if woken by a raise, `false` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.check_and_clear() {
            return true;
        }

        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock();
        loop {
            if self.check_and_clear() {
                return true;
            }
            if self.condvar.wait_until(&mut guard, deadline).timed_out() {
                return self.check_and_clear();
            }
        }
    }
}

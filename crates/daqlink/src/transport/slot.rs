// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Zero-copy slot transport.
//!
//! Two endpoints share one pool of fixed-size buffers allocated up front.
//! A sender borrows a free buffer, fills it in place, and hands ownership
//! to the peer; the peer reads it in place and returns it to the pool.
//! Buffers move between endpoints, bytes never do, and nothing is
//! allocated after [`slot_link`] returns.
//!
//! ```text
//!        alloc_tx_buffer          send_nocopy           recv_nocopy
//!  pool ----------------> TxBuffer ----------> [queue] ----------> RxBuffer
//!   ^                                                                 |
//!   +-------------------------- free_rx_buffer -----------------------+
//! ```
//!
//! [`SlotReader`] and [`SlotWriter`] adapt an endpoint to the byte stream
//! contract of [`TransportRead`]/[`TransportWrite`].

use super::{TransportRead, TransportWrite};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::io;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

/// Free list shared by both endpoints.
#[derive(Debug)]
struct SlotPool {
    free_tx: Sender<Box<[u8]>>,
    free_rx: Receiver<Box<[u8]>>,
    slot_size: usize,
}

impl SlotPool {
    fn new(slot_size: usize, slot_count: usize) -> Self {
        let (free_tx, free_rx) = channel::bounded(slot_count);
        for _ in 0..slot_count {
            // Capacity equals slot_count, so seeding cannot fail.
            let _ = free_tx.try_send(vec![0u8; slot_size].into_boxed_slice());
        }
        Self {
            free_tx,
            free_rx,
            slot_size,
        }
    }

    fn take(&self, timeout: Option<Duration>) -> io::Result<Box<[u8]>> {
        let taken = match timeout {
            Some(timeout) => self.free_rx.recv_timeout(timeout),
            None => self
                .free_rx
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };
        taken.map_err(|e| match e {
            RecvTimeoutError::Timeout => io::Error::from(io::ErrorKind::TimedOut),
            RecvTimeoutError::Disconnected => io::Error::from(io::ErrorKind::BrokenPipe),
        })
    }

    fn give_back(&self, data: Box<[u8]>) {
        // The pool holds its own sender and receiver and never exceeds
        // slot_count buffers.
        let _ = self.free_tx.try_send(data);
    }

    fn available(&self) -> usize {
        self.free_rx.len()
    }
}

/// Buffer borrowed for sending. Returns to the pool if dropped unsent.
#[derive(Debug)]
pub struct TxBuffer {
    data: Option<Box<[u8]>>,
    pool: Arc<SlotPool>,
}

impl Deref for TxBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }
}

impl DerefMut for TxBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.data.as_deref_mut().unwrap_or(&mut [])
    }
}

impl Drop for TxBuffer {
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            self.pool.give_back(data);
        }
    }
}

/// Received buffer, valid up to its payload length.
///
/// Returns to the pool when dropped.
#[derive(Debug)]
pub struct RxBuffer {
    data: Option<Box<[u8]>>,
    len: usize,
    pool: Arc<SlotPool>,
}

impl Deref for RxBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.data {
            Some(data) => &data[..self.len],
            None => &[],
        }
    }
}

impl Drop for RxBuffer {
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            self.pool.give_back(data);
        }
    }
}

/// One side of a slot link.
#[derive(Debug)]
pub struct SlotEndpoint {
    pool: Arc<SlotPool>,
    tx: Sender<(Box<[u8]>, usize)>,
    rx: Receiver<(Box<[u8]>, usize)>,
}

/// Create two connected endpoints sharing `slot_count` buffers of
/// `slot_size` bytes.
pub fn slot_link(slot_size: usize, slot_count: usize) -> (SlotEndpoint, SlotEndpoint) {
    let pool = Arc::new(SlotPool::new(slot_size, slot_count));
    let (a_tx, b_rx) = channel::unbounded();
    let (b_tx, a_rx) = channel::unbounded();
    (
        SlotEndpoint {
            pool: Arc::clone(&pool),
            tx: a_tx,
            rx: a_rx,
        },
        SlotEndpoint {
            pool,
            tx: b_tx,
            rx: b_rx,
        },
    )
}

impl SlotEndpoint {
    /// Payload capacity of every buffer.
    pub fn slot_size(&self) -> usize {
        self.pool.slot_size
    }

    /// Buffers currently free in the shared pool.
    pub fn available(&self) -> usize {
        self.pool.available()
    }

    /// Borrow a free buffer, waiting at most `timeout` for one.
    pub fn alloc_tx_buffer(&self, timeout: Option<Duration>) -> io::Result<TxBuffer> {
        Ok(TxBuffer {
            data: Some(self.pool.take(timeout)?),
            pool: Arc::clone(&self.pool),
        })
    }

    /// Hand the first `len` bytes of `buf` to the peer.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the slot size.
    pub fn send_nocopy(&self, mut buf: TxBuffer, len: usize) -> io::Result<()> {
        assert!(
            len <= self.slot_size(),
            "payload {len} exceeds slot size {}",
            self.slot_size()
        );
        let Some(data) = buf.data.take() else {
            return Ok(());
        };
        self.tx.send((data, len)).map_err(|e| {
            self.pool.give_back(e.into_inner().0);
            io::Error::from(io::ErrorKind::BrokenPipe)
        })
    }

    /// Take ownership of the next buffer sent by the peer.
    ///
    /// A closed peer with nothing left queued reports `UnexpectedEof`.
    pub fn recv_nocopy(&self, timeout: Option<Duration>) -> io::Result<RxBuffer> {
        let received = match timeout {
            Some(timeout) => self.rx.recv_timeout(timeout),
            None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok((data, len)) => Ok(RxBuffer {
                data: Some(data),
                len,
                pool: Arc::clone(&self.pool),
            }),
            Err(RecvTimeoutError::Timeout) => Err(io::Error::from(io::ErrorKind::TimedOut)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(io::Error::from(io::ErrorKind::UnexpectedEof))
            }
        }
    }

    /// Return a received buffer to the pool.
    pub fn free_rx_buffer(&self, buf: RxBuffer) {
        drop(buf);
    }

    /// Split into byte stream halves.
    pub fn into_split(self) -> (SlotReader, SlotWriter) {
        let Self { pool, tx, rx } = self;
        (
            SlotReader {
                endpoint: RecvSide {
                    pool: Arc::clone(&pool),
                    rx,
                },
                current: None,
                offset: 0,
            },
            SlotWriter { pool, tx },
        )
    }
}

#[derive(Debug)]
struct RecvSide {
    pool: Arc<SlotPool>,
    rx: Receiver<(Box<[u8]>, usize)>,
}

/// Byte stream reader over received slots.
#[derive(Debug)]
pub struct SlotReader {
    endpoint: RecvSide,
    current: Option<RxBuffer>,
    offset: usize,
}

/// Byte stream writer: each write fills at most one slot.
#[derive(Debug)]
pub struct SlotWriter {
    pool: Arc<SlotPool>,
    tx: Sender<(Box<[u8]>, usize)>,
}

impl TransportRead for SlotReader {
    fn timed_read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let slot = loop {
            if let Some(slot) = self.current.take() {
                break slot;
            }
            let received = match timeout {
                Some(timeout) => self.endpoint.rx.recv_timeout(timeout),
                None => self
                    .endpoint
                    .rx
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                // Empty slots carry no bytes, keep waiting.
                Ok((data, 0)) => self.endpoint.pool.give_back(data),
                Ok((data, len)) => {
                    self.offset = 0;
                    self.current = Some(RxBuffer {
                        data: Some(data),
                        len,
                        pool: Arc::clone(&self.endpoint.pool),
                    });
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(io::Error::from(io::ErrorKind::TimedOut))
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(0),
            }
        };

        let rest = &slot[self.offset..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.offset += n;
        if self.offset < slot.len() {
            self.current = Some(slot);
        }
        Ok(n)
    }
}

impl TransportWrite for SlotWriter {
    fn timed_write(&mut self, buf: &[u8], timeout: Option<Duration>) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut data = self.pool.take(timeout)?;
        let n = buf.len().min(data.len());
        data[..n].copy_from_slice(&buf[..n]);
        self.tx.send((data, n)).map_err(|e| {
            self.pool.give_back(e.into_inner().0);
            io::Error::from(io::ErrorKind::BrokenPipe)
        })?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership_round_trip() {
        let (a, b) = slot_link(16, 2);
        let mut tx = a.alloc_tx_buffer(None).unwrap();
        tx[..3].copy_from_slice(b"abc");
        a.send_nocopy(tx, 3).unwrap();
        assert_eq!(a.available(), 1);

        let rx = b.recv_nocopy(Some(Duration::from_millis(100))).unwrap();
        assert_eq!(&*rx, b"abc");
        b.free_rx_buffer(rx);
        assert_eq!(b.available(), 2);
    }

    #[test]
    fn test_pool_exhaustion_times_out() {
        let (a, _b) = slot_link(8, 1);
        let held = a.alloc_tx_buffer(None).unwrap();
        let err = a
            .alloc_tx_buffer(Some(Duration::from_millis(5)))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        drop(held);
        assert!(a.alloc_tx_buffer(Some(Duration::from_millis(5))).is_ok());
    }

    #[test]
    #[should_panic(expected = "exceeds slot size")]
    fn test_oversized_payload_panics() {
        let (a, _b) = slot_link(4, 1);
        let tx = a.alloc_tx_buffer(None).unwrap();
        let _ = a.send_nocopy(tx, 5);
    }

    #[test]
    fn test_closed_peer() {
        let (a, b) = slot_link(8, 2);
        drop(a);
        let err = b.recv_nocopy(Some(Duration::from_millis(5))).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_stream_adapter_spans_slots() {
        let (a, b) = slot_link(4, 4);
        let (_, mut writer) = a.into_split();
        let (mut reader, _) = b.into_split();

        assert_eq!(writer.timed_write(b"abcdef", None).unwrap(), 4);
        assert_eq!(writer.timed_write(b"ef", None).unwrap(), 2);

        let mut buf = [0u8; 3];
        assert_eq!(reader.timed_read(&mut buf, None).unwrap(), 3);
        assert_eq!(&buf, b"abc");
        assert_eq!(reader.timed_read(&mut buf, None).unwrap(), 1);
        assert_eq!(&buf[..1], b"d");
        assert_eq!(reader.timed_read(&mut buf, None).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
    }

    #[test]
    fn test_stream_adapter_releases_slots() {
        let (a, b) = slot_link(4, 1);
        let (_, mut writer) = a.into_split();
        let (mut reader, _) = b.into_split();
        let mut buf = [0u8; 4];
        for round in 0..3u8 {
            writer
                .timed_write(&[round; 4], Some(Duration::from_millis(100)))
                .unwrap();
            assert_eq!(reader.timed_read(&mut buf, None).unwrap(), 4);
            assert_eq!(buf, [round; 4]);
        }
    }
}

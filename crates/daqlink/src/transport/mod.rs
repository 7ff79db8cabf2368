// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte transports underneath [`MessageChannel`](crate::channel::MessageChannel).
//!
//! A transport is any endpoint offering timeout-bounded `read` and `write`.
//! Three are provided:
//!
//! - [`memory`] - in-process copying pipe, chunked to exercise partial I/O
//! - [`slot`] - zero-copy buffer pool with ownership transfer, plus a byte
//!   stream adapter over it
//! - TCP, through the impls on [`std::net::TcpStream`] below
//!
//! ## Conventions
//!
//! - `Ok(0)` from a read with a non-empty buffer means the peer closed
//! - An elapsed timeout is `io::ErrorKind::TimedOut`
//! - `None` as timeout waits indefinitely

pub mod memory;
pub mod slot;

pub use memory::{pipe, PipeBuilder, PipeReader, PipeWriter};
pub use slot::{slot_link, RxBuffer, SlotEndpoint, SlotReader, SlotWriter, TxBuffer};

use std::io;
use std::net::TcpStream;
use std::time::{Duration, Instant};

/// Receiving half of a transport.
pub trait TransportRead {
    /// Read up to `buf.len()` bytes, waiting at most `timeout`.
    fn timed_read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> io::Result<usize>;
}

/// Sending half of a transport.
pub trait TransportWrite {
    /// Write up to `buf.len()` bytes, waiting at most `timeout`.
    fn timed_write(&mut self, buf: &[u8], timeout: Option<Duration>) -> io::Result<usize>;
}

impl<T: TransportRead + ?Sized> TransportRead for &mut T {
    fn timed_read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> io::Result<usize> {
        (**self).timed_read(buf, timeout)
    }
}

impl<T: TransportWrite + ?Sized> TransportWrite for &mut T {
    fn timed_write(&mut self, buf: &[u8], timeout: Option<Duration>) -> io::Result<usize> {
        (**self).timed_write(buf, timeout)
    }
}

impl<T: TransportRead + ?Sized> TransportRead for Box<T> {
    fn timed_read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> io::Result<usize> {
        (**self).timed_read(buf, timeout)
    }
}

impl<T: TransportWrite + ?Sized> TransportWrite for Box<T> {
    fn timed_write(&mut self, buf: &[u8], timeout: Option<Duration>) -> io::Result<usize> {
        (**self).timed_write(buf, timeout)
    }
}

/// Adapts a transport to [`io::Read`]/[`io::Write`] under one absolute
/// deadline shared by every call.
pub struct Deadline<'a, T: ?Sized> {
    inner: &'a mut T,
    deadline: Option<Instant>,
}

impl<'a, T: ?Sized> Deadline<'a, T> {
    pub fn new(inner: &'a mut T, timeout: Option<Duration>) -> Self {
        Self {
            inner,
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    /// Time left before the deadline, `TimedOut` once it has passed.
    pub fn remaining(&self) -> io::Result<Option<Duration>> {
        match self.deadline {
            None => Ok(None),
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    Err(io::Error::from(io::ErrorKind::TimedOut))
                } else {
                    Ok(Some(left))
                }
            }
        }
    }
}

impl<T: TransportRead + ?Sized> io::Read for Deadline<'_, T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let timeout = self.remaining()?;
        self.inner.timed_read(buf, timeout)
    }
}

impl<T: TransportWrite + ?Sized> io::Write for Deadline<'_, T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let timeout = self.remaining()?;
        self.inner.timed_write(buf, timeout)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Socket timeouts reject zero, which the deadline never passes on anyway.
fn socket_timeout(timeout: Option<Duration>) -> io::Result<Option<Duration>> {
    match timeout {
        Some(t) if t.is_zero() => Err(io::Error::from(io::ErrorKind::TimedOut)),
        other => Ok(other),
    }
}

impl TransportRead for TcpStream {
    fn timed_read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> io::Result<usize> {
        self.set_read_timeout(socket_timeout(timeout)?)?;
        io::Read::read(self, buf)
    }
}

impl TransportWrite for TcpStream {
    fn timed_write(&mut self, buf: &[u8], timeout: Option<Duration>) -> io::Result<usize> {
        self.set_write_timeout(socket_timeout(timeout)?)?;
        io::Write::write(self, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Transport that never produces data.
    struct Silent;

    impl TransportRead for Silent {
        fn timed_read(&mut self, _buf: &mut [u8], timeout: Option<Duration>) -> io::Result<usize> {
            if let Some(t) = timeout {
                std::thread::sleep(t);
            }
            Err(io::Error::from(io::ErrorKind::TimedOut))
        }
    }

    #[test]
    fn test_deadline_expires() {
        let mut silent = Silent;
        let mut reader = Deadline::new(&mut silent, Some(Duration::from_millis(5)));
        let mut buf = [0u8; 4];
        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_tcp_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut client = TcpStream::connect(addr).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let mut writer = Deadline::new(&mut client, Some(Duration::from_secs(1)));
        writer.write_all(b"ping").unwrap();

        let mut buf = [0u8; 4];
        let mut reader = Deadline::new(&mut server, Some(Duration::from_secs(1)));
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");

        let err = server
            .timed_read(&mut buf, Some(Duration::from_millis(10)))
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
        ));
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process copying pipe.
//!
//! Every write copies at most `max_chunk` bytes into one chunk and queues
//! it; every read hands out at most `max_chunk` bytes. Small chunks split
//! messages across calls, which is how the channel's reassembly is tested.

use super::{TransportRead, TransportWrite};
use crate::ring::RingStream;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use std::io;
use std::time::Duration;

/// Pipe parameters.
#[derive(Debug, Clone, Copy)]
pub struct PipeBuilder {
    max_chunk: usize,
    depth: Option<usize>,
}

impl Default for PipeBuilder {
    fn default() -> Self {
        Self {
            max_chunk: usize::MAX,
            depth: None,
        }
    }
}

impl PipeBuilder {
    /// Largest byte count moved by a single read or write.
    #[must_use]
    pub fn max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = max_chunk.max(1);
        self
    }

    /// Number of chunks in flight before writes block.
    #[must_use]
    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn open(self) -> (PipeWriter, PipeReader) {
        let (tx, rx) = match self.depth {
            Some(depth) => channel::bounded(depth),
            None => channel::unbounded(),
        };
        (
            PipeWriter {
                tx,
                max_chunk: self.max_chunk,
            },
            PipeReader {
                rx,
                pending: RingStream::new(),
                max_chunk: self.max_chunk,
            },
        )
    }
}

/// Unbounded pipe with unlimited chunk size.
pub fn pipe() -> (PipeWriter, PipeReader) {
    PipeBuilder::default().open()
}

/// Sending end of a pipe. Dropping it closes the pipe.
#[derive(Debug)]
pub struct PipeWriter {
    tx: Sender<Vec<u8>>,
    max_chunk: usize,
}

/// Receiving end of a pipe.
#[derive(Debug)]
pub struct PipeReader {
    rx: Receiver<Vec<u8>>,
    pending: RingStream,
    max_chunk: usize,
}

impl TransportWrite for PipeWriter {
    fn timed_write(&mut self, buf: &[u8], timeout: Option<Duration>) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let chunk = buf[..buf.len().min(self.max_chunk)].to_vec();
        let len = chunk.len();
        let sent = match timeout {
            Some(timeout) => self.tx.send_timeout(chunk, timeout).map_err(|e| match e {
                SendTimeoutError::Timeout(_) => io::ErrorKind::TimedOut,
                SendTimeoutError::Disconnected(_) => io::ErrorKind::BrokenPipe,
            }),
            None => self.tx.send(chunk).map_err(|_| io::ErrorKind::BrokenPipe),
        };
        sent.map(|()| len).map_err(io::Error::from)
    }
}

impl TransportRead for PipeReader {
    fn timed_read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pending.is_empty() {
            let received = match timeout {
                Some(timeout) => self.rx.recv_timeout(timeout),
                None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(chunk) => self.pending.write(&chunk),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(io::Error::from(io::ErrorKind::TimedOut))
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(0),
            };
        }
        let limit = buf.len().min(self.max_chunk);
        Ok(self.pending.read(&mut buf[..limit]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunked_transfer() {
        let (mut writer, mut reader) = PipeBuilder::default().max_chunk(3).open();
        assert_eq!(writer.timed_write(b"abcdefg", None).unwrap(), 3);
        assert_eq!(writer.timed_write(b"defg", None).unwrap(), 3);

        let mut buf = [0u8; 8];
        assert_eq!(reader.timed_read(&mut buf, None).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(reader.timed_read(&mut buf, None).unwrap(), 3);
        assert_eq!(&buf[..3], b"def");
    }

    #[test]
    fn test_read_times_out() {
        let (_writer, mut reader) = pipe();
        let mut buf = [0u8; 4];
        let err = reader
            .timed_read(&mut buf, Some(Duration::from_millis(5)))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_closed_pipe_reads_zero_after_drain() {
        let (mut writer, mut reader) = pipe();
        writer.timed_write(b"xy", None).unwrap();
        drop(writer);

        let mut buf = [0u8; 1];
        assert_eq!(reader.timed_read(&mut buf, None).unwrap(), 1);
        assert_eq!(reader.timed_read(&mut buf, None).unwrap(), 1);
        assert_eq!(reader.timed_read(&mut buf, None).unwrap(), 0);
    }

    #[test]
    fn test_full_pipe_write_times_out() {
        let (mut writer, _reader) = PipeBuilder::default().depth(1).open();
        writer.timed_write(b"a", Some(Duration::from_millis(5))).unwrap();
        let err = writer
            .timed_write(b"b", Some(Duration::from_millis(5)))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_write_to_closed_pipe() {
        let (mut writer, reader) = pipe();
        drop(reader);
        let err = writer.timed_write(b"a", None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}

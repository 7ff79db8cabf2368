// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message framing over a byte transport.
//!
//! Each direction owns a [`RingStream`]. Sending encodes straight into the
//! send ring and drains it into the transport; receiving pulls transport
//! bytes into the receive ring until a whole message decodes from its
//! split view. Neither direction copies through a scratch buffer.
//!
//! Received point arrays live in storage the receiver reuses: hand a
//! handled message back with `recycle` and the next one decodes into the
//! same allocation.
//!
//! A send that times out leaves its unsent bytes queued, and the next send
//! drains them first, so the byte stream stays in order. A receive that
//! times out keeps any partial message buffered for the next call.

use crate::error::{Error, Result};
use crate::proto::{AppMsg, Decode, DecodeError, Encode, McuMsg, Point, POINT_SIZE};
use crate::ring::RingStream;
use crate::transport::{Deadline, TransportRead, TransportWrite};
use std::io;
use std::marker::PhantomData;
use std::time::Duration;

/// Sending half: encodes and drains messages into a transport writer.
#[derive(Debug)]
pub struct MessageSender<W> {
    writer: W,
    buffer: RingStream,
    max_len: usize,
}

/// Receiving half: reassembles messages of type `In` from a transport reader.
#[derive(Debug)]
pub struct MessageReceiver<R, In> {
    reader: R,
    buffer: RingStream,
    max_len: usize,
    spare: Vec<Point>,
    _message: PhantomData<fn() -> In>,
}

/// Bidirectional channel: sends any [`Encode`] message, receives `In`.
#[derive(Debug)]
pub struct MessageChannel<R, W, In> {
    sender: MessageSender<W>,
    receiver: MessageReceiver<R, In>,
}

/// Device side of the link: receives host messages.
pub type DeviceChannel<R, W> = MessageChannel<R, W, AppMsg<'static>>;

/// Host side of the link: receives device messages.
pub type HostChannel<R, W> = MessageChannel<R, W, McuMsg<'static>>;

impl<W: TransportWrite> MessageSender<W> {
    pub fn new(writer: W, max_len: usize) -> Self {
        Self {
            writer,
            buffer: RingStream::with_capacity(max_len),
            max_len,
        }
    }

    pub fn max_message_length(&self) -> usize {
        self.max_len
    }

    /// Bytes accepted by earlier sends but not yet taken by the transport.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Encode `msg` and drain the send buffer before `timeout` elapses.
    ///
    /// Messages longer than the limit are rejected before anything is
    /// queued.
    pub fn send<M: Encode + ?Sized>(&mut self, msg: &M, timeout: Option<Duration>) -> Result<()> {
        let size = msg.encoded_len();
        if size > self.max_len {
            return Err(Error::MessageTooLong {
                size,
                max: self.max_len,
            });
        }
        msg.encode(&mut self.buffer)?;
        self.flush(timeout)
    }

    /// Drain queued bytes into the transport.
    pub fn flush(&mut self, timeout: Option<Duration>) -> Result<()> {
        let mut out = Deadline::new(&mut self.writer, timeout);
        while !self.buffer.is_empty() {
            match self.buffer.write_to(&mut out, None) {
                Ok(0) => return Err(Error::UnexpectedEnd),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<R: TransportRead, In: Decode> MessageReceiver<R, In> {
    pub fn new(reader: R, max_len: usize) -> Self {
        Self {
            reader,
            buffer: RingStream::with_capacity(2 * max_len),
            max_len,
            spare: Vec::with_capacity(max_len / POINT_SIZE),
            _message: PhantomData,
        }
    }

    pub fn max_message_length(&self) -> usize {
        self.max_len
    }

    /// Bytes received but not yet consumed by a decoded message.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Wait at most `timeout` for one complete message.
    ///
    /// Undecodable input discards everything buffered, since the stream
    /// position of the next message is unknown.
    pub fn receive(&mut self, timeout: Option<Duration>) -> Result<In> {
        let mut input = Deadline::new(&mut self.reader, timeout);
        loop {
            match try_decode(&mut self.buffer, self.max_len, &mut self.spare) {
                Ok(Some(msg)) => return Ok(msg),
                Ok(None) => {}
                Err(e) => {
                    log::debug!(
                        "[channel] dropping {} buffered bytes: {}",
                        self.buffer.len(),
                        e
                    );
                    self.buffer.queue_mut().clear();
                    return Err(e.into());
                }
            }

            match self.buffer.read_from(&mut input, Some(self.max_len)) {
                Ok(0) => return Err(Error::UnexpectedEnd),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Return a handled message's point storage for reuse.
    pub fn recycle(&mut self, msg: In) {
        msg.recycle(&mut self.spare);
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Decode one message from the front of `buffer`, consuming its bytes.
///
/// `Ok(None)` means more bytes are needed. The body is decoded only once
/// the whole announced length is buffered.
fn try_decode<In: Decode>(
    buffer: &mut RingStream,
    max_len: usize,
    spare: &mut Vec<Point>,
) -> std::result::Result<Option<In>, DecodeError> {
    let mut view = buffer.queue().as_slices();
    let buffered = view.len();
    if buffered == 0 {
        return Ok(None);
    }
    let mut header = view;
    let len = match In::frame_len(&mut header) {
        Ok(len) => len,
        Err(DecodeError::Incomplete) => return Ok(None),
        Err(e) => return Err(e),
    };
    if len > max_len {
        return Err(DecodeError::Oversized { len, max: max_len });
    }
    if buffered < len {
        return Ok(None);
    }
    let msg = In::decode_with(&mut view, spare)?;
    let consumed = buffered - view.len();
    buffer.queue_mut().skip_front(consumed);
    Ok(Some(msg))
}

impl<R: TransportRead, W: TransportWrite, In: Decode> MessageChannel<R, W, In> {
    /// Build a channel over a transport's two halves.
    pub fn new(reader: R, writer: W, max_len: usize) -> Self {
        Self {
            sender: MessageSender::new(writer, max_len),
            receiver: MessageReceiver::new(reader, max_len),
        }
    }

    pub fn max_message_length(&self) -> usize {
        self.sender.max_message_length()
    }

    pub fn send<M: Encode + ?Sized>(&mut self, msg: &M, timeout: Option<Duration>) -> Result<()> {
        self.sender.send(msg, timeout)
    }

    pub fn receive(&mut self, timeout: Option<Duration>) -> Result<In> {
        self.receiver.receive(timeout)
    }

    pub fn recycle(&mut self, msg: In) {
        self.receiver.recycle(msg);
    }

    /// Separate the directions so two threads can drive them.
    pub fn split(self) -> (MessageSender<W>, MessageReceiver<R, In>) {
        (self.sender, self.receiver)
    }

    pub fn sender(&mut self) -> &mut MessageSender<W> {
        &mut self.sender
    }

    pub fn receiver(&mut self) -> &mut MessageReceiver<R, In> {
        &mut self.receiver
    }
}

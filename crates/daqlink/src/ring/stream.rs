// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! FIFO stream interface over a [`RingBuffer`].
//!
//! Bulk reads and writes move at most two contiguous regions, and the
//! byte specialization pumps data between the queue and any
//! [`io::Read`]/[`io::Write`] transport without an intermediate copy.

use super::RingBuffer;
use crate::error::{Error, Result};
use std::io;
use std::mem::MaybeUninit;
use std::ptr;

/// Stream adapter owning a ring buffer.
#[derive(Debug, Default)]
pub struct RingStream<T = u8> {
    queue: RingBuffer<T>,
}

impl<T> RingStream<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: RingBuffer::new(),
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: RingBuffer::with_capacity(capacity),
        }
    }

    /// Stream whose storage never grows; writes past capacity are truncated.
    #[must_use]
    pub fn fixed(capacity: usize) -> Self {
        Self {
            queue: RingBuffer::fixed(capacity),
        }
    }

    pub fn from_queue(queue: RingBuffer<T>) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &RingBuffer<T> {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut RingBuffer<T> {
        &mut self.queue
    }

    pub fn into_inner(self) -> RingBuffer<T> {
        self.queue
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Copy `src` into the front of `dst`.
fn write_slots<T: Copy>(dst: &mut [MaybeUninit<T>], src: &[T]) {
    assert!(src.len() <= dst.len());
    // SAFETY: both regions are valid for src.len() elements, they belong
    // to different allocations, and MaybeUninit<T> has T's layout.
    unsafe {
        ptr::copy_nonoverlapping(src.as_ptr(), dst.as_mut_ptr().cast::<T>(), src.len());
    }
}

/// Zero uninitialized bytes so they can be lent to [`io::Read`].
fn zeroed(slots: &mut [MaybeUninit<u8>]) -> &mut [u8] {
    for slot in slots.iter_mut() {
        slot.write(0);
    }
    // SAFETY: every slot was initialized just above.
    unsafe { &mut *(slots as *mut [MaybeUninit<u8>] as *mut [u8]) }
}

impl<T: Copy> RingStream<T> {
    /// Pop up to `dst.len()` elements into `dst`; returns the count moved.
    pub fn read(&mut self, dst: &mut [T]) -> usize {
        let n = self.queue.as_slices().copy_prefix(dst);
        self.queue.skip_front(n);
        n
    }

    /// Fill `dst` entirely, or fail with [`Error::UnexpectedEnd`] and
    /// consume nothing.
    pub fn read_exact(&mut self, dst: &mut [T]) -> Result<()> {
        if dst.len() > self.queue.len() {
            return Err(Error::UnexpectedEnd);
        }
        self.read(dst);
        Ok(())
    }

    /// Push `src` onto the back.
    ///
    /// Growable storage takes everything; fixed storage takes what fits.
    /// Returns the count accepted.
    pub fn write(&mut self, src: &[T]) -> usize {
        let len = match self.queue.grow_to_free(src.len()) {
            Ok(()) => src.len(),
            Err(_) => src.len().min(self.queue.free()),
        };

        let (first, second) = self.queue.free_space_as_slices();
        let left = first.len().min(len);
        write_slots(&mut first[..left], &src[..left]);
        write_slots(&mut second[..len - left], &src[left..len]);

        // SAFETY: the first `len` free slots were written above.
        unsafe { self.queue.expand_back(len) };
        len
    }

    /// Push all of `src`, or fail with [`Error::Overflow`] and push nothing.
    pub fn write_exact(&mut self, src: &[T]) -> Result<()> {
        self.queue.grow_to_free(src.len())?;
        let written = self.write(src);
        debug_assert_eq!(written, src.len());
        Ok(())
    }
}

impl RingStream<u8> {
    /// Fill free space straight from `src`.
    ///
    /// With a bound, performs at most two reads into the free regions and
    /// returns how many bytes arrived. `Ok(0)` with a non-zero bound means
    /// the source is at end-of-stream. Without a bound, keeps reading and
    /// growing until the source returns short. An error on the first read
    /// is returned as is; an error on the second read is swallowed and the
    /// first read's bytes are reported.
    pub fn read_from<R: io::Read + ?Sized>(
        &mut self,
        src: &mut R,
        len: Option<usize>,
    ) -> io::Result<usize> {
        match len {
            Some(len) => self.read_from_bounded(src, len),
            None => self.read_from_unbounded(src),
        }
    }

    fn read_from_bounded<R: io::Read + ?Sized>(
        &mut self,
        src: &mut R,
        len: usize,
    ) -> io::Result<usize> {
        let len = match self.queue.grow_to_free(len) {
            Ok(()) => len,
            Err(_) => len.min(self.queue.free()),
        };

        let (first, second) = self.queue.free_space_as_slices();
        let left_len = first.len().min(len);
        let right_len = second.len().min(len - left_len);
        let left = zeroed(&mut first[..left_len]);
        let right = zeroed(&mut second[..right_len]);

        let got = src.read(left)?;
        if got < left_len || right_len == 0 {
            // SAFETY: `got` leading free slots were zeroed then filled.
            unsafe { self.queue.expand_back(got) };
            return Ok(got);
        }

        let extra = src.read(right).unwrap_or(0);
        // SAFETY: left_len + extra leading free slots were zeroed then filled.
        unsafe { self.queue.expand_back(left_len + extra) };
        Ok(left_len + extra)
    }

    fn read_from_unbounded<R: io::Read + ?Sized>(&mut self, src: &mut R) -> io::Result<usize> {
        let mut total = 0;
        loop {
            let free = self.queue.free();
            if free > 0 {
                let got = self.read_from_bounded(src, free)?;
                total += got;
                if got < free {
                    return Ok(total);
                }
            }
            if self.queue.is_fixed() {
                return Ok(total);
            }
            self.queue.grow();
        }
    }

    /// Drain queued bytes straight into `dst`, at most `len` of them (all
    /// when `None`).
    ///
    /// Same error contract as [`read_from`](Self::read_from). Only the bytes
    /// the sink accepted are removed from the queue.
    pub fn write_to<W: io::Write + ?Sized>(
        &mut self,
        dst: &mut W,
        len: Option<usize>,
    ) -> io::Result<usize> {
        let queued = self.queue.len();
        let len = len.map_or(queued, |len| len.min(queued));

        let (first, second) = self.queue.as_slices().into_slices();
        let left_len = first.len().min(len);
        let right_len = second.len().min(len - left_len);

        let mut sent = dst.write(&first[..left_len])?;
        if sent == left_len && right_len > 0 {
            sent += dst.write(&second[..right_len]).unwrap_or(0);
        }

        self.queue.skip_front(sent);
        Ok(sent)
    }
}

impl io::Read for RingStream<u8> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(RingStream::read(self, buf))
    }
}

impl io::Write for RingStream<u8> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(RingStream::write(self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read-only split view over a ring buffer's live region.

use std::io;
use std::iter::Chain;
use std::slice;

/// Iterator over a split view, front to back.
pub type Iter<'a, T> = Chain<slice::Iter<'a, T>, slice::Iter<'a, T>>;

/// Two borrowed slices forming one logical sequence.
///
/// `first` is empty only when the whole view is empty, so a consumer that
/// wants a contiguous prefix can always look at [`first`](Self::first).
pub struct RingBufferView<'a, T> {
    first: &'a [T],
    second: &'a [T],
}

impl<'a, T> RingBufferView<'a, T> {
    pub fn new(first: &'a [T], second: &'a [T]) -> Self {
        let mut view = Self { first, second };
        view.normalize();
        view
    }

    fn normalize(&mut self) {
        if self.first.is_empty() {
            self.first = std::mem::take(&mut self.second);
        }
    }

    #[inline]
    pub fn first(&self) -> &'a [T] {
        self.first
    }

    #[inline]
    pub fn second(&self) -> &'a [T] {
        self.second
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.first.len() + self.second.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    pub fn into_slices(self) -> (&'a [T], &'a [T]) {
        (self.first, self.second)
    }

    pub fn get(&self, index: usize) -> Option<&'a T> {
        match index.checked_sub(self.first.len()) {
            None => self.first.get(index),
            Some(rest) => self.second.get(rest),
        }
    }

    /// Take the first element off the view.
    pub fn pop_front(&mut self) -> Option<&'a T> {
        let (head, rest) = self.first.split_first()?;
        self.first = rest;
        self.normalize();
        Some(head)
    }

    /// Advance past up to `count` elements; returns how many were skipped.
    pub fn skip_front(&mut self, count: usize) -> usize {
        let skip = count.min(self.len());
        if skip < self.first.len() {
            self.first = &self.first[skip..];
        } else {
            let rest = skip - self.first.len();
            self.first = &self.second[rest..];
            self.second = &[];
        }
        skip
    }

    pub fn iter(&self) -> Iter<'a, T> {
        self.first.iter().chain(self.second.iter())
    }

    /// Copy the longest possible prefix into `dst` without consuming it.
    pub fn copy_prefix(&self, dst: &mut [T]) -> usize
    where
        T: Copy,
    {
        let left = self.first.len().min(dst.len());
        dst[..left].copy_from_slice(&self.first[..left]);
        let right = self.second.len().min(dst.len() - left);
        dst[left..left + right].copy_from_slice(&self.second[..right]);
        left + right
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(self.first);
        out.extend_from_slice(self.second);
        out
    }
}

impl<T> Clone for RingBufferView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RingBufferView<'_, T> {}

impl<T: std::fmt::Debug> std::fmt::Debug for RingBufferView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for RingBufferView<'a, T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Consuming byte reads, used by the wire decoders.
impl io::Read for RingBufferView<'_, u8> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.copy_prefix(buf);
        self.skip_front(n);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_normalizes_empty_first() {
        let view = RingBufferView::new(&[], &[1, 2]);
        assert_eq!(view.first(), &[1, 2]);
        assert!(view.second().is_empty());
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_skip_across_boundary() {
        let mut view = RingBufferView::new(&[1, 2, 3], &[4, 5]);
        assert_eq!(view.skip_front(4), 4);
        assert_eq!(view.first(), &[5]);
        assert!(view.second().is_empty());
        assert_eq!(view.skip_front(3), 1);
        assert!(view.is_empty());
    }

    #[test]
    fn test_pop_front_moves_to_second() {
        let mut view = RingBufferView::new(&[1], &[2]);
        assert_eq!(view.pop_front(), Some(&1));
        assert_eq!(view.first(), &[2]);
        assert_eq!(view.pop_front(), Some(&2));
        assert_eq!(view.pop_front(), None);
    }

    #[test]
    fn test_get_spans_both_slices() {
        let view = RingBufferView::new(&[1, 2], &[3]);
        assert_eq!(view.get(0), Some(&1));
        assert_eq!(view.get(2), Some(&3));
        assert_eq!(view.get(3), None);
    }

    #[test]
    fn test_copy_prefix_is_non_consuming() {
        let view = RingBufferView::new(&[1, 2], &[3, 4]);
        let mut dst = [0; 3];
        assert_eq!(view.copy_prefix(&mut dst), 3);
        assert_eq!(dst, [1, 2, 3]);
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn test_read_consumes_bytes() {
        let mut view = RingBufferView::new(b"ab", b"cd");
        let mut buf = [0u8; 3];
        view.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");
        assert_eq!(view.to_vec(), b"d");
        assert!(view.read_exact(&mut buf).is_err());
    }
}

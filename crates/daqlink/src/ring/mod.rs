// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Growable circular queue over uninitialized slot storage.
//!
//! # Memory Layout
//!
//! ```text
//!  modulus = capacity + 1 slots (one slot always kept empty)
//! +-----+-----+-----+-----+-----+-----+-----+-----+
//! |  F  |  F  |  L  |  L  |  L  |  L  |  F  |  F  |   L = live, F = free
//! +-----+-----+-----+-----+-----+-----+-----+-----+
//!              ^front                  ^back
//! ```
//!
//! Slots in `[front, back)` (circularly) hold initialized values; every
//! other slot is raw storage that is only ever written. The live region
//! and the free region are each exposed as at most two contiguous slices,
//! so bulk transfers across the wrap boundary cost two copies at most.
//!
//! All `unsafe` in the crate that touches element storage lives in this
//! module.

pub mod stream;
pub mod view;

pub use stream::RingStream;
pub use view::RingBufferView;

use crate::error::{Error, Result};
use std::fmt;
use std::mem::{self, MaybeUninit};
use std::ops::Range;
use std::ptr;

/// Circular double-ended queue.
///
/// Growable buffers double their slot count whenever they run out of
/// space. Fixed buffers never reallocate and reject insertions when full,
/// which is what real-time sample paths need.
pub struct RingBuffer<T> {
    /// Slot storage, `data.len()` is the modulus
    data: Box<[MaybeUninit<T>]>,
    /// Index of the first live slot
    front: usize,
    /// Index one past the last live slot
    back: usize,
    /// Reject growth when set
    fixed: bool,
}

fn alloc_slots<T>(count: usize) -> Box<[MaybeUninit<T>]> {
    let mut slots = Vec::with_capacity(count);
    slots.resize_with(count, MaybeUninit::uninit);
    slots.into_boxed_slice()
}

/// Reinterpret initialized slots as values.
///
/// # Safety
///
/// Every slot in `slots` must be initialized.
unsafe fn assume_init_slice<T>(slots: &[MaybeUninit<T>]) -> &[T] {
    // SAFETY: MaybeUninit<T> is layout-compatible with T and the caller
    // guarantees initialization.
    unsafe { &*(slots as *const [MaybeUninit<T>] as *const [T]) }
}

/// Mutable variant of [`assume_init_slice`].
///
/// # Safety
///
/// Every slot in `slots` must be initialized.
unsafe fn assume_init_slice_mut<T>(slots: &mut [MaybeUninit<T>]) -> &mut [T] {
    // SAFETY: see assume_init_slice.
    unsafe { &mut *(slots as *mut [MaybeUninit<T>] as *mut [T]) }
}

impl<T> RingBuffer<T> {
    /// Create an empty growable buffer without allocating.
    #[must_use]
    pub fn new() -> Self {
        Self::with_modulus(0, false)
    }

    /// Create a growable buffer able to hold `capacity` elements before
    /// its first reallocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_modulus(modulus_for(capacity), false)
    }

    /// Create a fixed-capacity buffer.
    #[must_use]
    pub fn fixed(capacity: usize) -> Self {
        Self::with_modulus(modulus_for(capacity), true)
    }

    fn with_modulus(modulus: usize, fixed: bool) -> Self {
        Self {
            data: alloc_slots(modulus),
            front: 0,
            back: 0,
            fixed,
        }
    }

    #[inline]
    fn modulus(&self) -> usize {
        self.data.len()
    }

    /// Number of elements the buffer can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.modulus().saturating_sub(1)
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        let modulus = self.modulus();
        if modulus == 0 {
            0
        } else {
            (self.back + modulus - self.front) % modulus
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.front == self.back
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Number of uninitialized slots available without reallocating.
    #[inline]
    pub fn free(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Whether the buffer refuses to grow.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Live slot ranges, in logical order.
    fn live_ranges(&self) -> (Range<usize>, Range<usize>) {
        if self.front <= self.back {
            (self.front..self.back, 0..0)
        } else {
            (self.front..self.modulus(), 0..self.back)
        }
    }

    /// Free slot ranges, in the order they follow `back`.
    ///
    /// The slot right before `front` is never handed out.
    fn free_ranges(&self) -> (Range<usize>, Range<usize>) {
        let modulus = self.modulus();
        if modulus == 0 {
            (0..0, 0..0)
        } else if self.back < self.front {
            (self.back..self.front - 1, 0..0)
        } else if self.front == 0 {
            (self.back..modulus - 1, 0..0)
        } else {
            (self.back..modulus, 0..self.front - 1)
        }
    }

    /// Reallocate to `new_modulus` slots, moving live elements to the start.
    fn reserve_modulus(&mut self, new_modulus: usize) {
        if self.fixed || new_modulus <= self.modulus().max(1) {
            return;
        }

        let len = self.len();
        let (first, second) = self.live_ranges();
        let mut data = alloc_slots::<T>(new_modulus);

        // SAFETY:
        // - `first` and `second` are the live ranges, both in bounds of the
        //   old storage and holding initialized values
        // - The new storage has new_modulus > len slots, so both copies fit
        // - Source and destination are distinct allocations
        // - Values are moved bitwise; the old storage is a slice of
        //   MaybeUninit and will not drop them when it is released below
        unsafe {
            let src = self.data.as_ptr();
            let dst = data.as_mut_ptr();
            ptr::copy_nonoverlapping(src.add(first.start), dst, first.len());
            ptr::copy_nonoverlapping(src.add(second.start), dst.add(first.len()), second.len());
        }

        self.data = data;
        self.front = 0;
        self.back = len;
    }

    /// Double the slot count (or start at two slots).
    fn grow(&mut self) {
        let modulus = self.modulus();
        if modulus > 1 {
            self.reserve_modulus(2 * modulus);
        } else {
            self.reserve_modulus(2);
        }
    }

    /// Ensure the buffer can hold `capacity` elements in total.
    ///
    /// Fails with [`Error::Overflow`] only for fixed buffers.
    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        if self.fixed {
            if capacity > self.capacity() {
                return Err(Error::Overflow {
                    requested: capacity - self.len(),
                    available: self.free(),
                });
            }
            return Ok(());
        }
        self.reserve_modulus(modulus_for(capacity));
        Ok(())
    }

    /// Ensure at least `count` free slots follow the live region.
    ///
    /// Growable buffers double their slot count until the request fits.
    /// Fixed buffers fail with [`Error::Overflow`] when it does not.
    pub fn grow_to_free(&mut self, count: usize) -> Result<()> {
        if self.fixed {
            if count > self.free() {
                return Err(Error::Overflow {
                    requested: count,
                    available: self.free(),
                });
            }
            return Ok(());
        }

        let needed = self.len() + count + 1;
        let mut modulus = self.modulus().max(2);
        while modulus < needed {
            modulus *= 2;
        }
        self.reserve_modulus(modulus);
        Ok(())
    }

    #[inline]
    fn push_back_unchecked(&mut self, value: T) {
        let modulus = self.modulus();
        self.data[self.back].write(value);
        self.back = (self.back + 1) % modulus;
    }

    #[inline]
    fn push_front_unchecked(&mut self, value: T) {
        let modulus = self.modulus();
        self.front = (self.front + modulus - 1) % modulus;
        self.data[self.front].write(value);
    }

    /// Append an element at the back.
    ///
    /// Growable buffers never fail. A full fixed buffer hands the value back.
    pub fn push_back(&mut self, value: T) -> std::result::Result<(), T> {
        if self.is_full() {
            if self.fixed {
                return Err(value);
            }
            self.grow();
        }
        self.push_back_unchecked(value);
        Ok(())
    }

    /// Prepend an element at the front.
    ///
    /// Growable buffers never fail. A full fixed buffer hands the value back.
    pub fn push_front(&mut self, value: T) -> std::result::Result<(), T> {
        if self.is_full() {
            if self.fixed {
                return Err(value);
            }
            self.grow();
        }
        self.push_front_unchecked(value);
        Ok(())
    }

    /// Remove and return the first element.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the buffer is non-empty, so `front` is a live slot. It
        // leaves the live region right after the read and is never read again.
        let value = unsafe { self.data[self.front].assume_init_read() };
        self.front = (self.front + 1) % self.modulus();
        Some(value)
    }

    /// Remove and return the last element.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let modulus = self.modulus();
        self.back = (self.back + modulus - 1) % modulus;
        // SAFETY: the slot before the old `back` was the last live slot; it
        // has just left the live region and is never read again.
        Some(unsafe { self.data[self.back].assume_init_read() })
    }

    /// Reference to the element at logical position `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len() {
            return None;
        }
        let slot = (self.front + index) % self.modulus();
        // SAFETY: index < len, so the slot lies in the live region.
        Some(unsafe { self.data[slot].assume_init_ref() })
    }

    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn back(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|last| self.get(last))
    }

    /// Drop up to `count` elements from the front.
    ///
    /// Returns how many were actually removed; callers compare it with
    /// `count` to detect truncation.
    pub fn skip_front(&mut self, count: usize) -> usize {
        let skip = count.min(self.len());
        if skip == 0 {
            return 0;
        }
        if mem::needs_drop::<T>() {
            for _ in 0..skip {
                drop(self.pop_front());
            }
        } else {
            self.front = (self.front + skip) % self.modulus();
        }
        skip
    }

    /// Drop up to `count` elements from the back.
    pub fn skip_back(&mut self, count: usize) -> usize {
        let skip = count.min(self.len());
        if skip == 0 {
            return 0;
        }
        if mem::needs_drop::<T>() {
            for _ in 0..skip {
                drop(self.pop_back());
            }
        } else {
            let modulus = self.modulus();
            self.back = (self.back + modulus - skip) % modulus;
        }
        skip
    }

    /// Drop every element, keeping the storage.
    pub fn clear(&mut self) {
        self.skip_front(self.len());
        self.front = 0;
        self.back = 0;
    }

    /// Move the contents out, leaving an empty growable buffer behind.
    #[must_use]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Live contents as a split view.
    pub fn as_slices(&self) -> RingBufferView<'_, T> {
        let (first, second) = self.live_ranges();
        // SAFETY: both ranges are the live region and hold initialized values.
        unsafe {
            RingBufferView::new(
                assume_init_slice(&self.data[first]),
                assume_init_slice(&self.data[second]),
            )
        }
    }

    /// Live contents as two mutable slices, in logical order.
    pub fn as_mut_slices(&mut self) -> (&mut [T], &mut [T]) {
        let (front, back) = (self.front, self.back);
        let (first, second): (&mut [MaybeUninit<T>], &mut [MaybeUninit<T>]) = if front <= back {
            (&mut self.data[front..back], Default::default())
        } else {
            let (head, tail) = self.data.split_at_mut(front);
            (tail, &mut head[..back])
        };
        // SAFETY: the two slices are exactly the live region.
        unsafe { (assume_init_slice_mut(first), assume_init_slice_mut(second)) }
    }

    /// Uninitialized capacity as two writable slices, in the order slots
    /// follow the live region.
    ///
    /// Fill a prefix of this sequence, then commit it with
    /// [`expand_back`](Self::expand_back).
    pub fn free_space_as_slices(&mut self) -> (&mut [MaybeUninit<T>], &mut [MaybeUninit<T>]) {
        let (first, second) = self.free_ranges();
        let (head, tail) = self.data.split_at_mut(first.start);
        (&mut tail[..first.len()], &mut head[second])
    }

    /// Commit `count` slots written through
    /// [`free_space_as_slices`](Self::free_space_as_slices) as live elements
    /// at the back.
    ///
    /// # Safety
    ///
    /// The first `count` slots of the free-space sequence (first slice, then
    /// second) must have been initialized.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the free space.
    pub unsafe fn expand_back(&mut self, count: usize) {
        assert!(
            count <= self.free(),
            "expand_back({count}) exceeds free space {}",
            self.free()
        );
        if count != 0 {
            self.back = (self.back + count) % self.modulus();
        }
    }

    /// Commit `count` slots directly before the live region as live
    /// elements at the front.
    ///
    /// # Safety
    ///
    /// The `count` slots immediately preceding the first live slot,
    /// circularly, must have been initialized.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the free space.
    pub unsafe fn expand_front(&mut self, count: usize) {
        assert!(
            count <= self.free(),
            "expand_front({count}) exceeds free space {}",
            self.free()
        );
        if count != 0 {
            let modulus = self.modulus();
            self.front = (self.front + modulus - count) % modulus;
        }
    }

    /// Move every element of `other` onto the back, leaving `other` empty.
    ///
    /// Fails without moving anything if a fixed buffer lacks the space.
    pub fn append(&mut self, other: &mut Self) -> Result<()> {
        self.reserve(self.len() + other.len())?;
        while let Some(value) = other.pop_front() {
            self.push_back_unchecked(value);
        }
        other.front = 0;
        other.back = 0;
        Ok(())
    }

    /// Iterate over the elements front to back.
    pub fn iter(&self) -> view::Iter<'_, T> {
        self.as_slices().into_iter()
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Clone every element of `other` onto the back.
    pub fn append_copy(&mut self, other: &Self) -> Result<()> {
        self.reserve(self.len() + other.len())?;
        for value in other.iter() {
            self.push_back_unchecked(value.clone());
        }
        Ok(())
    }
}

/// Slot count for a requested element capacity.
#[inline]
fn modulus_for(capacity: usize) -> usize {
    if capacity == 0 {
        0
    } else {
        capacity + 1
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for RingBuffer<T> {
    fn clone(&self) -> Self {
        let mut copy = if self.fixed {
            Self::fixed(self.capacity())
        } else {
            Self::with_capacity(self.len())
        };
        for value in self.iter() {
            copy.push_back_unchecked(value.clone());
        }
        copy
    }
}

impl<T: fmt::Debug> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for RingBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for RingBuffer<T> {}

impl<T> FromIterator<T> for RingBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut buffer = Self::with_capacity(iter.size_hint().0);
        for value in iter {
            if buffer.is_full() {
                buffer.grow();
            }
            buffer.push_back_unchecked(value);
        }
        buffer
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = view::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts drops through a shared cell.
    struct Tracked {
        value: u32,
        drops: Rc<Cell<usize>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn tracked(value: u32, drops: &Rc<Cell<usize>>) -> Tracked {
        Tracked {
            value,
            drops: Rc::clone(drops),
        }
    }

    fn contents<T: Clone>(buffer: &RingBuffer<T>) -> Vec<T> {
        buffer.as_slices().to_vec()
    }

    #[test]
    fn test_new_is_empty() {
        let buffer = RingBuffer::<i32>::new();
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), 0);
        assert!(buffer.is_empty());
        assert!(buffer.as_slices().is_empty());
    }

    #[test]
    fn test_growth_on_full_preserves_order() {
        let mut buffer = RingBuffer::with_capacity(4);
        for i in 1..=4 {
            buffer.push_back(i).unwrap();
        }
        assert_eq!(buffer.capacity(), 4);
        assert!(buffer.is_full());

        buffer.push_back(5).unwrap();
        assert!(buffer.capacity() >= 5);
        assert_eq!(contents(&buffer), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_first_push_allocates_two_slots() {
        let mut buffer = RingBuffer::new();
        buffer.push_back(7u8).unwrap();
        assert_eq!(buffer.capacity(), 1);
        buffer.push_back(8).unwrap();
        assert_eq!(buffer.capacity(), 3);
        assert_eq!(contents(&buffer), vec![7, 8]);
    }

    #[test]
    fn test_push_pop_both_ends() {
        let mut buffer = RingBuffer::new();
        buffer.push_back(2).unwrap();
        buffer.push_front(1).unwrap();
        buffer.push_back(3).unwrap();
        buffer.push_front(0).unwrap();
        assert_eq!(contents(&buffer), vec![0, 1, 2, 3]);

        assert_eq!(buffer.pop_front(), Some(0));
        assert_eq!(buffer.pop_back(), Some(3));
        assert_eq!(buffer.pop_back(), Some(2));
        assert_eq!(buffer.pop_front(), Some(1));
        assert_eq!(buffer.pop_front(), None);
        assert_eq!(buffer.pop_back(), None);
    }

    #[test]
    fn test_wraparound_splits_view() {
        let mut buffer = RingBuffer::with_capacity(4);
        for i in 0..4 {
            buffer.push_back(i).unwrap();
        }
        assert_eq!(buffer.skip_front(3), 3);
        buffer.push_back(4).unwrap();
        buffer.push_back(5).unwrap();
        buffer.push_back(6).unwrap();

        let view = buffer.as_slices();
        assert_eq!(view.first(), &[3, 4]);
        assert_eq!(view.second(), &[5, 6]);
        assert_eq!(view.to_vec(), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_growth_unwraps_storage() {
        let mut buffer = RingBuffer::with_capacity(4);
        for i in 0..4 {
            buffer.push_back(i).unwrap();
        }
        buffer.skip_front(2);
        buffer.push_back(4).unwrap();
        buffer.push_back(5).unwrap();
        buffer.push_back(6).unwrap();

        assert_eq!(contents(&buffer), vec![2, 3, 4, 5, 6]);
        assert!(buffer.as_slices().second().is_empty());
    }

    #[test]
    fn test_fixed_rejects_when_full() {
        let mut buffer = RingBuffer::fixed(2);
        buffer.push_back(1).unwrap();
        buffer.push_back(2).unwrap();
        assert_eq!(buffer.push_back(3), Err(3));
        assert_eq!(buffer.push_front(0), Err(0));
        assert_eq!(buffer.capacity(), 2);
        assert!(matches!(
            buffer.grow_to_free(1),
            Err(Error::Overflow {
                requested: 1,
                available: 0
            })
        ));
    }

    #[test]
    fn test_free_space_commit() {
        let mut buffer = RingBuffer::<u8>::with_capacity(4);
        buffer.push_back(1).unwrap();
        buffer.push_back(2).unwrap();
        buffer.skip_front(2);

        let (first, second) = buffer.free_space_as_slices();
        assert_eq!(first.len() + second.len(), 4);
        let mut next = 10;
        for slot in first.iter_mut().chain(second.iter_mut()) {
            slot.write(next);
            next += 1;
        }
        // SAFETY: all four free slots were written above.
        unsafe { buffer.expand_back(4) };
        assert_eq!(contents(&buffer), vec![10, 11, 12, 13]);
    }

    #[test]
    fn test_expand_front_commits_slots_before_front() {
        let mut buffer = RingBuffer::<u8>::with_capacity(4);
        buffer.push_back(5).unwrap();
        let modulus = buffer.modulus();
        let slot = (buffer.front + modulus - 1) % modulus;
        buffer.data[slot].write(4);
        // SAFETY: the slot directly before `front` was written above.
        unsafe { buffer.expand_front(1) };
        assert_eq!(contents(&buffer), vec![4, 5]);
    }

    #[test]
    #[should_panic(expected = "exceeds free space")]
    fn test_expand_back_beyond_free_panics() {
        let mut buffer = RingBuffer::<u8>::with_capacity(2);
        // SAFETY: the call panics before any slot is committed.
        unsafe { buffer.expand_back(3) };
    }

    #[test]
    fn test_grow_to_free_doubles() {
        let mut buffer = RingBuffer::<u8>::new();
        buffer.grow_to_free(5).unwrap();
        assert!(buffer.free() >= 5);
        assert_eq!(buffer.capacity(), 7);
    }

    #[test]
    fn test_skip_reports_truncation() {
        let mut buffer: RingBuffer<i32> = (0..5).collect();
        assert_eq!(buffer.skip_back(2), 2);
        assert_eq!(buffer.skip_front(10), 3);
        assert!(buffer.is_empty());
        assert_eq!(buffer.skip_front(1), 0);
    }

    #[test]
    fn test_skip_finalizes_each_element() {
        let drops = Rc::new(Cell::new(0));
        let mut buffer = RingBuffer::new();
        for i in 0..6 {
            assert!(buffer.push_back(tracked(i, &drops)).is_ok());
        }
        assert_eq!(buffer.skip_front(2), 2);
        assert_eq!(buffer.skip_back(1), 1);
        assert_eq!(drops.get(), 3);
        assert_eq!(buffer.front().map(|t| t.value), Some(2));
        drop(buffer);
        assert_eq!(drops.get(), 6);
    }

    #[test]
    fn test_take_leaves_source_empty_without_double_drop() {
        let drops = Rc::new(Cell::new(0));
        let mut source = RingBuffer::new();
        for i in 0..4 {
            assert!(source.push_back(tracked(i, &drops)).is_ok());
        }

        let moved = source.take();
        assert_eq!(source.len(), 0);
        assert_eq!(moved.len(), 4);

        drop(source);
        assert_eq!(drops.get(), 0);

        drop(moved);
        assert_eq!(drops.get(), 4);
    }

    #[test]
    fn test_growth_moves_without_dropping() {
        let drops = Rc::new(Cell::new(0));
        let mut buffer = RingBuffer::with_capacity(1);
        for i in 0..20 {
            assert!(buffer.push_back(tracked(i, &drops)).is_ok());
        }
        assert_eq!(drops.get(), 0);
        let values: Vec<u32> = buffer.iter().map(|t| t.value).collect();
        assert_eq!(values, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_append_moves_and_empties_source() {
        let mut a: RingBuffer<i32> = (0..3).collect();
        let mut b: RingBuffer<i32> = (3..7).collect();
        a.append(&mut b).unwrap();
        assert_eq!(contents(&a), vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(b.is_empty());
        b.push_back(9).unwrap();
        assert_eq!(contents(&b), vec![9]);
    }

    #[test]
    fn test_append_copy_keeps_source() {
        let mut a: RingBuffer<String> = ["x".to_string()].into_iter().collect();
        let b: RingBuffer<String> = ["y".to_string(), "z".to_string()].into_iter().collect();
        a.append_copy(&b).unwrap();
        assert_eq!(contents(&a), vec!["x", "y", "z"]);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_append_into_fixed_checks_space() {
        let mut a = RingBuffer::fixed(3);
        a.push_back(1).unwrap();
        let mut b: RingBuffer<i32> = (2..5).collect();
        assert!(a.append(&mut b).is_err());
        assert_eq!(b.len(), 3);
        assert_eq!(contents(&a), vec![1]);
    }

    #[test]
    fn test_clone_preserves_order_across_wrap() {
        let mut buffer = RingBuffer::with_capacity(4);
        for i in 0..4 {
            buffer.push_back(i).unwrap();
        }
        buffer.skip_front(3);
        buffer.push_back(4).unwrap();
        buffer.push_back(5).unwrap();

        let copy = buffer.clone();
        assert_eq!(copy, buffer);
        assert_eq!(contents(&copy), vec![3, 4, 5]);
    }

    #[test]
    fn test_mut_slices_edit_in_place() {
        let mut buffer = RingBuffer::with_capacity(3);
        for i in 0..3 {
            buffer.push_back(i).unwrap();
        }
        buffer.skip_front(2);
        buffer.push_back(3).unwrap();
        buffer.push_back(4).unwrap();

        let (first, second) = buffer.as_mut_slices();
        for value in first.iter_mut().chain(second.iter_mut()) {
            *value *= 10;
        }
        assert_eq!(contents(&buffer), vec![20, 30, 40]);
    }

    #[test]
    fn test_get_and_back() {
        let buffer: RingBuffer<char> = "abc".chars().collect();
        assert_eq!(buffer.get(1), Some(&'b'));
        assert_eq!(buffer.get(3), None);
        assert_eq!(buffer.back(), Some(&'c'));
        assert_eq!(format!("{buffer:?}"), "['a', 'b', 'c']");
    }
}

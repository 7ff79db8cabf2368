// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire codec for both link directions.
//!
//! # Wire Format
//!
//! ```text
//! +--------+---------------------------+
//! | type   | body (layout set by type) |
//! | 1 byte | little-endian fields      |
//! +--------+---------------------------+
//! ```
//!
//! Point arrays and text carry a `u16` element count. A buffered prefix
//! shorter than the message it announces decodes to
//! [`DecodeError::Incomplete`], which the channel answers by reading more.

pub mod app;
pub mod mcu;

pub use app::AppMsg;
pub use mcu::McuMsg;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read, Write};

/// One analog sample
pub type Point = i32;

/// Encoded size of a [`Point`]
pub const POINT_SIZE: usize = std::mem::size_of::<Point>();

/// Type + count header of an analog output message
pub const DAC_DATA_HEADER: usize = 1 + 2;

/// Type + channel + count header of an analog input message
pub const ADC_DATA_HEADER: usize = 1 + 1 + 2;

/// Largest analog output batch that fits `max_len` bytes.
pub fn dac_batch_for(max_len: usize) -> usize {
    (max_len.saturating_sub(DAC_DATA_HEADER) / POINT_SIZE).min(usize::from(u16::MAX))
}

/// Largest analog input batch that fits `max_len` bytes.
pub fn adc_batch_for(max_len: usize) -> usize {
    (max_len.saturating_sub(ADC_DATA_HEADER) / POINT_SIZE).min(usize::from(u16::MAX))
}

/// Serialization half of a message type.
pub trait Encode {
    /// Exact number of bytes [`encode`](Self::encode) will produce.
    fn encoded_len(&self) -> usize;

    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()>;
}

/// Deserialization half of a message type.
pub trait Decode: Sized {
    /// Total encoded length announced by the header at the front of `r`.
    ///
    /// Reads only the type byte and any length prefix.
    fn frame_len<R: Read + ?Sized>(r: &mut R) -> Result<usize, DecodeError>;

    /// Decode one message from the front of `r`, storing points in `spare`.
    ///
    /// Readers are in-memory views, so running dry means the message is
    /// not fully buffered yet. `spare` keeps its allocation on failure.
    fn decode_with<R: Read + ?Sized>(
        r: &mut R,
        spare: &mut Vec<Point>,
    ) -> Result<Self, DecodeError>;

    fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self, DecodeError> {
        Self::decode_with(r, &mut Vec::new())
    }

    /// Hand the message's point storage back for the next decode.
    fn recycle(self, _spare: &mut Vec<Point>) {}
}

/// Codec failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffered bytes end before the message does
    Incomplete,
    /// Unrecognized type discriminant
    UnknownType(u8),
    /// Text body is not UTF-8
    InvalidText,
    /// Announced message length exceeds the limit
    Oversized { len: usize, max: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete => write!(f, "incomplete message"),
            Self::UnknownType(t) => write!(f, "unknown message type {t}"),
            Self::InvalidText => write!(f, "text body is not valid UTF-8"),
            Self::Oversized { len, max } => {
                write!(f, "message of {len} bytes exceeds the {max} byte limit")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<io::Error> for DecodeError {
    fn from(_: io::Error) -> Self {
        Self::Incomplete
    }
}

fn length_prefix(len: usize) -> io::Result<u16> {
    u16::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{len} elements exceed the u16 length prefix"),
        )
    })
}

pub(crate) fn write_points<W: Write + ?Sized>(w: &mut W, points: &[Point]) -> io::Result<()> {
    w.write_u16::<LittleEndian>(length_prefix(points.len())?)?;
    for &point in points {
        w.write_i32::<LittleEndian>(point)?;
    }
    Ok(())
}

pub(crate) fn read_count<R: Read + ?Sized>(r: &mut R) -> Result<usize, DecodeError> {
    Ok(usize::from(r.read_u16::<LittleEndian>()?))
}

/// Read a point array into `spare` and take it as the message's storage.
pub(crate) fn read_points<R: Read + ?Sized>(
    r: &mut R,
    spare: &mut Vec<Point>,
) -> Result<Cow<'static, [Point]>, DecodeError> {
    let len = read_count(r)?;
    spare.clear();
    spare.reserve(len);
    for _ in 0..len {
        spare.push(r.read_i32::<LittleEndian>()?);
    }
    Ok(Cow::Owned(std::mem::take(spare)))
}

/// Return owned point storage to `spare` if it holds more room.
pub(crate) fn reclaim(points: Cow<'static, [Point]>, spare: &mut Vec<Point>) {
    if let Cow::Owned(points) = points {
        if points.capacity() > spare.capacity() {
            *spare = points;
        }
    }
}

pub(crate) fn write_text<W: Write + ?Sized>(w: &mut W, text: &str) -> io::Result<()> {
    w.write_u16::<LittleEndian>(length_prefix(text.len())?)?;
    w.write_all(text.as_bytes())
}

pub(crate) fn read_text<R: Read + ?Sized>(r: &mut R) -> Result<Cow<'static, str>, DecodeError> {
    let len = read_count(r)?;
    let mut bytes = vec![0u8; len];
    r.read_exact(&mut bytes)?;
    String::from_utf8(bytes)
        .map(Cow::Owned)
        .map_err(|_| DecodeError::InvalidText)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_sizes_for_default_buffer() {
        assert_eq!(dac_batch_for(496), 123);
        assert_eq!(adc_batch_for(496), 123);
        assert_eq!(dac_batch_for(2), 0);
    }

    #[test]
    fn test_points_layout() {
        let mut out = Vec::new();
        write_points(&mut out, &[1, -1]).unwrap();
        assert_eq!(out, [2, 0, 1, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_truncated_points_are_incomplete() {
        let bytes = [2u8, 0, 1, 0, 0, 0, 0xFF];
        let mut spare = Vec::with_capacity(8);
        assert_eq!(
            read_points(&mut &bytes[..], &mut spare).unwrap_err(),
            DecodeError::Incomplete
        );
        assert!(spare.capacity() >= 8);
    }

    #[test]
    fn test_points_reuse_spare_storage() {
        let bytes = [2u8, 0, 1, 0, 0, 0, 2, 0, 0, 0];
        let mut spare = Vec::with_capacity(16);
        let ptr = spare.as_ptr();
        let points = read_points(&mut &bytes[..], &mut spare).unwrap();
        assert_eq!(&*points, &[1, 2]);
        assert_eq!(points.as_ptr(), ptr);

        reclaim(points, &mut spare);
        assert_eq!(spare.as_ptr(), ptr);
        assert_eq!(spare.capacity(), 16);
    }

    #[test]
    fn test_invalid_text() {
        let bytes = [2u8, 0, 0xC3, 0x28];
        assert_eq!(read_text(&mut &bytes[..]).unwrap_err(), DecodeError::InvalidText);
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host to device messages.

use super::{
    read_count, read_points, reclaim, write_points, Decode, DecodeError, Encode, Point,
    DAC_DATA_HEADER, POINT_SIZE,
};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::borrow::Cow;
use std::io::{self, Read, Write};

const CONNECT: u8 = 0;
const KEEP_ALIVE: u8 = 1;
const DOUT_UPDATE: u8 = 2;
const DAC_DATA: u8 = 3;

/// Message sent by the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMsg<'a> {
    /// Session handshake, also resets the device side
    Connect,
    KeepAlive,
    /// New digital output value
    DoutUpdate { value: u8 },
    /// Analog output points, at most one batch, covered by prior credit
    DacData { points: Cow<'a, [Point]> },
}

impl<'a> AppMsg<'a> {
    /// Borrowing constructor for outgoing analog output data.
    pub fn dac_data(points: &'a [Point]) -> Self {
        Self::DacData {
            points: Cow::Borrowed(points),
        }
    }

    /// Variant name, for logs and handshake errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect => "Connect",
            Self::KeepAlive => "KeepAlive",
            Self::DoutUpdate { .. } => "DoutUpdate",
            Self::DacData { .. } => "DacData",
        }
    }

    pub fn into_owned(self) -> AppMsg<'static> {
        match self {
            Self::Connect => AppMsg::Connect,
            Self::KeepAlive => AppMsg::KeepAlive,
            Self::DoutUpdate { value } => AppMsg::DoutUpdate { value },
            Self::DacData { points } => AppMsg::DacData {
                points: Cow::Owned(points.into_owned()),
            },
        }
    }
}

impl Encode for AppMsg<'_> {
    fn encoded_len(&self) -> usize {
        match self {
            Self::Connect | Self::KeepAlive => 1,
            Self::DoutUpdate { .. } => 2,
            Self::DacData { points } => DAC_DATA_HEADER + points.len() * POINT_SIZE,
        }
    }

    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Self::Connect => w.write_u8(CONNECT),
            Self::KeepAlive => w.write_u8(KEEP_ALIVE),
            Self::DoutUpdate { value } => {
                w.write_u8(DOUT_UPDATE)?;
                w.write_u8(*value)
            }
            Self::DacData { points } => {
                w.write_u8(DAC_DATA)?;
                write_points(w, points)
            }
        }
    }
}

impl Decode for AppMsg<'static> {
    fn frame_len<R: Read + ?Sized>(r: &mut R) -> Result<usize, DecodeError> {
        match r.read_u8()? {
            CONNECT | KEEP_ALIVE => Ok(1),
            DOUT_UPDATE => Ok(2),
            DAC_DATA => Ok(DAC_DATA_HEADER + read_count(r)? * POINT_SIZE),
            other => Err(DecodeError::UnknownType(other)),
        }
    }

    fn decode_with<R: Read + ?Sized>(
        r: &mut R,
        spare: &mut Vec<Point>,
    ) -> Result<Self, DecodeError> {
        match r.read_u8()? {
            CONNECT => Ok(Self::Connect),
            KEEP_ALIVE => Ok(Self::KeepAlive),
            DOUT_UPDATE => Ok(Self::DoutUpdate { value: r.read_u8()? }),
            DAC_DATA => Ok(Self::DacData {
                points: read_points(r, spare)?,
            }),
            other => Err(DecodeError::UnknownType(other)),
        }
    }

    fn recycle(self, spare: &mut Vec<Point>) {
        if let Self::DacData { points } = self {
            reclaim(points, spare);
        }
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Device to host messages.

use super::{
    read_count, read_points, read_text, reclaim, write_points, write_text, Decode, DecodeError,
    Encode, Point, ADC_DATA_HEADER, POINT_SIZE,
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::borrow::Cow;
use std::io::{self, Read, Write};

const DIN_UPDATE: u8 = 0;
const DAC_REQUEST: u8 = 1;
const ADC_DATA: u8 = 2;
const ERROR: u8 = 3;
const DEBUG: u8 = 4;

/// Message sent by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McuMsg<'a> {
    /// Current digital input value
    DinUpdate { value: u8 },
    /// Credit grant: the host may send this many more output points
    DacRequest { count: u32 },
    /// One full batch of analog input samples for one channel
    AdcData { index: u8, points: Cow<'a, [Point]> },
    /// Device-side failure report
    Error { code: u8, message: Cow<'a, str> },
    /// Free-form diagnostics
    Debug { message: Cow<'a, str> },
}

impl<'a> McuMsg<'a> {
    pub fn adc_data(index: u8, points: &'a [Point]) -> Self {
        Self::AdcData {
            index,
            points: Cow::Borrowed(points),
        }
    }

    pub fn debug(message: &'a str) -> Self {
        Self::Debug {
            message: Cow::Borrowed(message),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::DinUpdate { .. } => "DinUpdate",
            Self::DacRequest { .. } => "DacRequest",
            Self::AdcData { .. } => "AdcData",
            Self::Error { .. } => "Error",
            Self::Debug { .. } => "Debug",
        }
    }
}

impl Encode for McuMsg<'_> {
    fn encoded_len(&self) -> usize {
        match self {
            Self::DinUpdate { .. } => 2,
            Self::DacRequest { .. } => 1 + 4,
            Self::AdcData { points, .. } => ADC_DATA_HEADER + points.len() * POINT_SIZE,
            Self::Error { message, .. } => 1 + 1 + 2 + message.len(),
            Self::Debug { message } => 1 + 2 + message.len(),
        }
    }

    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Self::DinUpdate { value } => {
                w.write_u8(DIN_UPDATE)?;
                w.write_u8(*value)
            }
            Self::DacRequest { count } => {
                w.write_u8(DAC_REQUEST)?;
                w.write_u32::<LittleEndian>(*count)
            }
            Self::AdcData { index, points } => {
                w.write_u8(ADC_DATA)?;
                w.write_u8(*index)?;
                write_points(w, points)
            }
            Self::Error { code, message } => {
                w.write_u8(ERROR)?;
                w.write_u8(*code)?;
                write_text(w, message)
            }
            Self::Debug { message } => {
                w.write_u8(DEBUG)?;
                write_text(w, message)
            }
        }
    }
}

impl Decode for McuMsg<'static> {
    fn frame_len<R: Read + ?Sized>(r: &mut R) -> Result<usize, DecodeError> {
        match r.read_u8()? {
            DIN_UPDATE => Ok(2),
            DAC_REQUEST => Ok(5),
            ADC_DATA => {
                r.read_u8()?;
                Ok(ADC_DATA_HEADER + read_count(r)? * POINT_SIZE)
            }
            ERROR => {
                r.read_u8()?;
                Ok(4 + read_count(r)?)
            }
            DEBUG => Ok(3 + read_count(r)?),
            other => Err(DecodeError::UnknownType(other)),
        }
    }

    fn decode_with<R: Read + ?Sized>(
        r: &mut R,
        spare: &mut Vec<Point>,
    ) -> Result<Self, DecodeError> {
        match r.read_u8()? {
            DIN_UPDATE => Ok(Self::DinUpdate { value: r.read_u8()? }),
            DAC_REQUEST => Ok(Self::DacRequest {
                count: r.read_u32::<LittleEndian>()?,
            }),
            ADC_DATA => {
                let index = r.read_u8()?;
                Ok(Self::AdcData {
                    index,
                    points: read_points(r, spare)?,
                })
            }
            ERROR => {
                let code = r.read_u8()?;
                Ok(Self::Error {
                    code,
                    message: read_text(r)?,
                })
            }
            DEBUG => Ok(Self::Debug {
                message: read_text(r)?,
            }),
            other => Err(DecodeError::UnknownType(other)),
        }
    }

    fn recycle(self, spare: &mut Vec<Point>) {
        if let Self::AdcData { points, .. } = self {
            reclaim(points, spare);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adc_data_fits_default_message() {
        let points = vec![0; 123];
        let msg = McuMsg::adc_data(5, &points);
        assert_eq!(msg.encoded_len(), 496);
        let mut out = Vec::new();
        msg.encode(&mut out).unwrap();
        assert_eq!(out.len(), 496);
        assert_eq!(&out[..4], &[2, 5, 123, 0]);
    }

    #[test]
    fn test_decode_variants() {
        let cases = [
            McuMsg::DinUpdate { value: 0xA5 },
            McuMsg::DacRequest { count: 246 },
            McuMsg::AdcData {
                index: 2,
                points: Cow::Owned(vec![1, 2, 3]),
            },
            McuMsg::Error {
                code: 7,
                message: Cow::Owned("adc fault".into()),
            },
            McuMsg::debug("hello"),
        ];
        for msg in cases {
            let mut out = Vec::new();
            msg.encode(&mut out).unwrap();
            assert_eq!(out.len(), msg.encoded_len());
            assert_eq!(McuMsg::decode(&mut &out[..]).unwrap(), msg);
        }
    }

    #[test]
    fn test_request_layout() {
        let mut out = Vec::new();
        McuMsg::DacRequest { count: 0x0102 }.encode(&mut out).unwrap();
        assert_eq!(out, [1, 2, 1, 0, 0]);
    }

    #[test]
    fn test_truncated_text_is_incomplete() {
        let bytes = [DEBUG, 5, 0, b'h', b'i'];
        assert_eq!(
            McuMsg::decode(&mut &bytes[..]).unwrap_err(),
            DecodeError::Incomplete
        );
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the link layer.
//!
//! Only [`Error::Timeout`] is recoverable: the receive loop uses it as the
//! keep-alive clock and the send loop retries on it. Every other variant
//! ends the current connection or the task that observed it.

use crate::proto::DecodeError;
use std::fmt;
use std::io;

/// Result type for link operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by buffers, channels and the streaming controller
#[derive(Debug)]
pub enum Error {
    /// Deadline elapsed before the operation completed
    Timeout,

    /// Transport closed, or fewer bytes buffered than the operation requires
    UnexpectedEnd,

    /// Fixed-capacity storage cannot take the requested number of elements
    Overflow { requested: usize, available: usize },

    /// Encoded message exceeds the channel's maximum message length
    MessageTooLong { size: usize, max: usize },

    /// Received bytes do not form a valid message
    Decode(DecodeError),

    /// First message of a session was not the connect handshake
    Handshake { found: &'static str },

    /// Configuration rejected by validation
    InvalidConfig(String),

    /// Transport I/O failure
    Io(io::Error),
}

impl Error {
    /// Whether the caller should simply retry.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "Operation timed out"),
            Self::UnexpectedEnd => write!(f, "Unexpected end of stream"),
            Self::Overflow {
                requested,
                available,
            } => write!(
                f,
                "Buffer overflow: {requested} elements requested, {available} available"
            ),
            Self::MessageTooLong { size, max } => {
                write!(f, "Message too long: {size} bytes exceeds limit {max}")
            }
            Self::Decode(e) => write!(f, "Decode error: {e}"),
            Self::Handshake { found } => {
                write!(f, "Handshake failed: expected Connect, received {found}")
            }
            Self::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
            Self::Io(e) => write!(f, "Transport I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => Self::UnexpectedEnd,
            _ => Self::Io(e),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

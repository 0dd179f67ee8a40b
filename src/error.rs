//! Unified error types for the CardMatrix firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level control loop's error handling uniform. All variants are `Copy`
//! so they can be passed through the supervisor without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Cell or multiplexer addressing was rejected.
    Addressing(AddressingError),
    /// The card reader failed or is unreachable.
    Reader(ReaderError),
    /// Peripheral bring-up failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addressing(e) => write!(f, "addressing: {e}"),
            Self::Reader(e) => write!(f, "reader: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Addressing errors
// ---------------------------------------------------------------------------

/// Invalid row/col/index requests. Never fatal: the offending call is a
/// no-op and the previous addressing state is preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingError {
    /// Switch channel outside `[0, channel_count)`.
    ChannelOutOfRange(u8),
    /// Row outside `[0, MATRIX_ROWS)`.
    RowOutOfRange(u8),
    /// Column outside `[0, MATRIX_COLS)`.
    ColOutOfRange(u8),
    /// Linear cell index outside `[0, TOTAL_CELLS)`.
    IndexOutOfRange(u8),
}

impl fmt::Display for AddressingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelOutOfRange(a) => write!(f, "channel {a} out of range"),
            Self::RowOutOfRange(r) => write!(f, "row {r} out of range"),
            Self::ColOutOfRange(c) => write!(f, "column {c} out of range"),
            Self::IndexOutOfRange(i) => write!(f, "cell index {i} out of range"),
        }
    }
}

impl From<AddressingError> for Error {
    fn from(e: AddressingError) -> Self {
        Self::Addressing(e)
    }
}

// ---------------------------------------------------------------------------
// Reader errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderError {
    /// Device absent or non-responsive at bring-up.
    Unavailable,
    /// A single detection attempt failed at the transport level.
    Detection,
    /// A single detection attempt exceeded its bounded timeout.
    Timeout,
    /// The liveness probe failed during scanning.
    ConnectionLost,
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "device unavailable"),
            Self::Detection => write!(f, "detection attempt failed"),
            Self::Timeout => write!(f, "detection attempt timed out"),
            Self::ConnectionLost => write!(f, "connection lost"),
        }
    }
}

impl From<ReaderError> for Error {
    fn from(e: ReaderError) -> Self {
        Self::Reader(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

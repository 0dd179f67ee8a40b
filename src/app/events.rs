//! Outbound application events.
//!
//! The scan engine and supervisor emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them — log to serial, drive a display, publish.
//! The core has no output-formatting responsibility.

use crate::config::UID_MAX_LEN;
use crate::fsm::StateId;

/// A card identifier: variable-length byte sequence, bounded capacity,
/// no heap.
pub type CardUid = heapless::Vec<u8, UID_MAX_LEN>;

/// Structured events emitted by the scanner core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixEvent {
    /// A card appeared at a previously empty cell.
    CardAdded { cell: u8, uid: CardUid },

    /// The card at a cell was removed.
    CardRemoved { cell: u8 },

    /// A different card replaced the one cached at a cell.
    CardChanged { cell: u8, uid: CardUid },

    /// One full pass over all 96 cells finished.
    SweepComplete(SweepSummary),

    /// The supervisor changed operating mode.
    ModeChanged { from: StateId, to: StateId },

    /// The liveness probe lost the reader (carries the session error count).
    ReaderLost { errors: u32 },
}

/// Point-in-time summary emitted at the end of each sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    /// Completed full-sweep count (this sweep included).
    pub sweep: u32,
    /// Wall time of this sweep in milliseconds.
    pub elapsed_ms: u32,
    /// Cells with a card present at sweep end.
    pub cards_present: u32,
    /// Added / removed / changed events during this sweep.
    pub added: u32,
    pub removed: u32,
    pub changed: u32,
}

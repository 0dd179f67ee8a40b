//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured matrix events to the
//! ESP-IDF logger (UART / USB-CDC in production). A display or network
//! adapter would implement the same trait.

use core::fmt::Write as _;

use log::info;

use crate::app::events::{CardUid, MatrixEvent};
use crate::app::ports::EventSink;
use crate::drivers::addressing::index_to_row_col;

/// Adapter that logs every [`MatrixEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// Hex rendering of a UID, e.g. `04A1B2C3`.
fn uid_hex(uid: &CardUid) -> heapless::String<16> {
    let mut s = heapless::String::new();
    for byte in uid {
        // Capacity covers the 7-byte maximum UID.
        let _ = write!(s, "{byte:02X}");
    }
    s
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &MatrixEvent) {
        match event {
            MatrixEvent::CardAdded { cell, uid } => {
                let (row, col) = index_to_row_col(*cell);
                info!("CARD  | added [{row},{col}] uid={}", uid_hex(uid));
            }
            MatrixEvent::CardRemoved { cell } => {
                let (row, col) = index_to_row_col(*cell);
                info!("CARD  | removed [{row},{col}]");
            }
            MatrixEvent::CardChanged { cell, uid } => {
                let (row, col) = index_to_row_col(*cell);
                info!("CARD  | changed [{row},{col}] uid={}", uid_hex(uid));
            }
            MatrixEvent::SweepComplete(s) => {
                info!(
                    "SWEEP | #{} done in {} ms | present={} | +{} -{} ~{}",
                    s.sweep, s.elapsed_ms, s.cards_present, s.added, s.removed, s.changed,
                );
            }
            MatrixEvent::ModeChanged { from, to } => {
                info!("MODE  | {:?} -> {:?}", from, to);
            }
            MatrixEvent::ReaderLost { errors } => {
                info!("READER| connection lost (errors={errors})");
            }
        }
    }
}

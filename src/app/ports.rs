//! Port traits — the boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MatrixService (domain)
//! ```
//!
//! Driven adapters (GPIO bank, PN532 reader, event sinks) implement these
//! traits. The core consumes them via generics, so the scan logic never
//! touches hardware directly and every test runs on the host.

use crate::app::events::{CardUid, MatrixEvent};
use crate::error::ReaderError;

// ───────────────────────────────────────────────────────────────
// GPIO bus port (domain → select lines / enable line)
// ───────────────────────────────────────────────────────────────

/// Binary output lines plus a microsecond-granularity delay primitive.
/// The multiplexer drivers depend on nothing else.
pub trait GpioBus {
    /// Drive one output line high or low.
    fn write(&mut self, gpio: i32, high: bool);

    /// Busy-wait for `us` microseconds. Carries the single-digit-microsecond
    /// analog settle waits and, at startup only, the reader retry delay.
    fn delay_us(&mut self, us: u32);
}

// ───────────────────────────────────────────────────────────────
// Reader port (domain → contactless-card reader)
// ───────────────────────────────────────────────────────────────

/// Narrow contract over the physical reader. The core depends on these
/// three operations, not on the device's wire protocol.
pub trait ReaderPort {
    /// One-time hardware bring-up (wake, SAM configuration). `true` when
    /// the device accepted the sequence.
    fn power_up(&mut self) -> bool;

    /// Identity/firmware check — doubles as the liveness probe. `true`
    /// when the device responds with a plausible identity.
    fn identity_check(&mut self) -> bool;

    /// Exactly one passive-target detection attempt with a bounded
    /// timeout. `Ok(None)` means no card in field; `Err` is a transport
    /// fault, not an empty field.
    fn detect(&mut self, timeout_ms: u32) -> Result<Option<CardUid>, ReaderError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / reporting)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`MatrixEvent`]s through this port.
/// Adapters decide where they go — serial log, display, network.
pub trait EventSink {
    fn emit(&mut self, event: &MatrixEvent);
}

//! Supervisor state handlers and the state table.
//!
//! Handlers are pure functions over [`SupervisorContext`]: the service
//! refreshes the context (reader connectivity, time) before each tick and
//! performs the actual work (engine updates, reconnect attempts) outside
//! the machine, gated on the mode the machine settles in.

use log::warn;

use super::context::SupervisorContext;
use super::{StateDescriptor, StateId};

/// Build the state table. Index must equal `StateId as usize`.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        StateDescriptor {
            id: StateId::Init,
            name: "INIT",
            on_enter: Some(stamp_entry),
            on_exit: None,
            on_update: init_update,
        },
        StateDescriptor {
            id: StateId::Scanning,
            name: "SCANNING",
            on_enter: Some(stamp_entry),
            on_exit: None,
            on_update: scanning_update,
        },
        StateDescriptor {
            id: StateId::ErrorRecovery,
            name: "ERROR_RECOVERY",
            on_enter: Some(recovery_enter),
            on_exit: None,
            on_update: recovery_update,
        },
        StateDescriptor {
            id: StateId::Idle,
            name: "IDLE",
            on_enter: Some(stamp_entry),
            on_exit: None,
            on_update: idle_update,
        },
    ]
}

// ---------------------------------------------------------------------------
// Shared enter action
// ---------------------------------------------------------------------------

fn stamp_entry(ctx: &mut SupervisorContext) {
    ctx.state_entered_ms = ctx.now_ms;
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

/// Hold until bus setup, reader bring-up and engine initialization have all
/// succeeded (the service sets `init_complete`). A reader that never came up
/// keeps the machine here — the process never enters Scanning.
fn init_update(ctx: &mut SupervisorContext) -> Option<StateId> {
    (ctx.init_complete && ctx.reader_connected).then_some(StateId::Scanning)
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// A lost reader forces recovery within one tick; otherwise the service
/// delegates one scan-engine update while the machine stays put.
fn scanning_update(ctx: &mut SupervisorContext) -> Option<StateId> {
    (!ctx.reader_connected).then_some(StateId::ErrorRecovery)
}

// ---------------------------------------------------------------------------
// ErrorRecovery
// ---------------------------------------------------------------------------

fn recovery_enter(ctx: &mut SupervisorContext) {
    stamp_entry(ctx);
    ctx.error_count += 1;
    warn!("Supervisor: entering error recovery (error #{})", ctx.error_count);
}

/// The service attempts a reconnect each tick while here (the session
/// rate-limits to its fixed interval). Unbounded retries: once started,
/// the system never gives up.
fn recovery_update(ctx: &mut SupervisorContext) -> Option<StateId> {
    ctx.reader_connected.then_some(StateId::Scanning)
}

// ---------------------------------------------------------------------------
// Idle
// ---------------------------------------------------------------------------

/// Defined but unreachable in normal operation; if entered, return to
/// Scanning after a fixed dwell.
fn idle_update(ctx: &mut SupervisorContext) -> Option<StateId> {
    (ctx.ms_in_state() >= ctx.idle_dwell_ms).then_some(StateId::Scanning)
}

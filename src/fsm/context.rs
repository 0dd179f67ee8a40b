//! Shared context threaded through every supervisor state handler.
//!
//! Pure data: the service refreshes these fields each tick before the FSM
//! runs, so state handlers never touch hardware and the whole machine is
//! testable in isolation. What the original firmware kept in function-local
//! statics (entry times, report timestamps) are explicit fields here.

use crate::config::MatrixConfig;

/// Inputs and bookkeeping for the supervisor state handlers.
#[derive(Debug, Clone)]
pub struct SupervisorContext {
    /// Monotonic milliseconds, refreshed by the service every tick.
    pub now_ms: u32,

    /// Whether the reader session currently reports connected.
    pub reader_connected: bool,

    /// Set once bring-up (addressing + reader + engine) has succeeded.
    pub init_complete: bool,

    /// When the current state was entered (stamped by `on_enter`).
    pub state_entered_ms: u32,

    /// Ticks spent in the current state (maintained by the engine).
    pub ticks_in_state: u64,
    /// Total ticks since start (maintained by the engine).
    pub total_ticks: u64,

    /// Cumulative count of entries into error recovery.
    pub error_count: u32,

    /// Dwell in Idle before returning to Scanning.
    pub idle_dwell_ms: u32,
    /// Window for rate-limited routine transition reports.
    pub report_window_ms: u32,
}

impl SupervisorContext {
    pub fn new(config: &MatrixConfig) -> Self {
        Self {
            now_ms: 0,
            reader_connected: false,
            init_complete: false,
            state_entered_ms: 0,
            ticks_in_state: 0,
            total_ticks: 0,
            error_count: 0,
            idle_dwell_ms: config.idle_dwell_ms,
            report_window_ms: config.transition_report_window_ms,
        }
    }

    /// Milliseconds spent in the current state.
    pub fn ms_in_state(&self) -> u32 {
        self.now_ms.wrapping_sub(self.state_entered_ms)
    }
}

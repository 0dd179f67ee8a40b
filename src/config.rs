//! System configuration parameters
//!
//! All tunable timings for the matrix scanner. The values in `Default` were
//! tuned empirically on the real antenna board; they are configuration, not
//! derived logic.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Grid geometry — compile-time, not configuration
// ---------------------------------------------------------------------------

/// Antenna rows (multiplexer #1 channels).
pub const MATRIX_ROWS: usize = 8;
/// Antenna columns (multiplexer #2 channels).
pub const MATRIX_COLS: usize = 12;
/// Total addressable cells.
pub const TOTAL_CELLS: usize = MATRIX_ROWS * MATRIX_COLS;

/// Maximum card UID length in bytes (ISO14443A double-size UID).
pub const UID_MAX_LEN: usize = 7;

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// Core scanner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixConfig {
    // --- Scan timing ---
    /// Minimum interval between reader detection attempts (milliseconds).
    pub scan_delay_ms: u32,
    /// Per-call timeout for a single PN532 detection request (milliseconds).
    pub reader_timeout_ms: u32,
    /// Analog settle time after a real multiplexer address change (microseconds).
    pub mux_settle_time_us: u32,
    /// How long to hold addressing on a cell once a card is suspected
    /// (milliseconds). Trades sweep latency for read confidence.
    pub dwell_duration_ms: u32,
    /// Pause between full 96-cell sweeps (milliseconds).
    pub sweep_pause_ms: u32,

    // --- Reader recovery ---
    /// Minimum interval between reconnect attempts (milliseconds). Fixed
    /// interval, no backoff growth.
    pub reconnect_interval_ms: u32,
    /// Interval between liveness probes of the reader (milliseconds).
    pub liveness_interval_ms: u32,

    // --- Startup ---
    /// Reader bring-up attempts before startup is declared failed.
    pub max_init_attempts: u8,
    /// Delay between startup bring-up attempts (milliseconds).
    pub init_retry_delay_ms: u32,

    // --- Supervisor ---
    /// Dwell in Idle before returning to Scanning (milliseconds).
    pub idle_dwell_ms: u32,
    /// Routine mode transitions are summarised at most once per this window
    /// (milliseconds). Error/Init transitions always log.
    pub transition_report_window_ms: u32,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            // Scan timing
            scan_delay_ms: 5,
            reader_timeout_ms: 10,
            mux_settle_time_us: 2,
            dwell_duration_ms: 1000,
            sweep_pause_ms: 10,

            // Reader recovery
            reconnect_interval_ms: 5000,
            liveness_interval_ms: 10_000,

            // Startup
            max_init_attempts: 3,
            init_retry_delay_ms: 500,

            // Supervisor
            idle_dwell_ms: 1000,
            transition_report_window_ms: 5000,
        }
    }
}

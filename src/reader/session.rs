//! Reader session: connect, verify-alive, single detection attempts,
//! reconnect-with-fixed-interval, and read/error statistics.
//!
//! The session owns no hardware — every call takes the [`ReaderPort`] and
//! the current monotonic time, so the whole lifecycle is testable with a
//! scripted mock. All intervals are fixed configuration constants; there is
//! no dynamic adaptation and no backoff growth.

use log::{info, warn};

use crate::app::events::CardUid;
use crate::app::ports::ReaderPort;
use crate::config::MatrixConfig;
use crate::error::{Error, ReaderError, Result};

// ---------------------------------------------------------------------------
// Outcome of one detection attempt
// ---------------------------------------------------------------------------

/// Result of a single polling attempt, as seen by the scan engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// No card in the field (or the inter-attempt interval has not elapsed).
    NoCard,
    /// A card was read and its UID matches the immediately preceding read.
    CardFound,
    /// A card was read and its UID differs from the immediately preceding
    /// read (or there was no preceding read).
    CardChanged,
    /// The attempt failed at the transport level.
    Error,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Monotonic session counters. `reset_statistics` zeroes them without
/// touching the connection state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub total_attempts: u32,
    pub successful_reads: u32,
    pub errors: u32,
    pub timeouts: u32,
}

impl ReaderStats {
    /// Successful reads as a share of real attempts, in percent.
    pub fn success_rate(&self) -> f32 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        self.successful_reads as f32 / self.total_attempts as f32 * 100.0
    }
}

// ---------------------------------------------------------------------------
// ReaderSession
// ---------------------------------------------------------------------------

pub struct ReaderSession {
    connected: bool,
    stats: ReaderStats,

    scan_delay_ms: u32,
    reader_timeout_ms: u32,
    reconnect_interval_ms: u32,
    liveness_interval_ms: u32,

    last_attempt_ms: u32,
    last_reconnect_ms: u32,
    last_liveness_ms: u32,

    /// UID observed in the most recent successful detection. Used to
    /// classify `CardChanged` before the matrix cache commits.
    last_uid: CardUid,
    last_uid_valid: bool,
}

impl ReaderSession {
    pub fn new(config: &MatrixConfig) -> Self {
        Self {
            connected: false,
            stats: ReaderStats::default(),
            scan_delay_ms: config.scan_delay_ms,
            reader_timeout_ms: config.reader_timeout_ms,
            reconnect_interval_ms: config.reconnect_interval_ms,
            liveness_interval_ms: config.liveness_interval_ms,
            last_attempt_ms: 0,
            last_reconnect_ms: 0,
            last_liveness_ms: 0,
            last_uid: CardUid::new(),
            last_uid_valid: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Hardware bring-up plus identity check. Fails with
    /// [`ReaderError::Unavailable`] when the device does not respond.
    pub fn initialize(&mut self, reader: &mut impl ReaderPort, now_ms: u32) -> Result<()> {
        info!("ReaderSession: bringing up reader");

        if !reader.power_up() || !reader.identity_check() {
            self.connected = false;
            self.stats.errors += 1;
            return Err(Error::Reader(ReaderError::Unavailable));
        }

        self.connected = true;
        self.last_reconnect_ms = now_ms;
        self.last_liveness_ms = now_ms;
        self.clear_last_read();
        info!("ReaderSession: reader up and identified");
        Ok(())
    }

    /// One non-blocking detection attempt.
    ///
    /// Calls made before `scan_delay_ms` has elapsed since the previous
    /// attempt are no-ops returning [`ScanOutcome::NoCard`], not errors.
    /// When disconnected, a reconnect is tried first; failure yields
    /// [`ScanOutcome::Error`]. Otherwise exactly one detection request is
    /// issued with the bounded per-call timeout.
    pub fn attempt_detection(
        &mut self,
        reader: &mut impl ReaderPort,
        now_ms: u32,
    ) -> ScanOutcome {
        if now_ms.wrapping_sub(self.last_attempt_ms) < self.scan_delay_ms {
            return ScanOutcome::NoCard;
        }
        self.last_attempt_ms = now_ms;
        self.stats.total_attempts += 1;

        if !self.connected && !self.reconnect(reader, now_ms) {
            self.stats.errors += 1;
            return ScanOutcome::Error;
        }

        match reader.detect(self.reader_timeout_ms) {
            Ok(Some(uid)) => {
                self.stats.successful_reads += 1;
                let changed = !self.last_uid_valid || uid != self.last_uid;
                self.last_uid = uid;
                self.last_uid_valid = true;
                if changed {
                    ScanOutcome::CardChanged
                } else {
                    ScanOutcome::CardFound
                }
            }
            Ok(None) => {
                self.clear_last_read();
                ScanOutcome::NoCard
            }
            Err(e) => {
                if e == ReaderError::Timeout {
                    self.stats.timeouts += 1;
                }
                self.stats.errors += 1;
                warn!("ReaderSession: detection failed: {e}");
                ScanOutcome::Error
            }
        }
    }

    /// Try to re-establish the connection. Rate-limited to at most one
    /// attempt per `reconnect_interval_ms`; gated calls return `false`
    /// without touching the device.
    pub fn reconnect(&mut self, reader: &mut impl ReaderPort, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_reconnect_ms) < self.reconnect_interval_ms {
            return false;
        }
        self.last_reconnect_ms = now_ms;

        info!("ReaderSession: reconnect attempt");
        if reader.identity_check() {
            self.connected = true;
            info!("ReaderSession: reconnected");
            true
        } else {
            self.connected = false;
            self.stats.errors += 1;
            false
        }
    }

    /// Periodic liveness probe, independent of detection attempts. On
    /// failure the connection is demoted and an error counted; the probe
    /// itself never retries. Returns `false` exactly when it demoted.
    pub fn check_connection(&mut self, reader: &mut impl ReaderPort, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_liveness_ms) < self.liveness_interval_ms {
            return true;
        }
        self.last_liveness_ms = now_ms;

        if reader.identity_check() {
            true
        } else {
            warn!("ReaderSession: liveness probe failed, connection lost");
            self.connected = false;
            self.stats.errors += 1;
            false
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// UID of the most recent successful detection, if still valid.
    pub fn last_uid(&self) -> Option<&CardUid> {
        self.last_uid_valid.then_some(&self.last_uid)
    }

    pub fn stats(&self) -> &ReaderStats {
        &self.stats
    }

    /// Zero the counters; connection state and last-read UID survive.
    pub fn reset_statistics(&mut self) {
        self.stats = ReaderStats::default();
    }

    fn clear_last_read(&mut self) {
        self.last_uid.clear();
        self.last_uid_valid = false;
    }
}

//! Scan cycle engine.
//!
//! Drives one cooperative scanning step per `update()` call: select a cell,
//! request one detection, fold the result into the per-cell cache, apply the
//! dwell policy, advance. RFID coupling is position and orientation
//! sensitive, so once a card is suspected the engine holds addressing on
//! that cell for a fixed dwell, trading sweep latency for read confidence.
//!
//! Events (`CardAdded` / `CardRemoved` / `CardChanged`) are derived from
//! transitions of the **committed cache**, never from raw detection results:
//! a cell that keeps reporting the same UID across dwell polls emits
//! nothing after the first transition.

use log::{debug, warn};

use crate::app::events::{CardUid, MatrixEvent, SweepSummary};
use crate::app::ports::{EventSink, GpioBus, ReaderPort};
use crate::config::{MatrixConfig, TOTAL_CELLS};
use crate::drivers::addressing::CellAddressing;
use crate::reader::session::{ReaderSession, ScanOutcome};

// ---------------------------------------------------------------------------
// Per-cell cache entry
// ---------------------------------------------------------------------------

/// Live record for one antenna position. Created empty at engine
/// initialization, mutated every time its cell is visited, never destroyed
/// (only reset to absent).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardRecord {
    pub present: bool,
    /// Empty whenever `present` is false.
    pub uid: CardUid,
    pub last_seen_ms: u32,
    /// Whether this record's state differs from the previous scan of the
    /// same cell.
    pub changed: bool,
}

// ---------------------------------------------------------------------------
// Event counters
// ---------------------------------------------------------------------------

/// Cumulative card-event counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounters {
    pub added: u32,
    pub removed: u32,
    pub changed: u32,
}

// ---------------------------------------------------------------------------
// ScanEngine
// ---------------------------------------------------------------------------

pub struct ScanEngine {
    /// Exclusively owned by the engine; nothing else writes it.
    cache: [CardRecord; TOTAL_CELLS],

    current_cell: u8,
    cycle_in_progress: bool,
    cycle_start_ms: u32,
    cycle_end_ms: u32,

    /// Cell currently being dwelt on, if any, and when its card was first
    /// observed. Cleared whenever the engine leaves the cell.
    dwell_cell: Option<u8>,
    dwell_since_ms: u32,

    sweeps: u32,
    counters: EventCounters,
    /// Counter snapshot at cycle start, for per-sweep deltas.
    cycle_base: EventCounters,

    dwell_duration_ms: u32,
    sweep_pause_ms: u32,
}

impl ScanEngine {
    pub fn new(config: &MatrixConfig) -> Self {
        Self {
            cache: core::array::from_fn(|_| CardRecord::default()),
            current_cell: 0,
            cycle_in_progress: false,
            cycle_start_ms: 0,
            cycle_end_ms: 0,
            dwell_cell: None,
            dwell_since_ms: 0,
            sweeps: 0,
            counters: EventCounters::default(),
            cycle_base: EventCounters::default(),
            dwell_duration_ms: config.dwell_duration_ms,
            sweep_pause_ms: config.sweep_pause_ms,
        }
    }

    /// Perform exactly one unit of scanning work.
    pub fn update(
        &mut self,
        addressing: &mut CellAddressing,
        session: &mut ReaderSession,
        bus: &mut impl GpioBus,
        reader: &mut impl ReaderPort,
        sink: &mut impl EventSink,
        now_ms: u32,
    ) {
        if !self.cycle_in_progress {
            // Coarse pause between full sweeps.
            if self.sweeps > 0 && now_ms.wrapping_sub(self.cycle_end_ms) < self.sweep_pause_ms {
                return;
            }
            self.start_cycle(addressing, bus, now_ms);
        }

        // Re-assert the selection; the drivers suppress redundant writes.
        if let Err(e) = addressing.select_index(bus, self.current_cell) {
            warn!("ScanEngine: select failed for cell {}: {e}", self.current_cell);
            self.advance(addressing, bus, sink, now_ms);
            return;
        }

        let outcome = session.attempt_detection(reader, now_ms);
        self.fold(self.current_cell, outcome, session.last_uid(), now_ms, sink);

        match outcome {
            ScanOutcome::CardFound | ScanOutcome::CardChanged => {
                if self.dwell_cell != Some(self.current_cell) {
                    // First observation since the engine last left this cell.
                    self.dwell_cell = Some(self.current_cell);
                    self.dwell_since_ms = now_ms;
                }
                if now_ms.wrapping_sub(self.dwell_since_ms) < self.dwell_duration_ms {
                    // Hold addressing here; repeat detection next call.
                    return;
                }
                self.advance(addressing, bus, sink, now_ms);
            }
            ScanOutcome::NoCard => self.advance(addressing, bus, sink, now_ms),
            ScanOutcome::Error => {
                // Cache untouched; the cell is skipped for this pass only.
                debug!("ScanEngine: detection error at cell {}", self.current_cell);
                self.advance(addressing, bus, sink, now_ms);
            }
        }
    }

    // ── Cache accessors ───────────────────────────────────────

    /// Record for one cell; `None` for an out-of-range index.
    pub fn card(&self, cell: u8) -> Option<&CardRecord> {
        self.cache.get(cell as usize)
    }

    pub fn is_card_present(&self, cell: u8) -> bool {
        self.card(cell).is_some_and(|r| r.present)
    }

    /// Number of cells with a card currently present.
    pub fn cards_present(&self) -> u32 {
        self.cache.iter().filter(|r| r.present).count() as u32
    }

    pub fn sweeps(&self) -> u32 {
        self.sweeps
    }

    pub fn counters(&self) -> &EventCounters {
        &self.counters
    }

    pub fn current_cell(&self) -> u8 {
        self.current_cell
    }

    /// Reset every record to absent. Counters survive.
    pub fn clear_cache(&mut self) {
        for record in &mut self.cache {
            *record = CardRecord::default();
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn start_cycle(&mut self, addressing: &mut CellAddressing, bus: &mut impl GpioBus, now_ms: u32) {
        self.current_cell = 0;
        self.cycle_in_progress = true;
        self.cycle_start_ms = now_ms;
        self.cycle_base = self.counters;
        let _ = addressing.select_index(bus, 0);
    }

    fn advance(
        &mut self,
        addressing: &mut CellAddressing,
        bus: &mut impl GpioBus,
        sink: &mut impl EventSink,
        now_ms: u32,
    ) {
        // Leaving the cell ends any dwell on it.
        if self.dwell_cell == Some(self.current_cell) {
            self.dwell_cell = None;
        }

        self.current_cell += 1;
        if (self.current_cell as usize) < TOTAL_CELLS {
            let _ = addressing.select_index(bus, self.current_cell);
            return;
        }

        self.complete_cycle(sink, now_ms);
    }

    fn complete_cycle(&mut self, sink: &mut impl EventSink, now_ms: u32) {
        self.cycle_in_progress = false;
        self.cycle_end_ms = now_ms;
        self.sweeps += 1;

        let summary = SweepSummary {
            sweep: self.sweeps,
            elapsed_ms: now_ms.wrapping_sub(self.cycle_start_ms),
            cards_present: self.cards_present(),
            added: self.counters.added - self.cycle_base.added,
            removed: self.counters.removed - self.cycle_base.removed,
            changed: self.counters.changed - self.cycle_base.changed,
        };
        debug!(
            "ScanEngine: sweep {} complete, {} cards, {} ms",
            summary.sweep, summary.cards_present, summary.elapsed_ms
        );
        sink.emit(&MatrixEvent::SweepComplete(summary));
    }

    /// Fold one detection result into the cache and derive events from the
    /// committed-record transition.
    fn fold(
        &mut self,
        cell: u8,
        outcome: ScanOutcome,
        uid: Option<&CardUid>,
        now_ms: u32,
        sink: &mut impl EventSink,
    ) {
        let record = &mut self.cache[cell as usize];

        match outcome {
            ScanOutcome::CardFound | ScanOutcome::CardChanged => {
                // The session holds the UID of the read that produced this
                // outcome; without it there is nothing to commit.
                let Some(uid) = uid else { return };

                let was_present = record.present;
                let uid_differs = record.uid != *uid;

                record.present = true;
                record.last_seen_ms = now_ms;
                record.changed = !was_present || uid_differs;

                if !was_present {
                    record.uid = uid.clone();
                    self.counters.added += 1;
                    sink.emit(&MatrixEvent::CardAdded {
                        cell,
                        uid: uid.clone(),
                    });
                } else if uid_differs {
                    record.uid = uid.clone();
                    self.counters.changed += 1;
                    sink.emit(&MatrixEvent::CardChanged {
                        cell,
                        uid: uid.clone(),
                    });
                }
            }

            ScanOutcome::NoCard => {
                if record.present {
                    record.present = false;
                    record.uid.clear();
                    record.changed = true;
                    self.counters.removed += 1;
                    sink.emit(&MatrixEvent::CardRemoved { cell });
                } else {
                    record.changed = false;
                }
            }

            // Cache is left untouched on a transport error.
            ScanOutcome::Error => {}
        }
    }
}

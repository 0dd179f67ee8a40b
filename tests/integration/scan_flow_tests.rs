//! Integration tests for the scan engine → addressing → reader pipeline.
//!
//! Exercises full sweeps, the dwell policy and card lifecycle transitions
//! through `ScanEngine::update`, with scripted reader replies and a recorded
//! GPIO history.

use crate::mock_hw::{MockBus, RecordingSink, ScriptedReader};

use cardmatrix::app::events::MatrixEvent;
use cardmatrix::config::{MatrixConfig, TOTAL_CELLS};
use cardmatrix::drivers::addressing::CellAddressing;
use cardmatrix::error::ReaderError;
use cardmatrix::pins::MUX_ENABLE_GPIO;
use cardmatrix::reader::session::ReaderSession;
use cardmatrix::scan::engine::ScanEngine;

struct Rig {
    engine: ScanEngine,
    addressing: CellAddressing,
    session: ReaderSession,
    bus: MockBus,
    sink: RecordingSink,
}

/// Engine + addressing + session wired to mocks, reader already up.
fn rig(reader: &mut ScriptedReader) -> Rig {
    let config = MatrixConfig::default();
    let mut bus = MockBus::new();
    let mut addressing = CellAddressing::new(config.mux_settle_time_us);
    addressing.init(&mut bus);
    let mut session = ReaderSession::new(&config);
    session.initialize(reader, 0).unwrap();

    Rig {
        engine: ScanEngine::new(&config),
        addressing,
        session,
        bus,
        sink: RecordingSink::new(),
    }
}

fn step(r: &mut Rig, reader: &mut ScriptedReader, now_ms: u32) {
    r.engine.update(
        &mut r.addressing,
        &mut r.session,
        &mut r.bus,
        reader,
        &mut r.sink,
        now_ms,
    );
}

// ── Full sweep over an empty matrix ───────────────────────────

#[test]
fn empty_sweep_visits_all_cells_once() {
    let mut reader = ScriptedReader::alive();
    let mut r = rig(&mut reader);

    // One update per cell, spaced past the scan delay.
    for i in 0..TOTAL_CELLS as u32 {
        step(&mut r, &mut reader, 5 * (i + 1));
    }

    assert_eq!(r.engine.sweeps(), 1);
    assert_eq!(r.sink.sweeps(), 1);
    assert_eq!(reader.detects, TOTAL_CELLS as u32);

    let summary = r
        .sink
        .events
        .iter()
        .find_map(|e| match e {
            MatrixEvent::SweepComplete(s) => Some(*s),
            _ => None,
        })
        .unwrap();
    assert_eq!(summary.sweep, 1);
    assert_eq!(summary.cards_present, 0);
    assert_eq!(summary.added, 0);
}

#[test]
fn sweep_pause_gates_the_next_cycle() {
    let mut reader = ScriptedReader::alive();
    let mut r = rig(&mut reader);

    for i in 0..TOTAL_CELLS as u32 {
        step(&mut r, &mut reader, 5 * (i + 1));
    }
    let detects_after_sweep = reader.detects;

    // 5 ms after sweep end: still inside the 10 ms inter-sweep pause.
    step(&mut r, &mut reader, 485);
    assert_eq!(reader.detects, detects_after_sweep, "pause must be idle");
    assert_eq!(r.engine.sweeps(), 1);

    // Past the pause: a new cycle starts from cell 0.
    step(&mut r, &mut reader, 495);
    assert_eq!(r.engine.current_cell(), 1, "cell 0 scanned, advanced");
    assert_eq!(r.engine.sweeps(), 1);
}

// ── Dwell policy ──────────────────────────────────────────────

#[test]
fn dwell_holds_addressing_on_a_suspected_card() {
    let mut reader = ScriptedReader::alive();
    reader.hold_card(&[0x04, 0xA1, 0xB2, 0xC3]);
    let mut r = rig(&mut reader);

    // Card observed at cell 0 on the first update (t=5). The engine must
    // keep polling cell 0 until the dwell window has elapsed.
    let mut t = 5;
    while t <= 1000 {
        step(&mut r, &mut reader, t);
        assert_eq!(r.engine.current_cell(), 0, "held at t={t}");
        t += 5;
    }

    // Dwell elapsed: the engine moves on.
    step(&mut r, &mut reader, 1005);
    assert_eq!(r.engine.current_cell(), 1);

    // Steady presence across all those polls produced exactly one event.
    assert_eq!(r.sink.added(), 1);
    assert!(matches!(
        r.sink.events[0],
        MatrixEvent::CardAdded { cell: 0, .. }
    ));
}

// ── Card lifecycle ────────────────────────────────────────────

#[test]
fn card_appearing_then_leaving_emits_one_added_one_removed() {
    let mut reader = ScriptedReader::alive();
    reader.push_card(&[1, 2, 3, 4]);
    reader.push_card(&[1, 2, 3, 4]);
    reader.push_empty();
    let mut r = rig(&mut reader);

    step(&mut r, &mut reader, 5); // found -> added, dwell starts
    step(&mut r, &mut reader, 10); // same card, no event
    step(&mut r, &mut reader, 15); // gone -> removed

    let card_events: Vec<_> = r
        .sink
        .events
        .iter()
        .filter(|e| !matches!(e, MatrixEvent::SweepComplete(_)))
        .collect();
    assert_eq!(card_events.len(), 2);
    assert!(matches!(card_events[0], MatrixEvent::CardAdded { cell: 0, .. }));
    assert!(matches!(card_events[1], MatrixEvent::CardRemoved { cell: 0 }));
    assert!(!r.engine.is_card_present(0));
}

#[test]
fn identifier_swap_emits_added_then_changed() {
    let mut reader = ScriptedReader::alive();
    reader.push_card(&[1, 1, 1, 1]);
    reader.push_card(&[2, 2, 2, 2]);
    let mut r = rig(&mut reader);

    step(&mut r, &mut reader, 5);
    step(&mut r, &mut reader, 10);

    assert_eq!(r.sink.added(), 1);
    assert_eq!(r.sink.changed(), 1);
    let record = r.engine.card(0).unwrap();
    assert_eq!(record.uid.as_slice(), &[2, 2, 2, 2]);
}

#[test]
fn detection_error_skips_the_cell_without_touching_the_cache() {
    let mut reader = ScriptedReader::alive();
    reader.push_error(ReaderError::Detection);
    let mut r = rig(&mut reader);

    step(&mut r, &mut reader, 5);

    assert_eq!(r.engine.current_cell(), 1, "errored cell is skipped");
    assert!(r.sink.events.is_empty());
    assert_eq!(r.session.stats().errors, 1);
}

// ── Addressing side effects ───────────────────────────────────

#[test]
fn enable_line_is_asserted_while_scanning() {
    let mut reader = ScriptedReader::alive();
    let mut r = rig(&mut reader);

    step(&mut r, &mut reader, 5);

    // Active LOW: the most recent write to the enable line must be low.
    assert_eq!(r.bus.level(MUX_ENABLE_GPIO), Some(false));
}

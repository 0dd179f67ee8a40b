//! Integration tests for the MatrixService → FSM → scan pipeline.
//!
//! These run on the host (x86_64) and verify that the full orchestration
//! chain — supervisor transitions, liveness demotion, rate-limited
//! reconnects and scan events — works end to end against mock adapters.

use crate::mock_hw::{MockBus, RecordingSink, ScriptedReader};

use cardmatrix::app::events::MatrixEvent;
use cardmatrix::app::service::MatrixService;
use cardmatrix::config::MatrixConfig;
use cardmatrix::error::{Error, ReaderError};
use cardmatrix::fsm::StateId;

fn make_service() -> (MatrixService, MockBus, RecordingSink) {
    (
        MatrixService::new(MatrixConfig::default()),
        MockBus::new(),
        RecordingSink::new(),
    )
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn bring_up_failure_exhausts_the_retry_budget() {
    let (mut service, mut bus, _sink) = make_service();
    let mut reader = ScriptedReader::dead();

    let result = service.initialize(&mut bus, &mut reader, 0);

    assert_eq!(result, Err(Error::Reader(ReaderError::Unavailable)));
    assert_eq!(
        reader.power_ups,
        u32::from(service.config().max_init_attempts),
        "one bring-up per configured attempt, then give up"
    );
    assert_eq!(service.mode(), StateId::Init, "supervisor never leaves Init");
}

#[test]
fn service_reaches_scanning_after_bring_up() {
    let (mut service, mut bus, mut sink) = make_service();
    let mut reader = ScriptedReader::alive();

    service.initialize(&mut bus, &mut reader, 0).unwrap();
    assert_eq!(service.mode(), StateId::Init);

    service.tick(&mut bus, &mut reader, &mut sink, 5);

    assert_eq!(service.mode(), StateId::Scanning);
    assert!(sink.events.contains(&MatrixEvent::ModeChanged {
        from: StateId::Init,
        to: StateId::Scanning,
    }));
}

// ── Card lifecycle through the full service ───────────────────

#[test]
fn card_lifecycle_flows_through_the_service() {
    let (mut service, mut bus, mut sink) = make_service();
    let mut reader = ScriptedReader::alive();
    reader.push_card(&[0xDE, 0xAD, 0xBE, 0xEF]);
    reader.push_card(&[0xDE, 0xAD, 0xBE, 0xEF]);
    reader.push_empty();

    service.initialize(&mut bus, &mut reader, 0).unwrap();
    service.tick(&mut bus, &mut reader, &mut sink, 5); // -> Scanning, added
    service.tick(&mut bus, &mut reader, &mut sink, 10); // steady, dwell
    service.tick(&mut bus, &mut reader, &mut sink, 15); // removed

    assert_eq!(sink.added(), 1);
    assert_eq!(sink.removed(), 1);
    assert_eq!(service.engine().counters().added, 1);
    assert_eq!(service.engine().cards_present(), 0);
}

// ── Reader loss and recovery ──────────────────────────────────

#[test]
fn liveness_loss_enters_recovery_then_reconnects() {
    let (mut service, mut bus, mut sink) = make_service();
    let mut reader = ScriptedReader::alive();

    service.initialize(&mut bus, &mut reader, 0).unwrap();
    service.tick(&mut bus, &mut reader, &mut sink, 5);
    assert_eq!(service.mode(), StateId::Scanning);

    // The liveness probe fires at its interval, demotes the session and the
    // supervisor drops to ErrorRecovery within the same tick.
    reader.identity_ok = false;
    service.tick(&mut bus, &mut reader, &mut sink, 10_000);
    assert_eq!(service.mode(), StateId::ErrorRecovery);
    assert!(sink.count(|e| matches!(e, MatrixEvent::ReaderLost { .. })) == 1);

    // Device comes back: the recovery tick reconnects and scanning resumes.
    reader.identity_ok = true;
    service.tick(&mut bus, &mut reader, &mut sink, 10_005);
    assert_eq!(service.mode(), StateId::Scanning);
    assert!(service.session().is_connected());
}

#[test]
fn reconnect_attempts_are_rate_limited() {
    let (mut service, mut bus, mut sink) = make_service();
    let mut reader = ScriptedReader::alive();

    service.initialize(&mut bus, &mut reader, 0).unwrap();
    service.tick(&mut bus, &mut reader, &mut sink, 5);

    reader.identity_ok = false;
    service.tick(&mut bus, &mut reader, &mut sink, 10_000); // demote
    assert_eq!(service.mode(), StateId::ErrorRecovery);

    // First recovery tick issues one real reconnect probe; the next tick,
    // still inside the fixed interval, must not touch the device.
    let probes_before = reader.identity_checks;
    service.tick(&mut bus, &mut reader, &mut sink, 10_005);
    assert_eq!(reader.identity_checks, probes_before + 1);

    service.tick(&mut bus, &mut reader, &mut sink, 10_010);
    assert_eq!(reader.identity_checks, probes_before + 1, "gated, no traffic");
    assert_eq!(service.mode(), StateId::ErrorRecovery);
}

#[test]
fn detection_errors_do_not_demote_the_session() {
    let (mut service, mut bus, mut sink) = make_service();
    let mut reader = ScriptedReader::alive();
    reader.push_error(ReaderError::Detection);
    reader.push_error(ReaderError::Timeout);

    service.initialize(&mut bus, &mut reader, 0).unwrap();
    service.tick(&mut bus, &mut reader, &mut sink, 5);
    service.tick(&mut bus, &mut reader, &mut sink, 10);

    // Per-cell failures are skips, not connection loss.
    assert_eq!(service.mode(), StateId::Scanning);
    assert!(service.session().is_connected());
    assert_eq!(service.session().stats().errors, 2);
    assert_eq!(service.session().stats().timeouts, 1);
}

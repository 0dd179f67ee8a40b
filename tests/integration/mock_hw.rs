//! Mock hardware adapters for integration tests.
//!
//! Records every GPIO write and reader transaction so tests can assert on
//! the full command history without touching real hardware.

use std::collections::VecDeque;

use cardmatrix::app::events::{CardUid, MatrixEvent};
use cardmatrix::app::ports::{EventSink, GpioBus, ReaderPort};
use cardmatrix::error::ReaderError;

// ── MockBus ───────────────────────────────────────────────────

/// GPIO bank double: records every line write and accumulated delay.
pub struct MockBus {
    pub writes: Vec<(i32, bool)>,
    pub total_delay_us: u64,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            total_delay_us: 0,
        }
    }

    /// Most recent level written to `gpio`, if any.
    pub fn level(&self, gpio: i32) -> Option<bool> {
        self.writes
            .iter()
            .rev()
            .find_map(|(g, high)| (*g == gpio).then_some(*high))
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioBus for MockBus {
    fn write(&mut self, gpio: i32, high: bool) {
        self.writes.push((gpio, high));
    }

    fn delay_us(&mut self, us: u32) {
        self.total_delay_us += u64::from(us);
    }
}

// ── ScriptedReader ────────────────────────────────────────────

/// Reader double with a scripted reply queue. When the queue is empty,
/// `detect` falls back to `sticky` (a card that stays in the field) or an
/// empty field.
pub struct ScriptedReader {
    pub power_ok: bool,
    pub identity_ok: bool,
    pub replies: VecDeque<Result<Option<CardUid>, ReaderError>>,
    pub sticky: Option<CardUid>,
    pub power_ups: u32,
    pub identity_checks: u32,
    pub detects: u32,
}

#[allow(dead_code)]
impl ScriptedReader {
    pub fn alive() -> Self {
        Self {
            power_ok: true,
            identity_ok: true,
            replies: VecDeque::new(),
            sticky: None,
            power_ups: 0,
            identity_checks: 0,
            detects: 0,
        }
    }

    pub fn dead() -> Self {
        Self {
            power_ok: false,
            identity_ok: false,
            ..Self::alive()
        }
    }

    pub fn push_card(&mut self, uid: &[u8]) {
        self.replies
            .push_back(Ok(Some(CardUid::from_slice(uid).unwrap())));
    }

    pub fn push_empty(&mut self) {
        self.replies.push_back(Ok(None));
    }

    pub fn push_error(&mut self, e: ReaderError) {
        self.replies.push_back(Err(e));
    }

    pub fn hold_card(&mut self, uid: &[u8]) {
        self.sticky = Some(CardUid::from_slice(uid).unwrap());
    }
}

impl ReaderPort for ScriptedReader {
    fn power_up(&mut self) -> bool {
        self.power_ups += 1;
        self.power_ok
    }

    fn identity_check(&mut self) -> bool {
        self.identity_checks += 1;
        self.identity_ok
    }

    fn detect(&mut self, _timeout_ms: u32) -> Result<Option<CardUid>, ReaderError> {
        self.detects += 1;
        if let Some(reply) = self.replies.pop_front() {
            return reply;
        }
        Ok(self.sticky.clone())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Event sink double that keeps every emitted event in order.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<MatrixEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&MatrixEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn added(&self) -> usize {
        self.count(|e| matches!(e, MatrixEvent::CardAdded { .. }))
    }

    pub fn removed(&self) -> usize {
        self.count(|e| matches!(e, MatrixEvent::CardRemoved { .. }))
    }

    pub fn changed(&self) -> usize {
        self.count(|e| matches!(e, MatrixEvent::CardChanged { .. }))
    }

    pub fn sweeps(&self) -> usize {
        self.count(|e| matches!(e, MatrixEvent::SweepComplete(_)))
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &MatrixEvent) {
        self.events.push(event.clone());
    }
}

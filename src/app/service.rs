//! Matrix service — the top-level context.
//!
//! [`MatrixService`] owns every stateful component by value: the supervisor
//! FSM and its context, the cell addressing manager, the reader session and
//! the scan engine. No globals, no singletons. All I/O flows through port
//! traits injected at call sites, making the entire service testable with
//! mock adapters.
//!
//! ```text
//!   GpioBus ──▶ ┌────────────────────────────┐ ──▶ EventSink
//!               │        MatrixService        │
//! ReaderPort ──▶│  FSM · Addressing · Session │
//!               │        · ScanEngine         │
//!               └────────────────────────────┘
//! ```

use log::{error, info, warn};

use crate::app::events::MatrixEvent;
use crate::app::ports::{EventSink, GpioBus, ReaderPort};
use crate::config::MatrixConfig;
use crate::drivers::addressing::CellAddressing;
use crate::error::{Error, ReaderError, Result};
use crate::fsm::context::SupervisorContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::reader::session::ReaderSession;
use crate::scan::engine::ScanEngine;

pub struct MatrixService {
    config: MatrixConfig,
    fsm: Fsm,
    ctx: SupervisorContext,
    addressing: CellAddressing,
    session: ReaderSession,
    engine: ScanEngine,
}

impl MatrixService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch hardware — call [`initialize`](Self::initialize)
    /// next.
    pub fn new(config: MatrixConfig) -> Self {
        let ctx = SupervisorContext::new(&config);
        let fsm = Fsm::new(build_state_table(), StateId::Init);
        let addressing = CellAddressing::new(config.mux_settle_time_us);
        let session = ReaderSession::new(&config);
        let engine = ScanEngine::new(&config);

        Self {
            config,
            fsm,
            ctx,
            addressing,
            session,
            engine,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring up the addressing chain and the reader.
    ///
    /// Reader bring-up is retried up to `max_init_attempts` times with a
    /// fixed delay between attempts; exhausting the budget is a fatal
    /// startup condition — the supervisor never leaves `Init` and the error
    /// is surfaced to the caller.
    pub fn initialize(
        &mut self,
        bus: &mut impl GpioBus,
        reader: &mut impl ReaderPort,
        now_ms: u32,
    ) -> Result<()> {
        info!(
            "MatrixService: initializing {}x{} matrix",
            crate::config::MATRIX_ROWS,
            crate::config::MATRIX_COLS
        );

        self.addressing.init(bus);
        self.fsm.start(&mut self.ctx);

        let attempts = self.config.max_init_attempts.max(1);
        for attempt in 1..=attempts {
            match self.session.initialize(reader, now_ms) {
                Ok(()) => {
                    self.ctx.init_complete = true;
                    self.ctx.reader_connected = true;
                    info!("MatrixService: reader up on attempt {attempt}/{attempts}");
                    return Ok(());
                }
                Err(e) => {
                    warn!("MatrixService: reader bring-up attempt {attempt}/{attempts} failed: {e}");
                    if attempt < attempts {
                        bus.delay_us(self.config.init_retry_delay_ms.saturating_mul(1000));
                    }
                }
            }
        }

        error!("MatrixService: reader unavailable after {attempts} attempts");
        Err(Error::Reader(ReaderError::Unavailable))
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: liveness probe → context refresh → recovery
    /// reconnect → supervisor tick → one scan-engine update when scanning.
    pub fn tick(
        &mut self,
        bus: &mut impl GpioBus,
        reader: &mut impl ReaderPort,
        sink: &mut impl EventSink,
        now_ms: u32,
    ) {
        self.ctx.now_ms = now_ms;

        // 1. Independent liveness probe (session-gated to its interval).
        if self.session.is_connected() && !self.session.check_connection(reader, now_ms) {
            sink.emit(&MatrixEvent::ReaderLost {
                errors: self.session.stats().errors,
            });
        }

        // 2. While recovering, attempt a reconnect; the session rate-limits
        //    to one real attempt per fixed interval.
        if self.fsm.current_state() == StateId::ErrorRecovery && !self.session.is_connected() {
            let _ = self.session.reconnect(reader, now_ms);
        }

        self.ctx.reader_connected = self.session.is_connected();

        // 3. Supervisor tick (pure mode logic).
        if let Some((from, to)) = self.fsm.tick(&mut self.ctx) {
            sink.emit(&MatrixEvent::ModeChanged { from, to });
        }

        // 4. One unit of scan work when the machine settled in Scanning.
        if self.fsm.current_state() == StateId::Scanning {
            self.engine.update(
                &mut self.addressing,
                &mut self.session,
                bus,
                reader,
                sink,
                now_ms,
            );
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn mode(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn transition_count(&self) -> u32 {
        self.fsm.transition_count()
    }

    pub fn engine(&self) -> &ScanEngine {
        &self.engine
    }

    pub fn session(&self) -> &ReaderSession {
        &self.session
    }

    pub fn addressing(&self) -> &CellAddressing {
        &self.addressing
    }

    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }
}

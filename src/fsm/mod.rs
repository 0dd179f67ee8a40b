//! Function-pointer finite state machine for the supervisor.
//!
//! Classic embedded FSM pattern: a fixed table of state descriptors, each
//! with optional `on_enter`/`on_exit` actions and a per-tick `on_update`
//! handler. Each tick the engine calls `on_update` for the **current**
//! state; if it returns `Some(next)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the pointer.
//! All handlers receive `&mut SupervisorContext`.
//!
//! Transition logging is rate-limited: entering or leaving `ErrorRecovery`
//! or `Init` always logs; routine transitions produce a summary line at
//! most once per report window.

pub mod context;
pub mod states;

use context::SupervisorContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Operating modes of the scanner. No terminal state — this is a
/// long-running control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Init = 0,
    Scanning = 1,
    ErrorRecovery = 2,
    Idle = 3,
}

impl StateId {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert a `u8` index back to `StateId`. Any unrecognized value
    /// decodes to `ErrorRecovery` — the fail-safe default mode, in every
    /// build profile.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Init,
            1 => Self::Scanning,
            2 => Self::ErrorRecovery,
            3 => Self::Idle,
            _ => Self::ErrorRecovery,
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut SupervisorContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut SupervisorContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The supervisor state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Index of the previously active state.
    previous: usize,
    /// Monotonically increasing tick counter.
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
    /// Cumulative transition count.
    transitions: u32,
    /// Rate-limited reporting bookkeeping.
    last_report_ms: u32,
    transitions_at_report: u32,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            previous: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
            transitions: 0,
            last_report_ms: 0,
            transitions_at_report: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut SupervisorContext) {
        info!("Supervisor starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick. Returns the transition that occurred,
    /// if any, so the service can emit a `ModeChanged` event.
    pub fn tick(&mut self, ctx: &mut SupervisorContext) -> Option<(StateId, StateId)> {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;
        ctx.total_ticks = self.tick_count;

        let next = (self.table[self.current].on_update)(ctx);

        next.and_then(|next_id| {
            if next_id as usize == self.current {
                return None;
            }
            let from = self.current_state();
            self.transition(next_id, ctx);
            Some((from, next_id))
        })
    }

    /// Force an immediate transition (bring-up failure paths, tests).
    pub fn force_transition(&mut self, next: StateId, ctx: &mut SupervisorContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// The state the machine was in before the last transition.
    pub fn previous_state(&self) -> StateId {
        StateId::from_index(self.previous)
    }

    /// Cumulative transition count.
    pub fn transition_count(&self) -> u32 {
        self.transitions
    }

    /// How many ticks the FSM has been in the current state.
    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut SupervisorContext) {
        let next_idx = next_id as usize;
        let from = self.current_state();

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointers and timing
        self.previous = self.current;
        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        self.transitions += 1;
        ctx.ticks_in_state = 0;

        self.report_transition(from, next_id, ctx);

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Entry/exit of ErrorRecovery and Init always log; routine transitions
    /// are summarised at most once per report window.
    fn report_transition(&mut self, from: StateId, to: StateId, ctx: &SupervisorContext) {
        let always = matches!(from, StateId::ErrorRecovery | StateId::Init)
            || matches!(to, StateId::ErrorRecovery | StateId::Init);

        if always {
            info!(
                "Supervisor: {} -> {} (transition #{})",
                self.table[from as usize].name, self.table[to as usize].name, self.transitions
            );
        } else if ctx.now_ms.wrapping_sub(self.last_report_ms) >= ctx.report_window_ms {
            let in_window = self.transitions - self.transitions_at_report;
            info!(
                "Supervisor: {} transitions in window (total {}), now {}",
                in_window, self.transitions, self.table[to as usize].name
            );
            self.last_report_ms = ctx.now_ms;
            self.transitions_at_report = self.transitions;
        }
    }
}

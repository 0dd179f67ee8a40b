//! Two-stage cell addressing: row switch × column switch + shared enable.
//!
//! Composes the two [`MuxSwitch`]es into a single logical "select physical
//! cell K" operation and owns the conversion between linear cell index and
//! (row, col) pairs. The shared enable line is active LOW and is re-asserted
//! after every selection — if an error path ever deasserted it, the next
//! selection repairs it.

use log::warn;

use crate::app::ports::GpioBus;
use crate::config::{MATRIX_COLS, MATRIX_ROWS, TOTAL_CELLS};
use crate::error::AddressingError;
use crate::pins;

use super::mux_switch::MuxSwitch;

// ---------------------------------------------------------------------------
// Pure index math
// ---------------------------------------------------------------------------

/// Linear index → (row, col). Caller guarantees `index < TOTAL_CELLS`.
pub fn index_to_row_col(index: u8) -> (u8, u8) {
    (index / MATRIX_COLS as u8, index % MATRIX_COLS as u8)
}

/// (row, col) → linear index. Caller guarantees both are in range.
pub fn row_col_to_index(row: u8, col: u8) -> u8 {
    row * MATRIX_COLS as u8 + col
}

// ---------------------------------------------------------------------------
// CellAddressing
// ---------------------------------------------------------------------------

pub struct CellAddressing {
    row_switch: MuxSwitch,
    col_switch: MuxSwitch,
    enable_gpio: i32,
    settle_us: u32,
    current_row: u8,
    current_col: u8,
    enabled: bool,
}

impl CellAddressing {
    pub fn new(settle_us: u32) -> Self {
        Self {
            row_switch: MuxSwitch::new("row", &pins::MUX_ROW_SELECT, MATRIX_ROWS as u8),
            col_switch: MuxSwitch::new("col", &pins::MUX_COL_SELECT, MATRIX_COLS as u8),
            enable_gpio: pins::MUX_ENABLE_GPIO,
            settle_us,
            current_row: 0,
            current_col: 0,
            enabled: false,
        }
    }

    /// Bring the chain to a known state. Disables the switches **before**
    /// any address is asserted, to avoid a transient connection to an
    /// undefined channel, then parks on cell (0, 0).
    pub fn init(&mut self, bus: &mut impl GpioBus) {
        self.disable(bus);
        self.row_switch.init(bus, self.settle_us);
        self.col_switch.init(bus, self.settle_us);
        self.current_row = 0;
        self.current_col = 0;
        // select_cell re-enables the chain.
        let _ = self.select_cell(bus, 0, 0);
    }

    /// Select the antenna at (row, col). Only the switch(es) whose address
    /// actually changed are written; the enable line is re-asserted on every
    /// call. Out-of-range requests are a logged no-op.
    pub fn select_cell(
        &mut self,
        bus: &mut impl GpioBus,
        row: u8,
        col: u8,
    ) -> Result<(), AddressingError> {
        if row as usize >= MATRIX_ROWS {
            warn!("CellAddressing: rejected row {row}");
            return Err(AddressingError::RowOutOfRange(row));
        }
        if col as usize >= MATRIX_COLS {
            warn!("CellAddressing: rejected column {col}");
            return Err(AddressingError::ColOutOfRange(col));
        }

        // The switches suppress rewrites of an unchanged address themselves.
        self.row_switch.set_address(bus, row, self.settle_us)?;
        self.col_switch.set_address(bus, col, self.settle_us)?;
        self.current_row = row;
        self.current_col = col;

        self.enable(bus);
        Ok(())
    }

    /// Select by linear index `0..TOTAL_CELLS`.
    pub fn select_index(&mut self, bus: &mut impl GpioBus, index: u8) -> Result<(), AddressingError> {
        if index as usize >= TOTAL_CELLS {
            warn!("CellAddressing: rejected cell index {index}");
            return Err(AddressingError::IndexOutOfRange(index));
        }
        let (row, col) = index_to_row_col(index);
        self.select_cell(bus, row, col)
    }

    /// Index of the cell after the current one, wrapping at the end of the
    /// grid — the sweep is infinite and cyclic.
    pub fn next_index(&self) -> u8 {
        let next = self.current_index() as usize + 1;
        (next % TOTAL_CELLS) as u8
    }

    /// Select the next cell in sweep order and return its index.
    pub fn advance(&mut self, bus: &mut impl GpioBus) -> u8 {
        let next = self.next_index();
        // next_index is always in range.
        let _ = self.select_index(bus, next);
        next
    }

    /// Assert the shared enable line (active LOW).
    pub fn enable(&mut self, bus: &mut impl GpioBus) {
        bus.write(self.enable_gpio, false);
        self.enabled = true;
    }

    /// Deassert the shared enable line — disconnects all 96 antennas.
    pub fn disable(&mut self, bus: &mut impl GpioBus) {
        bus.write(self.enable_gpio, true);
        self.enabled = false;
    }

    pub fn current_index(&self) -> u8 {
        row_col_to_index(self.current_row, self.current_col)
    }

    pub fn current_cell(&self) -> (u8, u8) {
        (self.current_row, self.current_col)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

//! Hardware drivers: the multiplexer switch and the two-stage cell
//! addressing chain built from it.

pub mod addressing;
pub mod mux_switch;

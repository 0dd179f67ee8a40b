//! CardMatrix firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod reader;
pub mod scan;

// Adapters and drivers compile on the host too; the ESPidf-only parts are
// guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;

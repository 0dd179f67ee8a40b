//! Driven adapters: implementations of the port traits over real hardware
//! and the logger. ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` so everything else builds on the host.

pub mod hardware;
pub mod log_sink;
#[cfg(target_os = "espidf")]
pub mod pn532;
pub mod time;

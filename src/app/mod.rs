//! Application layer: port traits, outbound events, and the top-level
//! service that owns every stateful component.

pub mod events;
pub mod ports;
pub mod service;

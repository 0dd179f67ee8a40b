//! Reader lifecycle management for the single PN532 device.

pub mod session;

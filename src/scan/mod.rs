//! Cooperative matrix scanning: the per-cell cache and the cycle engine.

pub mod engine;

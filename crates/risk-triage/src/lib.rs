//! Risk-triage decision engine.
//!
//! Classifies free-text incident reports through a fixed cascade (manual override,
//! bilingual keyword scan, declarative rules, a lazily trained classifier and a
//! deterministic heuristic) and maps between the predicted and stored risk scales.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod triage;

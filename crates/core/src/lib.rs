//! Deterministic kernel of the rep coach.
//!
//! Turns per-frame pose landmarks into joint angles, counts repetitions with
//! a hysteresis state machine, and summarises each completed repetition into
//! a [`cycle::CycleDigest`] that drives rule feedback and LLM prompts.
//! Nothing in this crate performs I/O.

pub mod angle;
pub mod cycle;
pub mod error;
pub mod feedback;
pub mod hold;
pub mod landmarks;
pub mod metrics;
pub mod posture;
pub mod profile;
pub mod rep_counter;
pub mod session;
pub mod text;
pub mod threshold_validation;
pub mod types;

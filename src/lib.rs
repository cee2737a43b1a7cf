//! Garble - Synthetic Speech Degradation
//!
//! Turns clean speech recordings into labeled degraded variants for training
//! and testing speech systems under adverse conditions.
//!
//! # Architecture
//!
//! - `engine`: mono audio buffers and WAV I/O
//! - `dsp`: the degradation stages (filters, noise, echo, dropout, mixing)
//! - `pipeline`: per-file orchestration with seeded parameter draws
//! - `cli`: the batch command-line surface

pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod pipeline;

pub use error::{GarbleError, Result};

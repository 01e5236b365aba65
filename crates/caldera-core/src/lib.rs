//! Caldera Core
//!
//! This crate contains the foundation shared by every Caldera crate:
//! logging setup, frame profiling, engine configuration, and the
//! collection/math aliases the rest of the engine builds on.

pub mod alloc;
pub mod config;
pub mod logging;
pub mod math;
#[cfg(feature = "profiling")]
pub mod profiling;

//! Shared Type Definitions for interval capture
//!
//! This crate contains the geometry, target and session identity types
//! shared by the capture backends, the scheduler and the command-line app.

mod geometry;
mod session;
mod target;

pub use geometry::*;
pub use session::*;
pub use target::*;

/// Smallest capture period in milliseconds; shorter requests are clamped up to it
pub const MIN_INTERVAL_MS: f64 = 1.0;

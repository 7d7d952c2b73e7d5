//! Capture Session - periodic screenshots of a process window or the desktop
//!
//! Resolves a process name to window bounds every tick, falls back to the
//! primary display, and reports each bitmap or failure to observers.

mod activator;
mod config;
mod error;
mod events;
mod resolver;
mod scheduler;
mod status;

pub use activator::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use resolver::*;
pub use scheduler::*;
pub use status::*;

pub use capture::{CapturedImage, PixelFormat, PlatformServices, SamplingQuality};
pub use capture_types::{Bounds, CaptureTarget, ProcessHandle, SessionId, SessionState, WindowId};

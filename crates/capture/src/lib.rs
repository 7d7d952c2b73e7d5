//! Screen Capture - platform-native window lookup and screen copies
//!
//! Provides abstraction over platform-specific APIs:
//! - Process enumeration: sysinfo (all platforms)
//! - Windows: user32 window queries, GDI `BitBlt` screen copies

mod engine;
mod error;
mod frame;
mod process;
mod traits;
mod window;

#[cfg(target_os = "windows")]
mod win32;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use engine::*;
pub use error::*;
pub use frame::*;
pub use process::{find_process_by_name, process_has_exited, process_name_matches};
pub use traits::*;

#[cfg(target_os = "windows")]
pub use self::win32::WindowsPlatform;

/// Create the platform-appropriate desktop and screen services
pub fn create_platform() -> CaptureResult<PlatformServices> {
    #[cfg(target_os = "windows")]
    {
        let platform = std::sync::Arc::new(WindowsPlatform::new()?);
        Ok(PlatformServices::new(platform))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(CaptureError::UnsupportedPlatform)
    }
}

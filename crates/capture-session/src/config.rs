//! Capture configuration

use std::time::Duration;

use capture::SamplingQuality;
use capture_types::MIN_INTERVAL_MS;
use serde::Serialize;

use crate::ConfigError;

/// Validated capture period
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CaptureInterval {
    millis: f64,
}

impl CaptureInterval {
    /// Validate a period in milliseconds.
    ///
    /// Anything below one millisecond is clamped up to it; larger values are
    /// kept exactly as given.
    pub fn from_millis(millis: f64) -> Result<Self, ConfigError> {
        if !millis.is_finite() {
            return Err(ConfigError::NonFiniteInterval(millis));
        }

        let millis = if millis < MIN_INTERVAL_MS {
            MIN_INTERVAL_MS
        } else {
            millis
        };

        Duration::try_from_secs_f64(millis / 1000.0)
            .map_err(|_| ConfigError::IntervalOutOfRange(millis))?;

        Ok(Self { millis })
    }

    /// Validate a period in seconds
    pub fn from_secs(secs: f64) -> Result<Self, ConfigError> {
        Self::from_millis(secs * 1000.0)
    }

    pub fn as_millis(&self) -> f64 {
        self.millis
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs_f64(self.millis / 1000.0)
    }
}

/// Scheduler behaviour
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Restore and focus the target window once at session start
    pub activate_window: bool,
    /// Sampling settings for the screen copy
    pub quality: SamplingQuality,
    /// Name given to session worker threads
    pub thread_name: String,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            activate_window: true,
            quality: SamplingQuality::High,
            thread_name: "capture-session".to_string(),
        }
    }
}

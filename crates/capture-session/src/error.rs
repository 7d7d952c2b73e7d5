//! Session error types

use capture_types::SessionId;
use serde::Serialize;
use thiserror::Error;

/// Rejected capture parameters; never reaches the scheduler
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Capture interval must be a finite number of milliseconds, got {0}")]
    NonFiniteInterval(f64),

    #[error("Capture interval of {0} ms is out of range")]
    IntervalOutOfRange(f64),
}

/// Error starting a capture session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to spawn capture worker: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Step of a capture cycle that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    ResolveTarget,
    Capture,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::ResolveTarget => write!(f, "Target resolution"),
            Operation::Capture => write!(f, "Screen capture"),
        }
    }
}

/// Failure recorded during a session
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{operation} failed: {message}")]
pub struct CaptureFailure {
    pub session: SessionId,
    pub operation: Operation,
    pub message: String,
}

impl CaptureFailure {
    pub fn new(session: SessionId, operation: Operation, error: impl std::fmt::Display) -> Self {
        Self {
            session,
            operation,
            message: error.to_string(),
        }
    }
}

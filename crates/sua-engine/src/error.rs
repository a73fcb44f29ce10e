//! Error types for the engine bridge
//!
//! Two shapes live here:
//!
//! - [`PjError`] - the record an [`crate::Engine`] keeps about its last failed
//!   native step (`{status, "<step> failed."}`), queried with
//!   [`crate::Engine::last_error`]
//! - [`EngineError`] - the error half of every [`EngineResult`]

use serde::{Deserialize, Serialize};
use std::fmt;
use sua_native::PjStatus;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Status of the last failed native step
///
/// The default value is the "no error" record: success status and an empty
/// message.
///
/// # Examples
///
/// ```rust
/// use sua_engine::PjError;
/// use sua_native::PjStatus;
///
/// let error = PjError::step_failed("pjsua init", PjStatus::EINVAL);
/// assert_eq!(error.message(), "pjsua init failed.");
/// assert_eq!(error.status(), PjStatus::EINVAL);
/// assert!(error.is_error());
///
/// assert!(!PjError::default().is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PjError {
    status: PjStatus,
    message: String,
}

impl PjError {
    pub fn new(status: PjStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The record for a failed named step
    pub fn step_failed(step: &str, status: PjStatus) -> Self {
        Self::new(status, format!("{} failed.", step))
    }

    pub fn status(&self) -> PjStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_error(&self) -> bool {
        !self.status.is_success()
    }
}

impl fmt::Display for PjError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_error() {
            write!(f, "{} [{}]", self.message, self.status)
        } else {
            f.write_str("no error")
        }
    }
}

/// Errors returned by engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// A native entry point reported a failure
    #[error("{step} failed: {status}")]
    Native { step: &'static str, status: PjStatus },

    /// A list does not fit the native fixed-capacity array
    #[error("too many {what}: {count} given, at most {max} supported")]
    Capacity {
        what: &'static str,
        count: usize,
        max: usize,
    },

    /// The native engine has no record for the given id
    #[error("{what} not found: {status}")]
    NotFound { what: String, status: PjStatus },

    /// Operation not allowed in the current state
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Settings file could not be parsed
    #[error("Settings error: {0}")]
    Settings(#[from] toml::de::Error),

    /// Settings file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Native status behind this error, if any
    pub fn status(&self) -> Option<PjStatus> {
        match self {
            Self::Native { status, .. } | Self::NotFound { status, .. } => Some(*status),
            Self::Capacity { .. } => Some(PjStatus::ETOOMANY),
            _ => None,
        }
    }
}

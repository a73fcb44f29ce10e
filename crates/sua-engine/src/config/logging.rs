//! Native logging configuration

use std::fmt;
use std::sync::Arc;

use crate::logging::LogReceiver;

/// Default console verbosity of the native engine
pub const DEFAULT_CONSOLE_LEVEL: u32 = 4;

/// How the native engine's own log output is handled
///
/// `console_level` caps which native log lines are produced at all. When a
/// receiver is set, every produced line is delivered to it on a dispatcher
/// thread; the native thread that logged never runs receiver code.
///
/// # Examples
///
/// ```rust
/// use sua_engine::config::LoggingConfiguration;
/// use sua_engine::logging::TracingLogReceiver;
/// use std::sync::Arc;
///
/// let logging = LoggingConfiguration::new()
///     .with_console_level(5)
///     .with_receiver(Arc::new(TracingLogReceiver::default()));
///
/// assert_eq!(logging.console_level(), 5);
/// assert!(logging.receiver().is_some());
/// ```
#[derive(Clone)]
pub struct LoggingConfiguration {
    console_level: u32,
    receiver: Option<Arc<dyn LogReceiver>>,
}

impl LoggingConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_console_level(mut self, level: u32) -> Self {
        self.console_level = level;
        self
    }

    /// Deliver native log lines to `receiver`
    pub fn with_receiver(mut self, receiver: Arc<dyn LogReceiver>) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn console_level(&self) -> u32 {
        self.console_level
    }

    pub fn receiver(&self) -> Option<&Arc<dyn LogReceiver>> {
        self.receiver.as_ref()
    }
}

impl Default for LoggingConfiguration {
    fn default() -> Self {
        Self {
            console_level: DEFAULT_CONSOLE_LEVEL,
            receiver: None,
        }
    }
}

impl fmt::Debug for LoggingConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfiguration")
            .field("console_level", &self.console_level)
            .field("receiver", &self.receiver.is_some())
            .finish()
    }
}

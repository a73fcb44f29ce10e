//! Logging
//!
//! Two separate things live here. [`LogReceiver`] is where the native
//! engine's own log lines end up (see
//! [`LoggingConfiguration`](crate::config::LoggingConfiguration)).
//! [`setup_logging`] installs the process's `tracing` subscriber, which is
//! what this crate itself logs through.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{EngineError, EngineResult};

/// Receives native log lines
///
/// Lines arrive on a dispatcher thread in the order the native engine
/// produced them. `level` is the native verbosity (0 fatal .. 6 very
/// detailed) and `message` is the text exactly as logged.
pub trait LogReceiver: Send + Sync {
    fn on_log(&self, level: i32, message: &str);
}

/// Forwards native log lines into `tracing`
///
/// Native levels map to tracing levels as 0-1 error, 2 warn, 3 info,
/// 4 debug and 5 and up trace. Every event carries the original level in
/// the `pj_level` field.
#[derive(Debug, Clone, Default)]
pub struct TracingLogReceiver;

impl TracingLogReceiver {
    pub fn new() -> Self {
        Self
    }

    /// Tracing level a native level is logged at
    pub fn level_for(level: i32) -> Level {
        match level {
            i32::MIN..=1 => Level::ERROR,
            2 => Level::WARN,
            3 => Level::INFO,
            4 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

impl LogReceiver for TracingLogReceiver {
    fn on_log(&self, level: i32, message: &str) {
        // The level argument of `tracing::event!` must be a constant.
        match level {
            i32::MIN..=1 => tracing::error!(target: "pjsua", pj_level = level, "{}", message),
            2 => tracing::warn!(target: "pjsua", pj_level = level, "{}", message),
            3 => tracing::info!(target: "pjsua", pj_level = level, "{}", message),
            4 => tracing::debug!(target: "pjsua", pj_level = level, "{}", message),
            _ => tracing::trace!(target: "pjsua", pj_level = level, "{}", message),
        }
    }
}

/// Settings for the process's tracing subscriber
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// The log level to use
    pub level: Level,
    /// Whether to include file and line information
    pub file_info: bool,
    /// Whether to log span enter/exit
    pub log_spans: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: Level::INFO,
            file_info: false,
            log_spans: false,
        }
    }
}

impl LogSettings {
    pub fn new(level: Level) -> Self {
        LogSettings {
            level,
            ..Default::default()
        }
    }

    /// Enable file and line information in logs
    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    /// Enable span logging
    pub fn with_spans(mut self) -> Self {
        self.log_spans = true;
        self
    }
}

/// Install a `fmt` subscriber for the process
///
/// `RUST_LOG` directives are honoured on top of `settings.level`. When a
/// global subscriber is already installed this does nothing.
pub fn setup_logging(settings: LogSettings) -> EngineResult<()> {
    let filter = EnvFilter::from_default_env().add_directive(settings.level.into());

    let span_events = if settings.log_spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };

    let result = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_file(settings.file_info)
        .with_line_number(settings.file_info)
        .try_init();

    if let Err(e) = result {
        tracing::debug!("tracing subscriber already installed: {}", e);
    }
    Ok(())
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> EngineResult<Level> {
    Level::from_str(level).map_err(|_| EngineError::config(format!("Invalid log level: {}", level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(TracingLogReceiver::level_for(0), Level::ERROR);
        assert_eq!(TracingLogReceiver::level_for(1), Level::ERROR);
        assert_eq!(TracingLogReceiver::level_for(2), Level::WARN);
        assert_eq!(TracingLogReceiver::level_for(3), Level::INFO);
        assert_eq!(TracingLogReceiver::level_for(4), Level::DEBUG);
        assert_eq!(TracingLogReceiver::level_for(5), Level::TRACE);
        assert_eq!(TracingLogReceiver::level_for(6), Level::TRACE);
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug").ok(), Some(Level::DEBUG));
        assert_eq!(parse_log_level("WARN").ok(), Some(Level::WARN));
        assert!(matches!(parse_log_level("loud"), Err(EngineError::Config { .. })));
    }

    #[test]
    fn test_setup_logging_twice_is_harmless() {
        assert!(setup_logging(LogSettings::default()).is_ok());
        assert!(setup_logging(LogSettings::new(Level::DEBUG).with_file_info()).is_ok());
    }
}

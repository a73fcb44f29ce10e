//! File-based engine settings
//!
//! ```toml
//! [logging]
//! console_level = 5
//! forward_to_tracing = true
//!
//! [transport]
//! port = 5080
//!
//! [[accounts]]
//! sip_url = "sip:alice@example.com"
//! registration_uri = "sip:example.com"
//! proxies = ["sip:proxy.example.com;lr"]
//!
//! [[accounts.credentials]]
//! realm = "*"
//! username = "alice"
//! password = "secret"
//! ```
//!
//! Every section is optional; missing values take the same defaults as the
//! value objects they fill.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::account::AccountConfiguration;
use super::logging::{LoggingConfiguration, DEFAULT_CONSOLE_LEVEL};
use super::media::MediaConfiguration;
use super::transport::TransportConfiguration;
use crate::builder::Builder;
use crate::error::EngineResult;
use crate::logging::TracingLogReceiver;

/// The `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Native console verbosity
    pub console_level: u32,
    /// Send native log lines to `tracing` through [`TracingLogReceiver`]
    pub forward_to_tracing: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            console_level: DEFAULT_CONSOLE_LEVEL,
            forward_to_tracing: false,
        }
    }
}

impl LoggingSettings {
    /// The logging configuration these settings describe
    pub fn to_configuration(&self) -> LoggingConfiguration {
        let logging = LoggingConfiguration::new().with_console_level(self.console_level);
        if self.forward_to_tracing {
            logging.with_receiver(Arc::new(TracingLogReceiver::new()))
        } else {
            logging
        }
    }
}

/// Everything needed to bring an engine up and register its accounts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    pub logging: LoggingSettings,
    pub transport: TransportConfiguration,
    pub media: MediaConfiguration,
    pub accounts: Vec<AccountConfiguration>,
}

impl EngineSettings {
    /// Parse settings from TOML text
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let settings: EngineSettings = toml::from_str(text)?;
        debug!(
            "Loaded engine settings: port {}, {} account(s)",
            settings.transport.port,
            settings.accounts.len()
        );
        Ok(settings)
    }

    /// Read and parse a TOML settings file
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// A builder carrying the media, logging and transport sections
    pub fn builder(&self) -> Builder {
        Builder::new()
            .with_media_configuration(self.media.clone())
            .with_logging_configuration(self.logging.to_configuration())
            .with_transport_configuration(self.transport.clone())
    }
}

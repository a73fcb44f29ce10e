//! Transport configuration

use serde::{Deserialize, Serialize};

/// Default SIP listening port
pub const DEFAULT_SIP_PORT: u16 = 5060;

/// SIP transport parameters
///
/// Only the UDP listening port is tunable; everything else keeps the native
/// defaults.
///
/// # Examples
///
/// ```rust
/// use sua_engine::config::TransportConfiguration;
///
/// let transport = TransportConfiguration::new().with_port(5080);
/// assert_eq!(transport.port, 5080);
/// assert_eq!(TransportConfiguration::default().port, 5060);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfiguration {
    /// UDP port to listen on, `0` lets the engine pick one
    pub port: u16,
}

impl TransportConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl Default for TransportConfiguration {
    fn default() -> Self {
        Self {
            port: DEFAULT_SIP_PORT,
        }
    }
}

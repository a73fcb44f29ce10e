//! Configuration value objects
//!
//! Plain parameter bags with defaults. Nothing here talks to the native
//! engine; [`crate::translate`] turns them into native parameter blocks when
//! the engine is built or an account is added.
//!
//! ```text
//! Builder ──┬── MediaConfiguration      ─▶ MediaConfig
//!           ├── LoggingConfiguration    ─▶ LogConfig (+ queued log receiver)
//!           └── TransportConfiguration  ─▶ TransportConfig (UDP)
//!
//! Engine::add_account(AccountConfiguration) ─▶ AccConfig<'_>
//! ```

pub mod account;
pub mod logging;
pub mod media;
pub mod settings;
pub mod transport;

pub use account::{AccountConfiguration, AccountCredential, CredentialDataType};
pub use logging::LoggingConfiguration;
pub use media::MediaConfiguration;
pub use settings::{EngineSettings, LoggingSettings};
pub use transport::TransportConfiguration;

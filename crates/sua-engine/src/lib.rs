//! # sua-engine - event-driven bridge over a native SIP user agent
//!
//! This crate turns a native user-agent engine (anything implementing
//! [`sua_native::NativeUserAgent`]) into something an application can drive:
//!
//! - a fluent [`Builder`] that translates configuration into the native
//!   startup blocks and brings the engine up in a fixed, fail-fast order
//! - [`Engine::add_account`], translating an [`AccountConfiguration`] into the
//!   native account block
//! - a callback bridge that turns the native engine's context-free callbacks,
//!   fired on its own threads, into [`EngineEvent`]s carrying immutable
//!   [`CallInfo`] / [`AccountInfo`] snapshots
//!
//! ## Quick Start
//!
//! ```rust
//! use sua_engine::config::{AccountConfiguration, AccountCredential};
//! use sua_engine::events::{EngineEventHandler, EventSubscription};
//! use sua_engine::{AccountInfo, Engine};
//! use sua_native::loopback::LoopbackUserAgent;
//! use std::sync::Arc;
//!
//! struct Registrations;
//!
//! impl EngineEventHandler for Registrations {
//!     fn on_registration_started(&self, account: &AccountInfo, renew: bool) {
//!         println!("{} registering: {}", account.uri, renew);
//!     }
//! }
//!
//! let engine = Engine::build().create(LoopbackUserAgent::new());
//! assert!(engine.is_valid());
//!
//! engine.subscribe(EventSubscription::direct(Arc::new(Registrations)));
//! engine
//!     .add_account(
//!         &AccountConfiguration::new("sip:alice@example.com", "sip:example.com")
//!             .with_credential(AccountCredential::new("*", "alice", "secret")),
//!     )
//!     .unwrap();
//!
//! engine.shutdown().unwrap();
//! ```
//!
//! ## Threading
//!
//! Only one engine can be running per process; it is the target of every
//! native callback until [`Engine::shutdown`] returns. Direct subscriptions
//! run on native threads, queued ones on a dispatcher thread of their own.
//! See [`events`] for details.

mod bridge;
pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod info;
pub mod logging;
pub mod translate;

// Re-export main types
pub use builder::Builder;
pub use config::{
    AccountConfiguration, AccountCredential, EngineSettings, LoggingConfiguration,
    MediaConfiguration, TransportConfiguration,
};
pub use engine::Engine;
pub use error::{EngineError, EngineResult, PjError};
pub use events::{
    EngineEvent, EngineEventHandler, EventFilter, EventKind, EventStream, EventSubscription,
};
pub use info::{AccountInfo, CallInfo};
pub use logging::{LogReceiver, TracingLogReceiver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

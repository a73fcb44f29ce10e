//! # sua-native - the native SIP user-agent boundary
//!
//! This crate describes the surface of the native user-agent engine that
//! `sua-engine` wraps. The engine itself (SIP dialogs, registration, RTP and
//! codec negotiation) is an external collaborator; what lives here is only
//! the shape of its C-style API:
//!
//! - **Status codes** - [`PjStatus`], the zero/non-zero return convention
//! - **Parameter blocks** - [`UaConfig`], [`LogConfig`], [`MediaConfig`],
//!   [`TransportConfig`] and [`AccConfig`], each with a `Default` that mirrors
//!   the native `*_config_default` function
//! - **Callback slots** - context-free `fn` pointers collected in [`UaCallbacks`]
//! - **Info records** - [`NativeCallInfo`] and [`NativeAccountInfo`]
//! - **The entry points** - the [`NativeUserAgent`] trait
//!
//! [`loopback::LoopbackUserAgent`] is an in-process implementation with its
//! own worker thread. It is what the test-suites and demos drive.
//!
//! ```text
//! ┌───────────────┐  create/init/start/acc_add   ┌────────────────────┐
//! │  sua-engine   │ ───────────────────────────▶ │  NativeUserAgent   │
//! │  (bridge)     │ ◀─────────────────────────── │  (worker threads)  │
//! └───────────────┘   fn-pointer callbacks       └────────────────────┘
//! ```

pub mod callback;
pub mod config;
pub mod info;
pub mod loopback;
pub mod status;
pub mod types;
pub mod user_agent;

pub use callback::*;
pub use config::*;
pub use info::*;
pub use status::*;
pub use types::*;
pub use user_agent::NativeUserAgent;

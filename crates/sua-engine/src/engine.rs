//! The engine handle
//!
//! [`Engine`] owns one started native user agent. It is created only through
//! [`Engine::build`] and is the single target of native callbacks until it is
//! shut down.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sua_native::{AccountId, CallId, NativeUserAgent, PjStatus};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::bridge;
use crate::builder::Builder;
use crate::config::AccountConfiguration;
use crate::error::{EngineError, EngineResult, PjError};
use crate::events::{EngineEvent, EventEmitter, EventStream, EventSubscription};
use crate::info::{AccountInfo, CallInfo};
use crate::translate;

/// Step label recorded when adding an account fails
pub const STEP_ADD_ACCOUNT: &str = "Add account";

/// State shared between an [`Engine`] and the callback bridge
pub(crate) struct EngineCore {
    native: Arc<dyn NativeUserAgent>,
    events: EventEmitter,
    last_status: Mutex<PjStatus>,
    last_error: Mutex<PjError>,
    running: AtomicBool,
}

impl EngineCore {
    pub(crate) fn new(native: Arc<dyn NativeUserAgent>) -> Self {
        Self {
            native,
            events: EventEmitter::new(),
            last_status: Mutex::new(PjStatus::SUCCESS),
            last_error: Mutex::new(PjError::default()),
            running: AtomicBool::new(false),
        }
    }

    pub(crate) fn native(&self) -> &Arc<dyn NativeUserAgent> {
        &self.native
    }

    pub(crate) fn events(&self) -> &EventEmitter {
        &self.events
    }

    pub(crate) fn record_failure(&self, step: &str, status: PjStatus) {
        *self.last_status.lock() = status;
        *self.last_error.lock() = PjError::step_failed(step, status);
    }

    fn record_success(&self) {
        *self.last_status.lock() = PjStatus::SUCCESS;
    }

    pub(crate) fn set_running(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Hang up, destroy the native engine and leave the callback slot
    ///
    /// Only the first call does anything.
    fn teardown(self: &Arc<Self>) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Shutting down engine");
            self.native.call_hangup_all();
            let status = self.native.destroy();
            if !status.is_success() {
                warn!("Native destroy reported {}", status);
            }
            bridge::release(self);
        }
        self.events.close();
    }

    fn call_snapshot(&self, call_id: CallId) -> Option<CallInfo> {
        match self.native.call_get_info(call_id) {
            Ok(info) => Some(CallInfo::from(&info)),
            Err(status) => {
                warn!("No call info for {}: {}", call_id, status);
                None
            }
        }
    }

    fn account_snapshot(&self, acc_id: AccountId) -> Option<AccountInfo> {
        match self.native.acc_get_info(acc_id) {
            Ok(info) => Some(AccountInfo::from(&info)),
            Err(status) => {
                warn!("No account info for {}: {}", acc_id, status);
                None
            }
        }
    }

    pub(crate) fn handle_log(&self, level: i32, text: &str) {
        self.events.emit(EngineEvent::Log {
            level,
            message: text.to_string(),
        });
    }

    pub(crate) fn handle_incoming_call(&self, acc_id: AccountId, call_id: CallId) {
        let Some(call) = self.call_snapshot(call_id) else {
            return;
        };
        let Some(account) = self.account_snapshot(acc_id) else {
            return;
        };
        debug!("Incoming call {} on {} from {}", call_id, acc_id, call.remote_info);
        self.events.emit(EngineEvent::IncomingCall { account, call });
    }

    pub(crate) fn handle_call_state(&self, call_id: CallId) {
        if let Some(call) = self.call_snapshot(call_id) {
            debug!("Call {} state {}", call_id, call.state_text);
            self.events.emit(EngineEvent::CallState { call });
        }
    }

    pub(crate) fn handle_call_media_state(&self, call_id: CallId) {
        if let Some(call) = self.call_snapshot(call_id) {
            self.events.emit(EngineEvent::CallMediaState { call });
        }
    }

    pub(crate) fn handle_registration_started(&self, acc_id: AccountId, renew: bool) {
        if let Some(account) = self.account_snapshot(acc_id) {
            debug!(
                "{} started for {}",
                if renew { "Registration" } else { "Unregistration" },
                acc_id
            );
            self.events
                .emit(EngineEvent::RegistrationStarted { account, renew });
        }
    }
}

/// A running (or failed) native user agent
///
/// # Examples
///
/// ```rust
/// use sua_engine::config::{AccountConfiguration, TransportConfiguration};
/// use sua_engine::Engine;
/// use sua_native::loopback::LoopbackUserAgent;
///
/// let engine = Engine::build()
///     .with_transport_configuration(TransportConfiguration::new().with_port(5070))
///     .create(LoopbackUserAgent::new());
/// assert!(engine.is_valid(), "{}", engine.last_error());
///
/// let account = AccountConfiguration::new("sip:alice@example.com", "sip:example.com");
/// let acc_id = engine.add_account(&account).unwrap();
/// assert!(acc_id.is_valid());
///
/// engine.shutdown().unwrap();
/// ```
pub struct Engine {
    core: Arc<EngineCore>,
}

impl Engine {
    /// Start configuring a new engine
    pub fn build() -> Builder {
        Builder::new()
    }

    pub(crate) fn from_core(core: Arc<EngineCore>) -> Self {
        Self { core }
    }

    /// Whether the most recent native operation succeeded
    pub fn is_valid(&self) -> bool {
        self.last_status().is_success()
    }

    /// Status of the most recent native operation
    pub fn last_status(&self) -> PjStatus {
        *self.core.last_status.lock()
    }

    /// The last failure recorded, kept after later operations succeed
    pub fn last_error(&self) -> PjError {
        self.core.last_error.lock().clone()
    }

    /// Whether this engine is the one receiving native callbacks
    pub fn is_active(&self) -> bool {
        bridge::is_active(&self.core)
    }

    /// The wrapped native user agent
    pub fn native(&self) -> &Arc<dyn NativeUserAgent> {
        self.core.native()
    }

    /// Register an account and start registering it
    ///
    /// Registration progress is reported through
    /// [`EngineEvent::RegistrationStarted`]. A failure is recorded in
    /// [`Engine::last_error`] and leaves the engine running.
    pub fn add_account(&self, account: &AccountConfiguration) -> EngineResult<AccountId> {
        self.ensure_running()?;

        let cfg = match translate::account_config(account) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Rejected account {}: {}", account.sip_url, e);
                self.core.record_failure(STEP_ADD_ACCOUNT, PjStatus::ETOOMANY);
                return Err(e);
            }
        };

        match self.core.native.acc_add(&cfg, true) {
            Ok(acc_id) => {
                self.core.record_success();
                info!("Added account {} as {}", account.sip_url, acc_id);
                Ok(acc_id)
            }
            Err(status) => {
                warn!("Adding account {} failed: {}", account.sip_url, status);
                self.core.record_failure(STEP_ADD_ACCOUNT, status);
                Err(EngineError::Native {
                    step: STEP_ADD_ACCOUNT,
                    status,
                })
            }
        }
    }

    /// Snapshot of an account as it is now
    pub fn account_info(&self, acc_id: AccountId) -> EngineResult<AccountInfo> {
        self.ensure_running()?;
        self.core
            .native
            .acc_get_info(acc_id)
            .map(|info| AccountInfo::from(&info))
            .map_err(|status| EngineError::NotFound {
                what: format!("account {}", acc_id),
                status,
            })
    }

    /// Snapshot of a call as it is now
    pub fn call_info(&self, call_id: CallId) -> EngineResult<CallInfo> {
        self.ensure_running()?;
        self.core
            .native
            .call_get_info(call_id)
            .map(|info| CallInfo::from(&info))
            .map_err(|status| EngineError::NotFound {
                what: format!("call {}", call_id),
                status,
            })
    }

    /// Hang up every active call
    ///
    /// Each call reports its disconnect through the usual call-state event.
    pub fn hangup_all(&self) -> EngineResult<()> {
        self.ensure_running()?;
        self.core.native.call_hangup_all();
        Ok(())
    }

    /// Add an event subscription, returning its id
    pub fn subscribe(&self, subscription: EventSubscription) -> Uuid {
        self.core.events.subscribe(subscription)
    }

    /// Remove a subscription, returning whether it existed
    pub fn unsubscribe(&self, id: Uuid) -> bool {
        self.core.events.unsubscribe(id)
    }

    /// A stream of every event from now on
    pub fn events(&self) -> EventStream {
        self.core.events.stream()
    }

    /// Hang up all calls, destroy the native engine and stop receiving
    /// callbacks
    ///
    /// Queued subscriptions deliver what they already hold before this
    /// returns. Calling it again does nothing. Calling it from inside an
    /// engine callback fails with [`EngineError::InvalidState`].
    pub fn shutdown(&self) -> EngineResult<()> {
        if bridge::in_callback() {
            return Err(EngineError::invalid_state(
                "shutdown called from inside an engine callback",
            ));
        }

        self.core.teardown();
        Ok(())
    }

    fn ensure_running(&self) -> EngineResult<()> {
        if self.core.is_running() {
            Ok(())
        } else {
            Err(EngineError::invalid_state("engine is not running"))
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if !bridge::in_callback() {
            self.core.teardown();
            return;
        }

        // The trampoline on this thread holds the slot, so tear down once it
        // has returned.
        debug!("Engine dropped inside a callback; deferring teardown");
        let core = self.core.clone();
        let spawned = std::thread::Builder::new()
            .name("sua-engine-teardown".to_string())
            .spawn(move || core.teardown());
        if let Err(e) = spawned {
            error!("Deferred engine teardown could not start: {}", e);
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("running", &self.core.is_running())
            .field("last_status", &*self.core.last_status.lock())
            .field("last_error", &*self.core.last_error.lock())
            .field("events", &self.core.events)
            .finish()
    }
}

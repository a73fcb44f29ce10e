//! Native callback bridge
//!
//! The native engine calls plain function pointers with no user context, so
//! the running engine is found through a process-wide slot. Every trampoline
//! here follows the same shape:
//!
//! ```text
//! native thread ─▶ trampoline ─▶ read slot ─┬─ empty ─▶ return
//!                                           └─ engine ─▶ snapshot ─▶ emit
//! ```
//!
//! A trampoline keeps the slot's read guard until it returns. Clearing the
//! slot takes the write guard, so once [`release`] returns no trampoline is
//! still inside the engine and every later one finds the slot empty.

use std::cell::Cell;
use std::sync::Arc;

use parking_lot::RwLock;
use sua_native::{
    AccountId, CallId, LogCallback, PjBool, PjStatus, RxData, SipEvent, SipTransport,
    TransportState, TransportStateInfo, UaCallbacks,
};
use tracing::{debug, trace};

use crate::engine::EngineCore;

static ACTIVE: RwLock<Option<Arc<EngineCore>>> = parking_lot::const_rwlock(None);

thread_local! {
    static CALLBACK_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Marks the current thread as running engine callback code
struct CallbackScope;

impl CallbackScope {
    fn enter() -> Self {
        CALLBACK_DEPTH.with(|depth| depth.set(depth.get() + 1));
        CallbackScope
    }
}

impl Drop for CallbackScope {
    fn drop(&mut self) {
        CALLBACK_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Whether the current thread is inside a trampoline
pub(crate) fn in_callback() -> bool {
    CALLBACK_DEPTH.with(|depth| depth.get() > 0)
}

/// Whether some engine currently receives callbacks
pub(crate) fn is_occupied() -> bool {
    ACTIVE.read_recursive().is_some()
}

/// Whether `core` is the engine receiving callbacks
pub(crate) fn is_active(core: &Arc<EngineCore>) -> bool {
    ACTIVE
        .read_recursive()
        .as_ref()
        .is_some_and(|active| Arc::ptr_eq(active, core))
}

/// Make `core` the callback target
///
/// Fails with `EEXISTS` when another engine holds the slot.
pub(crate) fn install(core: Arc<EngineCore>) -> Result<(), PjStatus> {
    let mut slot = ACTIVE.write();
    if slot.is_some() {
        return Err(PjStatus::EEXISTS);
    }
    *slot = Some(core);
    debug!("Engine installed as callback target");
    Ok(())
}

/// Clear the slot if `core` occupies it
///
/// Waits for trampolines that are still running.
pub(crate) fn release(core: &Arc<EngineCore>) -> bool {
    let mut slot = ACTIVE.write();
    match slot.as_ref() {
        Some(active) if Arc::ptr_eq(active, core) => {
            *slot = None;
            debug!("Engine released as callback target");
            true
        }
        _ => false,
    }
}

fn with_active(callback: &'static str, f: impl FnOnce(&EngineCore)) {
    let guard = ACTIVE.read_recursive();
    match guard.as_ref() {
        Some(core) => {
            let _scope = CallbackScope::enter();
            f(core);
        }
        None => trace!("{} with no active engine; ignored", callback),
    }
}

/// The callback table registered with the native engine
pub(crate) fn callbacks() -> UaCallbacks {
    UaCallbacks {
        on_incoming_call: Some(on_incoming_call),
        on_call_state: Some(on_call_state),
        on_call_media_state: Some(on_call_media_state),
        on_reg_started: Some(on_reg_started),
        on_transport_state: Some(on_transport_state),
    }
}

/// The log callback registered with the native engine
pub(crate) fn log_callback() -> LogCallback {
    on_log
}

fn on_log(level: i32, data: &str, _len: usize) {
    with_active("log", |core| core.handle_log(level, data));
}

fn on_incoming_call(acc_id: AccountId, call_id: CallId, _rdata: &RxData) {
    with_active("incoming_call", |core| core.handle_incoming_call(acc_id, call_id));
}

fn on_call_state(call_id: CallId, _event: &SipEvent) {
    with_active("call_state", |core| core.handle_call_state(call_id));
}

fn on_call_media_state(call_id: CallId) {
    with_active("call_media_state", |core| core.handle_call_media_state(call_id));
}

fn on_reg_started(acc_id: AccountId, renew: PjBool) {
    with_active("reg_started", |core| {
        core.handle_registration_started(acc_id, renew.is_true())
    });
}

fn on_transport_state(tp: &SipTransport, state: TransportState, _info: &TransportStateInfo) {
    trace!("Transport {} {} is now {:?}", tp.type_name, tp.local_name, state);
}

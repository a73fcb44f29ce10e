//! Callback slots
//!
//! The native engine only accepts context-free function pointers. Nothing can
//! be captured, so whoever registers them needs some other way to find its
//! own state (see the trampolines in `sua-engine`).

use crate::status::{PjBool, PjStatus};
use crate::types::{AccountId, CallId};

/// Opaque incoming request data handed to `on_incoming_call` (`pjsip_rx_data`)
#[derive(Debug, Clone, Default)]
pub struct RxData {
    /// Raw request bytes as received
    pub packet: Vec<u8>,
}

/// Kind of the SIP event that triggered a call state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SipEventKind {
    #[default]
    Unknown,
    Timer,
    TsxState,
    TxMsg,
    RxMsg,
    User,
}

/// Opaque event handed to `on_call_state` (`pjsip_event`)
#[derive(Debug, Clone, Default)]
pub struct SipEvent {
    pub kind: SipEventKind,
}

/// Transport state reported through `on_transport_state`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connected,
    Disconnected,
    Shutdown,
    Destroy,
}

/// Opaque transport handle handed to `on_transport_state` (`pjsip_transport`)
#[derive(Debug, Clone, Default)]
pub struct SipTransport {
    pub type_name: String,
    pub local_name: String,
}

/// Extra transport state details (`pjsip_transport_state_info`)
#[derive(Debug, Clone, Default)]
pub struct TransportStateInfo {
    pub status: PjStatus,
}

pub type LogCallback = fn(level: i32, data: &str, len: usize);
pub type OnIncomingCall = fn(acc_id: AccountId, call_id: CallId, rdata: &RxData);
pub type OnCallState = fn(call_id: CallId, event: &SipEvent);
pub type OnCallMediaState = fn(call_id: CallId);
pub type OnRegStarted = fn(acc_id: AccountId, renew: PjBool);
pub type OnTransportState =
    fn(tp: &SipTransport, state: TransportState, info: &TransportStateInfo);

/// The callback table inside [`crate::UaConfig`] (`pjsua_callback`)
///
/// Every slot starts empty; the native engine skips empty slots.
#[derive(Clone, Copy, Default)]
pub struct UaCallbacks {
    pub on_incoming_call: Option<OnIncomingCall>,
    pub on_call_state: Option<OnCallState>,
    pub on_call_media_state: Option<OnCallMediaState>,
    pub on_reg_started: Option<OnRegStarted>,
    pub on_transport_state: Option<OnTransportState>,
}

impl std::fmt::Debug for UaCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UaCallbacks")
            .field("on_incoming_call", &self.on_incoming_call.is_some())
            .field("on_call_state", &self.on_call_state.is_some())
            .field("on_call_media_state", &self.on_call_media_state.is_some())
            .field("on_reg_started", &self.on_reg_started.is_some())
            .field("on_transport_state", &self.on_transport_state.is_some())
            .finish()
    }
}

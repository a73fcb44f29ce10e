//! Native info records returned by `call_get_info` and `acc_get_info`
//!
//! The records are owned copies: the native engine fills them under its own
//! lock and hands them out, so they stay valid after the call or account
//! they describe is gone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::status::PjStatus;
use crate::types::{AccountId, CallId};

/// INVITE session state (`pjsip_inv_state`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InvState {
    /// Before INVITE is sent or received
    #[default]
    Null,
    /// After INVITE is sent
    Calling,
    /// After INVITE is received
    Incoming,
    /// After response with To tag
    Early,
    /// After 2xx is sent/received
    Connecting,
    /// After ACK is sent/received
    Confirmed,
    /// Session is terminated
    Disconnected,
}

impl InvState {
    /// The text the native engine reports as `state_text`
    pub fn as_str(&self) -> &'static str {
        match self {
            InvState::Null => "NULL",
            InvState::Calling => "CALLING",
            InvState::Incoming => "INCOMING",
            InvState::Early => "EARLY",
            InvState::Connecting => "CONNECTING",
            InvState::Confirmed => "CONFIRMED",
            InvState::Disconnected => "DISCONNCTD",
        }
    }
}

impl fmt::Display for InvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the dialog we are (`pjsip_role_e`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CallRole {
    /// We sent the INVITE
    #[default]
    Uac,
    /// We received the INVITE
    Uas,
}

/// Media state of a call (`pjsua_call_media_status`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CallMediaStatus {
    #[default]
    None,
    Active,
    LocalHold,
    RemoteHold,
    Error,
}

/// Call record (`pjsua_call_info`)
#[derive(Debug, Clone, Default)]
pub struct NativeCallInfo {
    pub id: CallId,
    pub role: CallRole,
    pub acc_id: AccountId,
    pub local_info: Vec<u8>,
    pub local_contact: Vec<u8>,
    pub remote_info: Vec<u8>,
    pub remote_contact: Vec<u8>,
    /// SIP `Call-ID` header value
    pub call_id: Vec<u8>,
    pub state: InvState,
    pub state_text: Vec<u8>,
    pub last_status: u16,
    pub last_status_text: Vec<u8>,
    pub media_status: CallMediaStatus,
    pub connect_duration: Duration,
    pub total_duration: Duration,
}

/// Account record (`pjsua_acc_info`)
#[derive(Debug, Clone, Default)]
pub struct NativeAccountInfo {
    pub id: AccountId,
    pub is_default: bool,
    pub acc_uri: Vec<u8>,
    pub has_registration: bool,
    /// Seconds until the registration expires, negative when unknown
    pub expires: i32,
    /// Last SIP status code of the registration
    pub status: u16,
    pub reg_last_err: PjStatus,
    pub status_text: Vec<u8>,
    pub online_status: bool,
    pub online_status_text: Vec<u8>,
}

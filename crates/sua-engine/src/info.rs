//! Call and account snapshots
//!
//! A snapshot is an owned copy of a native info record taken at one instant.
//! It holds no handle into the native engine, so it can be kept, cloned and
//! sent anywhere after the call or account it describes has gone away.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sua_native::{
    AccountId, CallId, CallMediaStatus, CallRole, InvState, NativeAccountInfo, NativeCallInfo,
    PjStatus,
};

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// State of one call at the moment it was captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallInfo {
    pub id: CallId,
    pub role: CallRole,
    pub account_id: AccountId,
    pub local_info: String,
    pub local_contact: String,
    pub remote_info: String,
    pub remote_contact: String,
    /// SIP `Call-ID` header value
    pub sip_call_id: String,
    pub state: InvState,
    pub state_text: String,
    /// Last SIP status code seen on the dialog
    pub last_status: u16,
    pub last_status_text: String,
    pub media_status: CallMediaStatus,
    pub connect_duration: Duration,
    pub total_duration: Duration,
    pub captured_at: DateTime<Utc>,
}

impl CallInfo {
    pub fn is_active(&self) -> bool {
        self.state != InvState::Disconnected && self.state != InvState::Null
    }

    pub fn is_incoming(&self) -> bool {
        self.role == CallRole::Uas
    }
}

impl From<&NativeCallInfo> for CallInfo {
    fn from(info: &NativeCallInfo) -> Self {
        Self {
            id: info.id,
            role: info.role,
            account_id: info.acc_id,
            local_info: text(&info.local_info),
            local_contact: text(&info.local_contact),
            remote_info: text(&info.remote_info),
            remote_contact: text(&info.remote_contact),
            sip_call_id: text(&info.call_id),
            state: info.state,
            state_text: text(&info.state_text),
            last_status: info.last_status,
            last_status_text: text(&info.last_status_text),
            media_status: info.media_status,
            connect_duration: info.connect_duration,
            total_duration: info.total_duration,
            captured_at: Utc::now(),
        }
    }
}

/// State of one account at the moment it was captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub id: AccountId,
    pub is_default: bool,
    pub uri: String,
    pub has_registration: bool,
    /// Seconds until the registration expires, negative when unknown
    pub expires: i32,
    /// Last SIP status code of the registration
    pub status: u16,
    pub status_text: String,
    pub last_error: PjStatus,
    pub online_status: bool,
    pub online_status_text: String,
    pub captured_at: DateTime<Utc>,
}

impl AccountInfo {
    /// Whether the last registration attempt succeeded
    pub fn is_registered(&self) -> bool {
        self.has_registration && (200..300).contains(&self.status) && self.expires > 0
    }
}

impl From<&NativeAccountInfo> for AccountInfo {
    fn from(info: &NativeAccountInfo) -> Self {
        Self {
            id: info.id,
            is_default: info.is_default,
            uri: text(&info.acc_uri),
            has_registration: info.has_registration,
            expires: info.expires,
            status: info.status,
            status_text: text(&info.status_text),
            last_error: info.reg_last_err,
            online_status: info.online_status,
            online_status_text: text(&info.online_status_text),
            captured_at: Utc::now(),
        }
    }
}

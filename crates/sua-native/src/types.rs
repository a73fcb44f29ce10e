//! Handles and string views shared by the native API

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Maximum number of outbound proxies per account (`PJSUA_ACC_MAX_PROXIES`)
pub const PJSUA_ACC_MAX_PROXIES: usize = 8;

/// Maximum number of credentials per account
pub const PJSUA_MAX_CRED: usize = 8;

/// Native account handle (`pjsua_acc_id`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct AccountId(pub i32);

impl AccountId {
    /// Sentinel for "no account"
    pub const INVALID: AccountId = AccountId(-1);

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acc#{}", self.0)
    }
}

/// Native call handle (`pjsua_call_id`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct CallId(pub i32);

impl CallId {
    /// Sentinel for "no call"
    pub const INVALID: CallId = CallId(-1);

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call#{}", self.0)
    }
}

impl Default for CallId {
    fn default() -> Self {
        CallId::INVALID
    }
}

impl Default for AccountId {
    fn default() -> Self {
        AccountId::INVALID
    }
}

/// Native transport handle (`pjsua_transport_id`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TransportId(pub i32);

/// A borrowed native string view (`pj_str_t`)
///
/// The view points into a buffer owned by someone else; the lifetime ties it
/// to that buffer, so the owner has to outlive every parameter block the view
/// is stored in.
///
/// ```rust
/// use sua_native::PjStr;
///
/// let uri = String::from("sip:alice@example.com");
/// let view = PjStr::from(uri.as_str());
/// assert_eq!(view.as_bytes(), uri.as_bytes());
/// assert_eq!(view.len(), 21);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PjStr<'a> {
    bytes: &'a [u8],
}

impl<'a> PjStr<'a> {
    pub const EMPTY: PjStr<'static> = PjStr { bytes: &[] };

    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_string_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.bytes)
    }
}

impl<'a> From<&'a str> for PjStr<'a> {
    fn from(value: &'a str) -> Self {
        Self::from_bytes(value.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for PjStr<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::from_bytes(value)
    }
}

impl fmt::Debug for PjStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

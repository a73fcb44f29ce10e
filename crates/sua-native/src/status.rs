//! Native status codes
//!
//! Every native entry point returns a status: `0` on success, one of the
//! `PJ_E*` codes otherwise. [`PjStatus`] keeps the raw code so nothing is lost
//! when it crosses into the bridge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base of the portable error range.
pub const PJ_ERRNO_START_STATUS: i32 = 70_000;

/// A native status code
///
/// # Examples
///
/// ```rust
/// use sua_native::PjStatus;
///
/// assert!(PjStatus::SUCCESS.is_success());
/// assert_eq!(PjStatus::EINVAL.into_result(), Err(PjStatus::EINVAL));
/// assert_eq!(PjStatus::EINVAL.code(), 70_004);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PjStatus(pub i32);

impl PjStatus {
    pub const SUCCESS: PjStatus = PjStatus(0);
    pub const EUNKNOWN: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 1);
    pub const EPENDING: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 2);
    pub const ETOOMANYCONN: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 3);
    pub const EINVAL: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 4);
    pub const ENAMETOOLONG: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 5);
    pub const ENOTFOUND: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 6);
    pub const ENOMEM: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 7);
    pub const EBUG: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 8);
    pub const ETIMEDOUT: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 9);
    pub const ETOOMANY: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 10);
    pub const EBUSY: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 11);
    pub const ENOTSUP: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 12);
    pub const EINVALIDOP: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 13);
    pub const ECANCELLED: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 14);
    pub const EEXISTS: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 15);
    pub const EEOF: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 16);
    pub const ETOOBIG: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 17);
    pub const ERESOLVE: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 18);
    pub const ETOOSMALL: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 19);
    pub const EIGNORED: PjStatus = PjStatus(PJ_ERRNO_START_STATUS + 20);

    /// Raw numeric code
    pub fn code(self) -> i32 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// `Ok(())` for success, `Err(self)` otherwise
    pub fn into_result(self) -> Result<(), PjStatus> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Short human readable text for the code
    pub fn description(self) -> &'static str {
        match self.0 {
            0 => "Success",
            70_001 => "Unknown Error",
            70_002 => "Pending operation",
            70_003 => "Too many connecting sockets",
            70_004 => "Invalid argument",
            70_005 => "Name too long",
            70_006 => "Not found",
            70_007 => "Not enough memory",
            70_008 => "BUG DETECTED!",
            70_009 => "Operation timed out",
            70_010 => "Too many objects of the specified type",
            70_011 => "Object is busy",
            70_012 => "Option/operation is not supported",
            70_013 => "Invalid operation",
            70_014 => "Operation cancelled",
            70_015 => "Object already exists",
            70_016 => "End of file",
            70_017 => "Size is too big",
            70_018 => "gethostbyname() has returned error",
            70_019 => "Size is too small",
            70_020 => "Ignored",
            _ => "Unrecognized status",
        }
    }
}

impl Default for PjStatus {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl fmt::Display for PjStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (PJ status {})", self.description(), self.0)
    }
}

impl std::error::Error for PjStatus {}

impl From<i32> for PjStatus {
    fn from(code: i32) -> Self {
        PjStatus(code)
    }
}

/// Native boolean (`pj_bool_t`)
///
/// Only [`PjBool::TRUE`] reads as `true`; any other value, including stray
/// non-zero values, reads as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PjBool(pub i32);

impl PjBool {
    pub const FALSE: PjBool = PjBool(0);
    pub const TRUE: PjBool = PjBool(1);

    pub fn is_true(self) -> bool {
        self == Self::TRUE
    }
}

impl From<bool> for PjBool {
    fn from(value: bool) -> Self {
        if value {
            PjBool::TRUE
        } else {
            PjBool::FALSE
        }
    }
}

impl Default for PjBool {
    fn default() -> Self {
        PjBool::FALSE
    }
}

//! The native entry points

use crate::config::{AccConfig, LogConfig, MediaConfig, TransportConfig, TransportType, UaConfig};
use crate::info::{NativeAccountInfo, NativeCallInfo};
use crate::status::PjStatus;
use crate::types::{AccountId, CallId, TransportId};

/// The native user-agent library
///
/// One method per native entry point, with the native status convention
/// kept intact. The library is a process-wide resource: implementations are
/// shared behind an `Arc` and every method may be called from any thread.
///
/// Callbacks registered through [`UaConfig::cb`] and [`LogConfig::cb`] are
/// invoked on threads owned by the implementation.
pub trait NativeUserAgent: Send + Sync {
    /// Allocate the library (`pjsua_create`)
    fn create(&self) -> PjStatus;

    /// Initialize with the three startup blocks (`pjsua_init`)
    fn init(&self, ua_cfg: &UaConfig, log_cfg: &LogConfig, media_cfg: &MediaConfig) -> PjStatus;

    /// Open a SIP transport (`pjsua_transport_create`)
    fn transport_create(
        &self,
        kind: TransportType,
        cfg: &TransportConfig,
    ) -> Result<TransportId, PjStatus>;

    /// Start processing (`pjsua_start`)
    fn start(&self) -> PjStatus;

    /// Add an account, registering it straight away when the block asks for
    /// it (`pjsua_acc_add`)
    fn acc_add(&self, cfg: &AccConfig<'_>, is_default: bool) -> Result<AccountId, PjStatus>;

    /// Current account record (`pjsua_acc_get_info`)
    fn acc_get_info(&self, acc_id: AccountId) -> Result<NativeAccountInfo, PjStatus>;

    /// Current call record (`pjsua_call_get_info`)
    fn call_get_info(&self, call_id: CallId) -> Result<NativeCallInfo, PjStatus>;

    /// Hang up every active call (`pjsua_call_hangup_all`)
    fn call_hangup_all(&self);

    /// Tear the library down, joining its threads (`pjsua_destroy`)
    fn destroy(&self) -> PjStatus;
}

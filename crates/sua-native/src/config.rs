//! Native parameter blocks
//!
//! These are the fixed-shape structures the native engine consumes at
//! startup and when adding accounts. `Default` on each block mirrors the
//! matching native `*_config_default` function; callers start from the
//! default and override only what they need.

use std::fmt;

use crate::callback::{LogCallback, UaCallbacks};
use crate::status::PjBool;
use crate::types::{PjStr, PJSUA_ACC_MAX_PROXIES, PJSUA_MAX_CRED};

// Log decoration flags (`pj_log_decoration`)
pub const PJ_LOG_HAS_DAY_NAME: u32 = 1;
pub const PJ_LOG_HAS_YEAR: u32 = 2;
pub const PJ_LOG_HAS_MONTH: u32 = 4;
pub const PJ_LOG_HAS_DAY_OF_MON: u32 = 8;
pub const PJ_LOG_HAS_TIME: u32 = 16;
pub const PJ_LOG_HAS_MICRO_SEC: u32 = 32;
pub const PJ_LOG_HAS_SENDER: u32 = 64;
pub const PJ_LOG_HAS_NEWLINE: u32 = 128;
pub const PJ_LOG_HAS_CR: u32 = 256;
pub const PJ_LOG_HAS_SPACE: u32 = 512;
pub const PJ_LOG_HAS_COLOR: u32 = 1024;
pub const PJ_LOG_HAS_LEVEL_TEXT: u32 = 2048;
pub const PJ_LOG_HAS_THREAD_ID: u32 = 4096;
pub const PJ_LOG_HAS_THREAD_SWC: u32 = 8192;
pub const PJ_LOG_HAS_INDENT: u32 = 16384;

/// Engine-wide settings (`pjsua_config`)
#[derive(Debug, Clone)]
pub struct UaConfig {
    pub max_calls: u32,
    pub thread_cnt: u32,
    pub nameserver: Vec<String>,
    pub outbound_proxy: Vec<String>,
    pub user_agent: String,
    pub require_100rel: PjBool,
    pub cb: UaCallbacks,
}

impl Default for UaConfig {
    fn default() -> Self {
        Self {
            max_calls: 4,
            thread_cnt: 1,
            nameserver: Vec::new(),
            outbound_proxy: Vec::new(),
            user_agent: String::new(),
            require_100rel: PjBool::FALSE,
            cb: UaCallbacks::default(),
        }
    }
}

/// Logging settings (`pjsua_logging_config`)
///
/// The callback only sees messages at or below `console_level`.
#[derive(Clone)]
pub struct LogConfig {
    pub msg_logging: PjBool,
    pub level: u32,
    pub console_level: u32,
    pub decor: u32,
    pub log_filename: Option<String>,
    pub cb: Option<LogCallback>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            msg_logging: PjBool::TRUE,
            level: 5,
            console_level: 4,
            decor: PJ_LOG_HAS_SENDER
                | PJ_LOG_HAS_TIME
                | PJ_LOG_HAS_MICRO_SEC
                | PJ_LOG_HAS_NEWLINE
                | PJ_LOG_HAS_SPACE
                | PJ_LOG_HAS_THREAD_SWC
                | PJ_LOG_HAS_INDENT,
            log_filename: None,
            cb: None,
        }
    }
}

impl fmt::Debug for LogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogConfig")
            .field("msg_logging", &self.msg_logging)
            .field("level", &self.level)
            .field("console_level", &self.console_level)
            .field("decor", &format_args!("{:#x}", self.decor))
            .field("log_filename", &self.log_filename)
            .field("cb", &self.cb.is_some())
            .finish()
    }
}

/// Media settings (`pjsua_media_config`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    pub clock_rate: u32,
    pub snd_clock_rate: u32,
    pub channel_count: u32,
    pub audio_frame_ptime: u32,
    pub max_media_ports: u32,
    pub has_ioqueue: PjBool,
    pub thread_cnt: u32,
    pub quality: u32,
    pub ptime: u32,
    pub no_vad: PjBool,
    pub ec_tail_len: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            clock_rate: 16_000,
            snd_clock_rate: 0,
            channel_count: 1,
            audio_frame_ptime: 20,
            max_media_ports: 32,
            has_ioqueue: PjBool::TRUE,
            thread_cnt: 1,
            quality: 8,
            ptime: 0,
            no_vad: PjBool::FALSE,
            ec_tail_len: 200,
        }
    }
}

/// Transport kinds accepted by `transport_create` (`pjsip_transport_type_e`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportType {
    Udp,
    Tcp,
    Tls,
    Udp6,
    Tcp6,
}

/// Transport settings (`pjsua_transport_config`)
///
/// Also used as the RTP block inside [`AccConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportConfig {
    /// Listening port, `0` lets the engine pick
    pub port: u32,
    pub port_range: u32,
    pub public_addr: String,
    pub bound_addr: String,
}

/// Credential data kinds (`pjsip_cred_data_type`)
pub const PJSIP_CRED_DATA_PLAIN_PASSWD: i32 = 0;
pub const PJSIP_CRED_DATA_DIGEST: i32 = 1;
pub const PJSIP_CRED_DATA_EXT_AKA: i32 = 16;

/// One authentication credential (`pjsip_cred_info`)
#[derive(Clone, Copy, Default)]
pub struct CredInfo<'a> {
    pub realm: PjStr<'a>,
    pub scheme: PjStr<'a>,
    pub username: PjStr<'a>,
    pub data_type: i32,
    pub data: PjStr<'a>,
}

impl fmt::Debug for CredInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredInfo")
            .field("realm", &self.realm)
            .field("scheme", &self.scheme)
            .field("username", &self.username)
            .field("data_type", &self.data_type)
            .field("data", &"<redacted>")
            .finish()
    }
}

/// Account settings (`pjsua_acc_config`)
///
/// String fields are views into the caller's buffers. Only the first
/// `proxy_cnt` proxies and `cred_count` credentials are meaningful.
#[derive(Debug, Clone)]
pub struct AccConfig<'a> {
    pub priority: i32,
    pub id: PjStr<'a>,
    pub reg_uri: PjStr<'a>,
    pub reg_timeout: u32,
    pub register_on_acc_add: PjBool,
    pub allow_contact_rewrite: PjBool,
    pub proxy_cnt: u32,
    pub proxy: [PjStr<'a>; PJSUA_ACC_MAX_PROXIES],
    pub cred_count: u32,
    pub cred_info: [CredInfo<'a>; PJSUA_MAX_CRED],
    pub rtp_cfg: TransportConfig,
}

impl Default for AccConfig<'_> {
    fn default() -> Self {
        Self {
            priority: 0,
            id: PjStr::EMPTY,
            reg_uri: PjStr::EMPTY,
            reg_timeout: 300,
            register_on_acc_add: PjBool::TRUE,
            allow_contact_rewrite: PjBool::TRUE,
            proxy_cnt: 0,
            proxy: [PjStr::EMPTY; PJSUA_ACC_MAX_PROXIES],
            cred_count: 0,
            cred_info: [CredInfo::default(); PJSUA_MAX_CRED],
            rtp_cfg: TransportConfig {
                port: 4000,
                ..Default::default()
            },
        }
    }
}

impl<'a> AccConfig<'a> {
    /// The proxies that are actually in use
    pub fn proxies(&self) -> &[PjStr<'a>] {
        let count = (self.proxy_cnt as usize).min(PJSUA_ACC_MAX_PROXIES);
        &self.proxy[..count]
    }

    /// The credentials that are actually in use
    pub fn credentials(&self) -> &[CredInfo<'a>] {
        let count = (self.cred_count as usize).min(PJSUA_MAX_CRED);
        &self.cred_info[..count]
    }
}

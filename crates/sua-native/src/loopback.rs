//! In-process native user agent
//!
//! `LoopbackUserAgent` behaves like the native library from the outside: it
//! goes through the same create/init/transport/start lifecycle, keeps call
//! and account tables, and delivers every callback from its own worker
//! thread. No SIP traffic is produced; callers script what the "network"
//! does (an incoming INVITE, a state change, a registration) and the worker
//! plays it back in order.
//!
//! It also records the parameter blocks it was handed and can be told to
//! fail at any entry point, which is what the bridge test-suites rely on.
//!
//! # Example
//!
//! ```rust
//! use sua_native::loopback::LoopbackUserAgent;
//! use sua_native::{NativeUserAgent, UaConfig, LogConfig, MediaConfig};
//!
//! let native = LoopbackUserAgent::new();
//! assert!(native.create().is_success());
//! let (ua, log, media) = (UaConfig::default(), LogConfig::default(), MediaConfig::default());
//! assert!(native.init(&ua, &log, &media).is_success());
//! assert!(native.start().is_success());
//! native.destroy();
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::callback::{
    LogCallback, RxData, SipEvent, SipEventKind, SipTransport, TransportState, TransportStateInfo,
    UaCallbacks,
};
use crate::config::{
    AccConfig, LogConfig, MediaConfig, TransportConfig, TransportType, UaConfig, PJ_LOG_HAS_NEWLINE,
};
use crate::info::{CallMediaStatus, CallRole, InvState, NativeAccountInfo, NativeCallInfo};
use crate::status::{PjBool, PjStatus};
use crate::types::{AccountId, CallId, TransportId};
use crate::user_agent::NativeUserAgent;

/// Entry points that can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopbackStage {
    Create,
    Init,
    TransportCreate,
    Start,
    AccAdd,
}

/// Owned copy of one credential handed to `acc_add`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCredential {
    pub realm: Vec<u8>,
    pub scheme: Vec<u8>,
    pub username: Vec<u8>,
    pub data_type: i32,
    pub data: Vec<u8>,
}

/// Owned copy of an account block handed to `acc_add`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAccount {
    pub id: Vec<u8>,
    pub reg_uri: Vec<u8>,
    pub rtp_port: u32,
    pub allow_contact_rewrite: PjBool,
    pub register_on_acc_add: PjBool,
    pub is_default: bool,
    pub proxy_cnt: u32,
    pub proxies: Vec<Vec<u8>>,
    pub cred_count: u32,
    pub credentials: Vec<RecordedCredential>,
}

impl RecordedAccount {
    fn capture(cfg: &AccConfig<'_>, is_default: bool) -> Self {
        Self {
            id: cfg.id.as_bytes().to_vec(),
            reg_uri: cfg.reg_uri.as_bytes().to_vec(),
            rtp_port: cfg.rtp_cfg.port,
            allow_contact_rewrite: cfg.allow_contact_rewrite,
            register_on_acc_add: cfg.register_on_acc_add,
            is_default,
            proxy_cnt: cfg.proxy_cnt,
            proxies: cfg.proxies().iter().map(|p| p.as_bytes().to_vec()).collect(),
            cred_count: cfg.cred_count,
            credentials: cfg
                .credentials()
                .iter()
                .map(|c| RecordedCredential {
                    realm: c.realm.as_bytes().to_vec(),
                    scheme: c.scheme.as_bytes().to_vec(),
                    username: c.username.as_bytes().to_vec(),
                    data_type: c.data_type,
                    data: c.data.as_bytes().to_vec(),
                })
                .collect(),
        }
    }
}

/// The three startup blocks handed to `init`
#[derive(Debug, Clone)]
pub struct RecordedInit {
    pub ua: UaConfig,
    pub log: LogConfig,
    pub media: MediaConfig,
}

/// A callback the loopback can fire directly on the caller's thread
#[derive(Debug, Clone)]
pub enum NativeEvent {
    Log { level: i32, text: String },
    IncomingCall { acc_id: AccountId, call_id: CallId },
    CallState { call_id: CallId },
    CallMediaState { call_id: CallId },
    RegStarted { acc_id: AccountId, renew: PjBool },
    TransportState { state: TransportState },
}

enum Job {
    Log { level: i32, text: String },
    IncomingCall { acc_id: AccountId, call_id: CallId },
    CallState { call_id: CallId, state: InvState, status: u16 },
    CallMedia { call_id: CallId, status: CallMediaStatus },
    RegStarted { acc_id: AccountId, renew: PjBool },
    TransportState { state: TransportState },
    Flush(oneshot::Sender<()>),
}

#[derive(Default)]
struct State {
    created: bool,
    initialized: bool,
    started: bool,
    callbacks: UaCallbacks,
    log_cb: Option<LogCallback>,
    console_level: u32,
    decor: u32,
    init: Option<RecordedInit>,
    transports: Vec<(TransportType, TransportConfig)>,
    accounts: BTreeMap<AccountId, NativeAccountInfo>,
    calls: BTreeMap<CallId, NativeCallInfo>,
    recorded_accounts: Vec<RecordedAccount>,
    next_acc: i32,
    next_call: i32,
    next_transport: i32,
    failures: HashMap<LoopbackStage, PjStatus>,
    destroy_count: usize,
}

impl State {
    fn failure(&self, stage: LoopbackStage) -> Option<PjStatus> {
        self.failures.get(&stage).copied()
    }
}

struct Worker {
    tx: mpsc::UnboundedSender<Job>,
    handle: JoinHandle<()>,
}

/// Simulated native user agent with its own callback thread
pub struct LoopbackUserAgent {
    state: Arc<Mutex<State>>,
    worker: Mutex<Option<Worker>>,
}

impl LoopbackUserAgent {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(Mutex::new(State::default())),
            worker: Mutex::new(None),
        })
    }

    /// Make `stage` return `status` from now on
    pub fn fail_at(&self, stage: LoopbackStage, status: PjStatus) {
        self.state.lock().failures.insert(stage, status);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Thread that delivers callbacks, while the library is alive
    pub fn worker_thread_id(&self) -> Option<ThreadId> {
        self.worker.lock().as_ref().map(|w| w.handle.thread().id())
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    pub fn destroy_count(&self) -> usize {
        self.state.lock().destroy_count
    }

    pub fn recorded_init(&self) -> Option<RecordedInit> {
        self.state.lock().init.clone()
    }

    pub fn transports(&self) -> Vec<(TransportType, TransportConfig)> {
        self.state.lock().transports.clone()
    }

    pub fn recorded_accounts(&self) -> Vec<RecordedAccount> {
        self.state.lock().recorded_accounts.clone()
    }

    pub fn active_calls(&self) -> Vec<CallId> {
        self.state.lock().calls.keys().copied().collect()
    }

    /// Emit a native log line through the log callback
    ///
    /// Lines above the configured console level are dropped, and a newline
    /// is appended while the newline decoration is enabled.
    pub fn emit_log(&self, level: i32, text: impl Into<String>) -> bool {
        self.post(Job::Log {
            level,
            text: text.into(),
        })
    }

    /// An INVITE arrives for `acc_id`
    pub fn incoming_call(&self, acc_id: AccountId, remote_uri: &str) -> Result<CallId, PjStatus> {
        let call_id = {
            let mut state = self.state.lock();
            if !state.started {
                return Err(PjStatus::EINVALIDOP);
            }
            let local = state
                .accounts
                .get(&acc_id)
                .map(|acc| acc.acc_uri.clone())
                .ok_or(PjStatus::EINVAL)?;
            let call_id = CallId(state.next_call);
            state.next_call += 1;
            state.calls.insert(
                call_id,
                NativeCallInfo {
                    id: call_id,
                    role: CallRole::Uas,
                    acc_id,
                    local_info: local.clone(),
                    local_contact: local,
                    remote_info: remote_uri.as_bytes().to_vec(),
                    remote_contact: remote_uri.as_bytes().to_vec(),
                    call_id: format!("{}-loopback", call_id.0).into_bytes(),
                    state: InvState::Incoming,
                    state_text: InvState::Incoming.as_str().as_bytes().to_vec(),
                    ..Default::default()
                },
            );
            call_id
        };
        self.post(Job::IncomingCall { acc_id, call_id });
        Ok(call_id)
    }

    /// Place an outgoing call; the worker reports `CALLING`
    pub fn make_call(&self, acc_id: AccountId, dest_uri: &str) -> Result<CallId, PjStatus> {
        let call_id = {
            let mut state = self.state.lock();
            if !state.started {
                return Err(PjStatus::EINVALIDOP);
            }
            let local = state
                .accounts
                .get(&acc_id)
                .map(|acc| acc.acc_uri.clone())
                .ok_or(PjStatus::EINVAL)?;
            let call_id = CallId(state.next_call);
            state.next_call += 1;
            state.calls.insert(
                call_id,
                NativeCallInfo {
                    id: call_id,
                    role: CallRole::Uac,
                    acc_id,
                    local_info: local.clone(),
                    local_contact: local,
                    remote_info: dest_uri.as_bytes().to_vec(),
                    call_id: format!("{}-loopback", call_id.0).into_bytes(),
                    state_text: InvState::Null.as_str().as_bytes().to_vec(),
                    ..Default::default()
                },
            );
            call_id
        };
        self.post(Job::CallState {
            call_id,
            state: InvState::Calling,
            status: 0,
        });
        Ok(call_id)
    }

    /// Move a call to `state` with the given last SIP status
    pub fn set_call_state(&self, call_id: CallId, state: InvState, status: u16) -> bool {
        self.post(Job::CallState {
            call_id,
            state,
            status,
        })
    }

    pub fn set_media_status(&self, call_id: CallId, status: CallMediaStatus) -> bool {
        self.post(Job::CallMedia { call_id, status })
    }

    /// Begin a (re-)registration or unregistration for `acc_id`
    pub fn start_registration(&self, acc_id: AccountId, renew: PjBool) -> bool {
        self.post(Job::RegStarted { acc_id, renew })
    }

    pub fn transport_state(&self, state: TransportState) -> bool {
        self.post(Job::TransportState { state })
    }

    /// Block until every callback queued so far has been delivered
    ///
    /// Returns straight away when there is no worker or when called from the
    /// worker itself.
    pub fn flush(&self) {
        let rx = {
            let worker = self.worker.lock();
            let Some(worker) = worker.as_ref() else {
                return;
            };
            if worker.handle.thread().id() == std::thread::current().id() {
                return;
            }
            let (tx, rx) = oneshot::channel();
            if worker.tx.send(Job::Flush(tx)).is_err() {
                return;
            }
            rx
        };
        let _ = rx.blocking_recv();
    }

    /// Invoke a registered callback right here, on the calling thread
    ///
    /// The tables are left alone and the lifecycle is ignored: this works
    /// after `destroy()` too, which is how a straggling native thread looks
    /// from the receiving side.
    pub fn fire_now(&self, event: NativeEvent) {
        let (callbacks, log_cb) = {
            let state = self.state.lock();
            (state.callbacks, state.log_cb)
        };
        match event {
            NativeEvent::Log { level, text } => {
                if let Some(cb) = log_cb {
                    cb(level, &text, text.len());
                }
            }
            NativeEvent::IncomingCall { acc_id, call_id } => {
                if let Some(cb) = callbacks.on_incoming_call {
                    cb(acc_id, call_id, &RxData::default());
                }
            }
            NativeEvent::CallState { call_id } => {
                if let Some(cb) = callbacks.on_call_state {
                    cb(call_id, &SipEvent::default());
                }
            }
            NativeEvent::CallMediaState { call_id } => {
                if let Some(cb) = callbacks.on_call_media_state {
                    cb(call_id);
                }
            }
            NativeEvent::RegStarted { acc_id, renew } => {
                if let Some(cb) = callbacks.on_reg_started {
                    cb(acc_id, renew);
                }
            }
            NativeEvent::TransportState { state } => {
                if let Some(cb) = callbacks.on_transport_state {
                    cb(&SipTransport::default(), state, &TransportStateInfo::default());
                }
            }
        }
    }

    fn post(&self, job: Job) -> bool {
        match self.worker.lock().as_ref() {
            Some(worker) => worker.tx.send(job).is_ok(),
            None => {
                trace!("loopback user agent is not running; dropping job");
                false
            }
        }
    }

    fn spawn_worker(&self) -> Result<Worker, PjStatus> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let state = self.state.clone();
        let handle = std::thread::Builder::new()
            .name("loopback-ua".to_string())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    run_job(&state, job);
                }
                debug!("loopback worker finished");
            })
            .map_err(|e| {
                warn!("failed to spawn loopback worker: {}", e);
                PjStatus::ENOMEM
            })?;
        Ok(Worker { tx, handle })
    }

    fn stop_worker(&self) {
        let worker = self.worker.lock().take();
        if let Some(Worker { tx, handle }) = worker {
            drop(tx);
            if handle.thread().id() != std::thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

fn run_job(state: &Mutex<State>, job: Job) {
    match job {
        Job::Log { level, text } => {
            let (cb, console_level, decor) = {
                let s = state.lock();
                (s.log_cb, s.console_level, s.decor)
            };
            let Some(cb) = cb else { return };
            if level > console_level as i32 {
                return;
            }
            let line = if decor & PJ_LOG_HAS_NEWLINE != 0 {
                format!("{}\n", text)
            } else {
                text
            };
            cb(level, &line, line.len());
        }
        Job::IncomingCall { acc_id, call_id } => {
            let cb = state.lock().callbacks.on_incoming_call;
            if let Some(cb) = cb {
                let rdata = RxData {
                    packet: b"INVITE sip:loopback SIP/2.0\r\n\r\n".to_vec(),
                };
                cb(acc_id, call_id, &rdata);
            }
        }
        Job::CallState {
            call_id,
            state: inv_state,
            status,
        } => {
            let cb = {
                let mut s = state.lock();
                let Some(call) = s.calls.get_mut(&call_id) else {
                    return;
                };
                call.state = inv_state;
                call.state_text = inv_state.as_str().as_bytes().to_vec();
                call.last_status = status;
                call.last_status_text = reason_phrase(status).as_bytes().to_vec();
                s.callbacks.on_call_state
            };
            if let Some(cb) = cb {
                cb(call_id, &SipEvent { kind: SipEventKind::TsxState });
            }
            // The call slot is released once the application has seen the
            // disconnect.
            if inv_state == InvState::Disconnected {
                state.lock().calls.remove(&call_id);
            }
        }
        Job::CallMedia { call_id, status } => {
            let cb = {
                let mut s = state.lock();
                let Some(call) = s.calls.get_mut(&call_id) else {
                    return;
                };
                call.media_status = status;
                s.callbacks.on_call_media_state
            };
            if let Some(cb) = cb {
                cb(call_id);
            }
        }
        Job::RegStarted { acc_id, renew } => {
            let cb = {
                let mut s = state.lock();
                let Some(acc) = s.accounts.get_mut(&acc_id) else {
                    return;
                };
                acc.status = 100;
                acc.status_text = b"In Progress".to_vec();
                s.callbacks.on_reg_started
            };
            if let Some(cb) = cb {
                cb(acc_id, renew);
            }
        }
        Job::TransportState { state: tp_state } => {
            let cb = state.lock().callbacks.on_transport_state;
            if let Some(cb) = cb {
                let tp = SipTransport {
                    type_name: "UDP".to_string(),
                    local_name: "127.0.0.1".to_string(),
                };
                cb(&tp, tp_state, &TransportStateInfo::default());
            }
        }
        Job::Flush(ack) => {
            let _ = ack.send(());
        }
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        0 => "",
        100 => "Trying",
        180 => "Ringing",
        183 => "Session Progress",
        200 => "OK",
        404 => "Not Found",
        408 => "Request Timeout",
        486 => "Busy Here",
        487 => "Request Terminated",
        603 => "Decline",
        _ => "Unknown",
    }
}

impl NativeUserAgent for LoopbackUserAgent {
    fn create(&self) -> PjStatus {
        {
            let mut state = self.state.lock();
            if let Some(status) = state.failure(LoopbackStage::Create) {
                return status;
            }
            if state.created {
                return PjStatus::EEXISTS;
            }
        }
        let worker = match self.spawn_worker() {
            Ok(worker) => worker,
            Err(status) => return status,
        };
        *self.worker.lock() = Some(worker);

        let mut state = self.state.lock();
        state.created = true;
        state.initialized = false;
        state.started = false;
        state.callbacks = UaCallbacks::default();
        state.log_cb = None;
        state.init = None;
        state.transports.clear();
        debug!("loopback user agent created");
        PjStatus::SUCCESS
    }

    fn init(&self, ua_cfg: &UaConfig, log_cfg: &LogConfig, media_cfg: &MediaConfig) -> PjStatus {
        let mut state = self.state.lock();
        if !state.created {
            return PjStatus::EINVALIDOP;
        }
        if let Some(status) = state.failure(LoopbackStage::Init) {
            return status;
        }
        state.callbacks = ua_cfg.cb;
        state.log_cb = log_cfg.cb;
        state.console_level = log_cfg.console_level;
        state.decor = log_cfg.decor;
        state.init = Some(RecordedInit {
            ua: ua_cfg.clone(),
            log: log_cfg.clone(),
            media: media_cfg.clone(),
        });
        state.initialized = true;
        PjStatus::SUCCESS
    }

    fn transport_create(
        &self,
        kind: TransportType,
        cfg: &TransportConfig,
    ) -> Result<TransportId, PjStatus> {
        let mut state = self.state.lock();
        if !state.initialized {
            return Err(PjStatus::EINVALIDOP);
        }
        if let Some(status) = state.failure(LoopbackStage::TransportCreate) {
            return Err(status);
        }
        state.transports.push((kind, cfg.clone()));
        let id = TransportId(state.next_transport);
        state.next_transport += 1;
        Ok(id)
    }

    fn start(&self) -> PjStatus {
        let mut state = self.state.lock();
        if !state.initialized {
            return PjStatus::EINVALIDOP;
        }
        if let Some(status) = state.failure(LoopbackStage::Start) {
            return status;
        }
        state.started = true;
        PjStatus::SUCCESS
    }

    fn acc_add(&self, cfg: &AccConfig<'_>, is_default: bool) -> Result<AccountId, PjStatus> {
        let (acc_id, register) = {
            let mut state = self.state.lock();
            if !state.initialized {
                return Err(PjStatus::EINVALIDOP);
            }
            if let Some(status) = state.failure(LoopbackStage::AccAdd) {
                return Err(status);
            }
            state
                .recorded_accounts
                .push(RecordedAccount::capture(cfg, is_default));

            let acc_id = AccountId(state.next_acc);
            state.next_acc += 1;
            let has_registration = !cfg.reg_uri.is_empty();
            state.accounts.insert(
                acc_id,
                NativeAccountInfo {
                    id: acc_id,
                    is_default,
                    acc_uri: cfg.id.as_bytes().to_vec(),
                    has_registration,
                    expires: if has_registration {
                        cfg.reg_timeout as i32
                    } else {
                        -1
                    },
                    status: 0,
                    reg_last_err: PjStatus::SUCCESS,
                    status_text: Vec::new(),
                    online_status: false,
                    online_status_text: b"Offline".to_vec(),
                },
            );
            (acc_id, has_registration && cfg.register_on_acc_add.is_true())
        };
        if register {
            self.post(Job::RegStarted {
                acc_id,
                renew: PjBool::TRUE,
            });
        }
        Ok(acc_id)
    }

    fn acc_get_info(&self, acc_id: AccountId) -> Result<NativeAccountInfo, PjStatus> {
        self.state
            .lock()
            .accounts
            .get(&acc_id)
            .cloned()
            .ok_or(PjStatus::EINVAL)
    }

    fn call_get_info(&self, call_id: CallId) -> Result<NativeCallInfo, PjStatus> {
        self.state
            .lock()
            .calls
            .get(&call_id)
            .cloned()
            .ok_or(PjStatus::EINVAL)
    }

    fn call_hangup_all(&self) {
        let live: Vec<CallId> = self
            .state
            .lock()
            .calls
            .values()
            .filter(|call| call.state != InvState::Disconnected)
            .map(|call| call.id)
            .collect();
        for call_id in live {
            self.post(Job::CallState {
                call_id,
                state: InvState::Disconnected,
                status: 200,
            });
        }
    }

    fn destroy(&self) -> PjStatus {
        // Let the worker drain whatever is queued, then release the tables.
        self.stop_worker();
        let mut state = self.state.lock();
        state.created = false;
        state.initialized = false;
        state.started = false;
        state.accounts.clear();
        state.calls.clear();
        state.destroy_count += 1;
        PjStatus::SUCCESS
    }
}

impl Drop for LoopbackUserAgent {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

//! Engine events
//!
//! Everything the native engine reports asynchronously reaches the
//! application as an [`EngineEvent`]. Events carry snapshots
//! ([`CallInfo`], [`AccountInfo`]) captured at the moment the native callback
//! fired, never live handles.
//!
//! # Delivery
//!
//! Each subscription picks how its handler is run:
//!
//! - **Direct** - the handler runs synchronously on the thread that fired the
//!   native callback, before the callback returns. Keep it short.
//! - **Queued** - the event is handed to a dispatcher thread owned by the
//!   subscription and the handler runs there, in arrival order.
//!
//! Async consumers can also take an [`EventStream`] from
//! [`EventEmitter::stream`].
//!
//! ```rust
//! use sua_engine::events::{
//!     EngineEventHandler, EventEmitter, EventFilter, EventKind, EventSubscription,
//! };
//! use sua_engine::CallInfo;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl EngineEventHandler for Printer {
//!     fn on_call_state(&self, call: &CallInfo) {
//!         println!("{} is now {}", call.id, call.state_text);
//!     }
//! }
//!
//! let emitter = EventEmitter::new();
//! let id = emitter.subscribe(
//!     EventSubscription::direct(Arc::new(Printer))
//!         .with_filter(EventFilter::kinds([EventKind::CallState])),
//! );
//! assert_eq!(emitter.subscription_count(), 1);
//! assert!(emitter.unsubscribe(id));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use sua_native::{AccountId, CallId};
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::info::{AccountInfo, CallInfo};
use crate::logging::LogReceiver;

/// Stream of engine events for async consumers
pub type EventStream = BroadcastStream<EngineEvent>;

const STREAM_CAPACITY: usize = 1000;

/// An asynchronous notification from the native engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EngineEvent {
    /// A native log line, verbatim
    Log { level: i32, message: String },
    /// A new inbound call on `account`
    IncomingCall { account: AccountInfo, call: CallInfo },
    /// A call's INVITE session changed state
    CallState { call: CallInfo },
    /// A call's media changed state
    CallMediaState { call: CallInfo },
    /// A registration or unregistration was started
    RegistrationStarted { account: AccountInfo, renew: bool },
}

/// Discriminant of [`EngineEvent`], for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Log,
    IncomingCall,
    CallState,
    CallMediaState,
    RegistrationStarted,
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::Log { .. } => EventKind::Log,
            EngineEvent::IncomingCall { .. } => EventKind::IncomingCall,
            EngineEvent::CallState { .. } => EventKind::CallState,
            EngineEvent::CallMediaState { .. } => EventKind::CallMediaState,
            EngineEvent::RegistrationStarted { .. } => EventKind::RegistrationStarted,
        }
    }

    /// The call this event is about, if any
    pub fn call_id(&self) -> Option<CallId> {
        match self {
            EngineEvent::IncomingCall { call, .. }
            | EngineEvent::CallState { call }
            | EngineEvent::CallMediaState { call } => Some(call.id),
            _ => None,
        }
    }

    /// The account this event is about, if any
    ///
    /// Call events report the account the call belongs to.
    pub fn account_id(&self) -> Option<AccountId> {
        match self {
            EngineEvent::IncomingCall { account, .. }
            | EngineEvent::RegistrationStarted { account, .. } => Some(account.id),
            EngineEvent::CallState { call } | EngineEvent::CallMediaState { call } => {
                Some(call.account_id)
            }
            EngineEvent::Log { .. } => None,
        }
    }

    /// Check whether this event should be delivered under `filter`
    ///
    /// An id filter rejects events that carry no id of that kind.
    pub fn passes_filter(&self, filter: &EventFilter) -> bool {
        if let Some(kinds) = &filter.kinds {
            if !kinds.contains(&self.kind()) {
                return false;
            }
        }

        if let Some(call_ids) = &filter.call_ids {
            match self.call_id() {
                Some(id) if call_ids.contains(&id) => {}
                _ => return false,
            }
        }

        if let Some(account_ids) = &filter.account_ids {
            match self.account_id() {
                Some(id) if account_ids.contains(&id) => {}
                _ => return false,
            }
        }

        true
    }
}

/// Which events a subscription receives
///
/// `None` in a field means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Only these kinds of events
    pub kinds: Option<HashSet<EventKind>>,
    /// Only events about these calls
    pub call_ids: Option<HashSet<CallId>>,
    /// Only events about these accounts
    pub account_ids: Option<HashSet<AccountId>>,
}

impl EventFilter {
    /// Accept only the listed kinds
    pub fn kinds(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        Self {
            kinds: Some(kinds.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Accept only events about `call_id`
    pub fn call(call_id: CallId) -> Self {
        Self {
            call_ids: Some(HashSet::from([call_id])),
            ..Default::default()
        }
    }

    /// Accept only events about `account_id`
    pub fn account(account_id: AccountId) -> Self {
        Self {
            account_ids: Some(HashSet::from([account_id])),
            ..Default::default()
        }
    }
}

/// Receives engine events
///
/// Every method has an empty default, so implementors only write the ones
/// they care about. Handlers must not block for long: a direct handler holds
/// up the native thread that fired the callback.
pub trait EngineEventHandler: Send + Sync {
    fn on_log(&self, _level: i32, _message: &str) {}

    fn on_incoming_call(&self, _account: &AccountInfo, _call: &CallInfo) {}

    fn on_call_state(&self, _call: &CallInfo) {}

    fn on_call_media_state(&self, _call: &CallInfo) {}

    fn on_registration_started(&self, _account: &AccountInfo, _renew: bool) {}

    /// Route an event to the matching method
    fn on_event(&self, event: &EngineEvent) {
        match event {
            EngineEvent::Log { level, message } => self.on_log(*level, message),
            EngineEvent::IncomingCall { account, call } => self.on_incoming_call(account, call),
            EngineEvent::CallState { call } => self.on_call_state(call),
            EngineEvent::CallMediaState { call } => self.on_call_media_state(call),
            EngineEvent::RegistrationStarted { account, renew } => {
                self.on_registration_started(account, *renew)
            }
        }
    }
}

/// Adapts a [`LogReceiver`] into an event handler for log events
pub(crate) struct LogReceiverHandler(pub(crate) Arc<dyn LogReceiver>);

impl EngineEventHandler for LogReceiverHandler {
    fn on_log(&self, level: i32, message: &str) {
        self.0.on_log(level, message);
    }
}

/// Where a subscription's handler runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// On the thread that fired the native callback
    Direct,
    /// On the subscription's own dispatcher thread
    Queued,
}

/// A handler plus how and what it is delivered
pub struct EventSubscription {
    id: Uuid,
    handler: Arc<dyn EngineEventHandler>,
    filter: EventFilter,
    delivery: Delivery,
}

impl EventSubscription {
    /// Deliver every event synchronously on the firing thread
    pub fn direct(handler: Arc<dyn EngineEventHandler>) -> Self {
        Self::new(handler, Delivery::Direct)
    }

    /// Deliver every event on a dedicated dispatcher thread
    pub fn queued(handler: Arc<dyn EngineEventHandler>) -> Self {
        Self::new(handler, Delivery::Queued)
    }

    fn new(handler: Arc<dyn EngineEventHandler>, delivery: Delivery) -> Self {
        Self {
            id: Uuid::new_v4(),
            handler,
            filter: EventFilter::default(),
            delivery,
        }
    }

    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSubscription")
            .field("id", &self.id)
            .field("filter", &self.filter)
            .field("delivery", &self.delivery)
            .finish()
    }
}

fn deliver(id: Uuid, handler: &dyn EngineEventHandler, event: &EngineEvent) {
    let result = catch_unwind(AssertUnwindSafe(|| handler.on_event(event)));
    if result.is_err() {
        error!("Event handler {} panicked while handling {:?}", id, event.kind());
    }
}

/// The dispatcher thread behind a queued subscription
struct Dispatcher {
    tx: Mutex<Option<mpsc::UnboundedSender<EngineEvent>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    fn spawn(id: Uuid, handler: Arc<dyn EngineEventHandler>) -> std::io::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<EngineEvent>();
        let handle = std::thread::Builder::new()
            .name(format!("sua-events-{}", &id.simple().to_string()[..8]))
            .spawn(move || {
                while let Some(event) = rx.blocking_recv() {
                    deliver(id, handler.as_ref(), &event);
                }
                debug!("Event dispatcher {} finished", id);
            })?;
        Ok(Self {
            tx: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        })
    }

    fn send(&self, event: EngineEvent) {
        if let Some(tx) = self.tx.lock().as_ref() {
            let _ = tx.send(event);
        }
    }

    /// Close the queue and wait for what is already in it to be delivered
    fn stop(&self) {
        drop(self.tx.lock().take());
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() != std::thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Subscriber {
    id: Uuid,
    handler: Arc<dyn EngineEventHandler>,
    filter: EventFilter,
    dispatcher: Option<Dispatcher>,
}

impl Subscriber {
    fn dispatch(&self, event: &EngineEvent) {
        if !event.passes_filter(&self.filter) {
            return;
        }
        match &self.dispatcher {
            Some(dispatcher) => dispatcher.send(event.clone()),
            None => deliver(self.id, self.handler.as_ref(), event),
        }
    }

    fn stop(&self) {
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.stop();
        }
    }
}

/// Fan-out of engine events to subscriptions and streams
pub struct EventEmitter {
    subscribers: RwLock<Vec<Arc<Subscriber>>>,
    sender: broadcast::Sender<EngineEvent>,
}

impl EventEmitter {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(STREAM_CAPACITY);
        Self {
            subscribers: RwLock::new(Vec::new()),
            sender,
        }
    }

    /// Add a subscription, returning its id
    ///
    /// A queued subscription whose dispatcher thread cannot be started falls
    /// back to direct delivery.
    pub fn subscribe(&self, subscription: EventSubscription) -> Uuid {
        let EventSubscription {
            id,
            handler,
            filter,
            delivery,
        } = subscription;

        let dispatcher = match delivery {
            Delivery::Direct => None,
            Delivery::Queued => match Dispatcher::spawn(id, handler.clone()) {
                Ok(dispatcher) => Some(dispatcher),
                Err(e) => {
                    warn!("Failed to start event dispatcher, delivering directly: {}", e);
                    None
                }
            },
        };

        debug!("Added {:?} event subscription {}", delivery, id);
        self.subscribers.write().push(Arc::new(Subscriber {
            id,
            handler,
            filter,
            dispatcher,
        }));
        id
    }

    /// Remove a subscription
    ///
    /// A queued subscription delivers what it has already accepted before
    /// this returns. Returns `false` for an unknown id.
    pub fn unsubscribe(&self, id: Uuid) -> bool {
        let removed = {
            let mut subscribers = self.subscribers.write();
            subscribers
                .iter()
                .position(|s| s.id == id)
                .map(|index| subscribers.remove(index))
        };
        match removed {
            Some(subscriber) => {
                subscriber.stop();
                true
            }
            None => false,
        }
    }

    /// Publish an event to every matching subscription and to open streams
    pub fn emit(&self, event: EngineEvent) {
        let subscribers = self.subscribers.read().clone();
        for subscriber in &subscribers {
            subscriber.dispatch(&event);
        }
        if self.sender.receiver_count() > 0 {
            let _ = self.sender.send(event);
        }
    }

    /// A stream of every event emitted from now on
    pub fn stream(&self) -> EventStream {
        BroadcastStream::new(self.sender.subscribe())
    }

    pub fn subscription_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Remove every subscription, draining queued ones
    pub fn close(&self) {
        let subscribers = std::mem::take(&mut *self.subscribers.write());
        for subscriber in &subscribers {
            subscriber.stop();
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("subscriptions", &self.subscription_count())
            .field("streams", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::ThreadId;
    use sua_native::{InvState, NativeAccountInfo, NativeCallInfo};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(EngineEvent, ThreadId)>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<EngineEvent> {
            self.events.lock().iter().map(|(e, _)| e.clone()).collect()
        }
    }

    impl EngineEventHandler for Recorder {
        fn on_event(&self, event: &EngineEvent) {
            self.events
                .lock()
                .push((event.clone(), std::thread::current().id()));
        }
    }

    struct Panicker;

    impl EngineEventHandler for Panicker {
        fn on_log(&self, _level: i32, _message: &str) {
            panic!("handler failure");
        }
    }

    fn call(id: i32, acc: i32, state: InvState) -> CallInfo {
        CallInfo::from(&NativeCallInfo {
            id: CallId(id),
            acc_id: AccountId(acc),
            state,
            ..Default::default()
        })
    }

    fn account(id: i32) -> AccountInfo {
        AccountInfo::from(&NativeAccountInfo {
            id: AccountId(id),
            ..Default::default()
        })
    }

    fn log(message: &str) -> EngineEvent {
        EngineEvent::Log {
            level: 3,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_event_ids() {
        let event = EngineEvent::IncomingCall {
            account: account(2),
            call: call(7, 2, InvState::Incoming),
        };
        assert_eq!(event.kind(), EventKind::IncomingCall);
        assert_eq!(event.call_id(), Some(CallId(7)));
        assert_eq!(event.account_id(), Some(AccountId(2)));

        let state = EngineEvent::CallState {
            call: call(4, 1, InvState::Early),
        };
        assert_eq!(state.account_id(), Some(AccountId(1)));
        assert_eq!(log("x").call_id(), None);
        assert_eq!(log("x").account_id(), None);
    }

    #[test]
    fn test_filters() {
        let state = EngineEvent::CallState {
            call: call(4, 1, InvState::Early),
        };
        assert!(state.passes_filter(&EventFilter::default()));
        assert!(state.passes_filter(&EventFilter::kinds([EventKind::CallState])));
        assert!(!state.passes_filter(&EventFilter::kinds([EventKind::Log])));
        assert!(state.passes_filter(&EventFilter::call(CallId(4))));
        assert!(!state.passes_filter(&EventFilter::call(CallId(5))));
        assert!(state.passes_filter(&EventFilter::account(AccountId(1))));
        assert!(!log("x").passes_filter(&EventFilter::call(CallId(4))));
        assert!(!log("x").passes_filter(&EventFilter::account(AccountId(1))));
    }

    #[test]
    fn test_direct_delivery_runs_on_emitting_thread_in_order() {
        let emitter = EventEmitter::new();
        let recorder = Arc::new(Recorder::default());
        emitter.subscribe(EventSubscription::direct(recorder.clone()));

        emitter.emit(log("one"));
        emitter.emit(log("two"));

        let recorded = recorder.events.lock().clone();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].0, log("one"));
        assert_eq!(recorded[1].0, log("two"));
        assert!(recorded.iter().all(|(_, t)| *t == std::thread::current().id()));
    }

    #[test]
    fn test_queued_delivery_runs_elsewhere_and_drains_on_unsubscribe() {
        let emitter = EventEmitter::new();
        let recorder = Arc::new(Recorder::default());
        let id = emitter.subscribe(EventSubscription::queued(recorder.clone()));

        for i in 0..50 {
            emitter.emit(log(&i.to_string()));
        }
        assert!(emitter.unsubscribe(id));

        let recorded = recorder.events.lock().clone();
        assert_eq!(recorded.len(), 50);
        for (i, (event, thread)) in recorded.iter().enumerate() {
            assert_eq!(*event, log(&i.to_string()));
            assert_ne!(*thread, std::thread::current().id());
        }
    }

    #[test]
    fn test_filtered_subscription_skips_other_events() {
        let emitter = EventEmitter::new();
        let recorder = Arc::new(Recorder::default());
        emitter.subscribe(
            EventSubscription::direct(recorder.clone())
                .with_filter(EventFilter::kinds([EventKind::CallState])),
        );

        emitter.emit(log("ignored"));
        emitter.emit(EngineEvent::CallState {
            call: call(0, 0, InvState::Calling),
        });

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::CallState);
    }

    #[test]
    fn test_panicking_handler_does_not_stop_others() {
        let emitter = EventEmitter::new();
        let recorder = Arc::new(Recorder::default());
        emitter.subscribe(EventSubscription::direct(Arc::new(Panicker)));
        emitter.subscribe(EventSubscription::direct(recorder.clone()));

        emitter.emit(log("still delivered"));
        assert_eq!(recorder.events(), vec![log("still delivered")]);
    }

    #[test]
    fn test_unsubscribe_unknown_id() {
        let emitter = EventEmitter::new();
        assert!(!emitter.unsubscribe(Uuid::new_v4()));
    }

    #[test]
    fn test_close_removes_everything() {
        let emitter = EventEmitter::new();
        let recorder = Arc::new(Recorder::default());
        emitter.subscribe(EventSubscription::queued(recorder.clone()));
        emitter.subscribe(EventSubscription::direct(recorder.clone()));
        emitter.emit(log("before"));
        emitter.close();
        emitter.emit(log("after"));

        assert_eq!(emitter.subscription_count(), 0);
        assert_eq!(recorder.events(), vec![log("before"), log("before")]);
    }

    #[test]
    fn test_log_receiver_adapter() {
        #[derive(Default)]
        struct Lines(Mutex<Vec<(i32, String)>>);
        impl LogReceiver for Lines {
            fn on_log(&self, level: i32, message: &str) {
                self.0.lock().push((level, message.to_string()));
            }
        }

        let lines = Arc::new(Lines::default());
        let handler = LogReceiverHandler(lines.clone());
        handler.on_event(&log("hello"));
        handler.on_event(&EngineEvent::CallState {
            call: call(0, 0, InvState::Calling),
        });
        assert_eq!(*lines.0.lock(), vec![(3, "hello".to_string())]);
    }
}

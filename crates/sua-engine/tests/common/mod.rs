//! Shared helpers for the engine integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::thread::ThreadId;

use parking_lot::Mutex;
use sua_engine::events::{EngineEvent, EngineEventHandler, EventKind, EventSubscription};
use sua_engine::{Engine, LogReceiver};
use sua_native::loopback::LoopbackUserAgent;

/// Records every event it sees together with the delivering thread
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<(EngineEvent, ThreadId)>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().iter().map(|(e, _)| e.clone()).collect()
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<EngineEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.kind() == kind)
            .collect()
    }

    pub fn threads(&self) -> Vec<ThreadId> {
        self.events.lock().iter().map(|(_, t)| *t).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }
}

impl EngineEventHandler for Recorder {
    fn on_event(&self, event: &EngineEvent) {
        self.events
            .lock()
            .push((event.clone(), std::thread::current().id()));
    }
}

/// Log receiver keeping `(level, message, thread)` triples
#[derive(Default)]
pub struct LogLines {
    lines: Mutex<Vec<(i32, String, ThreadId)>>,
}

impl LogLines {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<(i32, String)> {
        self.lines
            .lock()
            .iter()
            .map(|(level, message, _)| (*level, message.clone()))
            .collect()
    }

    pub fn threads(&self) -> Vec<ThreadId> {
        self.lines.lock().iter().map(|(_, _, t)| *t).collect()
    }
}

impl LogReceiver for LogLines {
    fn on_log(&self, level: i32, message: &str) {
        self.lines
            .lock()
            .push((level, message.to_string(), std::thread::current().id()));
    }
}

/// A default engine over a fresh loopback user agent
pub fn started_engine() -> (Engine, Arc<LoopbackUserAgent>) {
    let native = LoopbackUserAgent::new();
    let engine = Engine::build().create(native.clone());
    assert!(engine.is_valid(), "engine failed to start: {}", engine.last_error());
    (engine, native)
}

/// A started engine with a direct recorder attached
pub fn recorded_engine() -> (Engine, Arc<LoopbackUserAgent>, Arc<Recorder>) {
    let (engine, native) = started_engine();
    let recorder = Recorder::new();
    engine.subscribe(EventSubscription::direct(recorder.clone()));
    (engine, native, recorder)
}

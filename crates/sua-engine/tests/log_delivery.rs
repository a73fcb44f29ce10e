//! Native log lines reaching the configured receiver

mod common;

use std::sync::Arc;

use serial_test::serial;
use sua_engine::config::LoggingConfiguration;
use sua_engine::events::{EventKind, EventSubscription};
use sua_engine::{Engine, EngineEvent};
use sua_native::loopback::{LoopbackUserAgent, NativeEvent};

use common::{LogLines, Recorder};

fn engine_with_receiver(console_level: u32) -> (Engine, Arc<LoopbackUserAgent>, Arc<LogLines>) {
    let native = LoopbackUserAgent::new();
    let lines = LogLines::new();
    let engine = Engine::build()
        .with_logging_configuration(
            LoggingConfiguration::new()
                .with_console_level(console_level)
                .with_receiver(lines.clone()),
        )
        .create(native.clone());
    assert!(engine.is_valid(), "{}", engine.last_error());
    (engine, native, lines)
}

#[test]
#[serial]
fn test_lines_arrive_verbatim_on_another_thread() {
    let (engine, native, lines) = engine_with_receiver(5);

    native.emit_log(3, "pjsua_core.c  SIP UDP socket reachable at 127.0.0.1:5060");
    native.emit_log(5, "sip_endpoint.c  Module \"mod-pjsua\" registered");
    native.flush();
    let worker = native.worker_thread_id().expect("worker is running");

    // Shutting down drains the queued receiver.
    engine.shutdown().unwrap();

    assert_eq!(
        lines.lines(),
        vec![
            (
                3,
                "pjsua_core.c  SIP UDP socket reachable at 127.0.0.1:5060".to_string()
            ),
            (5, "sip_endpoint.c  Module \"mod-pjsua\" registered".to_string()),
        ]
    );
    for thread in lines.threads() {
        assert_ne!(thread, worker);
        assert_ne!(thread, std::thread::current().id());
    }
}

#[test]
#[serial]
fn test_console_level_caps_delivery() {
    let (engine, native, lines) = engine_with_receiver(2);

    native.emit_log(1, "error line");
    native.emit_log(4, "debug line");
    native.emit_log(2, "warning line");
    native.flush();
    engine.shutdown().unwrap();

    assert_eq!(
        lines.lines(),
        vec![(1, "error line".to_string()), (2, "warning line".to_string())]
    );
}

#[test]
#[serial]
fn test_order_is_preserved() {
    let (engine, native, lines) = engine_with_receiver(5);
    for i in 0..200 {
        native.emit_log(4, format!("line {}", i));
    }
    native.flush();
    engine.shutdown().unwrap();

    let received: Vec<String> = lines.lines().into_iter().map(|(_, m)| m).collect();
    let expected: Vec<String> = (0..200).map(|i| format!("line {}", i)).collect();
    assert_eq!(received, expected);
}

#[test]
#[serial]
fn test_synchronous_log_callback_is_still_deferred() {
    let (engine, native, lines) = engine_with_receiver(5);

    native.fire_now(NativeEvent::Log {
        level: 3,
        text: "fired here".to_string(),
    });
    engine.shutdown().unwrap();

    assert_eq!(lines.lines(), vec![(3, "fired here".to_string())]);
    assert_ne!(lines.threads()[0], std::thread::current().id());
}

#[test]
#[serial]
fn test_log_events_for_direct_subscribers() {
    let (engine, native, lines) = engine_with_receiver(5);
    let recorder = Recorder::new();
    engine.subscribe(EventSubscription::direct(recorder.clone()));

    native.emit_log(3, "both see this");
    native.flush();

    let events = recorder.of_kind(EventKind::Log);
    assert_eq!(
        events,
        vec![EngineEvent::Log {
            level: 3,
            message: "both see this".to_string(),
        }]
    );
    assert_eq!(Some(recorder.threads()[0]), native.worker_thread_id());

    engine.shutdown().unwrap();
    assert_eq!(lines.lines().len(), 1);
}

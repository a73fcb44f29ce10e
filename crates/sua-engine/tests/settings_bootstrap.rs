//! Bringing an engine up from a settings file

mod common;

use std::io::Write;

use serial_test::serial;
use sua_engine::EngineSettings;
use sua_native::loopback::LoopbackUserAgent;
use sua_native::PJ_LOG_HAS_NEWLINE;

const SETTINGS: &str = r#"
[logging]
console_level = 2
forward_to_tracing = true

[transport]
port = 5099

[[accounts]]
sip_url = "sip:alice@example.com"
registration_uri = "sip:example.com"
proxies = ["sip:edge.example.com;lr"]

[[accounts.credentials]]
realm = "*"
username = "alice"
password = "secret"

[[accounts]]
sip_url = "sip:bob@example.com"
rtp_port = 4100
allow_contact_rewrite = false
"#;

#[test]
#[serial]
fn test_engine_from_settings() {
    let settings = EngineSettings::from_toml_str(SETTINGS).unwrap();
    let native = LoopbackUserAgent::new();
    let engine = settings.builder().create(native.clone());
    assert!(engine.is_valid(), "{}", engine.last_error());

    let init = native.recorded_init().expect("init was called");
    assert_eq!(init.log.console_level, 2);
    assert_eq!(init.log.decor & PJ_LOG_HAS_NEWLINE, 0);
    assert_eq!(native.transports()[0].1.port, 5099);

    let ids: Vec<_> = settings
        .accounts
        .iter()
        .map(|account| engine.add_account(account).unwrap())
        .collect();
    assert_eq!(ids.len(), 2);

    let recorded = native.recorded_accounts();
    assert_eq!(recorded[0].proxy_cnt, 1);
    assert_eq!(recorded[0].cred_count, 1);
    assert_eq!(recorded[0].credentials[0].scheme, b"digest");
    assert_eq!(recorded[1].rtp_port, 4100);
    assert!(!recorded[1].allow_contact_rewrite.is_true());

    native.emit_log(1, "forwarded to tracing");
    native.flush();
    engine.shutdown().unwrap();
}

#[test]
#[serial]
fn test_settings_file_round_trip_through_disk() {
    let path = std::env::temp_dir().join(format!("sua-engine-{}.toml", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(SETTINGS.as_bytes()).unwrap();
    }
    let settings = EngineSettings::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(settings, EngineSettings::from_toml_str(SETTINGS).unwrap());
    assert_eq!(settings.transport.port, 5099);
}

//! Account translation and registration notifications

mod common;

use serial_test::serial;
use sua_engine::config::{AccountCredential, CredentialDataType};
use sua_engine::events::{EventFilter, EventKind, EventSubscription};
use sua_engine::{AccountConfiguration, EngineError, EngineEvent};
use sua_native::loopback::{LoopbackStage, NativeEvent};
use sua_native::{AccountId, PjBool, PjStatus, PJSUA_ACC_MAX_PROXIES, PJSUA_MAX_CRED};

use common::{recorded_engine, started_engine, Recorder};

fn alice() -> AccountConfiguration {
    AccountConfiguration::new("sip:alice@example.com", "sip:registrar.example.com")
        .with_rtp_port(4020)
        .with_contact_rewrite(false)
        .with_proxy("sip:edge1.example.com;lr")
        .with_proxy("sip:edge2.example.com;lr")
        .with_proxy("sip:edge3.example.com;lr")
        .with_credential(AccountCredential::new("example.com", "alice", "pa55"))
        .with_credential(
            AccountCredential::new("*", "alice-ha1", "8f7c1e")
                .with_scheme("Digest")
                .with_data_type(CredentialDataType::Digest),
        )
}

#[test]
#[serial]
fn test_account_block_carries_configuration() {
    let (engine, native) = started_engine();
    let account = alice();

    let acc_id = engine.add_account(&account).unwrap();
    assert_eq!(acc_id, AccountId(0));
    assert!(engine.is_valid());

    let recorded = native.recorded_accounts();
    assert_eq!(recorded.len(), 1);
    let block = &recorded[0];
    assert!(block.is_default);
    assert!(block.register_on_acc_add.is_true());
    assert_eq!(block.id, b"sip:alice@example.com");
    assert_eq!(block.reg_uri, b"sip:registrar.example.com");
    assert_eq!(block.rtp_port, 4020);
    assert_eq!(block.allow_contact_rewrite, PjBool::FALSE);

    assert_eq!(block.proxy_cnt, 3);
    for (recorded, configured) in block.proxies.iter().zip(&account.proxies) {
        assert_eq!(recorded.as_slice(), configured.as_bytes());
    }

    assert_eq!(block.cred_count, 2);
    for (recorded, configured) in block.credentials.iter().zip(&account.credentials) {
        assert_eq!(recorded.realm.as_slice(), configured.realm.as_bytes());
        assert_eq!(recorded.scheme.as_slice(), configured.scheme.as_bytes());
        assert_eq!(recorded.username.as_slice(), configured.username.as_bytes());
        assert_eq!(recorded.data_type, configured.data_type.as_native());
        assert_eq!(recorded.data.as_slice(), configured.password.as_bytes());
    }

    engine.shutdown().unwrap();
}

#[test]
#[serial]
fn test_account_without_lists() {
    let (engine, native) = started_engine();
    engine
        .add_account(&AccountConfiguration::new("sip:bob@example.com", ""))
        .unwrap();

    let block = &native.recorded_accounts()[0];
    assert_eq!(block.proxy_cnt, 0);
    assert_eq!(block.cred_count, 0);
    assert!(block.proxies.is_empty());
    assert!(block.reg_uri.is_empty());
    assert_eq!(block.allow_contact_rewrite, PjBool::TRUE);
}

#[test]
#[serial]
fn test_too_many_proxies_is_rejected_before_native_call() {
    let (engine, native) = started_engine();
    let mut account = AccountConfiguration::new("sip:carol@example.com", "");
    for i in 0..=PJSUA_ACC_MAX_PROXIES {
        account = account.with_proxy(format!("sip:p{}.example.com", i));
    }

    let result = engine.add_account(&account);
    assert!(matches!(
        result,
        Err(EngineError::Capacity { what: "proxies", .. })
    ));
    assert!(native.recorded_accounts().is_empty());
    assert_eq!(engine.last_status(), PjStatus::ETOOMANY);
    assert_eq!(engine.last_error().message(), "Add account failed.");
    // Only the account failed; the engine keeps running.
    assert!(engine.is_active());
}

#[test]
#[serial]
fn test_too_many_credentials_is_rejected() {
    let (engine, native) = started_engine();
    let mut account = AccountConfiguration::new("sip:dave@example.com", "");
    for i in 0..=PJSUA_MAX_CRED {
        account = account.with_credential(AccountCredential::new("*", format!("u{}", i), "x"));
    }

    let error = engine.add_account(&account).unwrap_err();
    assert_eq!(error.status(), Some(PjStatus::ETOOMANY));
    assert!(native.recorded_accounts().is_empty());
}

#[test]
#[serial]
fn test_native_refusal_is_recorded() {
    let (engine, native) = started_engine();
    native.fail_at(LoopbackStage::AccAdd, PjStatus::EINVAL);

    let result = engine.add_account(&alice());
    match result {
        Err(EngineError::Native { step, status }) => {
            assert_eq!(step, "Add account");
            assert_eq!(status, PjStatus::EINVAL);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!engine.is_valid());
    assert_eq!(engine.last_error().message(), "Add account failed.");
    assert!(engine.is_active());
    assert_eq!(native.destroy_count(), 0);

    native.clear_failures();
    assert!(engine.add_account(&alice()).is_ok());
    assert!(engine.is_valid());
    assert_eq!(engine.last_status(), PjStatus::SUCCESS);
    // The failure itself is still on record.
    assert_eq!(engine.last_error().status(), PjStatus::EINVAL);
}

#[test]
#[serial]
fn test_registration_started_reports_renew() {
    let (engine, native, recorder) = recorded_engine();

    let acc_id = engine.add_account(&alice()).unwrap();
    native.flush();

    native.start_registration(acc_id, PjBool::FALSE);
    native.flush();

    let events = recorder.of_kind(EventKind::RegistrationStarted);
    assert_eq!(events.len(), 2);
    match &events[0] {
        EngineEvent::RegistrationStarted { account, renew } => {
            assert!(*renew);
            assert_eq!(account.id, acc_id);
            assert_eq!(account.uri, "sip:alice@example.com");
            assert!(account.is_default);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    match &events[1] {
        EngineEvent::RegistrationStarted { renew, .. } => assert!(!*renew),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[test]
#[serial]
fn test_account_without_registrar_does_not_register() {
    let (engine, native, recorder) = recorded_engine();
    engine
        .add_account(&AccountConfiguration::new("sip:local@example.com", ""))
        .unwrap();
    native.flush();
    assert!(recorder.of_kind(EventKind::RegistrationStarted).is_empty());
}

#[test]
#[serial]
fn test_registration_for_unknown_account_publishes_nothing() {
    let (_engine, native, recorder) = recorded_engine();
    native.fire_now(NativeEvent::RegStarted {
        acc_id: AccountId(17),
        renew: PjBool::TRUE,
    });
    assert_eq!(recorder.len(), 0);
}

#[test]
#[serial]
fn test_account_filter() {
    let (engine, native) = started_engine();
    let first = engine.add_account(&alice()).unwrap();
    native.flush();

    let recorder = Recorder::new();
    let second_config = AccountConfiguration::new("sip:eve@example.com", "sip:example.com");
    // Subscribe for the account that will be added next.
    engine.subscribe(
        EventSubscription::direct(recorder.clone())
            .with_filter(EventFilter::account(AccountId(first.0 + 1))),
    );
    let second = engine.add_account(&second_config).unwrap();
    native.start_registration(first, PjBool::TRUE);
    native.flush();

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].account_id(), Some(second));
}

#[test]
#[serial]
fn test_account_info_on_demand() {
    let (engine, _native) = started_engine();
    let acc_id = engine.add_account(&alice()).unwrap();

    let info = engine.account_info(acc_id).unwrap();
    assert_eq!(info.id, acc_id);
    assert_eq!(info.uri, "sip:alice@example.com");
    assert!(info.has_registration);

    let missing = engine.account_info(AccountId(99));
    assert!(matches!(
        missing,
        Err(EngineError::NotFound { status: PjStatus::EINVAL, .. })
    ));
}

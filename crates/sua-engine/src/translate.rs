//! Configuration to native block translation
//!
//! Each function starts from the native default block and overrides only the
//! fields the configuration controls.

use sua_native::{
    AccConfig, CredInfo, LogCallback, LogConfig, MediaConfig, PjBool, PjStr, TransportConfig,
    UaCallbacks, UaConfig, PJSUA_ACC_MAX_PROXIES, PJSUA_MAX_CRED, PJ_LOG_HAS_NEWLINE,
};
use tracing::debug;

use crate::config::{
    AccountConfiguration, LoggingConfiguration, MediaConfiguration, TransportConfiguration,
};
use crate::error::{EngineError, EngineResult};

/// Engine-wide block with every callback slot filled from `callbacks`
pub fn ua_config(callbacks: UaCallbacks) -> UaConfig {
    UaConfig {
        cb: callbacks,
        ..UaConfig::default()
    }
}

/// Logging block routed to `log_cb`
///
/// The newline decoration is cleared so receivers get lines without a
/// trailing line break.
pub fn log_config(logging: &LoggingConfiguration, log_cb: LogCallback) -> LogConfig {
    let mut cfg = LogConfig::default();
    cfg.console_level = logging.console_level();
    cfg.cb = Some(log_cb);
    cfg.decor &= !PJ_LOG_HAS_NEWLINE;
    cfg
}

pub fn media_config(_media: &MediaConfiguration) -> MediaConfig {
    MediaConfig::default()
}

pub fn transport_config(transport: &TransportConfiguration) -> TransportConfig {
    TransportConfig {
        port: u32::from(transport.port),
        ..TransportConfig::default()
    }
}

/// Account block viewing the strings of `account`
///
/// Fails without building anything when the proxy or credential list does
/// not fit the native arrays.
pub fn account_config(account: &AccountConfiguration) -> EngineResult<AccConfig<'_>> {
    if account.proxies.len() > PJSUA_ACC_MAX_PROXIES {
        return Err(EngineError::Capacity {
            what: "proxies",
            count: account.proxies.len(),
            max: PJSUA_ACC_MAX_PROXIES,
        });
    }
    if account.credentials.len() > PJSUA_MAX_CRED {
        return Err(EngineError::Capacity {
            what: "credentials",
            count: account.credentials.len(),
            max: PJSUA_MAX_CRED,
        });
    }

    let mut cfg = AccConfig::default();
    cfg.id = PjStr::from(account.sip_url.as_str());
    cfg.reg_uri = PjStr::from(account.registration_uri.as_str());
    cfg.rtp_cfg.port = u32::from(account.rtp_port);
    cfg.allow_contact_rewrite = PjBool::from(account.allow_contact_rewrite);

    for (slot, proxy) in cfg.proxy.iter_mut().zip(&account.proxies) {
        *slot = PjStr::from(proxy.as_str());
    }
    cfg.proxy_cnt = account.proxies.len() as u32;

    for (slot, cred) in cfg.cred_info.iter_mut().zip(&account.credentials) {
        *slot = CredInfo {
            realm: PjStr::from(cred.realm.as_str()),
            scheme: PjStr::from(cred.scheme.as_str()),
            username: PjStr::from(cred.username.as_str()),
            data_type: cred.data_type.as_native(),
            data: PjStr::from(cred.password.as_str()),
        };
    }
    cfg.cred_count = account.credentials.len() as u32;

    debug!(
        "Account block for {}: {} proxies, {} credentials, rtp port {}",
        account.sip_url, cfg.proxy_cnt, cfg.cred_count, cfg.rtp_cfg.port
    );
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccountCredential, CredentialDataType};

    fn noop_log(_level: i32, _data: &str, _len: usize) {}

    #[test]
    fn test_log_config_overrides() {
        let logging = LoggingConfiguration::new().with_console_level(2);
        let cfg = log_config(&logging, noop_log);
        assert_eq!(cfg.console_level, 2);
        assert!(cfg.cb.is_some());
        assert_eq!(cfg.decor & PJ_LOG_HAS_NEWLINE, 0);
        // Other decorations are left at their defaults.
        assert_eq!(cfg.decor, LogConfig::default().decor & !PJ_LOG_HAS_NEWLINE);
        assert_eq!(cfg.level, LogConfig::default().level);
    }

    #[test]
    fn test_transport_only_port_changes() {
        let cfg = transport_config(&TransportConfiguration::new().with_port(5090));
        assert_eq!(
            cfg,
            TransportConfig {
                port: 5090,
                ..TransportConfig::default()
            }
        );
    }

    #[test]
    fn test_ua_config_keeps_defaults() {
        let cfg = ua_config(UaCallbacks::default());
        let default = UaConfig::default();
        assert_eq!(cfg.max_calls, default.max_calls);
        assert_eq!(cfg.thread_cnt, default.thread_cnt);
    }

    #[test]
    fn test_account_block_views_configuration_bytes() {
        let account = AccountConfiguration::new("sip:alice@example.com", "sip:example.com")
            .with_rtp_port(4010)
            .with_contact_rewrite(false)
            .with_proxy("sip:p1;lr")
            .with_proxy("sip:p2;lr")
            .with_credential(
                AccountCredential::new("*", "alice", "pw")
                    .with_data_type(CredentialDataType::Digest),
            );

        let cfg = account_config(&account).unwrap();
        assert_eq!(cfg.id.as_bytes(), b"sip:alice@example.com");
        assert_eq!(cfg.reg_uri.as_bytes(), b"sip:example.com");
        assert_eq!(cfg.rtp_cfg.port, 4010);
        assert!(!cfg.allow_contact_rewrite.is_true());
        assert!(cfg.register_on_acc_add.is_true());
        assert_eq!(cfg.proxy_cnt, 2);
        assert_eq!(cfg.proxies()[1].as_bytes(), b"sip:p2;lr");
        assert_eq!(cfg.cred_count, 1);
        let cred = &cfg.credentials()[0];
        assert_eq!(cred.realm.as_bytes(), b"*");
        assert_eq!(cred.scheme.as_bytes(), b"digest");
        assert_eq!(cred.username.as_bytes(), b"alice");
        assert_eq!(cred.data_type, 1);
        assert_eq!(cred.data.as_bytes(), b"pw");
        // The block points into the configuration's own storage.
        assert_eq!(cfg.id.as_bytes().as_ptr(), account.sip_url.as_ptr());
    }

    #[test]
    fn test_capacity_is_exact() {
        let mut account = AccountConfiguration::new("sip:a@b", "");
        for i in 0..PJSUA_ACC_MAX_PROXIES {
            account = account.with_proxy(format!("sip:p{}", i));
        }
        for i in 0..PJSUA_MAX_CRED {
            account = account.with_credential(AccountCredential::new("*", format!("u{}", i), "x"));
        }
        let cfg = account_config(&account).unwrap();
        assert_eq!(cfg.proxy_cnt as usize, PJSUA_ACC_MAX_PROXIES);
        assert_eq!(cfg.cred_count as usize, PJSUA_MAX_CRED);

        let too_many_proxies = account.clone().with_proxy("sip:extra");
        assert!(matches!(
            account_config(&too_many_proxies),
            Err(EngineError::Capacity { what: "proxies", count: 9, max: 8 })
        ));

        let too_many_creds = account.with_credential(AccountCredential::new("*", "extra", "x"));
        assert!(matches!(
            account_config(&too_many_creds),
            Err(EngineError::Capacity { what: "credentials", .. })
        ));
    }
}

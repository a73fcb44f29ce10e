//! Account configuration
//!
//! An account is a SIP identity plus where and how to register it. The
//! native account block has fixed room for proxies and credentials
//! ([`sua_native::PJSUA_ACC_MAX_PROXIES`], [`sua_native::PJSUA_MAX_CRED`]);
//! the lists here are unbounded and are checked when the account is added.
//!
//! # Examples
//!
//! ```rust
//! use sua_engine::config::{AccountConfiguration, AccountCredential};
//!
//! let account = AccountConfiguration::new("sip:alice@example.com", "sip:example.com")
//!     .with_rtp_port(4000)
//!     .with_contact_rewrite(false)
//!     .with_proxy("sip:proxy.example.com;lr")
//!     .with_credential(AccountCredential::new("example.com", "alice", "secret"));
//!
//! assert_eq!(account.proxies.len(), 1);
//! assert_eq!(account.credentials[0].scheme, "digest");
//! assert!(!account.allow_contact_rewrite);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use sua_native::{PJSIP_CRED_DATA_DIGEST, PJSIP_CRED_DATA_EXT_AKA, PJSIP_CRED_DATA_PLAIN_PASSWD};

/// Default local RTP port for an account
pub const DEFAULT_RTP_PORT: u16 = 4000;

/// What the credential's secret holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialDataType {
    /// Plain text password
    #[default]
    PlainPassword,
    /// Pre-computed digest (HA1)
    Digest,
    /// AKA authentication material
    ExtAka,
}

impl CredentialDataType {
    /// The native `data_type` value
    pub fn as_native(self) -> i32 {
        match self {
            Self::PlainPassword => PJSIP_CRED_DATA_PLAIN_PASSWD,
            Self::Digest => PJSIP_CRED_DATA_DIGEST,
            Self::ExtAka => PJSIP_CRED_DATA_EXT_AKA,
        }
    }
}

/// One authentication credential for an account
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCredential {
    /// Realm the credential applies to, `*` for any
    pub realm: String,
    /// Authentication scheme, normally `digest`
    #[serde(default = "default_scheme")]
    pub scheme: String,
    pub username: String,
    #[serde(default)]
    pub data_type: CredentialDataType,
    /// Secret material; interpretation depends on `data_type`
    pub password: String,
}

fn default_scheme() -> String {
    "digest".to_string()
}

impl AccountCredential {
    /// A digest credential with a plain text password
    pub fn new(
        realm: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            realm: realm.into(),
            scheme: default_scheme(),
            username: username.into(),
            data_type: CredentialDataType::PlainPassword,
            password: password.into(),
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_data_type(mut self, data_type: CredentialDataType) -> Self {
        self.data_type = data_type;
        self
    }
}

impl fmt::Debug for AccountCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredential")
            .field("realm", &self.realm)
            .field("scheme", &self.scheme)
            .field("username", &self.username)
            .field("data_type", &self.data_type)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A SIP account to register with the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfiguration {
    /// Identity URI, e.g. `sip:alice@example.com`
    pub sip_url: String,
    /// Registrar URI; empty for an account that never registers
    #[serde(default)]
    pub registration_uri: String,
    /// Local RTP port for calls on this account
    #[serde(default = "default_rtp_port")]
    pub rtp_port: u16,
    /// Let the engine rewrite the Contact header after NAT discovery
    #[serde(default = "default_true")]
    pub allow_contact_rewrite: bool,
    /// Outbound proxies, in route order
    #[serde(default)]
    pub proxies: Vec<String>,
    /// Credentials, tried in order
    #[serde(default)]
    pub credentials: Vec<AccountCredential>,
}

fn default_rtp_port() -> u16 {
    DEFAULT_RTP_PORT
}

fn default_true() -> bool {
    true
}

impl AccountConfiguration {
    pub fn new(sip_url: impl Into<String>, registration_uri: impl Into<String>) -> Self {
        Self {
            sip_url: sip_url.into(),
            registration_uri: registration_uri.into(),
            rtp_port: DEFAULT_RTP_PORT,
            allow_contact_rewrite: true,
            proxies: Vec::new(),
            credentials: Vec::new(),
        }
    }

    pub fn with_rtp_port(mut self, port: u16) -> Self {
        self.rtp_port = port;
        self
    }

    pub fn with_contact_rewrite(mut self, allow: bool) -> Self {
        self.allow_contact_rewrite = allow;
        self
    }

    /// Append an outbound proxy
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxies.push(proxy.into());
        self
    }

    /// Append a credential
    pub fn with_credential(mut self, credential: AccountCredential) -> Self {
        self.credentials.push(credential);
        self
    }
}

//! Module dedicated to the IMAP credentials.
//!
//! Credentials are read from the host secret store as documents
//! shaped `{host, port, secure, user, password}`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{some_bool_or_kind, EncryptionKind};

/// The IMAP credentials.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImapConfig {
    /// The IMAP server host name.
    #[serde(default = "ImapConfig::default_host")]
    pub host: String,

    /// The IMAP server host port.
    #[serde(default = "ImapConfig::default_port")]
    pub port: u16,

    /// The IMAP encryption protocol to use.
    ///
    /// Supported encryption: SSL/TLS, STARTTLS or none. The boolean
    /// `secure` flag maps `true` to SSL/TLS and `false` to none.
    #[serde(
        default,
        alias = "secure",
        deserialize_with = "some_bool_or_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub encryption: Option<EncryptionKind>,

    /// The IMAP server login.
    ///
    /// Usually, the login is the email address of the account. This
    /// is the identity checked by the account guard.
    #[serde(default, alias = "user")]
    pub login: String,

    /// The IMAP server password.
    #[serde(default, alias = "password")]
    pub passwd: String,
}

impl ImapConfig {
    fn default_host() -> String {
        String::from("imap.ionos.com")
    }

    fn default_port() -> u16 {
        993
    }

    /// Return the effective encryption kind, SSL/TLS when undefined.
    pub fn encryption(&self) -> EncryptionKind {
        self.encryption.clone().unwrap_or_default()
    }

    /// Return `true` if TLS or StartTLS is enabled.
    pub fn is_encryption_enabled(&self) -> bool {
        matches!(
            self.encryption.as_ref(),
            None | Some(EncryptionKind::Tls) | Some(EncryptionKind::StartTls)
        )
    }

    /// Return `true` if StartTLS is enabled.
    pub fn is_start_tls_encryption_enabled(&self) -> bool {
        matches!(self.encryption.as_ref(), Some(EncryptionKind::StartTls))
    }

    /// Return `true` if encryption is disabled.
    pub fn is_encryption_disabled(&self) -> bool {
        matches!(self.encryption.as_ref(), Some(EncryptionKind::None))
    }
}

impl Default for ImapConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            encryption: None,
            login: String::new(),
            passwd: String::new(),
        }
    }
}

impl fmt::Debug for ImapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("encryption", &self.encryption)
            .field("login", &self.login)
            .field("passwd", &"<redacted>")
            .finish()
    }
}

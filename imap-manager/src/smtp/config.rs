//! Module dedicated to the SMTP credentials.
//!
//! Credentials are read from the host secret store as documents
//! shaped `{host, port, secure, user, password, from?}`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{some_bool_or_kind, EncryptionKind};

/// The SMTP credentials.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpConfig {
    /// The SMTP server host name.
    #[serde(default)]
    pub host: String,

    /// The SMTP server host port.
    #[serde(default = "SmtpConfig::default_port")]
    pub port: u16,

    /// The SMTP encryption protocol to use.
    ///
    /// Supported encryption: SSL/TLS, STARTTLS or none.
    #[serde(
        default,
        alias = "secure",
        deserialize_with = "some_bool_or_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub encryption: Option<EncryptionKind>,

    /// The SMTP server login.
    #[serde(default, alias = "user")]
    pub login: String,

    /// The SMTP server password.
    #[serde(default, alias = "password")]
    pub passwd: String,

    /// The default envelope sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl SmtpConfig {
    fn default_port() -> u16 {
        465
    }

    /// Return the default envelope sender, if defined and not empty.
    pub fn sender(&self) -> Option<&str> {
        self.from
            .as_deref()
            .map(str::trim)
            .filter(|from| !from.is_empty())
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

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: Self::default_port(),
            encryption: None,
            login: String::new(),
            passwd: String::new(),
            from: None,
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("encryption", &self.encryption)
            .field("login", &self.login)
            .field("passwd", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

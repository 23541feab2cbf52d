//! # Credentials
//!
//! Module dedicated to credential resolution. Credentials are owned
//! by the host secret store: the manager only reads them through the
//! [`CredentialStore`] trait.

use std::{fmt, result};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::{some_bool_or_kind, EncryptionKind},
    imap::config::ImapConfig,
    smtp::config::SmtpConfig,
};

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot find IMAP credentials")]
    MissingImapCredentialsError,
}

/// The credential store.
///
/// Credentials are immutable for the duration of a run.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Resolve the IMAP credentials.
    async fn imap_credentials(&self) -> Result<ImapConfig>;

    /// Resolve the SMTP credentials, `None` when not configured.
    async fn smtp_credentials(&self) -> Result<Option<SmtpConfig>>;
}

/// Credentials known ahead of the run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StaticCredentials {
    pub imap: Option<ImapConfig>,
    pub smtp: Option<SmtpConfig>,
}

impl StaticCredentials {
    pub fn new(imap: ImapConfig) -> Self {
        Self {
            imap: Some(imap),
            smtp: None,
        }
    }

    pub fn with_smtp(mut self, smtp: SmtpConfig) -> Self {
        self.smtp = Some(smtp);
        self
    }
}

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn imap_credentials(&self) -> Result<ImapConfig> {
        self.imap.clone().ok_or(Error::MissingImapCredentialsError)
    }

    async fn smtp_credentials(&self) -> Result<Option<SmtpConfig>> {
        Ok(self.smtp.clone())
    }
}

/// SMTP credentials without host are considered not configured.
impl From<ImapSmtpConfig> for StaticCredentials {
    fn from(config: ImapSmtpConfig) -> Self {
        let (imap, smtp) = config.into_configs();
        Self {
            imap: Some(imap),
            smtp: Some(smtp).filter(|smtp| !smtp.host.trim().is_empty()),
        }
    }
}

/// The combined IMAP and SMTP credentials.
///
/// Some hosts store both protocols in a single credential document,
/// using prefixed keys.
#[derive(Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImapSmtpConfig {
    pub imap_host: String,
    pub imap_port: Option<u16>,
    #[serde(deserialize_with = "some_bool_or_kind")]
    pub imap_secure: Option<EncryptionKind>,
    pub imap_user: String,
    pub imap_password: String,

    pub smtp_host: String,
    pub smtp_port: Option<u16>,
    #[serde(deserialize_with = "some_bool_or_kind")]
    pub smtp_secure: Option<EncryptionKind>,
    pub smtp_user: String,
    pub smtp_password: String,

    /// The default envelope sender.
    pub from: Option<String>,
}

impl ImapSmtpConfig {
    /// Split the document into IMAP and SMTP credentials.
    pub fn into_configs(self) -> (ImapConfig, SmtpConfig) {
        let imap_defaults = ImapConfig::default();
        let imap = ImapConfig {
            host: self.imap_host,
            port: self.imap_port.unwrap_or(imap_defaults.port),
            encryption: self.imap_secure,
            login: self.imap_user,
            passwd: self.imap_password,
        };

        let smtp_defaults = SmtpConfig::default();
        let smtp = SmtpConfig {
            host: self.smtp_host,
            port: self.smtp_port.unwrap_or(smtp_defaults.port),
            encryption: self.smtp_secure,
            login: self.smtp_user,
            passwd: self.smtp_password,
            from: self.from,
        };

        (imap, smtp)
    }
}

impl fmt::Debug for ImapSmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (imap, smtp) = self.clone().into_configs();
        f.debug_struct("ImapSmtpConfig")
            .field("imap", &imap)
            .field("smtp", &smtp)
            .finish()
    }
}

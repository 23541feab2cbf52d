//! # Config
//!
//! Module dedicated to the manager configuration: the encryption kind
//! shared by IMAP and SMTP credentials, the [`Features`] selecting a
//! manager variant and the [`ManagerConfig`] loaded from TOML.

use std::{fmt, fs, io, marker::PhantomData, path::Path, result};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    credentials::StaticCredentials, imap::config::ImapConfig, smtp::config::SmtpConfig,
};

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read manager configuration file {1}")]
    ReadConfigFileError(#[source] io::Error, String),
    #[error("cannot parse manager configuration")]
    ParseConfigError(#[source] toml::de::Error),
}

/// The encryption protocol used to talk to a mail server.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncryptionKind {
    #[default]
    #[serde(alias = "ssl")]
    Tls,
    #[serde(alias = "starttls")]
    StartTls,
    None,
}

impl fmt::Display for EncryptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tls => write!(f, "SSL/TLS"),
            Self::StartTls => write!(f, "StartTLS"),
            Self::None => write!(f, "None"),
        }
    }
}

impl From<bool> for EncryptionKind {
    fn from(secure: bool) -> Self {
        if secure {
            Self::Tls
        } else {
            Self::None
        }
    }
}

/// Deserialize an optional encryption kind from either a boolean (the
/// `secure` flag of credential documents) or a kind name.
pub(crate) fn some_bool_or_kind<'de, D>(
    deserializer: D,
) -> result::Result<Option<EncryptionKind>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct SomeBoolOrKind(PhantomData<fn() -> Option<EncryptionKind>>);

    impl<'de> serde::de::Visitor<'de> for SomeBoolOrKind {
        type Value = Option<EncryptionKind>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("some or none")
        }

        fn visit_none<E>(self) -> result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> result::Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            struct BoolOrKind(PhantomData<fn() -> EncryptionKind>);

            impl<'de> serde::de::Visitor<'de> for BoolOrKind {
                type Value = EncryptionKind;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("boolean or string")
                }

                fn visit_bool<E>(self, v: bool) -> result::Result<Self::Value, E>
                where
                    E: serde::de::Error,
                {
                    Ok(v.into())
                }

                fn visit_str<E>(self, v: &str) -> result::Result<Self::Value, E>
                where
                    E: serde::de::Error,
                {
                    Deserialize::deserialize(serde::de::value::StrDeserializer::new(v))
                }
            }

            deserializer
                .deserialize_any(BoolOrKind(PhantomData))
                .map(Option::Some)
        }
    }

    deserializer.deserialize_option(SomeBoolOrKind(PhantomData))
}

/// The features of a manager variant.
///
/// The distributed variants of the manager only differ by these
/// flags, so they all share the same orchestration code.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Features {
    /// Route account guard failures to a dedicated error output
    /// instead of aborting the run.
    pub error_output: bool,

    /// Enable the `redirect` operation.
    pub redirect: bool,

    /// Enable the `listMailboxes` operation.
    pub list_mailboxes: bool,

    /// Enable the account guard.
    pub account_guard: bool,
}

impl Features {
    /// The standard manager: dual output, account guard and mailbox
    /// listing, without redirect.
    pub fn manager() -> Self {
        Self {
            error_output: true,
            redirect: false,
            list_mailboxes: true,
            account_guard: true,
        }
    }

    /// Every feature enabled.
    pub fn full() -> Self {
        Self {
            error_output: true,
            redirect: true,
            list_mailboxes: true,
            account_guard: true,
        }
    }

    /// The single output variant with redirect, but without account
    /// guard nor mailbox listing.
    pub fn minimal() -> Self {
        Self {
            error_output: false,
            redirect: true,
            list_mailboxes: false,
            account_guard: false,
        }
    }
}

impl Default for Features {
    fn default() -> Self {
        Self::manager()
    }
}

/// The manager configuration.
///
/// Usually loaded from a TOML file by the host running the manager:
///
/// ```toml
/// [features]
/// redirect = true
///
/// [imap]
/// host = "imap.example.com"
/// user = "alice@example.com"
/// password = "secret"
///
/// [parameters]
/// mailbox = "INBOX"
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ManagerConfig {
    /// The features of the manager variant.
    #[serde(default)]
    pub features: Features,

    /// The IMAP credentials.
    pub imap: Option<ImapConfig>,

    /// The SMTP credentials, used by the redirect operation.
    pub smtp: Option<SmtpConfig>,

    /// Node-level parameters, used when an item does not define them.
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ManagerConfig {
    /// Parse the configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(Error::ParseConfigError)
    }

    /// Read then parse the configuration from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let toml = fs::read_to_string(path)
            .map_err(|err| Error::ReadConfigFileError(err, path.display().to_string()))?;
        Self::from_toml_str(&toml)
    }

    /// Build a credential store from the configured credentials.
    pub fn credentials(&self) -> StaticCredentials {
        StaticCredentials {
            imap: self.imap.clone(),
            smtp: self.smtp.clone(),
        }
    }
}

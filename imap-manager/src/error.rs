use std::{any::Any, error, fmt, result};

use thiserror::Error;

use crate::{
    credentials,
    guard::GuardError,
    operation::{self, OperationKind},
};

/// The global `Result` alias of the library.
pub type Result<T> = result::Result<T, Error>;

/// The global any `Result` alias of the library.
///
/// The difference with [`Result`] is that it takes a dynamic error
/// `Box<dyn AnyError>`. Capabilities return it, so that any client
/// implementation can plug its own errors in.
pub type AnyResult<T> = result::Result<T, AnyBoxedError>;

/// The global, downcastable any `Error` trait of the library.
///
/// This trait is used instead of [`std::error::Error`] when an error
/// that is not known at compilation time cannot be placed in a
/// generic due to object-safe trait constraint. The main use case is
/// for capabilities.
pub trait AnyError: error::Error + Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// The global any boxed `Error` alias of the module.
pub type AnyBoxedError = Box<dyn AnyError + Send + 'static>;

impl error::Error for AnyBoxedError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.as_ref().source()
    }
}

/// The failure classes a caller can react to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Authentication or network setup failed while opening a
    /// session.
    Connection,
    /// A required parameter is missing or invalid.
    Validation,
    /// A mailbox cannot be resolved or locked.
    Mailbox,
    /// A collaborator of the redirect operation is missing or failed.
    Dependency,
    /// The account guard rejected the item.
    Guard,
    /// A protocol command failed once the operation started.
    Operation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => write!(f, "connection"),
            Self::Validation => write!(f, "validation"),
            Self::Mailbox => write!(f, "mailbox"),
            Self::Dependency => write!(f, "dependency"),
            Self::Guard => write!(f, "guard"),
            Self::Operation => write!(f, "operation"),
        }
    }
}

/// The global `Error` enum of the library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot resolve IMAP credentials")]
    ResolveImapCredentialsError(#[source] credentials::Error),
    #[error("cannot open IMAP session to {1}:{2}")]
    OpenSessionError(#[source] AnyBoxedError, String, u16),

    #[error("invalid parameters for item {1}")]
    ValidationError(#[source] operation::Error, usize),

    #[error("cannot lock mailbox {1}")]
    LockMailboxError(#[source] AnyBoxedError, String),
    #[error("cannot lock mailbox {0}: mailbox {1} is still locked")]
    MailboxAlreadyLockedError(String, String),

    #[error("cannot redirect message: no SMTP sender configured")]
    MissingSenderError,
    #[error("cannot redirect message: SMTP credentials not found")]
    MissingSmtpCredentialsError,
    #[error("cannot resolve SMTP credentials")]
    ResolveSmtpCredentialsError(#[source] credentials::Error),
    #[error("cannot fetch raw message {1} from mailbox {2}")]
    FetchRawMessageError(#[source] AnyBoxedError, u32, String),
    #[error("cannot find raw message {0} in mailbox {1}")]
    RawMessageNotFoundError(u32, String),
    #[error("cannot connect to SMTP server {1}:{2}")]
    ConnectSmtpError(#[source] AnyBoxedError, String, u16),
    #[error("cannot redirect message {1} to {2}")]
    SendRawMessageError(#[source] AnyBoxedError, u32, String),

    #[error("cannot process item {1}")]
    GuardError(#[source] GuardError, usize),

    #[error("cannot execute {1} operation")]
    ExecuteOperationError(#[source] AnyBoxedError, OperationKind),
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ResolveImapCredentialsError(_) | Self::OpenSessionError(..) => {
                ErrorKind::Connection
            }
            Self::ValidationError(..) => ErrorKind::Validation,
            Self::LockMailboxError(..) | Self::MailboxAlreadyLockedError(..) => ErrorKind::Mailbox,
            Self::MissingSenderError
            | Self::MissingSmtpCredentialsError
            | Self::ResolveSmtpCredentialsError(_)
            | Self::FetchRawMessageError(..)
            | Self::RawMessageNotFoundError(..)
            | Self::ConnectSmtpError(..)
            | Self::SendRawMessageError(..) => ErrorKind::Dependency,
            Self::GuardError(..) => ErrorKind::Guard,
            Self::ExecuteOperationError(..) => ErrorKind::Operation,
        }
    }

    /// Return the index of the item that triggered the error, when
    /// known.
    pub fn item_index(&self) -> Option<usize> {
        match self {
            Self::ValidationError(_, index) | Self::GuardError(_, index) => Some(*index),
            _ => None,
        }
    }
}

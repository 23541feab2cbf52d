use std::{any::Any, io, result};

use thiserror::Error;

use crate::{AnyBoxedError, AnyError};

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot connect to IMAP server {1}:{2} using TCP")]
    ConnectTcpError(#[source] io::Error, String, u16),
    #[error("cannot use {0} as TLS server name")]
    InvalidServerNameError(String),
    #[error("cannot negotiate TLS with IMAP server {1}")]
    ConnectTlsError(#[source] io::Error, String),
    #[error("cannot prepare IMAP stream for STARTTLS")]
    StartTlsError(#[source] io::Error),
    #[error("cannot read IMAP server greeting")]
    ReadGreetingError(#[source] async_imap::error::Error),
    #[error("cannot read IMAP greeting: connection closed by server")]
    MissingGreetingError,
    #[error("cannot authenticate to IMAP server as {1}")]
    LoginError(#[source] async_imap::error::Error, String),

    #[error("cannot list IMAP mailboxes")]
    ListMailboxesError(#[source] async_imap::error::Error),
    #[error("cannot select IMAP mailbox {1}")]
    SelectMailboxError(#[source] async_imap::error::Error, String),
    #[error("cannot run IMAP command: no mailbox selected")]
    NoMailboxSelectedError,
    #[error("cannot search IMAP messages with header {1}: {2}")]
    SearchHeaderError(#[source] async_imap::error::Error, String, String),
    #[error("cannot add flags {1} to IMAP message {2}")]
    AddFlagsError(#[source] async_imap::error::Error, String, u32),
    #[error("cannot remove flags {1} from IMAP message {2}")]
    RemoveFlagsError(#[source] async_imap::error::Error, String, u32),
    #[error("cannot move IMAP message {1} to mailbox {2}")]
    MoveMessageError(#[source] async_imap::error::Error, u32, String),
    #[error("cannot copy IMAP message {1} to mailbox {2}")]
    CopyMessageError(#[source] async_imap::error::Error, u32, String),
    #[error("cannot mark IMAP message {1} as deleted")]
    MarkDeletedError(#[source] async_imap::error::Error, u32),
    #[error("cannot expunge IMAP message {1}")]
    ExpungeError(#[source] async_imap::error::Error, u32),
    #[error("cannot fetch IMAP message {1}")]
    FetchMessageError(#[source] async_imap::error::Error, u32),
    #[error("cannot logout from IMAP server")]
    LogoutError(#[source] async_imap::error::Error),
}

impl AnyError for Error {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl From<Error> for AnyBoxedError {
    fn from(err: Error) -> Self {
        Box::new(err)
    }
}

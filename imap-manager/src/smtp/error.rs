use std::{any::Any, result};

use thiserror::Error;

use crate::{AnyBoxedError, AnyError};

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot connect to SMTP server {1}:{2} using TCP")]
    ConnectTcpError(#[source] mail_send::Error, String, u16),
    #[error("cannot connect to SMTP server {1}:{2} using TLS")]
    ConnectTlsError(#[source] mail_send::Error, String, u16),
    #[error("cannot send message without a recipient")]
    SendMessageMissingRecipientError,
    #[error("cannot send message")]
    SendMessageError(#[source] mail_send::Error),
    #[error("cannot send message: SMTP session already closed")]
    SessionClosedError,
    #[error("cannot quit SMTP session")]
    QuitError(#[source] mail_send::Error),
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

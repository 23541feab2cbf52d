//! # Mail client
//!
//! The mail client capability the manager expects from an IMAP
//! implementation. A [`MailClient`] opens authenticated
//! [`MailSession`]s; each session exposes the protocol commands the
//! operations need. Failures surface as [`AnyBoxedError`]s so any
//! implementation can plug its own error type in.
//!
//! [`AnyBoxedError`]: crate::AnyBoxedError

use async_trait::async_trait;
use serde::Serialize;

use crate::{imap::config::ImapConfig, AnyResult};

/// The unique identifier of a message within a mailbox.
pub type Uid = u32;

/// A mailbox (folder) as listed by the server.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MailboxInfo {
    /// The full path of the mailbox, hierarchy delimiters included.
    pub path: String,

    /// The last segment of the path.
    pub name: String,

    /// The mailbox attributes, like `\HasChildren`.
    pub flags: Vec<String>,

    /// The special use attribute (RFC 6154), like `\Sent`.
    pub special_use: Option<String>,

    /// The hierarchy delimiter.
    pub delimiter: Option<String>,
}

impl MailboxInfo {
    /// Return `true` if the path or the name contains the given
    /// lowercase filter.
    pub fn matches(&self, filter: &str) -> bool {
        filter.is_empty()
            || self.path.to_lowercase().contains(filter)
            || self.name.to_lowercase().contains(filter)
    }
}

/// The outcome of a move or a copy.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MessageTransfer {
    /// The source mailbox.
    pub path: String,

    /// The destination mailbox.
    pub destination: String,
}

/// The mail client, able to open authenticated sessions.
#[async_trait]
pub trait MailClient: Send + Sync {
    /// Connect then authenticate to the server.
    async fn connect(&self, config: &ImapConfig) -> AnyResult<Box<dyn MailSession>>;
}

/// A live, authenticated connection to a mail server.
///
/// Message commands apply to the mailbox selected by the last
/// successful [`MailSession::lock_mailbox`].
#[async_trait]
pub trait MailSession: Send {
    /// List all available mailboxes.
    async fn list_mailboxes(&mut self) -> AnyResult<Vec<MailboxInfo>>;

    /// Acquire exclusive access to the given mailbox.
    async fn lock_mailbox(&mut self, mailbox: &str) -> AnyResult<()>;

    /// Release the access acquired by [`MailSession::lock_mailbox`].
    ///
    /// Releasing never fails.
    fn unlock_mailbox(&mut self, _mailbox: &str) {}

    /// Search message UIDs having the given header value.
    async fn search_header(&mut self, header: &str, value: &str) -> AnyResult<Vec<Uid>>;

    /// Add the given flags to the message.
    async fn add_flags(&mut self, uid: Uid, flags: &[String]) -> AnyResult<()>;

    /// Remove the given flags from the message.
    async fn remove_flags(&mut self, uid: Uid, flags: &[String]) -> AnyResult<()>;

    /// Move the message to the given mailbox.
    async fn move_message(&mut self, uid: Uid, destination: &str) -> AnyResult<MessageTransfer>;

    /// Copy the message to the given mailbox.
    async fn copy_message(&mut self, uid: Uid, destination: &str) -> AnyResult<MessageTransfer>;

    /// Delete the message.
    async fn delete_message(&mut self, uid: Uid) -> AnyResult<()>;

    /// Fetch the raw, unparsed message, `None` if not found.
    async fn fetch_raw_message(&mut self, uid: Uid) -> AnyResult<Option<Vec<u8>>>;

    /// Log out from the server.
    async fn logout(&mut self) -> AnyResult<()>;
}

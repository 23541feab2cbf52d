//! Rust library to run mailbox operations over IMAP on behalf of a
//! batch of workflow items.
//!
//! For every input item, the [`ImapManager`](crate::manager::ImapManager)
//! opens a fresh authenticated IMAP session, runs exactly one
//! operation against the remote mailbox, then logs out. Results are
//! appended to a main output, while account mismatches can be routed
//! to a dedicated error output.
//!
//! The protocol itself is delegated to two capabilities:
//!
//! - [`MailClient`](crate::client::MailClient), implemented over IMAP
//!   by [`ImapClient`](crate::imap::ImapClient) (cargo feature
//!   `imap`)
//! - [`MailSender`](crate::sender::MailSender), implemented over SMTP
//!   by [`SmtpSender`](crate::smtp::SmtpSender) (cargo feature
//!   `smtp`), only used by the redirect operation
//!
//! ## Operations
//!
//! - `listMailboxes`
//! - `searchByMessageId`
//! - `addKeywords` / `removeKeywords`
//! - `move` / `copy`
//! - `delete`
//! - `redirect`
//!
//! See examples in the /tests folder.

pub mod client;
pub mod config;
pub mod context;
pub mod credentials;
pub mod dispatch;
mod error;
pub mod guard;
pub mod imap;
pub mod lock;
pub mod manager;
pub mod operation;
pub mod output;
pub mod record;
pub mod redirect;
pub mod sender;
pub mod session;
pub mod smtp;

#[doc(inline)]
pub use self::error::*;

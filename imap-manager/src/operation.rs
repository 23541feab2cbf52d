//! # Operation
//!
//! Module dedicated to the mailbox operations. An [`Operation`] is
//! parsed once per item from the [`ExecutionContext`]: each variant
//! only carries the fields it needs, and parsing fails fast on the
//! first missing or invalid one.

use std::{fmt, result, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{client::Uid, config::Features, context::ExecutionContext};

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("operation is required")]
    MissingOperationError,
    #[error("cannot parse unknown operation {0}")]
    UnknownOperationError(String),
    #[error("operation {0} is not enabled")]
    DisabledOperationError(OperationKind),
    #[error("mailbox is required")]
    MissingMailboxError,
    #[error("messageId is required")]
    MissingMessageIdError,
    #[error("uid is required")]
    MissingUidError,
    #[error("cannot parse uid {0}")]
    InvalidUidError(String),
    #[error("keywords are required")]
    MissingKeywordsError,
    #[error("destMailbox is required")]
    MissingDestMailboxError,
    #[error("redirectTo is required")]
    MissingRedirectToError,
    #[error("cannot parse parameter {0}: expected {1}")]
    InvalidParameterError(String, &'static str),
}

/// The name of an operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    ListMailboxes,
    SearchByMessageId,
    AddKeywords,
    RemoveKeywords,
    Move,
    Copy,
    Delete,
    Redirect,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListMailboxes => "listMailboxes",
            Self::SearchByMessageId => "searchByMessageId",
            Self::AddKeywords => "addKeywords",
            Self::RemoveKeywords => "removeKeywords",
            Self::Move => "move",
            Self::Copy => "copy",
            Self::Delete => "delete",
            Self::Redirect => "redirect",
        }
    }

    /// Return `true` if the given features enable the operation.
    pub fn is_enabled(&self, features: &Features) -> bool {
        match self {
            Self::ListMailboxes => features.list_mailboxes,
            Self::Redirect => features.redirect,
            _ => true,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" => Err(Error::MissingOperationError),
            "listMailboxes" => Ok(Self::ListMailboxes),
            "searchByMessageId" => Ok(Self::SearchByMessageId),
            "addKeywords" => Ok(Self::AddKeywords),
            "removeKeywords" => Ok(Self::RemoveKeywords),
            "move" => Ok(Self::Move),
            "copy" => Ok(Self::Copy),
            "delete" => Ok(Self::Delete),
            "redirect" => Ok(Self::Redirect),
            unknown => Err(Error::UnknownOperationError(unknown.to_owned())),
        }
    }
}

/// A fully validated operation, ready to be dispatched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operation {
    ListMailboxes {
        /// The lowercase substring filter, empty to list everything.
        filter: String,
    },
    SearchByMessageId {
        mailbox: String,
        message_id: String,
    },
    AddKeywords {
        mailbox: String,
        uid: Uid,
        keywords: Vec<String>,
    },
    RemoveKeywords {
        mailbox: String,
        uid: Uid,
        keywords: Vec<String>,
    },
    Move {
        mailbox: String,
        uid: Uid,
        dest_mailbox: String,
    },
    Copy {
        mailbox: String,
        uid: Uid,
        dest_mailbox: String,
    },
    Delete {
        mailbox: String,
        uid: Uid,
    },
    Redirect {
        mailbox: String,
        uid: Uid,
        redirect_to: String,
        from_override: Option<String>,
    },
}

impl Operation {
    /// Parse the operation of the item at the given index.
    pub fn from_context(
        ctx: &dyn ExecutionContext,
        index: usize,
        features: &Features,
    ) -> Result<Self> {
        let kind: OperationKind = ctx.string("operation", index)?.parse()?;

        if !kind.is_enabled(features) {
            return Err(Error::DisabledOperationError(kind));
        }

        let mailbox = || required(ctx, "mailbox", index, Error::MissingMailboxError);

        let op = match kind {
            OperationKind::ListMailboxes => {
                let filter = ctx.string("mailboxFilter", index)?;
                Self::ListMailboxes {
                    filter: filter.trim().to_lowercase(),
                }
            }
            OperationKind::SearchByMessageId => Self::SearchByMessageId {
                mailbox: mailbox()?,
                message_id: required(ctx, "messageId", index, Error::MissingMessageIdError)?,
            },
            OperationKind::AddKeywords => Self::AddKeywords {
                mailbox: mailbox()?,
                uid: required_uid(ctx, index)?,
                keywords: required_keywords(ctx, index)?,
            },
            OperationKind::RemoveKeywords => Self::RemoveKeywords {
                mailbox: mailbox()?,
                uid: required_uid(ctx, index)?,
                keywords: required_keywords(ctx, index)?,
            },
            OperationKind::Move => Self::Move {
                mailbox: mailbox()?,
                uid: required_uid(ctx, index)?,
                dest_mailbox: required(ctx, "destMailbox", index, Error::MissingDestMailboxError)?,
            },
            OperationKind::Copy => Self::Copy {
                mailbox: mailbox()?,
                uid: required_uid(ctx, index)?,
                dest_mailbox: required(ctx, "destMailbox", index, Error::MissingDestMailboxError)?,
            },
            OperationKind::Delete => Self::Delete {
                mailbox: mailbox()?,
                uid: required_uid(ctx, index)?,
            },
            OperationKind::Redirect => {
                let mailbox = mailbox()?;
                let uid = required_uid(ctx, index)?;
                let redirect_to =
                    required(ctx, "redirectTo", index, Error::MissingRedirectToError)?;
                let from_override = ctx.string("fromOverride", index)?;
                let from_override = Some(from_override.trim())
                    .filter(|from| !from.is_empty())
                    .map(ToOwned::to_owned);

                Self::Redirect {
                    mailbox,
                    uid,
                    redirect_to,
                    from_override,
                }
            }
        };

        Ok(op)
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::ListMailboxes { .. } => OperationKind::ListMailboxes,
            Self::SearchByMessageId { .. } => OperationKind::SearchByMessageId,
            Self::AddKeywords { .. } => OperationKind::AddKeywords,
            Self::RemoveKeywords { .. } => OperationKind::RemoveKeywords,
            Self::Move { .. } => OperationKind::Move,
            Self::Copy { .. } => OperationKind::Copy,
            Self::Delete { .. } => OperationKind::Delete,
            Self::Redirect { .. } => OperationKind::Redirect,
        }
    }

    /// Return the mailbox the operation locks, `None` for mailbox
    /// agnostic operations.
    pub fn mailbox(&self) -> Option<&str> {
        match self {
            Self::ListMailboxes { .. } => None,
            Self::SearchByMessageId { mailbox, .. }
            | Self::AddKeywords { mailbox, .. }
            | Self::RemoveKeywords { mailbox, .. }
            | Self::Move { mailbox, .. }
            | Self::Copy { mailbox, .. }
            | Self::Delete { mailbox, .. }
            | Self::Redirect { mailbox, .. } => Some(mailbox),
        }
    }
}

/// Split comma-separated keywords.
///
/// Segments are trimmed and empty ones dropped. Order and duplicates
/// are preserved.
pub fn parse_keywords(keywords: &str) -> Vec<String> {
    keywords
        .split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn required(
    ctx: &dyn ExecutionContext,
    name: &str,
    index: usize,
    missing: Error,
) -> Result<String> {
    let value = ctx.string(name, index)?;
    let value = value.trim();

    if value.is_empty() {
        Err(missing)
    } else {
        Ok(value.to_owned())
    }
}

fn required_uid(ctx: &dyn ExecutionContext, index: usize) -> Result<Uid> {
    match ctx.uid("uid", index)? {
        0 => Err(Error::MissingUidError),
        uid => Ok(uid),
    }
}

fn required_keywords(ctx: &dyn ExecutionContext, index: usize) -> Result<Vec<String>> {
    let keywords = parse_keywords(&ctx.string("keywords", index)?);

    if keywords.is_empty() {
        Err(Error::MissingKeywordsError)
    } else {
        Ok(keywords)
    }
}

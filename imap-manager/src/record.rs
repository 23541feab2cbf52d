//! # Record
//!
//! Module dedicated to the records emitted by the manager. Every
//! result record carries enough context to be correlated with the
//! item that produced it.

use serde::Serialize;

use crate::{
    client::{MailboxInfo, MessageTransfer, Uid},
    operation::OperationKind,
};

/// A listed mailbox.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailboxRecord {
    pub path: String,
    pub name: String,
    pub flags: Vec<String>,
    /// The special use attribute, empty when none.
    pub special_use: String,
    pub delimiter: Option<String>,
    pub listed: bool,
}

impl From<MailboxInfo> for MailboxRecord {
    fn from(mbox: MailboxInfo) -> Self {
        Self {
            path: mbox.path,
            name: mbox.name,
            flags: mbox.flags,
            special_use: mbox.special_use.unwrap_or_default(),
            delimiter: mbox.delimiter,
            listed: true,
        }
    }
}

/// The record emitted when no mailbox matches the filter.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EmptyMailboxesRecord {
    pub mailboxes: Vec<MailboxRecord>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    pub mailbox: String,
    pub message_id: String,
    pub uids: Vec<Uid>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordsRecord {
    pub mailbox: String,
    pub uid: Uid,
    pub operation: OperationKind,
    pub keywords: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    pub mailbox: String,
    pub uid: Uid,
    pub moved_to: String,
    pub result: MessageTransfer,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyRecord {
    pub mailbox: String,
    pub uid: Uid,
    pub copied_to: String,
    pub result: MessageTransfer,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRecord {
    pub mailbox: String,
    pub uid: Uid,
    pub deleted: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectRecord {
    pub mailbox: String,
    pub uid: Uid,
    pub redirected_to: String,
    /// The identifier of the sent message, `null` when unknown.
    pub message_id: Option<String>,
}

/// The record routed to the error output by the account guard.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardRecord {
    pub error: String,
    pub account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_user: Option<String>,
    pub item_index: usize,
}

/// A record of the main output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Mailbox(MailboxRecord),
    EmptyMailboxes(EmptyMailboxesRecord),
    Search(SearchRecord),
    Keywords(KeywordsRecord),
    Move(MoveRecord),
    Copy(CopyRecord),
    Delete(DeleteRecord),
    Redirect(RedirectRecord),
}

macro_rules! impl_from_record {
    ($($variant:ident($record:ty)),* $(,)?) => {
        $(
            impl From<$record> for Record {
                fn from(record: $record) -> Self {
                    Self::$variant(record)
                }
            }
        )*
    };
}

impl_from_record!(
    Mailbox(MailboxRecord),
    EmptyMailboxes(EmptyMailboxesRecord),
    Search(SearchRecord),
    Keywords(KeywordsRecord),
    Move(MoveRecord),
    Copy(CopyRecord),
    Delete(DeleteRecord),
    Redirect(RedirectRecord),
);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn mailbox_record() {
        let record = Record::from(MailboxRecord::from(MailboxInfo {
            path: "INBOX".into(),
            name: "INBOX".into(),
            flags: vec!["\\HasNoChildren".into()],
            special_use: Some("\\Inbox".into()),
            delimiter: Some("/".into()),
        }));

        assert_eq!(
            serde_json::to_value(record).unwrap(),
            json!({
                "path": "INBOX",
                "name": "INBOX",
                "flags": ["\\HasNoChildren"],
                "specialUse": "\\Inbox",
                "delimiter": "/",
                "listed": true,
            })
        );

        let record = MailboxRecord::from(MailboxInfo::default());
        assert_eq!(record.special_use, "");
    }

    #[test]
    fn empty_mailboxes_record() {
        let record = Record::from(EmptyMailboxesRecord::default());
        assert_eq!(
            serde_json::to_value(record).unwrap(),
            json!({ "mailboxes": [] })
        );
    }

    #[test]
    fn operation_records() {
        let record = Record::from(KeywordsRecord {
            mailbox: "INBOX".into(),
            uid: 3,
            operation: OperationKind::RemoveKeywords,
            keywords: vec!["a".into()],
        });
        assert_eq!(
            serde_json::to_value(record).unwrap(),
            json!({
                "mailbox": "INBOX",
                "uid": 3,
                "operation": "removeKeywords",
                "keywords": ["a"],
            })
        );

        let record = Record::from(MoveRecord {
            mailbox: "INBOX".into(),
            uid: 3,
            moved_to: "Archive".into(),
            result: MessageTransfer {
                path: "INBOX".into(),
                destination: "Archive".into(),
            },
        });
        assert_eq!(
            serde_json::to_value(record).unwrap(),
            json!({
                "mailbox": "INBOX",
                "uid": 3,
                "movedTo": "Archive",
                "result": { "path": "INBOX", "destination": "Archive" },
            })
        );

        let record = Record::from(RedirectRecord {
            mailbox: "INBOX".into(),
            uid: 7,
            redirected_to: "a@b.com".into(),
            message_id: None,
        });
        assert_eq!(
            serde_json::to_value(record).unwrap(),
            json!({
                "mailbox": "INBOX",
                "uid": 7,
                "redirectedTo": "a@b.com",
                "messageId": null,
            })
        );
    }
}

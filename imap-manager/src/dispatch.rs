//! # Dispatch
//!
//! Module dedicated to operation dispatching: run one validated
//! [`Operation`] against an open [`Session`] and shape its result
//! records. Every operation but the mailbox listing runs with an
//! exclusive lock on its mailbox.

use tracing::{debug, info};

use crate::{
    client::{MailboxInfo, Uid},
    lock::with_mailbox_lock,
    operation::{Operation, OperationKind},
    record::{
        CopyRecord, DeleteRecord, EmptyMailboxesRecord, KeywordsRecord, MailboxRecord, MoveRecord,
        Record, SearchRecord,
    },
    redirect::{redirect_message, Redirect},
    session::Session,
    AnyBoxedError, Error, Result,
};

/// The header searched by the `searchByMessageId` operation.
pub const MESSAGE_ID_HEADER: &str = "Message-ID";

/// Run the given operation.
///
/// The redirect dependencies are only required by the redirect
/// operation.
pub async fn dispatch(
    session: &mut Session,
    operation: Operation,
    redirect: Option<&Redirect>,
) -> Result<Vec<Record>> {
    let kind = operation.kind();
    debug!("dispatching {kind} operation");

    let records = match operation {
        Operation::ListMailboxes { filter } => list_mailboxes(session, &filter).await?,
        Operation::SearchByMessageId {
            mailbox,
            message_id,
        } => {
            let lock = mailbox.clone();
            let record = with_mailbox_lock(session, &lock, move |session| {
                Box::pin(async move {
                    let mut uids = session
                        .client()
                        .search_header(MESSAGE_ID_HEADER, &message_id)
                        .await
                        .map_err(op_err(kind))?;
                    uids.sort_unstable();

                    Ok(SearchRecord {
                        mailbox,
                        message_id,
                        uids,
                    })
                })
            })
            .await?;

            vec![record.into()]
        }
        Operation::AddKeywords {
            mailbox,
            uid,
            keywords,
        }
        | Operation::RemoveKeywords {
            mailbox,
            uid,
            keywords,
        } => {
            let record = update_keywords(session, kind, mailbox, uid, keywords).await?;
            vec![record.into()]
        }
        Operation::Move {
            mailbox,
            uid,
            dest_mailbox,
        } => {
            let lock = mailbox.clone();
            let record = with_mailbox_lock(session, &lock, move |session| {
                Box::pin(async move {
                    let result = session
                        .client()
                        .move_message(uid, &dest_mailbox)
                        .await
                        .map_err(op_err(kind))?;

                    Ok(MoveRecord {
                        mailbox,
                        uid,
                        moved_to: dest_mailbox,
                        result,
                    })
                })
            })
            .await?;

            vec![record.into()]
        }
        Operation::Copy {
            mailbox,
            uid,
            dest_mailbox,
        } => {
            let lock = mailbox.clone();
            let record = with_mailbox_lock(session, &lock, move |session| {
                Box::pin(async move {
                    let result = session
                        .client()
                        .copy_message(uid, &dest_mailbox)
                        .await
                        .map_err(op_err(kind))?;

                    Ok(CopyRecord {
                        mailbox,
                        uid,
                        copied_to: dest_mailbox,
                        result,
                    })
                })
            })
            .await?;

            vec![record.into()]
        }
        Operation::Delete { mailbox, uid } => {
            let lock = mailbox.clone();
            let record = with_mailbox_lock(session, &lock, move |session| {
                Box::pin(async move {
                    session
                        .client()
                        .delete_message(uid)
                        .await
                        .map_err(op_err(kind))?;

                    Ok(DeleteRecord {
                        mailbox,
                        uid,
                        deleted: true,
                    })
                })
            })
            .await?;

            vec![record.into()]
        }
        Operation::Redirect {
            mailbox,
            uid,
            redirect_to,
            from_override,
        } => {
            let redirect = redirect.ok_or(Error::MissingSenderError)?;
            let record = redirect_message(
                session,
                redirect,
                &mailbox,
                uid,
                &redirect_to,
                from_override.as_deref(),
            )
            .await?;

            vec![record.into()]
        }
    };

    info!("{kind} operation produced {} record(s)", records.len());

    Ok(records)
}

async fn list_mailboxes(session: &mut Session, filter: &str) -> Result<Vec<Record>> {
    let mboxes: Vec<MailboxInfo> = session
        .client()
        .list_mailboxes()
        .await
        .map_err(op_err(OperationKind::ListMailboxes))?;

    let records: Vec<Record> = mboxes
        .into_iter()
        .filter(|mbox| mbox.matches(filter))
        .map(MailboxRecord::from)
        .map(Record::from)
        .collect();

    if records.is_empty() {
        debug!("no mailbox matching {filter:?}");
        return Ok(vec![EmptyMailboxesRecord::default().into()]);
    }

    Ok(records)
}

async fn update_keywords(
    session: &mut Session,
    kind: OperationKind,
    mailbox: String,
    uid: Uid,
    keywords: Vec<String>,
) -> Result<KeywordsRecord> {
    let lock = mailbox.clone();

    with_mailbox_lock(session, &lock, move |session| {
        Box::pin(async move {
            let client = session.client();

            let res = if let OperationKind::RemoveKeywords = kind {
                client.remove_flags(uid, &keywords).await
            } else {
                client.add_flags(uid, &keywords).await
            };
            res.map_err(op_err(kind))?;

            Ok(KeywordsRecord {
                mailbox,
                uid,
                operation: kind,
                keywords,
            })
        })
    })
    .await
}

fn op_err(kind: OperationKind) -> impl FnOnce(AnyBoxedError) -> Error {
    move |err| Error::ExecuteOperationError(err, kind)
}

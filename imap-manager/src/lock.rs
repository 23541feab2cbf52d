//! # Mailbox lock scope
//!
//! Run a piece of work with exclusive access to a mailbox. The lock is
//! released whatever the outcome of the work.

use futures::future::BoxFuture;

use crate::{session::Session, Result};

/// Lock the given mailbox, run `body` then release the lock.
///
/// The error of a failing lock is returned as is, and `body` is not
/// executed. The error of a failing `body` is returned after the lock
/// has been released.
///
/// ```rust,ignore
/// let uids = with_mailbox_lock(&mut session, "INBOX", |session| {
///     Box::pin(async move { search(session).await })
/// })
/// .await?;
/// ```
pub async fn with_mailbox_lock<T, F>(session: &mut Session, mailbox: &str, body: F) -> Result<T>
where
    F: for<'a> FnOnce(&'a mut Session) -> BoxFuture<'a, Result<T>>,
{
    let lock = session.lock_mailbox(mailbox).await?;
    let res = body(session).await;
    session.release_mailbox(lock);
    res
}

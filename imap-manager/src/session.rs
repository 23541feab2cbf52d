//! # Session
//!
//! Module dedicated to the IMAP session lifecycle. A [`Session`] is
//! opened for exactly one item then released, and it keeps track of
//! the mailbox it currently locks.

use tracing::{debug, info, instrument, warn};

use crate::{
    client::{MailClient, MailSession},
    imap::config::ImapConfig,
    Error, Result,
};

/// The exclusive access to a mailbox.
///
/// The lock can only be released by giving it back to the session
/// that acquired it, see [`Session::release_mailbox`].
#[derive(Debug, Eq, PartialEq)]
#[must_use = "a mailbox lock must be released"]
pub struct MailboxLock {
    mailbox: String,
}

impl MailboxLock {
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }
}

/// A live, authenticated IMAP session bound to one item.
pub struct Session {
    inner: Box<dyn MailSession>,
    locked: Option<String>,
}

impl Session {
    /// Open an authenticated session.
    #[instrument(skip_all, fields(host = %config.host, port = config.port))]
    pub async fn acquire(client: &dyn MailClient, config: &ImapConfig) -> Result<Self> {
        debug!("opening IMAP session as {}", config.login);

        let inner = client
            .connect(config)
            .await
            .map_err(|err| Error::OpenSessionError(err, config.host.clone(), config.port))?;

        info!("IMAP session opened");

        Ok(Self {
            inner,
            locked: None,
        })
    }

    /// Log out then drop the session.
    ///
    /// A lock still held is released first. Failures are logged and
    /// swallowed, so that they never mask the result of the
    /// operation.
    pub async fn release(mut self) {
        if let Some(mailbox) = self.locked.take() {
            warn!("mailbox {mailbox} still locked at logout, releasing it");
            self.inner.unlock_mailbox(&mailbox);
        }

        match self.inner.logout().await {
            Ok(()) => info!("IMAP session closed"),
            Err(err) => {
                warn!("cannot logout from IMAP session: {err}");
                debug!("{err:?}");
            }
        }
    }

    /// Acquire exclusive access to the given mailbox.
    ///
    /// Only one mailbox can be locked at a time.
    pub async fn lock_mailbox(&mut self, mailbox: &str) -> Result<MailboxLock> {
        if let Some(locked) = &self.locked {
            return Err(Error::MailboxAlreadyLockedError(
                mailbox.to_owned(),
                locked.clone(),
            ));
        }

        self.inner
            .lock_mailbox(mailbox)
            .await
            .map_err(|err| Error::LockMailboxError(err, mailbox.to_owned()))?;

        debug!("mailbox {mailbox} locked");
        self.locked = Some(mailbox.to_owned());

        Ok(MailboxLock {
            mailbox: mailbox.to_owned(),
        })
    }

    /// Release the given mailbox lock.
    pub fn release_mailbox(&mut self, lock: MailboxLock) {
        self.inner.unlock_mailbox(&lock.mailbox);

        if self.locked.as_deref() == Some(lock.mailbox.as_str()) {
            self.locked = None;
        }

        debug!("mailbox {} released", lock.mailbox);
    }

    /// Return the currently locked mailbox, if any.
    pub fn locked_mailbox(&self) -> Option<&str> {
        self.locked.as_deref()
    }

    /// Access the underlying client session.
    pub fn client(&mut self) -> &mut dyn MailSession {
        self.inner.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        client::{MailboxInfo, MessageTransfer, Uid},
        AnyBoxedError, AnyError, AnyResult, ErrorKind,
    };

    #[derive(Debug, thiserror::Error)]
    #[error("no such mailbox {0}")]
    struct NoSuchMailbox(String);

    impl AnyError for NoSuchMailbox {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[derive(Default)]
    struct Events(Arc<Mutex<Vec<String>>>);

    struct FakeSession(Arc<Mutex<Vec<String>>>);

    impl FakeSession {
        fn push(&self, event: impl ToString) {
            self.0.lock().unwrap().push(event.to_string());
        }
    }

    #[async_trait]
    impl MailSession for FakeSession {
        async fn list_mailboxes(&mut self) -> AnyResult<Vec<MailboxInfo>> {
            Ok(vec![])
        }

        async fn lock_mailbox(&mut self, mailbox: &str) -> AnyResult<()> {
            if mailbox == "Missing" {
                let err: AnyBoxedError = Box::new(NoSuchMailbox(mailbox.to_owned()));
                return Err(err);
            }
            self.push(format!("lock {mailbox}"));
            Ok(())
        }

        fn unlock_mailbox(&mut self, mailbox: &str) {
            self.push(format!("unlock {mailbox}"));
        }

        async fn search_header(&mut self, _: &str, _: &str) -> AnyResult<Vec<Uid>> {
            Ok(vec![])
        }

        async fn add_flags(&mut self, _: Uid, _: &[String]) -> AnyResult<()> {
            Ok(())
        }

        async fn remove_flags(&mut self, _: Uid, _: &[String]) -> AnyResult<()> {
            Ok(())
        }

        async fn move_message(&mut self, _: Uid, _: &str) -> AnyResult<MessageTransfer> {
            Ok(MessageTransfer::default())
        }

        async fn copy_message(&mut self, _: Uid, _: &str) -> AnyResult<MessageTransfer> {
            Ok(MessageTransfer::default())
        }

        async fn delete_message(&mut self, _: Uid) -> AnyResult<()> {
            Ok(())
        }

        async fn fetch_raw_message(&mut self, _: Uid) -> AnyResult<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn logout(&mut self) -> AnyResult<()> {
            self.push("logout");
            Err(Box::new(NoSuchMailbox("logout".into())))
        }
    }

    #[async_trait]
    impl MailClient for Events {
        async fn connect(&self, _: &ImapConfig) -> AnyResult<Box<dyn MailSession>> {
            Ok(Box::new(FakeSession(self.0.clone())))
        }
    }

    #[test_log::test(tokio::test)]
    async fn one_lock_at_a_time() {
        let client = Events::default();
        let mut session = Session::acquire(&client, &ImapConfig::default())
            .await
            .unwrap();

        let lock = session.lock_mailbox("INBOX").await.unwrap();
        assert_eq!(session.locked_mailbox(), Some("INBOX"));

        let err = session.lock_mailbox("Archive").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mailbox);

        session.release_mailbox(lock);
        assert_eq!(session.locked_mailbox(), None);

        let lock = session.lock_mailbox("Archive").await.unwrap();
        assert_eq!(lock.mailbox(), "Archive");
        session.release_mailbox(lock);

        let err = session.lock_mailbox("Missing").await.unwrap_err();
        assert!(matches!(err, Error::LockMailboxError(_, ref mbox) if mbox == "Missing"));
        assert_eq!(session.locked_mailbox(), None);

        session.release().await;

        assert_eq!(
            *client.0.lock().unwrap(),
            vec![
                "lock INBOX",
                "unlock INBOX",
                "lock Archive",
                "unlock Archive",
                "logout"
            ]
        );
    }

    #[test_log::test(tokio::test)]
    async fn release_unlocks_pending_lock() {
        let client = Events::default();
        let mut session = Session::acquire(&client, &ImapConfig::default())
            .await
            .unwrap();

        let lock = session.lock_mailbox("INBOX").await.unwrap();
        std::mem::forget(lock);
        session.release().await;

        assert_eq!(
            *client.0.lock().unwrap(),
            vec!["lock INBOX", "unlock INBOX", "logout"]
        );
    }
}

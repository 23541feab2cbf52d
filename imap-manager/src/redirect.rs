//! # Redirect
//!
//! Module dedicated to the redirect operation: the raw message is
//! fetched from the locked mailbox, then resent unmodified over a
//! dedicated SMTP connection. Only the envelope changes.

use std::{fmt, sync::Arc};

use tracing::{debug, info, warn};

use crate::{
    client::Uid,
    credentials::CredentialStore,
    lock::with_mailbox_lock,
    record::RedirectRecord,
    sender::{Envelope, MailSender},
    session::Session,
    smtp::config::SmtpConfig,
    Error, Result,
};

/// The resolved dependencies of a redirect.
#[derive(Clone)]
pub struct Redirect {
    sender: Arc<dyn MailSender>,
    config: SmtpConfig,
}

impl Redirect {
    pub fn new(sender: Arc<dyn MailSender>, config: SmtpConfig) -> Self {
        Self { sender, config }
    }

    /// Resolve the sender and its SMTP credentials.
    pub async fn resolve(
        sender: Option<&Arc<dyn MailSender>>,
        credentials: &dyn CredentialStore,
    ) -> Result<Self> {
        let sender = sender.cloned().ok_or(Error::MissingSenderError)?;

        let config = credentials
            .smtp_credentials()
            .await
            .map_err(Error::ResolveSmtpCredentialsError)?
            .ok_or(Error::MissingSmtpCredentialsError)?;

        Ok(Self::new(sender, config))
    }

    /// Build the envelope of the redirected message.
    ///
    /// The envelope sender is the override if any, otherwise the
    /// default sender of the SMTP credentials, otherwise the null
    /// sender.
    pub fn envelope(&self, redirect_to: &str, from_override: Option<&str>) -> Envelope {
        let from = from_override
            .map(str::trim)
            .filter(|from| !from.is_empty())
            .or_else(|| self.config.sender())
            .map(ToOwned::to_owned);

        Envelope {
            from,
            to: vec![redirect_to.to_owned()],
        }
    }

    /// Send the raw message using the given envelope.
    ///
    /// The SMTP connection is closed whatever the outcome. A failing
    /// close is logged and swallowed.
    pub async fn send(&self, uid: Uid, envelope: &Envelope, raw: &[u8]) -> Result<Option<String>> {
        let host = &self.config.host;
        let port = self.config.port;

        debug!("connecting to SMTP server {host}:{port}");
        let mut session = self
            .sender
            .connect(&self.config)
            .await
            .map_err(|err| Error::ConnectSmtpError(err, host.clone(), port))?;

        let res = session.send_raw_message(envelope, raw).await;

        if let Err(err) = session.quit().await {
            warn!("cannot quit SMTP session: {err}");
            debug!("{err:?}");
        }

        res.map_err(|err| Error::SendRawMessageError(err, uid, envelope.to.join(", ")))
    }
}

impl fmt::Debug for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Redirect")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Fetch the raw message from the locked mailbox, then resend it.
///
/// The mailbox lock is released before the SMTP connection opens.
pub async fn redirect_message(
    session: &mut Session,
    redirect: &Redirect,
    mailbox: &str,
    uid: Uid,
    redirect_to: &str,
    from_override: Option<&str>,
) -> Result<RedirectRecord> {
    let owned_mailbox = mailbox.to_owned();
    let raw = with_mailbox_lock(session, mailbox, move |session| {
        Box::pin(async move {
            let mailbox = owned_mailbox;
            session
                .client()
                .fetch_raw_message(uid)
                .await
                .map_err(|err| Error::FetchRawMessageError(err, uid, mailbox.clone()))?
                .ok_or(Error::RawMessageNotFoundError(uid, mailbox))
        })
    })
    .await?;

    debug!("fetched raw message {uid} ({} bytes)", raw.len());

    let envelope = redirect.envelope(redirect_to, from_override);
    let message_id = redirect.send(uid, &envelope, &raw).await?;

    info!("message {uid} from {mailbox} redirected to {redirect_to}");

    Ok(RedirectRecord {
        mailbox: mailbox.to_owned(),
        uid,
        redirected_to: redirect_to.to_owned(),
        message_id,
    })
}

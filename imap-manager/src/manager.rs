//! # Manager
//!
//! Module dedicated to the per-item orchestration. The
//! [`ImapManager`] processes items strictly one after the other: for
//! each item, the account guard runs first, then the operation is
//! parsed and validated, then a fresh session is opened, the
//! operation is dispatched and the session is released.

use std::{fmt, sync::Arc};

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::{
    client::MailClient,
    config::Features,
    context::{ExecutionContext, Parameters},
    credentials::CredentialStore,
    dispatch::dispatch,
    guard::AccountGuard,
    operation::{Operation, OperationKind},
    output::{OutputRouter, Outputs},
    record::Record,
    redirect::Redirect,
    sender::MailSender,
    session::Session,
    Error, Result,
};

/// The IMAP manager.
#[derive(Clone)]
pub struct ImapManager {
    client: Arc<dyn MailClient>,
    sender: Option<Arc<dyn MailSender>>,
    features: Features,
}

impl ImapManager {
    pub fn new(client: Arc<dyn MailClient>) -> Self {
        Self {
            client,
            sender: None,
            features: Features::default(),
        }
    }

    pub fn with_sender(mut self, sender: Arc<dyn MailSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Process the given items, reading their parameters from the
    /// items themselves then from the given defaults.
    pub async fn run(
        &self,
        items: &[Value],
        defaults: Map<String, Value>,
        credentials: &dyn CredentialStore,
    ) -> Result<Outputs> {
        let params = Parameters::new(items).with_defaults(defaults);
        self.execute(items.len(), &params, credentials).await
    }

    /// Process `count` items using the given execution context.
    ///
    /// Account guard failures are routed to the error output when the
    /// manager has one. Any other failure aborts the run.
    pub async fn execute(
        &self,
        count: usize,
        ctx: &dyn ExecutionContext,
        credentials: &dyn CredentialStore,
    ) -> Result<Outputs> {
        info!("processing {count} item(s)");

        let mut router = OutputRouter::new(self.features.error_output);

        for index in 0..count {
            if self.features.account_guard {
                let guard =
                    AccountGuard::from_context(ctx, index).map_err(|err| ctx.fail(err, index))?;

                if let Err(err) = guard.check(credentials).await {
                    router.route_guard_failure(err, index)?;
                    continue;
                }
            }

            let records = self.process(index, ctx, credentials).await?;
            router.extend(records);
        }

        Ok(router.finish())
    }

    #[instrument(skip(self, ctx, credentials))]
    async fn process(
        &self,
        index: usize,
        ctx: &dyn ExecutionContext,
        credentials: &dyn CredentialStore,
    ) -> Result<Vec<Record>> {
        let operation = Operation::from_context(ctx, index, &self.features)
            .map_err(|err| ctx.fail(err, index))?;

        match operation.mailbox() {
            Some(mailbox) => info!("running {} operation on {mailbox}", operation.kind()),
            None => info!("running {} operation", operation.kind()),
        }

        let redirect = match operation.kind() {
            OperationKind::Redirect => {
                Some(Redirect::resolve(self.sender.as_ref(), credentials).await?)
            }
            _ => None,
        };

        let config = credentials
            .imap_credentials()
            .await
            .map_err(Error::ResolveImapCredentialsError)?;

        let mut session = Session::acquire(self.client.as_ref(), &config).await?;
        let res = dispatch(&mut session, operation, redirect.as_ref()).await;
        session.release().await;

        if let Err(err) = &res {
            debug!("item {index} failed: {err}");
        }

        res
    }
}

#[cfg(feature = "imap")]
impl ImapManager {
    /// Build a manager using the IMAP client, and the SMTP sender
    /// when the `smtp` cargo feature is enabled.
    pub fn from_features(features: Features) -> Self {
        let manager = Self::new(Arc::new(crate::imap::ImapClient::new())).with_features(features);

        #[cfg(feature = "smtp")]
        let manager = manager.with_sender(Arc::new(crate::smtp::SmtpSender::new()));

        manager
    }
}

impl fmt::Debug for ImapManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapManager")
            .field("features", &self.features)
            .field("sender", &self.sender.is_some())
            .finish_non_exhaustive()
    }
}

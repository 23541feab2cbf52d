//! # Account guard
//!
//! Module dedicated to the account guard: an optional check, run
//! before any session is opened, that the account an item belongs to
//! matches the identity of the IMAP credentials.

use thiserror::Error;
use tracing::debug;

use crate::{
    context::ExecutionContext, credentials::CredentialStore, operation, record::GuardRecord,
};

/// The errors of the account guard.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum GuardError {
    #[error("cannot match account {account} with credential user {credential_user}")]
    CredentialMismatchError {
        account: String,
        credential_user: String,
    },
    #[error("cannot find credentials for account {account}")]
    CredentialNotFoundError { account: String },
}

impl GuardError {
    /// Return the error code exposed in error records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CredentialMismatchError { .. } => "credential_mismatch",
            Self::CredentialNotFoundError { .. } => "credential_not_found",
        }
    }

    /// Build the error record of the item at the given index.
    pub fn to_record(&self, index: usize) -> GuardRecord {
        match self {
            Self::CredentialMismatchError {
                account,
                credential_user,
            } => GuardRecord {
                error: self.code().to_owned(),
                account: account.clone(),
                credential_user: Some(credential_user.clone()),
                item_index: index,
            },
            Self::CredentialNotFoundError { account } => GuardRecord {
                error: self.code().to_owned(),
                account: account.clone(),
                credential_user: None,
                item_index: index,
            },
        }
    }
}

/// The account guard of an item.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccountGuard {
    /// Whether the guard is enforced.
    pub enforce: bool,

    /// The account identifier supplied upstream, possibly empty.
    pub account: String,
}

impl AccountGuard {
    pub fn new(enforce: bool, account: impl ToString) -> Self {
        Self {
            enforce,
            account: account.to_string(),
        }
    }

    /// Read the guard parameters of the item at the given index.
    pub fn from_context(ctx: &dyn ExecutionContext, index: usize) -> operation::Result<Self> {
        let enforce = ctx.bool("enforceAccountMatch", index)?;
        let account = ctx.string("accountField", index)?;
        Ok(Self::new(enforce, account))
    }

    /// Return `true` if the guard needs to check the credentials.
    pub fn is_active(&self) -> bool {
        self.enforce && !self.account.is_empty()
    }

    /// Check the account against the IMAP credentials.
    ///
    /// Only fails when both the account and the credential user are
    /// defined and differ, case insensitively.
    pub async fn check(&self, credentials: &dyn CredentialStore) -> Result<(), GuardError> {
        if !self.is_active() {
            return Ok(());
        }

        let config = match credentials.imap_credentials().await {
            Ok(config) => config,
            Err(err) => {
                debug!("cannot resolve credentials for account guard: {err}");
                debug!("{err:?}");
                return Err(GuardError::CredentialNotFoundError {
                    account: self.account.clone(),
                });
            }
        };

        let user = &config.login;

        if !user.is_empty() && user.to_lowercase() != self.account.to_lowercase() {
            return Err(GuardError::CredentialMismatchError {
                account: self.account.clone(),
                credential_user: user.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        context::Parameters, credentials::StaticCredentials, imap::config::ImapConfig,
    };

    fn credentials(login: &str) -> StaticCredentials {
        StaticCredentials::new(ImapConfig {
            login: login.into(),
            ..Default::default()
        })
    }

    #[test_log::test(tokio::test)]
    async fn inactive() {
        let creds = StaticCredentials::default();

        assert!(AccountGuard::new(false, "bob").check(&creds).await.is_ok());
        assert!(AccountGuard::new(true, "").check(&creds).await.is_ok());
    }

    #[test_log::test(tokio::test)]
    async fn whitespace_is_significant() {
        let creds = credentials("alice@example.com");

        let err = AccountGuard::new(true, "   ").check(&creds).await.unwrap_err();
        assert_eq!(
            err,
            GuardError::CredentialMismatchError {
                account: "   ".into(),
                credential_user: "alice@example.com".into(),
            }
        );

        let err = AccountGuard::new(true, " alice@example.com ")
            .check(&creds)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "credential_mismatch");
    }

    #[test_log::test(tokio::test)]
    async fn case_insensitive_match() {
        let guard = AccountGuard::new(true, "Alice@Example.com");
        assert_eq!(guard.check(&credentials("alice@example.com")).await, Ok(()));
    }

    #[test_log::test(tokio::test)]
    async fn empty_credential_user_passes() {
        let guard = AccountGuard::new(true, "alice@example.com");
        assert_eq!(guard.check(&credentials("")).await, Ok(()));
    }

    #[test_log::test(tokio::test)]
    async fn mismatch() {
        let guard = AccountGuard::new(true, "bob@example.com");
        let err = guard
            .check(&credentials("alice@example.com"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "credential_mismatch");

        let record = serde_json::to_value(err.to_record(3)).unwrap();
        assert_eq!(
            record,
            json!({
                "error": "credential_mismatch",
                "account": "bob@example.com",
                "credentialUser": "alice@example.com",
                "itemIndex": 3,
            })
        );
    }

    #[test_log::test(tokio::test)]
    async fn not_found() {
        let guard = AccountGuard::new(true, "bob@example.com");
        let err = guard
            .check(&StaticCredentials::default())
            .await
            .unwrap_err();

        let record = serde_json::to_value(err.to_record(0)).unwrap();
        assert_eq!(
            record,
            json!({
                "error": "credential_not_found",
                "account": "bob@example.com",
                "itemIndex": 0,
            })
        );
    }

    #[test]
    fn from_context() {
        let items = [json!({ "enforceAccountMatch": true, "accountField": " bob " })];
        let guard = AccountGuard::from_context(&Parameters::new(&items), 0).unwrap();

        assert_eq!(guard.account, " bob ");
        assert!(guard.is_active());

        let guard = AccountGuard::from_context(&Parameters::new(&[]), 0).unwrap();
        assert!(!guard.is_active());
    }
}

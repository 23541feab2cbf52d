//! # Output
//!
//! Module dedicated to output routing. Result records go to the main
//! output. Account guard failures go to the error output when the
//! manager has one, otherwise they abort the run.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::{
    guard::GuardError,
    record::{GuardRecord, Record},
    Error, Result,
};

/// The outputs of a run.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Outputs {
    /// The result records, in item order.
    pub main: Vec<Record>,

    /// The account guard failures, in item order. Always empty for
    /// single output managers.
    pub error: Vec<GuardRecord>,
}

impl Outputs {
    /// Serialize both outputs into JSON arrays.
    pub fn to_json(&self) -> serde_json::Result<(Value, Value)> {
        Ok((
            serde_json::to_value(&self.main)?,
            serde_json::to_value(&self.error)?,
        ))
    }
}

/// The output router of a run.
#[derive(Debug, Default)]
pub struct OutputRouter {
    error_output: bool,
    outputs: Outputs,
}

impl OutputRouter {
    pub fn new(error_output: bool) -> Self {
        Self {
            error_output,
            outputs: Outputs::default(),
        }
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) {
        self.outputs.main.extend(records);
    }

    /// Route the guard failure of the item at the given index.
    ///
    /// Without error output, the failure is returned as an error.
    pub fn route_guard_failure(&mut self, err: GuardError, index: usize) -> Result<()> {
        if !self.error_output {
            return Err(Error::GuardError(err, index));
        }

        warn!("item {index} routed to error output: {err}");
        self.outputs.error.push(err.to_record(index));
        Ok(())
    }

    pub fn finish(self) -> Outputs {
        self.outputs
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{record::DeleteRecord, ErrorKind};

    fn mismatch() -> GuardError {
        GuardError::CredentialMismatchError {
            account: "bob".into(),
            credential_user: "alice".into(),
        }
    }

    #[test]
    fn dual_output() {
        let mut router = OutputRouter::new(true);

        router.extend([Record::from(DeleteRecord {
            mailbox: "INBOX".into(),
            uid: 1,
            deleted: true,
        })]);
        router.route_guard_failure(mismatch(), 1).unwrap();

        let (main, error) = router.finish().to_json().unwrap();

        assert_eq!(
            main,
            json!([{ "mailbox": "INBOX", "uid": 1, "deleted": true }])
        );
        assert_eq!(
            error,
            json!([{
                "error": "credential_mismatch",
                "account": "bob",
                "credentialUser": "alice",
                "itemIndex": 1,
            }])
        );
    }

    #[test]
    fn single_output() {
        let mut router = OutputRouter::new(false);
        let err = router.route_guard_failure(mismatch(), 4).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Guard);
        assert_eq!(err.item_index(), Some(4));
        assert!(router.finish().error.is_empty());
    }
}

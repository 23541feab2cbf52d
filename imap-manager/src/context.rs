//! # Execution context
//!
//! The narrow interface between the manager and the host running it:
//! read a named parameter for an item, and fail with a structured
//! error. [`Parameters`] is the bundled implementation, reading
//! parameters from the JSON items themselves.

use serde_json::{Map, Value};

use crate::{
    client::Uid,
    operation::{self, Error},
};

/// The execution context of a run.
pub trait ExecutionContext: Send + Sync {
    /// Read the parameter with the given name for the item at the
    /// given index.
    ///
    /// Returns `None` when the parameter is not defined.
    fn parameter(&self, name: &str, index: usize) -> Option<Value>;

    /// Build the error reported when the item at the given index
    /// cannot be processed.
    fn fail(&self, err: operation::Error, index: usize) -> crate::Error {
        crate::Error::ValidationError(err, index)
    }

    /// Read a string parameter, empty when not defined.
    ///
    /// Numbers and booleans are accepted and converted.
    fn string(&self, name: &str, index: usize) -> operation::Result<String> {
        match self.parameter(name, index) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(value)) => Ok(value),
            Some(Value::Number(value)) => Ok(value.to_string()),
            Some(Value::Bool(value)) => Ok(value.to_string()),
            Some(_) => Err(Error::InvalidParameterError(name.to_owned(), "a string")),
        }
    }

    /// Read a boolean parameter, `false` when not defined.
    fn bool(&self, name: &str, index: usize) -> operation::Result<bool> {
        match self.parameter(name, index) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(value)) => Ok(value),
            Some(Value::String(value)) => match value.trim() {
                "" | "false" => Ok(false),
                "true" => Ok(true),
                _ => Err(Error::InvalidParameterError(name.to_owned(), "a boolean")),
            },
            Some(_) => Err(Error::InvalidParameterError(name.to_owned(), "a boolean")),
        }
    }

    /// Read a UID parameter, `0` when not defined.
    ///
    /// UIDs are accepted as numbers or numeric strings.
    fn uid(&self, name: &str, index: usize) -> operation::Result<Uid> {
        match self.parameter(name, index) {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Number(value)) => value
                .as_u64()
                .and_then(|uid| Uid::try_from(uid).ok())
                .ok_or_else(|| Error::InvalidUidError(value.to_string())),
            Some(Value::String(value)) => match value.trim() {
                "" => Ok(0),
                uid => uid
                    .parse()
                    .map_err(|_| Error::InvalidUidError(uid.to_owned())),
            },
            Some(value) => Err(Error::InvalidUidError(value.to_string())),
        }
    }
}

/// The parameters of a run.
///
/// A parameter is resolved from the item's own fields first, then
/// from the node-level defaults, then from the built-in defaults. A
/// `null` value counts as undefined.
#[derive(Clone, Debug)]
pub struct Parameters<'a> {
    items: &'a [Value],
    defaults: Map<String, Value>,
}

impl<'a> Parameters<'a> {
    pub fn new(items: &'a [Value]) -> Self {
        Self {
            items,
            defaults: Map::new(),
        }
    }

    pub fn with_defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Return the built-in default value of the given parameter.
    pub fn builtin_default(name: &str) -> Option<Value> {
        match name {
            "operation" => Some(Value::from("searchByMessageId")),
            "mailbox" => Some(Value::from("INBOX")),
            "destMailbox" => Some(Value::from("Archive")),
            "uid" => Some(Value::from(0)),
            "enforceAccountMatch" => Some(Value::from(false)),
            "keywords" | "messageId" | "mailboxFilter" | "accountField" | "redirectTo"
            | "fromOverride" => Some(Value::from("")),
            _ => None,
        }
    }
}

impl ExecutionContext for Parameters<'_> {
    fn parameter(&self, name: &str, index: usize) -> Option<Value> {
        let defined = |value: &&Value| !value.is_null();

        self.items
            .get(index)
            .and_then(|item| item.get(name))
            .filter(defined)
            .or_else(|| self.defaults.get(name).filter(defined))
            .cloned()
            .or_else(|| Self::builtin_default(name))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn resolution_order() {
        let items = [
            json!({ "mailbox": "Sales", "uid": null }),
            json!({ "uid": 5 }),
        ];
        let mut defaults = Map::new();
        defaults.insert("uid".into(), json!(9));
        defaults.insert("mailbox".into(), json!(null));

        let params = Parameters::new(&items).with_defaults(defaults);

        assert_eq!(params.parameter("mailbox", 0), Some(json!("Sales")));
        assert_eq!(params.parameter("mailbox", 1), Some(json!("INBOX")));
        assert_eq!(params.parameter("uid", 0), Some(json!(9)));
        assert_eq!(params.parameter("uid", 1), Some(json!(5)));
        assert_eq!(params.parameter("unknown", 0), None);
        assert_eq!(params.parameter("destMailbox", 7), Some(json!("Archive")));
    }

    #[test]
    fn typed_parameters() {
        let items = [json!({
            "enforce": "true",
            "uid": "42",
            "big": 4294967296u64,
            "frac": 1.5,
            "list": [],
            "num": 12,
        })];
        let params = Parameters::new(&items);

        assert_eq!(params.bool("enforce", 0), Ok(true));
        assert_eq!(params.bool("enforceAccountMatch", 0), Ok(false));
        assert_eq!(params.uid("uid", 0), Ok(42));
        assert_eq!(
            params.uid("big", 0),
            Err(Error::InvalidUidError("4294967296".into()))
        );
        assert_eq!(params.uid("frac", 0), Err(Error::InvalidUidError("1.5".into())));
        assert_eq!(params.string("num", 0), Ok("12".into()));
        assert_eq!(
            params.string("list", 0),
            Err(Error::InvalidParameterError("list".into(), "a string"))
        );
        assert_eq!(params.string("keywords", 0), Ok(String::new()));
    }

    #[test]
    fn fail_builds_validation_error() {
        let params = Parameters::new(&[]);
        let err = params.fail(Error::MissingUidError, 2);

        assert_eq!(err.kind(), crate::ErrorKind::Validation);
        assert_eq!(err.item_index(), Some(2));
    }
}

//! The call dispatcher.
//!
//! Routes `{model, method, args}` calls, as they arrive over a process boundary, to the
//! registry and folds every failure into an error envelope instead of propagating it.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use crate::{
    error::{DbError, ErrorKind},
    registry::DbClient,
};

/// One dispatched call.
#[derive(Debug, Clone, Deserialize)]
pub struct DbCall {
    pub model: String,
    pub method: String,
    #[serde(default)]
    pub args: JsonValue,
}

impl DbCall {
    pub fn new(model: impl Into<String>, method: impl Into<String>, args: JsonValue) -> Self {
        Self {
            model: model.into(),
            method: method.into(),
            args,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    FindFirst,
    FindMany,
    Create,
    Update,
    UpdateMany,
    UpdateAll,
    Upsert,
    Delete,
    DeleteMany,
    DeleteAll,
    Count,
}

impl Method {
    pub const ALL: [Method; 11] = [
        Method::FindFirst,
        Method::FindMany,
        Method::Create,
        Method::Update,
        Method::UpdateMany,
        Method::UpdateAll,
        Method::Upsert,
        Method::Delete,
        Method::DeleteMany,
        Method::DeleteAll,
        Method::Count,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FindFirst => "findFirst",
            Self::FindMany => "findMany",
            Self::Create => "create",
            Self::Update => "update",
            Self::UpdateMany => "updateMany",
            Self::UpdateAll => "updateAll",
            Self::Upsert => "upsert",
            Self::Delete => "delete",
            Self::DeleteMany => "deleteMany",
            Self::DeleteAll => "deleteAll",
            Self::Count => "count",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or(())
    }
}

/// The options object of a call: the first element of a list, or the value itself.
pub(crate) fn first_argument(args: JsonValue) -> JsonValue {
    match args {
        JsonValue::Array(items) => items.into_iter().next().unwrap_or(JsonValue::Null),
        other => other,
    }
}

/// What a failed call returns across the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn to_json(&self) -> JsonValue {
        json!({
            "isError": true,
            "kind": self.kind,
            "message": self.message,
        })
    }
}

impl From<&DbError> for ErrorEnvelope {
    fn from(err: &DbError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Runs `call` and returns either its JSON result or the error envelope.
pub async fn handle(client: &DbClient, call: DbCall) -> JsonValue {
    let model = call.model.clone();
    let method = call.method.clone();
    match client.call(call).await {
        Ok(result) => result,
        Err(err) => {
            debug!(%model, %method, kind = %err.kind(), error = %err, "db call failed");
            ErrorEnvelope::from(&err).to_json()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tally_events::NullSink;

    use super::*;
    use crate::connection::Database;

    fn client() -> DbClient {
        DbClient::new(Database::open_in_memory(Arc::new(NullSink)).unwrap())
    }

    #[test]
    fn test_method_names_round_trip() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>(), Ok(method));
        }
        assert!("explode".parse::<Method>().is_err());
        assert!("FindMany".parse::<Method>().is_err());
    }

    #[test]
    fn test_first_argument() {
        assert_eq!(
            first_argument(json!([{ "take": 1 }, { "take": 2 }])),
            json!({ "take": 1 })
        );
        assert_eq!(first_argument(json!({ "take": 1 })), json!({ "take": 1 }));
        assert_eq!(first_argument(json!([])), JsonValue::Null);
        assert_eq!(first_argument(JsonValue::Null), JsonValue::Null);
    }

    #[test]
    fn test_envelope_json() {
        let err = DbError::UnknownModel("ghosts".into());
        assert_eq!(
            ErrorEnvelope::from(&err).to_json(),
            json!({
                "isError": true,
                "kind": "DispatchError",
                "message": "dbClient model not found: ghosts",
            })
        );
    }

    #[test]
    fn test_call_decoding() {
        let call: DbCall =
            serde_json::from_value(json!({ "model": "users", "method": "count" })).unwrap();
        assert_eq!(call.args, JsonValue::Null);
    }

    #[tokio::test]
    async fn test_handle_round_trip() {
        let client = client();
        let created = handle(
            &client,
            DbCall::new(
                "users",
                "create",
                json!([{ "data": { "id": "u1", "name": "Ada", "email": "ada@x.com" } }]),
            ),
        )
        .await;
        assert_eq!(created["role"], json!("USER"));

        let found = handle(
            &client,
            DbCall::new(
                "users",
                "findMany",
                json!([{ "where": { "role": { "in": ["USER"] } }, "select": { "email": true } }]),
            ),
        )
        .await;
        assert_eq!(found, json!([{ "email": "ada@x.com" }]));

        let count = handle(&client, DbCall::new("users", "count", JsonValue::Null)).await;
        assert_eq!(count, json!(1));

        let missing = handle(
            &client,
            DbCall::new("users", "findFirst", json!({ "where": { "id": "ghost" } })),
        )
        .await;
        assert_eq!(missing, JsonValue::Null);
    }

    #[tokio::test]
    async fn test_handle_folds_errors_into_envelopes() {
        let client = client();

        let unknown = handle(&client, DbCall::new("ghosts", "findMany", JsonValue::Null)).await;
        assert_eq!(unknown["isError"], json!(true));
        assert_eq!(unknown["kind"], json!("DispatchError"));

        let schema = handle(
            &client,
            DbCall::new("users", "findMany", json!({ "where": { "nickname": "x" } })),
        )
        .await;
        assert_eq!(schema["kind"], json!("SchemaError"));

        let validation = handle(
            &client,
            DbCall::new("users", "update", json!({ "where": { "id": "u1" }, "data": {} })),
        )
        .await;
        assert_eq!(validation["kind"], json!("ValidationError"));

        let malformed = handle(
            &client,
            DbCall::new("users", "findMany", json!({ "orderBy": { "id": "sideways" } })),
        )
        .await;
        assert_eq!(malformed["kind"], json!("ValidationError"));

        let storage = handle(
            &client,
            DbCall::new("users", "create", json!({ "data": { "name": "No email" } })),
        )
        .await;
        assert_eq!(storage["kind"], json!("StorageError"));
    }
}

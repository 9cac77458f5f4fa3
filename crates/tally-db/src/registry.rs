//! The client registry: one typed model client per table.

use serde_json::Value as JsonValue;
use tracing::trace;

use crate::{
    client::{ModelClient, TableClient},
    connection::Database,
    dispatch::{DbCall, Method},
    error::{DbError, Result},
    schema::{find_table, invoice_templates::InvoiceTemplates, printers::Printers, users::Users},
};

#[derive(Debug, Clone)]
pub struct DbClient {
    pub users: ModelClient<Users>,
    pub printers: ModelClient<Printers>,
    pub invoice_templates: ModelClient<InvoiceTemplates>,
    db: Database,
}

impl DbClient {
    pub fn new(db: Database) -> Self {
        Self {
            users: ModelClient::new(db.clone()),
            printers: ModelClient::new(db.clone()),
            invoice_templates: ModelClient::new(db.clone()),
            db,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Resolves a client by table name (`invoice_templates`) or model name
    /// (`invoiceTemplates`).
    pub fn model(&self, name: &str) -> Option<&TableClient> {
        match find_table(name)?.name {
            "users" => Some(self.users.raw()),
            "printers" => Some(self.printers.raw()),
            "invoice_templates" => Some(self.invoice_templates.raw()),
            _ => None,
        }
    }

    /// Routes a string-addressed call.
    pub async fn call(&self, call: DbCall) -> Result<JsonValue> {
        let client = self
            .model(&call.model)
            .ok_or_else(|| DbError::UnknownModel(call.model.clone()))?;
        let method: Method = call.method.parse().map_err(|_| DbError::UnknownMethod {
            model: call.model.clone(),
            method: call.method.clone(),
        })?;

        trace!(model = %call.model, %method, "dispatching");
        client.dispatch(method, call.args).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tally_events::NullSink;

    use super::*;

    fn client() -> DbClient {
        DbClient::new(Database::open_in_memory(Arc::new(NullSink)).unwrap())
    }

    #[test]
    fn test_model_lookup() {
        let client = client();
        assert_eq!(client.model("users").unwrap().descriptor().name, "users");
        assert_eq!(
            client.model("invoiceTemplates").unwrap().descriptor().name,
            "invoice_templates"
        );
        assert_eq!(
            client.model("invoice_templates").unwrap().descriptor().name,
            "invoice_templates"
        );
        assert!(client.model("ghosts").is_none());
    }

    #[tokio::test]
    async fn test_unknown_model_and_method() {
        let client = client();
        let err = client
            .call(DbCall::new("ghosts", "findMany", JsonValue::Null))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UnknownModel(ref model) if model == "ghosts"));

        let err = client
            .call(DbCall::new("users", "explode", JsonValue::Null))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "dbClient model or method not found: users.explode");
    }
}

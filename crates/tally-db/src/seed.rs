//! Sample data.

use serde_json::Value as JsonValue;
use tracing::info;

use crate::{
    error::{DbError, Result},
    query::Data,
    registry::DbClient,
    schema::{invoice_templates, printers, users},
};

const COUNT: usize = 10;

/// Rows written by [`seed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub printers: usize,
    pub templates: usize,
}

/// Inserts ten users, ten printers and ten invoice templates.
///
/// The first user is an `ADMIN` and the first printer is the default. Printers and
/// templates are assigned to users in rotation.
pub async fn seed(client: &DbClient) -> Result<SeedSummary> {
    let mut user_ids = Vec::with_capacity(COUNT);
    for i in 1..=COUNT {
        let role = if i == 1 { "ADMIN" } else { "USER" };
        let user = client
            .users
            .create(
                Data::new()
                    .set(users::NAME, format!("User {i}"))
                    .set(users::EMAIL, format!("user{i}@example.com"))
                    .set(users::ROLE, role),
            )
            .await?;
        let id = user
            .get(users::ID.name)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| DbError::Validation("created user has no id".into()))?;
        user_ids.push(id.to_string());
    }

    for i in 1..=COUNT {
        client
            .printers
            .create(
                Data::new()
                    .set(printers::NAME, format!("Printer {i}"))
                    .set(printers::IS_DEFAULT, i == 1)
                    .set(printers::USER_ID, user_ids[(i - 1) % user_ids.len()].clone()),
            )
            .await?;
    }

    for i in 1..=COUNT {
        client
            .invoice_templates
            .create(
                Data::new()
                    .set(invoice_templates::NAME, format!("Template {i}"))
                    .set(
                        invoice_templates::CONTENT,
                        format!("<h1>Invoice Template {i}</h1><p>Content for template {i}</p>"),
                    )
                    .set(
                        invoice_templates::USER_ID,
                        user_ids[(i - 1) % user_ids.len()].clone(),
                    ),
            )
            .await?;
    }

    let summary = SeedSummary {
        users: COUNT,
        printers: COUNT,
        templates: COUNT,
    };
    info!(?summary, "seeded database");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tally_events::NullSink;

    use super::*;
    use crate::{connection::Database, query::FindOptions};

    #[tokio::test]
    async fn test_seed() {
        let client = DbClient::new(Database::open_in_memory(Arc::new(NullSink)).unwrap());
        let summary = seed(&client).await.unwrap();
        assert_eq!(summary.users, 10);

        assert_eq!(client.users.count(None).await.unwrap(), 10);
        assert_eq!(client.printers.count(None).await.unwrap(), 10);
        assert_eq!(client.invoice_templates.count(None).await.unwrap(), 10);

        let admins = client
            .users
            .find_many(FindOptions::new().filter(users::ROLE.eq("ADMIN")))
            .await
            .unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0]["email"], json!("user1@example.com"));

        let defaults = client
            .printers
            .count(Some(printers::IS_DEFAULT.eq(true)))
            .await
            .unwrap();
        assert_eq!(defaults, 1);

        // Every printer belongs to a seeded user.
        let owned = client
            .printers
            .find_many(
                FindOptions::new()
                    .select(&[printers::NAME])
                    .include(printers::OWNER, FindOptions::new().select(&[users::ID])),
            )
            .await
            .unwrap();
        assert_eq!(owned.len(), 10);
        assert!(owned.iter().all(|row| row["owner_id"].is_string()));
    }

    #[tokio::test]
    async fn test_seed_twice_fails_on_unique_email() {
        let client = DbClient::new(Database::open_in_memory(Arc::new(NullSink)).unwrap());
        seed(&client).await.unwrap();
        let err = seed(&client).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::StorageError);
    }
}

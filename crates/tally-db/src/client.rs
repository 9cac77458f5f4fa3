//! Model clients.
//!
//! [`TableClient`] implements every operation once, over a runtime
//! [`TableDescriptor`] and string-keyed arguments. [`ModelClient<T>`] is the typed
//! facade generated for each table marker; it only converts its typed arguments and
//! delegates.
//!
//! Every operation compiles its statement on the calling task, so schema and
//! validation errors surface before the connection is touched, then runs it on the
//! blocking pool.

use std::marker::PhantomData;

use rusqlite::TransactionBehavior;
use serde_json::Value as JsonValue;
use tally_config::BulkMutation;
use tally_events::{DbEvent, MutationKind};
use tracing::{debug, trace};

use crate::{
    connection::Database,
    dispatch::{first_argument, Method},
    error::{DbError, Result},
    expr::Filter,
    query::{
        args::{
            CreateArgs, DeleteArgs, FilterArgs, FindArgs, UpdateAllArgs, UpdateArgs,
            UpdateManyArgs, UpsertArgs, WhereCondition,
        },
        clause::compile_where,
        include::IncludeResolver,
        mutation,
        options::{Data, FindOptions},
        order::Window,
        plan::{QueryPlan, Statement},
    },
    schema::{Table, TableDescriptor},
    value::Row,
};

/// Operations over one table, addressed at runtime.
#[derive(Debug, Clone)]
pub struct TableClient {
    db: Database,
    table: &'static TableDescriptor,
}

fn first_row(rows: Vec<Row>) -> Result<Row> {
    rows.into_iter()
        .next()
        .ok_or(DbError::Storage(rusqlite::Error::QueryReturnedNoRows))
}

impl TableClient {
    pub fn new(db: Database, table: &'static TableDescriptor) -> Self {
        Self {
            db,
            table,
        }
    }

    pub fn descriptor(&self) -> &'static TableDescriptor {
        self.table
    }

    fn plan(&self, args: &FindArgs) -> Result<QueryPlan> {
        let mut resolver = IncludeResolver::new(self.table, self.db.events().as_ref());
        QueryPlan::build(self.table, args, &mut resolver)
    }

    async fn query(&self, stmt: Statement) -> Result<Vec<Row>> {
        self.db.run(move |conn| Ok(stmt.query(conn)?)).await
    }

    async fn execute(&self, stmt: Statement) -> Result<usize> {
        self.db.run(move |conn| Ok(stmt.execute(conn)?)).await
    }

    /// Reports a bulk mutation without a `where` condition, or refuses it under
    /// [`BulkMutation::Deny`].
    fn check_bulk(&self, condition: Option<&WhereCondition>, operation: MutationKind) -> Result<()> {
        if condition.is_some() {
            return Ok(());
        }

        if self.db.bulk_mutation() == BulkMutation::Deny {
            let explicit = match operation {
                MutationKind::UpdateMany => "updateAll",
                MutationKind::DeleteMany => "deleteAll",
            };
            return Err(DbError::Validation(format!(
                "{operation} called without where on table {}; use {explicit} to touch every row",
                self.table.name
            )));
        }

        debug!(table = self.table.name, %operation, "bulk mutation without where");
        self.db.events().emit(DbEvent::UnboundedMutation {
            table: self.table.name.to_string(),
            operation,
        });
        Ok(())
    }

    /// The first matching row, after ordering and `skip`.
    pub async fn find_first(&self, args: FindArgs) -> Result<Option<Row>> {
        let mut plan = self.plan(&args)?;
        plan.window = Window::new(Some(1), args.skip);
        let rows = self.query(plan.into_statement()).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn find_many(&self, args: FindArgs) -> Result<Vec<Row>> {
        let plan = self.plan(&args)?;
        self.query(plan.into_statement()).await
    }

    /// Inserts one row and returns it as stored, defaults included.
    pub async fn create(&self, data: Row) -> Result<Row> {
        let stmt = mutation::insert(self.table, &data)?;
        first_row(self.query(stmt).await?)
    }

    /// Updates every matching row and returns one of them.
    ///
    /// Which row comes back when several match is unspecified.
    pub async fn update(&self, condition: WhereCondition, data: Row) -> Result<Option<Row>> {
        let stmt = mutation::update(self.table, Some(&condition), &data, true)?;
        let rows = self.query(stmt).await?;
        if rows.len() > 1 {
            trace!(table = self.table.name, matched = rows.len(), "update matched several rows");
        }
        Ok(rows.into_iter().next())
    }

    pub async fn update_many(&self, condition: Option<WhereCondition>, data: Row) -> Result<usize> {
        let stmt = mutation::update(self.table, condition.as_ref(), &data, false)?;
        self.check_bulk(condition.as_ref(), MutationKind::UpdateMany)?;
        self.execute(stmt).await
    }

    /// Updates every row of the table.
    pub async fn update_all(&self, data: Row) -> Result<usize> {
        let stmt = mutation::update(self.table, None, &data, false)?;
        self.execute(stmt).await
    }

    /// Updates the rows matching `condition`, or inserts `create` when there are none.
    ///
    /// The lookup and the write run in one immediate transaction. An empty `update`
    /// returns the existing row unchanged. A `where` that constrains nothing, such as
    /// `{}` or `{"name": {}}`, is refused.
    pub async fn upsert(
        &self,
        condition: Option<WhereCondition>,
        update: Row,
        create: Row,
    ) -> Result<Row> {
        let missing_where = || DbError::Validation("Upsert requires a valid 'where' condition".into());
        let condition = condition.ok_or_else(missing_where)?;
        if compile_where(Some(&condition), self.table, None)?.terms.is_empty() {
            return Err(missing_where());
        }

        let lookup = mutation::first_match(self.table, Some(&condition))?;
        let update = if update.is_empty() {
            None
        } else {
            Some(mutation::update(self.table, Some(&condition), &update, true)?)
        };
        let insert = mutation::insert(self.table, &create)?;

        self.db
            .run(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let existing = lookup.query(&tx)?.into_iter().next();
                let row = match (existing, update) {
                    (Some(row), None) => row,
                    (Some(_), Some(update)) => first_row(update.query(&tx)?)?,
                    (None, _) => first_row(insert.query(&tx)?)?,
                };
                tx.commit()?;
                Ok(row)
            })
            .await
    }

    /// Deletes every matching row and returns one of them.
    ///
    /// Which row comes back when several match is unspecified.
    pub async fn delete(&self, condition: WhereCondition) -> Result<Option<Row>> {
        let stmt = mutation::delete(self.table, Some(&condition), true)?;
        let rows = self.query(stmt).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn delete_many(&self, condition: Option<WhereCondition>) -> Result<usize> {
        let stmt = mutation::delete(self.table, condition.as_ref(), false)?;
        self.check_bulk(condition.as_ref(), MutationKind::DeleteMany)?;
        self.execute(stmt).await
    }

    /// Deletes every row of the table.
    pub async fn delete_all(&self) -> Result<usize> {
        let stmt = mutation::delete(self.table, None, false)?;
        self.execute(stmt).await
    }

    pub async fn count(&self, condition: Option<WhereCondition>) -> Result<u64> {
        let stmt = mutation::count(self.table, condition.as_ref())?;
        let count = self.db.run(move |conn| Ok(stmt.scalar(conn)?)).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Runs `method` with JSON arguments and returns a JSON result.
    ///
    /// `args` may be the options object itself or a list whose first element is.
    pub async fn dispatch(&self, method: Method, args: JsonValue) -> Result<JsonValue> {
        let args = first_argument(args);
        let result = match method {
            Method::FindFirst => {
                let args: FindArgs = decode_or_default(args)?;
                self.find_first(args).await?.map(JsonValue::Object).unwrap_or(JsonValue::Null)
            }
            Method::FindMany => {
                let args: FindArgs = decode_or_default(args)?;
                JsonValue::Array(
                    self.find_many(args)
                        .await?
                        .into_iter()
                        .map(JsonValue::Object)
                        .collect(),
                )
            }
            Method::Create => {
                let args: CreateArgs = serde_json::from_value(args)?;
                JsonValue::Object(self.create(args.data).await?)
            }
            Method::Update => {
                let args: UpdateArgs = serde_json::from_value(args)?;
                self.update(args.where_, args.data)
                    .await?
                    .map(JsonValue::Object)
                    .unwrap_or(JsonValue::Null)
            }
            Method::UpdateMany => {
                let args: UpdateManyArgs = serde_json::from_value(args)?;
                JsonValue::from(self.update_many(args.where_, args.data).await?)
            }
            Method::UpdateAll => {
                let args: UpdateAllArgs = serde_json::from_value(args)?;
                JsonValue::from(self.update_all(args.data).await?)
            }
            Method::Upsert => {
                let args: UpsertArgs = serde_json::from_value(args)?;
                JsonValue::Object(self.upsert(args.where_, args.update, args.create).await?)
            }
            Method::Delete => {
                let args: DeleteArgs = serde_json::from_value(args)?;
                self.delete(args.where_)
                    .await?
                    .map(JsonValue::Object)
                    .unwrap_or(JsonValue::Null)
            }
            Method::DeleteMany => {
                let args: FilterArgs = decode_or_default(args)?;
                JsonValue::from(self.delete_many(args.where_).await?)
            }
            Method::DeleteAll => JsonValue::from(self.delete_all().await?),
            Method::Count => {
                let args: FilterArgs = decode_or_default(args)?;
                JsonValue::from(self.count(args.where_).await?)
            }
        };
        Ok(result)
    }
}

/// Decodes optional arguments; a missing options object means the defaults.
fn decode_or_default<A>(args: JsonValue) -> Result<A>
where
    A: serde::de::DeserializeOwned + Default,
{
    if args.is_null() {
        return Ok(A::default());
    }
    Ok(serde_json::from_value(args)?)
}

/// The typed facade for table `T`.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use tally_db::{
///     client::ModelClient,
///     connection::Database,
///     query::{Data, FindOptions},
///     schema::users::{self, Users},
/// };
/// use tally_events::NullSink;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let db = Database::open_in_memory(Arc::new(NullSink)).unwrap();
/// let users = ModelClient::<Users>::new(db);
///
/// users
///     .create(Data::new().set(users::NAME, "Ada").set(users::EMAIL, "ada@example.com"))
///     .await
///     .unwrap();
/// let ada = users
///     .find_first(FindOptions::new().filter(users::EMAIL.eq("ada@example.com")))
///     .await
///     .unwrap();
/// assert!(ada.is_some());
/// # });
/// ```
pub struct ModelClient<T> {
    inner: TableClient,
    _table: PhantomData<fn() -> T>,
}

impl<T> Clone for ModelClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _table: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for ModelClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ModelClient").field(&self.inner.table.name).finish()
    }
}

impl<T: Table> ModelClient<T> {
    pub fn new(db: Database) -> Self {
        Self {
            inner: TableClient::new(db, T::descriptor()),
            _table: PhantomData,
        }
    }

    /// The untyped client underneath, as used by the dispatcher.
    pub fn raw(&self) -> &TableClient {
        &self.inner
    }

    pub async fn find_first(&self, options: FindOptions<T>) -> Result<Option<Row>> {
        self.inner.find_first(options.into_args()).await
    }

    pub async fn find_many(&self, options: FindOptions<T>) -> Result<Vec<Row>> {
        self.inner.find_many(options.into_args()).await
    }

    pub async fn create(&self, data: Data<T>) -> Result<Row> {
        self.inner.create(data.into_row()).await
    }

    pub async fn update(&self, filter: Filter<T>, data: Data<T>) -> Result<Option<Row>> {
        self.inner.update(filter.into_where(), data.into_row()).await
    }

    pub async fn update_many(&self, filter: Option<Filter<T>>, data: Data<T>) -> Result<usize> {
        self.inner
            .update_many(filter.map(Filter::into_where), data.into_row())
            .await
    }

    pub async fn update_all(&self, data: Data<T>) -> Result<usize> {
        self.inner.update_all(data.into_row()).await
    }

    pub async fn upsert(&self, filter: Filter<T>, update: Data<T>, create: Data<T>) -> Result<Row> {
        self.inner
            .upsert(Some(filter.into_where()), update.into_row(), create.into_row())
            .await
    }

    pub async fn delete(&self, filter: Filter<T>) -> Result<Option<Row>> {
        self.inner.delete(filter.into_where()).await
    }

    pub async fn delete_many(&self, filter: Option<Filter<T>>) -> Result<usize> {
        self.inner.delete_many(filter.map(Filter::into_where)).await
    }

    pub async fn delete_all(&self) -> Result<usize> {
        self.inner.delete_all().await
    }

    pub async fn count(&self, filter: Option<Filter<T>>) -> Result<u64> {
        self.inner.count(filter.map(Filter::into_where)).await
    }
}

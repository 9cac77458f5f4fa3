//! Query plans and executable statements.
//!
//! A [`QueryPlan`] is built per find call from the compiled predicate, projection,
//! ordering and includes, rendered once into a [`Statement`], and dropped.

use rusqlite::{types::Value, Connection, ToSql};
use tracing::trace;

use crate::{
    error::{DbError, Result},
    expr::ColumnRef,
    query::{
        args::FindArgs,
        clause::{compile_where, Predicate},
        include::IncludeResolver,
        order::{compile_order, Window},
        select::compile_select,
    },
    schema::{quote_ident, ColumnDef, ColumnType, RelationDef, TableDescriptor},
    value::{from_sql_value, Row},
};

/// A result column: its output name and the declared type of the column it comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutputColumn {
    pub name: String,
    pub ty: ColumnType,
}

impl OutputColumn {
    pub fn of(col: &ColumnDef) -> Self {
        Self {
            name: col.name.to_string(),
            ty: col.ty,
        }
    }

    fn prefixed(&self, prefix: &str) -> Self {
        Self {
            name: format!("{}_{}", prefix, self.name),
            ty: self.ty,
        }
    }
}

/// A derived relation joined into a plan.
#[derive(Debug)]
pub(crate) struct Join {
    pub relation: &'static RelationDef,
    pub plan: QueryPlan,
}

#[derive(Debug)]
pub(crate) struct QueryPlan {
    pub table: &'static TableDescriptor,
    /// Columns of `table` surfaced in the result.
    pub projection: Vec<&'static ColumnDef>,
    /// Columns fetched only so an enclosing join can reference them.
    pub hidden: Vec<&'static ColumnDef>,
    pub joins: Vec<Join>,
    pub predicate: Predicate,
    pub order: Vec<String>,
    pub window: Window,
}

impl QueryPlan {
    /// Compiles `args` against `table`. Includes are expanded through `resolver`.
    pub fn build(
        table: &'static TableDescriptor,
        args: &FindArgs,
        resolver: &mut IncludeResolver<'_>,
    ) -> Result<Self> {
        let qualifier = Some(table.name);
        let predicate = compile_where(args.where_.as_ref(), table, qualifier)?;
        let order = compile_order(args.order_by.as_ref(), table, qualifier)?;
        let projection = compile_select(args.select.as_ref(), table);
        let joins = resolver.resolve(table, args.include.as_ref())?;

        Ok(Self {
            table,
            projection,
            hidden: Vec::new(),
            joins,
            predicate,
            order,
            window: Window::new(args.take, args.skip),
        })
    }

    /// Makes sure `column` is fetched, even when the projection leaves it out.
    pub fn expose(&mut self, column: &str) -> Result<()> {
        let in_plan = self
            .projection
            .iter()
            .chain(self.hidden.iter())
            .any(|col| col.name == column);
        if !in_plan {
            let col = self
                .table
                .column(column)
                .ok_or_else(|| DbError::unknown_column(self.table.name, column))?;
            self.hidden.push(col);
        }
        Ok(())
    }

    /// Result columns, in select-list order. Hidden columns are not part of the result.
    pub fn output_columns(&self) -> Vec<OutputColumn> {
        let mut columns: Vec<_> = self.projection.iter().map(|col| OutputColumn::of(col)).collect();
        for join in &self.joins {
            columns.extend(
                join.plan
                    .output_columns()
                    .iter()
                    .map(|col| col.prefixed(join.relation.name)),
            );
        }
        columns
    }

    fn render(&self, params: &mut Vec<Value>) -> String {
        let table = self.table.name;
        let own = |col: &&ColumnDef| {
            format!(
                "{} AS {}",
                ColumnRef::new(Some(table), col.name).sql(),
                quote_ident(col.name)
            )
        };

        let mut select: Vec<String> = self.projection.iter().map(own).collect();
        for join in &self.joins {
            let alias = join.relation.name;
            for col in join.plan.output_columns() {
                select.push(format!(
                    "{} AS {}",
                    ColumnRef::new(Some(alias), &col.name).sql(),
                    quote_ident(&col.prefixed(alias).name)
                ));
            }
        }
        select.extend(self.hidden.iter().map(own));

        let mut sql = format!("SELECT {} FROM {}", select.join(", "), quote_ident(table));

        for join in &self.joins {
            let alias = join.relation.name;
            let subquery = join.plan.render(params);
            sql.push_str(&format!(
                " LEFT JOIN ({}) AS {} ON {} = {}",
                subquery,
                quote_ident(alias),
                ColumnRef::new(Some(table), join.relation.local_field).sql(),
                ColumnRef::new(Some(alias), join.relation.referenced_field).sql()
            ));
        }

        sql.push_str(&self.predicate.sql());
        params.extend(self.predicate.params.iter().cloned());

        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order.join(", "));
        }

        sql.push_str(&self.window.sql());
        sql
    }

    pub fn into_statement(self) -> Statement {
        let mut params = Vec::new();
        let sql = self.render(&mut params);
        Statement {
            sql,
            params,
            columns: self.output_columns(),
        }
    }
}

/// Rendered SQL, its bound parameters, and the shape of the rows it returns.
#[derive(Debug, Clone)]
pub(crate) struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
    pub columns: Vec<OutputColumn>,
}

impl Statement {
    /// Runs a row-returning statement.
    pub fn query(&self, conn: &Connection) -> rusqlite::Result<Vec<Row>> {
        trace!(sql = %self.sql, params = self.params.len(), "query");
        let mut stmt = conn.prepare(&self.sql)?;

        let params_ref: Vec<&dyn ToSql> = self.params.iter().map(|v| v as &dyn ToSql).collect();
        let rows = stmt.query_map(params_ref.as_slice(), |row| {
            let mut out = Row::new();
            for (idx, col) in self.columns.iter().enumerate() {
                out.insert(col.name.clone(), from_sql_value(row.get_ref(idx)?, col.ty));
            }
            Ok(out)
        })?;
        rows.collect()
    }

    /// Runs a statement and returns the number of affected rows.
    pub fn execute(&self, conn: &Connection) -> rusqlite::Result<usize> {
        trace!(sql = %self.sql, params = self.params.len(), "execute");
        let params_ref: Vec<&dyn ToSql> = self.params.iter().map(|v| v as &dyn ToSql).collect();
        conn.execute(&self.sql, params_ref.as_slice())
    }

    /// Runs a statement returning a single integer.
    pub fn scalar(&self, conn: &Connection) -> rusqlite::Result<i64> {
        trace!(sql = %self.sql, params = self.params.len(), "scalar");
        let mut stmt = conn.prepare(&self.sql)?;

        let params_ref: Vec<&dyn ToSql> = self.params.iter().map(|v| v as &dyn ToSql).collect();
        stmt.query_row(params_ref.as_slice(), |row| row.get(0))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tally_events::NullSink;

    use super::*;
    use crate::schema::{invoice_templates, users, Table};

    fn plan(table: &'static TableDescriptor, args: serde_json::Value) -> QueryPlan {
        let args: FindArgs = serde_json::from_value(args).unwrap();
        let mut resolver = IncludeResolver::new(table, &NullSink);
        QueryPlan::build(table, &args, &mut resolver).unwrap()
    }

    #[test]
    fn test_render_plain_select() {
        let stmt = plan(
            users::Users::descriptor(),
            json!({
                "select": { "id": true, "role": true },
                "where": { "role": "ADMIN" },
                "orderBy": { "name": "desc" },
                "take": 2,
                "skip": 1
            }),
        )
        .into_statement();

        assert_eq!(
            stmt.sql,
            "SELECT \"users\".\"id\" AS \"id\", \"users\".\"role\" AS \"role\" FROM \"users\" \
             WHERE \"users\".\"role\" = ? ORDER BY \"users\".\"name\" DESC LIMIT 2 OFFSET 1"
        );
        assert_eq!(stmt.params, vec![Value::Text("ADMIN".into())]);
        let names: Vec<_> = stmt.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "role"]);
    }

    #[test]
    fn test_render_join_with_hidden_reference() {
        let stmt = plan(
            users::Users::descriptor(),
            json!({
                "select": { "name": true },
                "where": { "role": "USER" },
                "include": {
                    "printers": { "select": { "name": true }, "where": { "isDefault": true } }
                }
            }),
        )
        .into_statement();

        assert_eq!(
            stmt.sql,
            "SELECT \"users\".\"name\" AS \"name\", \"printers\".\"name\" AS \"printers_name\" \
             FROM \"users\" LEFT JOIN (SELECT \"printers\".\"name\" AS \"name\", \
             \"printers\".\"userId\" AS \"userId\" FROM \"printers\" \
             WHERE \"printers\".\"isDefault\" = ?) AS \"printers\" \
             ON \"users\".\"id\" = \"printers\".\"userId\" WHERE \"users\".\"role\" = ?"
        );
        assert_eq!(
            stmt.params,
            vec![Value::Integer(1), Value::Text("USER".into())]
        );
        let names: Vec<_> = stmt.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["name", "printers_name"]);
    }

    #[test]
    fn test_nested_prefix_compounds() {
        let stmt = plan(
            invoice_templates::InvoiceTemplates::descriptor(),
            json!({
                "select": { "name": true },
                "include": {
                    "author": {
                        "select": { "email": true },
                        "include": { "printers": { "select": { "name": true } } }
                    }
                }
            }),
        )
        .into_statement();

        let names: Vec<_> = stmt.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["name", "author_email", "author_printers_name"]);
        assert!(stmt
            .sql
            .contains("\"author\".\"printers_name\" AS \"author_printers_name\""));
    }

    #[test]
    fn test_boolean_type_survives_prefixing() {
        let stmt = plan(
            users::Users::descriptor(),
            json!({ "select": { "id": true }, "include": { "printers": true } }),
        )
        .into_statement();
        let is_default = stmt
            .columns
            .iter()
            .find(|c| c.name == "printers_isDefault")
            .unwrap();
        assert_eq!(is_default.ty, ColumnType::Boolean);
    }
}

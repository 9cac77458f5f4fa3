//! INSERT, UPDATE, DELETE and COUNT statements.

use rusqlite::types::Value;
use uuid::Uuid;

use crate::{
    error::{DbError, Result},
    query::{
        args::WhereCondition,
        clause::compile_where,
        plan::{OutputColumn, Statement},
    },
    schema::{quote_ident, ColumnDef, DefaultRule, TableDescriptor},
    value::{to_sql_value, Row},
};

fn returning(table: &TableDescriptor) -> (String, Vec<OutputColumn>) {
    let names = table
        .columns
        .iter()
        .map(|col| quote_ident(col.name))
        .collect::<Vec<_>>()
        .join(", ");
    let columns = table.columns.iter().map(OutputColumn::of).collect();
    (format!(" RETURNING {}", names), columns)
}

/// Validates payload keys and converts the values, in payload order.
fn assignments(table: &TableDescriptor, data: &Row) -> Result<Vec<(&'static ColumnDef, Value)>> {
    data.iter()
        .map(|(key, value)| {
            let col = table
                .column(key)
                .ok_or_else(|| DbError::unknown_column(table.name, key))?;
            Ok((col, to_sql_value(col.name, value)?))
        })
        .collect()
}

/// `INSERT ... RETURNING` every column.
///
/// Columns with a [`DefaultRule::Uuid`] default that the payload leaves out get a fresh
/// v4 UUID.
pub(crate) fn insert(table: &TableDescriptor, data: &Row) -> Result<Statement> {
    let mut values = assignments(table, data)?;
    for col in table.columns {
        if col.default == DefaultRule::Uuid && !data.contains_key(col.name) {
            values.push((col, Value::Text(Uuid::new_v4().to_string())));
        }
    }

    let (returning, columns) = returning(table);
    let sql = if values.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES{}", quote_ident(table.name), returning)
    } else {
        let names = values
            .iter()
            .map(|(col, _)| quote_ident(col.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; values.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({}){}",
            quote_ident(table.name),
            names,
            placeholders,
            returning
        )
    };

    Ok(Statement {
        sql,
        params: values.into_iter().map(|(_, value)| value).collect(),
        columns,
    })
}

/// `UPDATE ... SET`. With `returning`, every column of every updated row comes back.
pub(crate) fn update(
    table: &TableDescriptor,
    condition: Option<&WhereCondition>,
    data: &Row,
    returning_rows: bool,
) -> Result<Statement> {
    if data.is_empty() {
        return Err(DbError::Validation(format!(
            "Update on `{}` requires at least one field in `data`",
            table.name
        )));
    }

    let values = assignments(table, data)?;
    let predicate = compile_where(condition, table, None)?;

    let sets = values
        .iter()
        .map(|(col, _)| format!("{} = ?", quote_ident(col.name)))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!("UPDATE {} SET {}{}", quote_ident(table.name), sets, predicate.sql());

    let mut params: Vec<Value> = values.into_iter().map(|(_, value)| value).collect();
    params.extend(predicate.params);

    let mut columns = Vec::new();
    if returning_rows {
        let (clause, cols) = returning(table);
        sql.push_str(&clause);
        columns = cols;
    }

    Ok(Statement {
        sql,
        params,
        columns,
    })
}

/// `DELETE FROM`. With `returning`, every column of every deleted row comes back.
pub(crate) fn delete(
    table: &TableDescriptor,
    condition: Option<&WhereCondition>,
    returning_rows: bool,
) -> Result<Statement> {
    let predicate = compile_where(condition, table, None)?;
    let mut sql = format!("DELETE FROM {}{}", quote_ident(table.name), predicate.sql());

    let mut columns = Vec::new();
    if returning_rows {
        let (clause, cols) = returning(table);
        sql.push_str(&clause);
        columns = cols;
    }

    Ok(Statement {
        sql,
        params: predicate.params,
        columns,
    })
}

pub(crate) fn count(table: &TableDescriptor, condition: Option<&WhereCondition>) -> Result<Statement> {
    let predicate = compile_where(condition, table, None)?;
    Ok(Statement {
        sql: format!("SELECT COUNT(*) FROM {}{}", quote_ident(table.name), predicate.sql()),
        params: predicate.params,
        columns: Vec::new(),
    })
}

/// The first row matching `condition`, every column.
pub(crate) fn first_match(table: &TableDescriptor, condition: Option<&WhereCondition>) -> Result<Statement> {
    let predicate = compile_where(condition, table, None)?;
    let names = table
        .columns
        .iter()
        .map(|col| quote_ident(col.name))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(Statement {
        sql: format!(
            "SELECT {} FROM {}{} LIMIT 1",
            names,
            quote_ident(table.name),
            predicate.sql()
        ),
        params: predicate.params,
        columns: table.columns.iter().map(OutputColumn::of).collect(),
    })
}

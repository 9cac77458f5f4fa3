//! Predicate compiler: where conditions → conjunctive SQL condition.

use rusqlite::types::Value;
use serde_json::Value as JsonValue;

use crate::{
    error::{DbError, Result},
    expr::ColumnRef,
    query::args::{Condition, OperatorSet, WhereCondition},
    schema::TableDescriptor,
    traits::Expression,
    value::to_sql_value,
};

/// A compiled `WHERE` clause: AND-ed terms and their bound parameters, in placeholder
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Predicate {
    pub terms: Vec<String>,
    pub params: Vec<Value>,
}

impl Predicate {
    /// The ` WHERE ...` suffix, or nothing when every row matches.
    pub fn sql(&self) -> String {
        if self.terms.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.terms.join(" AND "))
        }
    }
}

/// Compiles `condition` against `table`.
///
/// Columns are qualified with `qualifier` when given. Every key must name a column of
/// `table`; the first unknown one is reported before anything else is compiled.
pub(crate) fn compile_where(
    condition: Option<&WhereCondition>,
    table: &TableDescriptor,
    qualifier: Option<&str>,
) -> Result<Predicate> {
    let mut predicate = Predicate::default();
    let Some(condition) = condition else {
        return Ok(predicate);
    };

    for (column, _) in condition.iter() {
        if table.column(column).is_none() {
            return Err(DbError::unknown_column(table.name, column));
        }
    }

    for (column, condition) in condition.iter() {
        let col = ColumnRef::new(qualifier, column);
        match condition {
            Condition::Equals(value) => push_eq(&mut predicate, col, column, value)?,
            Condition::Operators(set) => push_operators(&mut predicate, col, column, set)?,
        }
    }

    Ok(predicate)
}

fn push(predicate: &mut Predicate, expr: impl Expression) {
    let sql = expr.to_sql(&mut predicate.params);
    predicate.terms.push(sql);
}

fn push_eq(
    predicate: &mut Predicate,
    col: ColumnRef<'_>,
    column: &str,
    value: &JsonValue,
) -> Result<()> {
    if value.is_null() {
        push(predicate, col.null());
    } else {
        push(predicate, col.eq(to_sql_value(column, value)?));
    }
    Ok(())
}

/// Operators are emitted in a fixed order regardless of how the caller wrote them.
fn push_operators(
    predicate: &mut Predicate,
    col: ColumnRef<'_>,
    column: &str,
    set: &OperatorSet,
) -> Result<()> {
    if let Some(value) = &set.eq {
        push_eq(predicate, col, column, value)?;
    }
    if let Some(value) = &set.ne {
        if value.is_null() {
            push(predicate, col.not_null());
        } else {
            push(predicate, col.ne(to_sql_value(column, value)?));
        }
    }
    if let Some(value) = &set.gt {
        push(predicate, col.gt(to_sql_value(column, value)?));
    }
    if let Some(value) = &set.gte {
        push(predicate, col.gte(to_sql_value(column, value)?));
    }
    if let Some(value) = &set.lt {
        push(predicate, col.lt(to_sql_value(column, value)?));
    }
    if let Some(value) = &set.lte {
        push(predicate, col.lte(to_sql_value(column, value)?));
    }
    if let Some(values) = &set.in_ {
        let values = values
            .iter()
            .map(|value| to_sql_value(column, value))
            .collect::<Result<Vec<_>>>()?;
        push(predicate, col.in_(values));
    }
    Ok(())
}

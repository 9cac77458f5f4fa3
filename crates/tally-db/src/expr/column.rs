//! Typed column and relation handles.
//!
//! `Col<T>` ties a column name to the table marker `T`, so a filter built from one
//! table's columns cannot be handed to another table's client. `Rel<T, R>` does the same
//! for a relation from `T` to `R`.

use std::marker::PhantomData;

use rusqlite::types::Value;
use serde_json::Value as JsonValue;

use crate::{
    query::args::{Condition, OperatorSet, WhereCondition},
    schema::quote_ident,
    traits::Expression,
};

/// A typed reference to a column of table `T`.
///
/// # Example
///
/// ```rust
/// use tally_db::schema::users;
///
/// let admins = users::ROLE.eq("ADMIN");
/// ```
pub struct Col<T> {
    pub name: &'static str,
    _table: PhantomData<fn() -> T>,
}

impl<T> Clone for Col<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Col<T> {}

impl<T> std::fmt::Debug for Col<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Col").field(&self.name).finish()
    }
}

impl<T> Col<T> {
    /// Creates a new column reference.
    ///
    /// # Parameters
    ///
    /// - `name`: the actual column name in the database (e.g., `"userId"`)
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _table: PhantomData,
        }
    }

    fn op(self, set: OperatorSet) -> Filter<T> {
        Filter::single(self.name, Condition::Operators(set))
    }

    /// Implicit equality. `null` matches rows where the column is NULL.
    pub fn eq(self, value: impl Into<JsonValue>) -> Filter<T> {
        Filter::single(self.name, Condition::Equals(value.into()))
    }

    pub fn ne(self, value: impl Into<JsonValue>) -> Filter<T> {
        self.op(OperatorSet {
            ne: Some(value.into()),
            ..Default::default()
        })
    }

    pub fn gt(self, value: impl Into<JsonValue>) -> Filter<T> {
        self.op(OperatorSet {
            gt: Some(value.into()),
            ..Default::default()
        })
    }

    pub fn gte(self, value: impl Into<JsonValue>) -> Filter<T> {
        self.op(OperatorSet {
            gte: Some(value.into()),
            ..Default::default()
        })
    }

    pub fn lt(self, value: impl Into<JsonValue>) -> Filter<T> {
        self.op(OperatorSet {
            lt: Some(value.into()),
            ..Default::default()
        })
    }

    pub fn lte(self, value: impl Into<JsonValue>) -> Filter<T> {
        self.op(OperatorSet {
            lte: Some(value.into()),
            ..Default::default()
        })
    }

    /// Membership test. An empty list matches nothing.
    pub fn in_<V, I>(self, values: I) -> Filter<T>
    where
        V: Into<JsonValue>,
        I: IntoIterator<Item = V>,
    {
        self.op(OperatorSet {
            in_: Some(values.into_iter().map(Into::into).collect()),
            ..Default::default()
        })
    }

    pub fn is_null(self) -> Filter<T> {
        self.eq(JsonValue::Null)
    }

    pub fn is_not_null(self) -> Filter<T> {
        self.ne(JsonValue::Null)
    }
}

/// A conjunction of column conditions on table `T`.
pub struct Filter<T> {
    terms: Vec<(&'static str, Condition)>,
    _table: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Filter").field(&self.terms).finish()
    }
}

impl<T> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Self {
            terms: self.terms.clone(),
            _table: PhantomData,
        }
    }
}

impl<T> Filter<T> {
    fn single(column: &'static str, condition: Condition) -> Self {
        Self {
            terms: vec![(column, condition)],
            _table: PhantomData,
        }
    }

    /// Combines two filters with `AND`.
    pub fn and(mut self, other: Filter<T>) -> Self {
        self.terms.extend(other.terms);
        self
    }

    pub(crate) fn into_where(self) -> WhereCondition {
        WhereCondition::from_terms(
            self.terms
                .into_iter()
                .map(|(column, condition)| (column.to_string(), condition)),
        )
    }
}

/// A typed reference to the relation `name`, leading from table `T` to table `R`.
pub struct Rel<T, R> {
    pub name: &'static str,
    _tables: PhantomData<fn() -> (T, R)>,
}

impl<T, R> Clone for Rel<T, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, R> Copy for Rel<T, R> {}

impl<T, R> std::fmt::Debug for Rel<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Rel").field(&self.name).finish()
    }
}

impl<T, R> Rel<T, R> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _tables: PhantomData,
        }
    }
}

/// A column as it appears in generated SQL, optionally qualified by a table or
/// derived-relation alias.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRef<'a> {
    qualifier: Option<&'a str>,
    name: &'a str,
}

impl<'a> ColumnRef<'a> {
    pub fn new(qualifier: Option<&'a str>, name: &'a str) -> Self {
        Self {
            qualifier,
            name,
        }
    }

    pub fn sql(&self) -> String {
        match self.qualifier {
            Some(qualifier) => format!("{}.{}", quote_ident(qualifier), quote_ident(self.name)),
            None => quote_ident(self.name),
        }
    }
}

impl Expression for ColumnRef<'_> {
    fn to_sql(&self, _params: &mut Vec<Value>) -> String {
        self.sql()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::{printers, users};

    #[test]
    fn test_filter_terms_keep_order() {
        let filter = users::ROLE
            .eq("ADMIN")
            .and(users::CREATED_AT.gte(100))
            .and(users::ROLE.ne("GUEST"));
        let condition = filter.into_where();
        let keys: Vec<_> = condition.iter().map(|(column, _)| column.as_str()).collect();
        assert_eq!(keys, ["role", "createdAt", "role"]);
    }

    #[test]
    fn test_in_collects_values() {
        let filter = printers::NAME.in_(["a", "b"]);
        let condition = filter.into_where();
        let (_, cond) = condition.iter().next().unwrap();
        match cond {
            Condition::Operators(set) => {
                assert_eq!(set.in_, Some(vec![json!("a"), json!("b")]));
                assert!(set.eq.is_none());
            }
            other => panic!("unexpected condition {other:?}"),
        }
    }

    #[test]
    fn test_null_helpers() {
        let condition = printers::USER_ID.is_not_null().into_where();
        let (_, cond) = condition.iter().next().unwrap();
        assert!(matches!(
            cond,
            Condition::Operators(OperatorSet { ne: Some(JsonValue::Null), .. })
        ));
    }

    #[test]
    fn test_column_ref_quoting() {
        let mut params = vec![];
        assert_eq!(
            ColumnRef::new(Some("owner"), "createdAt").to_sql(&mut params),
            "\"owner\".\"createdAt\""
        );
    }
}

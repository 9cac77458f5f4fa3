//! Compile-time checked builders over the string-keyed arguments.

use std::marker::PhantomData;

use serde_json::Value as JsonValue;

use crate::{
    expr::{Col, Filter, Rel},
    query::args::{Direction, FindArgs, Include, Includes, OrderBy, WhereCondition},
    value::Row,
};

/// Find options for table `T`.
///
/// # Example
///
/// ```rust
/// use tally_db::{query::{Direction, FindOptions}, schema::{printers, users}};
///
/// let options = FindOptions::new()
///     .filter(users::ROLE.eq("ADMIN"))
///     .select(&[users::ID, users::NAME])
///     .order_by(users::NAME, Direction::Asc)
///     .include(users::PRINTERS, FindOptions::new().select(&[printers::NAME]))
///     .take(10);
/// ```
pub struct FindOptions<T> {
    args: FindArgs,
    filter: Option<Filter<T>>,
    _table: PhantomData<fn() -> T>,
}

impl<T> Default for FindOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FindOptions<T> {
    pub fn new() -> Self {
        Self {
            args: FindArgs::default(),
            filter: None,
            _table: PhantomData,
        }
    }

    /// Adds a condition; repeated calls are AND-ed.
    pub fn filter(mut self, filter: Filter<T>) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    pub fn select(mut self, columns: &[Col<T>]) -> Self {
        let selection = self.args.select.get_or_insert_with(Default::default);
        for col in columns {
            selection.insert(col.name.to_string(), true);
        }
        self
    }

    pub fn order_by(mut self, column: Col<T>, direction: Direction) -> Self {
        self.args
            .order_by
            .get_or_insert_with(OrderBy::default)
            .push(column.name, direction);
        self
    }

    pub fn take(mut self, take: u32) -> Self {
        self.args.take = Some(take);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.args.skip = Some(skip);
        self
    }

    /// Joins `relation`, applying `options` to the related table first.
    pub fn include<R>(mut self, relation: Rel<T, R>, options: FindOptions<R>) -> Self {
        self.args
            .include
            .get_or_insert_with(Includes::default)
            .push(relation.name, Include::Nested(Box::new(options.into_args())));
        self
    }

    /// Joins every column of `relation`.
    pub fn include_all<R>(mut self, relation: Rel<T, R>) -> Self {
        self.args
            .include
            .get_or_insert_with(Includes::default)
            .push(relation.name, Include::Flag(true));
        self
    }

    pub fn into_args(self) -> FindArgs {
        let mut args = self.args;
        if let Some(filter) = self.filter {
            let mut terms: Vec<_> = args
                .where_
                .take()
                .map(|existing| existing.iter().cloned().collect())
                .unwrap_or_default();
            terms.extend(filter.into_where().iter().cloned());
            args.where_ = Some(WhereCondition::from_terms(terms));
        }
        args
    }
}

/// A mutation payload for table `T`.
pub struct Data<T> {
    row: Row,
    _table: PhantomData<fn() -> T>,
}

impl<T> Default for Data<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Data<T> {
    pub fn new() -> Self {
        Self {
            row: Row::new(),
            _table: PhantomData,
        }
    }

    pub fn set(mut self, column: Col<T>, value: impl Into<JsonValue>) -> Self {
        self.row.insert(column.name.to_string(), value.into());
        self
    }

    pub fn into_row(self) -> Row {
        self.row
    }
}

//! Ordering and pagination compiler.

use crate::{
    error::{DbError, Result},
    expr::ColumnRef,
    query::args::OrderBy,
    schema::TableDescriptor,
};

/// Compiles sort keys into `ORDER BY` terms, left to right.
pub(crate) fn compile_order(
    order_by: Option<&OrderBy>,
    table: &TableDescriptor,
    qualifier: Option<&str>,
) -> Result<Vec<String>> {
    let Some(order_by) = order_by else {
        return Ok(Vec::new());
    };

    order_by
        .iter()
        .map(|(column, direction)| {
            if table.column(column).is_none() {
                return Err(DbError::unknown_column(table.name, column));
            }
            let col = ColumnRef::new(qualifier, column).sql();
            Ok(format!("{} {}", col, direction.as_sql()))
        })
        .collect()
}

/// Row window applied after sorting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Window {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Window {
    pub fn new(take: Option<u32>, skip: Option<u32>) -> Self {
        Self {
            limit: take,
            offset: skip,
        }
    }

    /// SQLite only accepts `OFFSET` after a `LIMIT`; a negative limit means unbounded.
    pub fn sql(&self) -> String {
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {} OFFSET {}", limit, offset),
            (Some(limit), None) => format!(" LIMIT {}", limit),
            (None, Some(offset)) => format!(" LIMIT -1 OFFSET {}", offset),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::{users, Table};

    #[test]
    fn test_order_terms() {
        let order: OrderBy =
            serde_json::from_value(json!({ "role": "desc", "name": "asc", "id": null })).unwrap();
        let terms = compile_order(Some(&order), users::Users::descriptor(), Some("users")).unwrap();
        assert_eq!(
            terms,
            vec![
                "\"users\".\"role\" DESC",
                "\"users\".\"name\" ASC",
                "\"users\".\"id\" ASC",
            ]
        );
    }

    #[test]
    fn test_unknown_order_column() {
        let order: OrderBy = serde_json::from_value(json!({ "rank": "desc" })).unwrap();
        assert!(matches!(
            compile_order(Some(&order), users::Users::descriptor(), None),
            Err(DbError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_window_sql() {
        assert_eq!(Window::new(None, None).sql(), "");
        assert_eq!(Window::new(Some(10), None).sql(), " LIMIT 10");
        assert_eq!(Window::new(Some(10), Some(5)).sql(), " LIMIT 10 OFFSET 5");
        assert_eq!(Window::new(None, Some(5)).sql(), " LIMIT -1 OFFSET 5");
    }
}

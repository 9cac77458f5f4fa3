//! Projection compiler: field selection → columns to fetch.

use crate::{
    query::args::Selection,
    schema::{ColumnDef, TableDescriptor},
};

/// Columns of `table` flagged `true` in `selection`, in descriptor order.
///
/// Unknown keys are dropped without error. When nothing is selected, or nothing
/// survives, every column is fetched.
pub(crate) fn compile_select(
    selection: Option<&Selection>,
    table: &TableDescriptor,
) -> Vec<&'static ColumnDef> {
    let selected: Vec<_> = match selection {
        Some(selection) if !selection.is_empty() => table
            .columns
            .iter()
            .filter(|col| selection.get(col.name).copied().unwrap_or(false))
            .collect(),
        _ => Vec::new(),
    };

    if selected.is_empty() {
        table.columns.iter().collect()
    } else {
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{users, Table};

    fn selection(pairs: &[(&str, bool)]) -> Selection {
        pairs
            .iter()
            .map(|(name, flag)| (name.to_string(), *flag))
            .collect()
    }

    fn names(columns: Vec<&'static ColumnDef>) -> Vec<&'static str> {
        columns.into_iter().map(|col| col.name).collect()
    }

    #[test]
    fn test_selected_columns_in_descriptor_order() {
        let sel = selection(&[("email", true), ("id", true), ("role", false)]);
        assert_eq!(
            names(compile_select(Some(&sel), users::Users::descriptor())),
            ["id", "email"]
        );
    }

    #[test]
    fn test_unknown_columns_are_dropped() {
        let sel = selection(&[("name", true), ("nickname", true)]);
        assert_eq!(
            names(compile_select(Some(&sel), users::Users::descriptor())),
            ["name"]
        );
    }

    #[test]
    fn test_falls_back_to_all_columns() {
        let all = users::Users::descriptor().column_names().collect::<Vec<_>>();
        assert_eq!(names(compile_select(None, users::Users::descriptor())), all);

        let empty = Selection::new();
        assert_eq!(
            names(compile_select(Some(&empty), users::Users::descriptor())),
            all
        );

        let nothing_survives = selection(&[("role", false), ("nickname", true)]);
        assert_eq!(
            names(compile_select(Some(&nothing_survives), users::Users::descriptor())),
            all
        );
    }
}

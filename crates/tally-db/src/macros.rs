//! Macros for defining table descriptors.
//!
//! The [`define_table!`] macro generates, for one table, a marker type implementing
//! [`Table`](crate::schema::Table), its static [`TableDescriptor`](crate::schema::TableDescriptor),
//! and typed column and relation constants.

/// Defines a module describing one database table.
///
/// # Syntax
///
/// ```ignore
/// define_table!(
///     printers => Printers {
///         table: "printers",
///         model: "printers",
///         columns: {
///             ID: "id" => Text.primary_key().default(DefaultRule::Uuid),
///             NAME: "name" => Text.not_null(),
///             USER_ID: "userId" => Text.not_null()
///         },
///         relations: {
///             OWNER: "owner" => {
///                 local: "userId",
///                 target: super::users::Users,
///                 referenced: "id"
///             }
///         }
///     }
/// );
/// ```
///
/// This expands to:
///
/// ```ignore
/// pub mod printers {
///     pub struct Printers;
///     pub const TABLE: &str = "printers";
///     pub static DESCRIPTOR: TableDescriptor = /* ... */;
///     impl Table for Printers { /* ... */ }
///
///     pub const ID: Col<Printers> = Col::new("id");
///     pub const NAME: Col<Printers> = Col::new("name");
///     pub const USER_ID: Col<Printers> = Col::new("userId");
///     pub const OWNER: Rel<Printers, super::users::Users> = Rel::new("owner");
/// }
/// ```
///
/// Column modifiers are the `const` builder methods of
/// [`ColumnDef`](crate::schema::ColumnDef). Relation targets are paths relative to the
/// generated module.
#[macro_export]
macro_rules! define_table {
    (
        $module:ident => $marker:ident {
            table: $table:literal,
            model: $model:literal,
            columns: {
                $(
                    $col:ident : $db_col:literal => $ty:ident $( . $modifier:ident ( $($arg:expr),* ) )*
                ),* $(,)?
            },
            relations: {
                $(
                    $rel:ident : $rel_name:literal => {
                        local: $local:literal,
                        target: $target:path,
                        referenced: $referenced:literal $(,)?
                    }
                ),* $(,)?
            } $(,)?
        }
    ) => {
        pub mod $module {
            #[allow(unused_imports)]
            use $crate::{
                expr::{Col, Rel},
                schema::{ColumnDef, ColumnType, DefaultRule, RelationDef, Table, TableDescriptor},
            };

            #[derive(Debug, Clone, Copy, Default)]
            pub struct $marker;

            pub const TABLE: &str = $table;

            pub static DESCRIPTOR: TableDescriptor = TableDescriptor {
                name: $table,
                model: $model,
                columns: &[
                    $(
                        ColumnDef::new($db_col, ColumnType::$ty) $( .$modifier($($arg),*) )*
                    ),*
                ],
                relations: &[
                    $(
                        RelationDef {
                            name: $rel_name,
                            local_field: $local,
                            target: <$target as Table>::descriptor,
                            referenced_field: $referenced,
                        }
                    ),*
                ],
            };

            impl Table for $marker {
                const NAME: &'static str = $table;

                fn descriptor() -> &'static TableDescriptor {
                    &DESCRIPTOR
                }
            }

            $(
                pub const $col: Col<$marker> = Col::new($db_col);
            )*

            $(
                pub const $rel: Rel<$marker, $target> = Rel::new($rel_name);
            )*
        }
    };
}

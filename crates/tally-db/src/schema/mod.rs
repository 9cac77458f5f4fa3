//! Table descriptors.
//!
//! Every entity is described once, at compile time, by a [`TableDescriptor`] generated
//! with [`define_table!`](crate::define_table). The descriptors are `static` and never
//! change after start-up; the query compilers only ever borrow them.

pub mod tables;

pub use tables::*;

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    /// Stored as 0/1, surfaced as a JSON boolean.
    Boolean,
    /// UNIX epoch seconds, stored as INTEGER.
    Timestamp,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer | Self::Boolean | Self::Timestamp => "INTEGER",
            Self::Real => "REAL",
        }
    }
}

/// How a column gets its value when an insert leaves it out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultRule {
    None,
    /// A random UUID generated before the insert is sent to the store.
    Uuid,
    /// `strftime('%s','now')`, evaluated by the store.
    UnixEpoch,
    Text(&'static str),
    Integer(i64),
    Boolean(bool),
}

impl DefaultRule {
    /// SQL `DEFAULT` clause, if the store is responsible for this default.
    fn sql_default(&self) -> Option<String> {
        match self {
            Self::None | Self::Uuid => None,
            Self::UnixEpoch => Some("(strftime('%s','now'))".to_string()),
            Self::Text(value) => Some(format!("'{}'", value.replace('\'', "''"))),
            Self::Integer(value) => Some(value.to_string()),
            Self::Boolean(value) => Some(if *value { "1" } else { "0" }.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub default: DefaultRule,
}

impl ColumnDef {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            nullable: true,
            primary_key: false,
            unique: false,
            default: DefaultRule::None,
        }
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn default(mut self, rule: DefaultRule) -> Self {
        self.default = rule;
        self
    }

    fn ddl(&self) -> String {
        let mut ddl = format!("{} {}", quote_ident(self.name), self.ty.sql_type());
        if self.primary_key {
            ddl.push_str(" PRIMARY KEY");
        }
        if !self.nullable {
            ddl.push_str(" NOT NULL");
        }
        if self.unique {
            ddl.push_str(" UNIQUE");
        }
        if let Some(default) = self.default.sql_default() {
            ddl.push_str(" DEFAULT ");
            ddl.push_str(&default);
        }
        ddl
    }
}

/// A named link from a local field to a field of another table.
#[derive(Debug, Clone, Copy)]
pub struct RelationDef {
    pub name: &'static str,
    pub local_field: &'static str,
    pub target: fn() -> &'static TableDescriptor,
    pub referenced_field: &'static str,
}

impl RelationDef {
    pub fn target(&self) -> &'static TableDescriptor {
        (self.target)()
    }
}

#[derive(Debug)]
pub struct TableDescriptor {
    /// Table name in the store.
    pub name: &'static str,
    /// Name the entity is addressed by across the dispatch boundary.
    pub model: &'static str,
    pub columns: &'static [ColumnDef],
    pub relations: &'static [RelationDef],
}

impl TableDescriptor {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|col| col.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&'static RelationDef> {
        self.relations.iter().find(|rel| rel.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> {
        self.columns.iter().map(|col| col.name)
    }

    pub fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(ColumnDef::ddl)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(self.name),
            columns
        )
    }
}

/// A compile-time handle to one entity's descriptor.
///
/// Implemented by the marker types generated with [`define_table!`](crate::define_table).
pub trait Table: Send + Sync + 'static {
    const NAME: &'static str;

    fn descriptor() -> &'static TableDescriptor;
}

/// Every table known to the registry, in creation order.
pub fn all_tables() -> [&'static TableDescriptor; 3] {
    [
        users::Users::descriptor(),
        printers::Printers::descriptor(),
        invoice_templates::InvoiceTemplates::descriptor(),
    ]
}

/// Looks a table up by store name or model name.
pub fn find_table(name: &str) -> Option<&'static TableDescriptor> {
    all_tables()
        .into_iter()
        .find(|table| table.name == name || table.model == name)
}

/// Quotes an SQL identifier.
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_table_by_name_and_model() {
        assert_eq!(find_table("users").map(|t| t.name), Some("users"));
        assert_eq!(
            find_table("invoiceTemplates").map(|t| t.name),
            Some("invoice_templates")
        );
        assert_eq!(
            find_table("invoice_templates").map(|t| t.model),
            Some("invoiceTemplates")
        );
        assert!(find_table("ghosts").is_none());
    }

    #[test]
    fn test_create_table_sql() {
        let sql = users::Users::descriptor().create_table_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"users\" ("));
        assert!(sql.contains("\"id\" TEXT PRIMARY KEY NOT NULL"));
        assert!(sql.contains("\"email\" TEXT NOT NULL UNIQUE"));
        assert!(sql.contains("\"role\" TEXT DEFAULT 'USER'"));
        assert!(sql.contains("\"createdAt\" INTEGER DEFAULT (strftime('%s','now'))"));

        let sql = printers::Printers::descriptor().create_table_sql();
        assert!(sql.contains("\"isDefault\" INTEGER DEFAULT 0"));
    }

    #[test]
    fn test_relations_resolve_to_existing_columns() {
        for table in all_tables() {
            for relation in table.relations {
                assert!(
                    table.column(relation.local_field).is_some(),
                    "{}.{} has no local field {}",
                    table.name,
                    relation.name,
                    relation.local_field
                );
                assert!(relation.target().column(relation.referenced_field).is_some());
                assert!(table.column(relation.name).is_none());
                assert_ne!(relation.name, table.name);
            }
        }
    }

    #[test]
    fn test_text_default_is_escaped() {
        assert_eq!(
            DefaultRule::Text("O'Brien").sql_default().as_deref(),
            Some("'O''Brien'")
        );
        assert_eq!(DefaultRule::Uuid.sql_default(), None);
    }
}

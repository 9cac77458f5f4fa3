use serde::Serialize;

/// Non-fatal diagnostics raised while compiling or executing a data-access call.
///
/// None of these abort the call that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum DbEvent {
    /// An include referenced a relation the table does not define; it was skipped.
    #[serde(rename_all = "camelCase")]
    UnknownRelation { table: String, relation: String },
    /// A bulk mutation ran without a `where` condition and touched every row.
    #[serde(rename_all = "camelCase")]
    UnboundedMutation {
        table: String,
        operation: MutationKind,
    },
}

impl DbEvent {
    /// Human readable one-line description, used by frontends that render events as text.
    pub fn describe(&self) -> String {
        match self {
            Self::UnknownRelation {
                table,
                relation,
            } => format!("Relation '{relation}' not found on table '{table}'"),
            Self::UnboundedMutation {
                table,
                operation,
            } => format!("{operation} called without where on table {table}"),
        }
    }
}

/// Bulk mutation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    UpdateMany,
    DeleteMany,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpdateMany => write!(f, "updateMany"),
            Self::DeleteMany => write!(f, "deleteMany"),
        }
    }
}

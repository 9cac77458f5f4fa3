//! The query compilers.
//!
//! Declarative find options and mutation payloads are compiled against a
//! [`TableDescriptor`](crate::schema::TableDescriptor) into SQL text plus bound
//! parameters. Nothing here touches the connection except [`plan::Statement`]'s
//! execution helpers.
//!
//! # Submodules
//!
//! - [`args`]: string-keyed arguments as they arrive from the dispatcher.
//! - [`options`]: typed builders over [`args`].
//! - [`clause`]: the predicate compiler.
//! - [`select`]: the projection compiler.
//! - [`order`]: ordering and pagination.
//! - [`include`]: the relation resolver.
//! - [`plan`]: query plans and executable statements.
//! - [`mutation`]: INSERT/UPDATE/DELETE/COUNT statements.

pub mod args;
pub(crate) mod clause;
pub(crate) mod include;
pub(crate) mod mutation;
pub mod options;
pub(crate) mod order;
pub(crate) mod plan;
pub(crate) mod select;

pub use args::{
    Condition, CreateArgs, DeleteArgs, Direction, FilterArgs, FindArgs, Include, Includes,
    OperatorSet, OrderBy, Selection, UpdateAllArgs, UpdateArgs, UpdateManyArgs, UpsertArgs,
    WhereCondition,
};
pub use options::{Data, FindOptions};

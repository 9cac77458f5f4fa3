//! Descriptor-driven data access over an embedded SQLite store.
//!
//! Tables are described once with [`define_table!`]. From those descriptors the query
//! compilers turn declarative find options (filters, projections, ordering, pagination
//! and relation includes) into SQL, and every table gets the same set of operations
//! through [`ModelClient`]. [`DbClient`] binds one client per table and routes
//! string-addressed calls for [`dispatch::handle`].

pub mod client;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod expr;
pub mod macros;
pub mod query;
pub mod registry;
pub mod schema;
pub mod seed;
pub mod traits;
pub mod value;

pub use client::{ModelClient, TableClient};
pub use connection::Database;
pub use dispatch::{handle, DbCall, ErrorEnvelope, Method};
pub use error::{DbError, ErrorKind, Result};
pub use query::{Data, Direction, FindArgs, FindOptions};
pub use registry::DbClient;
pub use seed::{seed, SeedSummary};
pub use value::Row;

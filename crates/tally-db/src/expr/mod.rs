//! Expression types for building SQL conditions.
//!
//! This module contains the building blocks of query filters: typed column and relation
//! handles for the compile-time checked API, and the operator fragments the predicate
//! compiler renders.

pub mod column;
pub mod ops;

pub use column::{Col, ColumnRef, Filter, Rel};
pub use ops::{BinaryOp, InOp, NullOp};

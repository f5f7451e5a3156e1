//! Fluent query builder over a `RecordStore`.
//!
//! # Responsibility
//! - Accumulate includes, filters and one deferred operation per builder.
//! - Merge filters and execute the bound operation on `run`.
//!
//! # Invariants
//! - Builders are immutable; every configuration call returns a new builder.
//! - `run` without a bound operation fails before touching the store.
//! - Store errors reach the caller unchanged inside `QueryError::Store`.

use crate::model::entity::EntityType;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod builder;
mod chain;
pub mod merge;
pub mod operation;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug)]
pub enum QueryError {
    /// `run` or `plan` called before a terminal method such as `read`.
    UnboundOperation { target: EntityType },
    /// Failure raised by the store, including `RelationNotFound`.
    Store(StoreError),
}

impl QueryError {
    /// Stable code used in `error_code=` log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnboundOperation { .. } => "unbound_operation",
            Self::Store(err) => err.code(),
        }
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnboundOperation { target } => write!(
                f,
                "no operation bound on {target} query; call a terminal method such as read() first"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnboundOperation { .. } => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for QueryError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

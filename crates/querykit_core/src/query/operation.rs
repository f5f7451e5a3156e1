//! Deferred query operations and the plans built around them.

use crate::model::entity::EntityType;
use crate::model::record::{Filter, Record, RecordId};
use crate::query::QueryResult;
use crate::store::{FindOne, RecordStore};
use serde::Serialize;

/// Query action bound by a terminal builder call and dispatched on `run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PendingOperation {
    /// Fetch one record by primary key, narrowed by the merged filter.
    ReadById { id: RecordId },
}

impl PendingOperation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReadById { .. } => "read_by_id",
        }
    }
}

/// Fully resolved query: what `run` hands to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub target: EntityType,
    pub operation: PendingOperation,
    pub includes: Vec<EntityType>,
    pub filter: Filter,
}

impl QueryPlan {
    /// Executes the plan with exactly one store call.
    pub fn execute<S>(&self, store: &S) -> QueryResult<Option<Record>>
    where
        S: RecordStore + ?Sized,
    {
        match &self.operation {
            PendingOperation::ReadById { id } => {
                let request = FindOne {
                    target: self.target,
                    id,
                    filter: &self.filter,
                    includes: &self.includes,
                };
                let handle = store.find_one(&request)?;
                Ok(handle.map(|handle| handle.snapshot()))
            }
        }
    }
}

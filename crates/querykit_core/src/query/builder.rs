//! Immutable query builder.
//!
//! # Invariants
//! - `includes` keep call order and duplicates.
//! - `filters` are append-only and merged in call order at plan time.
//! - `read` overwrites any previously bound operation.

use super::chain::Chain;
use super::merge::merge_filters;
use super::operation::{PendingOperation, QueryPlan};
use super::{QueryError, QueryResult};
use crate::model::entity::EntityType;
use crate::model::record::{Filter, Record, RecordId};
use crate::store::RecordStore;
use log::{debug, error};
use std::fmt::{Debug, Formatter};
use std::time::Instant;

/// Query under construction for one target entity.
///
/// Configuration methods take `&self` and return a new builder, so a base
/// query can be branched into differently filtered queries:
///
/// ```ignore
/// let base = QueryBuilder::new(&store, USER).with(POST);
/// let named = base.filter(by_name).read(id.clone());
/// let everyone = base.read(id);
/// ```
pub struct QueryBuilder<'s, S: ?Sized> {
    store: &'s S,
    target: EntityType,
    includes: Chain<EntityType>,
    filters: Chain<Filter>,
    operation: Option<PendingOperation>,
}

impl<'s, S> QueryBuilder<'s, S>
where
    S: RecordStore + ?Sized,
{
    pub fn new(store: &'s S, target: EntityType) -> Self {
        Self {
            store,
            target,
            includes: Chain::new(),
            filters: Chain::new(),
            operation: None,
        }
    }

    pub fn target(&self) -> EntityType {
        self.target
    }

    /// Includes accumulated so far, in call order.
    pub fn includes(&self) -> Vec<EntityType> {
        self.includes.ordered().into_iter().copied().collect()
    }

    /// Filters accumulated so far, unmerged, in call order.
    pub fn filters(&self) -> Vec<&Filter> {
        self.filters.ordered()
    }

    pub fn operation(&self) -> Option<&PendingOperation> {
        self.operation.as_ref()
    }

    /// Requests eager loading of `relation`.
    ///
    /// Not checked here; the store rejects relations the target does not
    /// declare with `RelationNotFound`.
    pub fn with(&self, relation: EntityType) -> Self {
        Self {
            includes: self.includes.push(relation),
            ..self.clone()
        }
    }

    /// Narrows the query by a partial predicate map.
    pub fn filter(&self, filter: Filter) -> Self {
        Self {
            filters: self.filters.push(filter),
            ..self.clone()
        }
    }

    /// Binds the "fetch one record by id" operation.
    pub fn read(&self, id: impl Into<RecordId>) -> Self {
        Self {
            operation: Some(PendingOperation::ReadById { id: id.into() }),
            ..self.clone()
        }
    }

    /// Resolves the plan `run` would execute, without touching the store.
    pub fn plan(&self) -> QueryResult<QueryPlan> {
        let operation = self
            .operation
            .clone()
            .ok_or(QueryError::UnboundOperation {
                target: self.target,
            })?;

        Ok(QueryPlan {
            target: self.target,
            operation,
            includes: self.includes(),
            filter: merge_filters(self.filters.ordered()),
        })
    }

    /// Executes the bound operation.
    ///
    /// Returns `Ok(None)` when no record matches. Calling `run` again
    /// re-executes the query.
    pub fn run(&self) -> QueryResult<Option<Record>> {
        let started_at = Instant::now();
        let result = self.plan().and_then(|plan| {
            debug!(
                "event=query_run module=query status=start target={} op={} includes={} filter_keys={}",
                plan.target,
                plan.operation.kind(),
                plan.includes.len(),
                plan.filter.len()
            );
            plan.execute(self.store)
        });

        match &result {
            Ok(record) => debug!(
                "event=query_run module=query status=ok target={} found={} duration_ms={}",
                self.target,
                record.is_some(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=query_run module=query status=error target={} duration_ms={} error_code={} error={}",
                self.target,
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }

        result
    }
}

impl<S: ?Sized> Clone for QueryBuilder<'_, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            target: self.target,
            includes: self.includes.clone(),
            filters: self.filters.clone(),
            operation: self.operation.clone(),
        }
    }
}

impl<S: ?Sized> Debug for QueryBuilder<'_, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("target", &self.target)
            .field("includes", &self.includes.ordered())
            .field("filters", &self.filters.len())
            .field("operation", &self.operation)
            .finish()
    }
}

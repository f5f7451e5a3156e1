//! User query facade with named include helpers.

use crate::model::blog::{COMMENT, POST, STORY, USER};
use crate::model::entity::EntityType;
use crate::model::record::{Filter, Record, RecordId};
use crate::query::builder::QueryBuilder;
use crate::query::operation::QueryPlan;
use crate::query::QueryResult;
use crate::store::RecordStore;

/// Query over `User` records. Immutable like the builder it wraps.
pub struct UserQuery<'s, S: ?Sized> {
    inner: QueryBuilder<'s, S>,
}

impl<'s, S> UserQuery<'s, S>
where
    S: RecordStore + ?Sized,
{
    pub fn new(store: &'s S) -> Self {
        Self {
            inner: QueryBuilder::new(store, USER),
        }
    }

    pub fn with_posts(&self) -> Self {
        self.with(POST)
    }

    pub fn with_comments(&self) -> Self {
        self.with(COMMENT)
    }

    pub fn with_stories(&self) -> Self {
        self.with(STORY)
    }

    pub fn with(&self, relation: EntityType) -> Self {
        Self {
            inner: self.inner.with(relation),
        }
    }

    pub fn filter(&self, filter: Filter) -> Self {
        Self {
            inner: self.inner.filter(filter),
        }
    }

    pub fn read(&self, id: impl Into<RecordId>) -> Self {
        Self {
            inner: self.inner.read(id),
        }
    }

    pub fn plan(&self) -> QueryResult<QueryPlan> {
        self.inner.plan()
    }

    pub fn run(&self) -> QueryResult<Option<Record>> {
        self.inner.run()
    }
}

impl<S: ?Sized> Clone for UserQuery<'_, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

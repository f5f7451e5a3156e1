//! Fluent repository queries over a SQLite blog store.
//!
//! A `QueryBuilder` accumulates includes and filters for one entity, binds a
//! deferred operation with `read`, and executes it once per `run` against a
//! `RecordStore`.

pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod seed;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::blog::{blog_schema, COMMENT, POST, STORY, USER};
pub use model::entity::{EntityDef, EntityType, Relation, RelationKind, Schema};
pub use model::record::{Filter, Record, RecordId};
pub use query::builder::QueryBuilder;
pub use query::merge::merge_filters;
pub use query::operation::{PendingOperation, QueryPlan};
pub use query::{QueryError, QueryResult};
pub use seed::{seed_blog, seed_blog_with_rng, SeedSummary, DEFAULT_SEED_ROWS, MAX_SEED_ROWS};
pub use service::user_query::UserQuery;
pub use store::{
    FindOne, Included, RecordHandle, RecordStore, SqliteRecordStore, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

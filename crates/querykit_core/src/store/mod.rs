//! Record store contract consumed by the query layer.
//!
//! # Responsibility
//! - Define the single read primitive (`find_one`) a bound query invokes.
//! - Define the fetched-record handle and its plain snapshot form.
//!
//! # Invariants
//! - Stores validate includes against the schema before reading rows.
//! - A missing record is `Ok(None)`, not an error.

use crate::db::DbError;
use crate::model::entity::EntityType;
use crate::model::record::{Filter, Record};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod predicate;
pub mod sqlite;

pub use sqlite::SqliteRecordStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    UnknownEntity(EntityType),
    /// An include is not declared as a relation of the target entity.
    RelationNotFound {
        target: EntityType,
        relation: EntityType,
    },
    InvalidFilter(String),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl StoreError {
    /// Stable code used in `error_code=` log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(err) => err.code(),
            Self::UnknownEntity(_) => "unknown_entity",
            Self::RelationNotFound { .. } => "relation_not_found",
            Self::InvalidFilter(_) => "invalid_filter",
            Self::InvalidData(_) => "invalid_data",
            Self::MissingRequiredTable(_) => "missing_table",
            Self::MissingRequiredColumn { .. } => "missing_column",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UnknownEntity(entity) => write!(f, "entity {entity} is not in the schema"),
            Self::RelationNotFound { target, relation } => {
                write!(f, "{relation} is not associated to {target}")
            }
            Self::InvalidFilter(message) => write!(f, "invalid filter: {message}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One "fetch by id" request.
#[derive(Debug, Clone, Copy)]
pub struct FindOne<'a> {
    pub target: EntityType,
    pub id: &'a str,
    /// Merged filter; conjoined with the id match.
    pub filter: &'a Filter,
    /// Relations to eager load, in request order.
    pub includes: &'a [EntityType],
}

/// Read primitive the query layer executes against.
pub trait RecordStore {
    fn find_one(&self, request: &FindOne<'_>) -> StoreResult<Option<RecordHandle>>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn find_one(&self, request: &FindOne<'_>) -> StoreResult<Option<RecordHandle>> {
        (**self).find_one(request)
    }
}

/// Records loaded for one include.
#[derive(Debug, Clone, PartialEq)]
pub enum Included {
    Many(Vec<Record>),
    One(Option<Record>),
}

impl Included {
    fn into_value(self) -> Value {
        match self {
            Self::Many(records) => Value::Array(records.into_iter().map(Value::Object).collect()),
            Self::One(Some(record)) => Value::Object(record),
            Self::One(None) => Value::Null,
        }
    }
}

/// A fetched record with its eager-loaded includes.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordHandle {
    entity: EntityType,
    fields: Record,
    includes: Vec<(String, Included)>,
}

impl RecordHandle {
    pub fn new(entity: EntityType, fields: Record) -> Self {
        Self {
            entity,
            fields,
            includes: Vec::new(),
        }
    }

    /// Attaches loaded records under `alias`.
    pub fn with_included(mut self, alias: impl Into<String>, included: Included) -> Self {
        self.includes.push((alias.into(), included));
        self
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn fields(&self) -> &Record {
        &self.fields
    }

    /// Flattens the record and its includes into one plain map.
    ///
    /// Includes are nested under their alias; a repeated alias keeps the
    /// last loaded value.
    pub fn snapshot(&self) -> Record {
        let mut record = self.fields.clone();
        for (alias, included) in &self.includes {
            record.insert(alias.clone(), included.clone().into_value());
        }
        record
    }
}

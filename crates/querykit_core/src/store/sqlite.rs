//! SQLite-backed record store.
//!
//! # Responsibility
//! - Execute `find_one` requests against tables described by a `Schema`.
//! - Eager load declared relations into the returned handle.
//!
//! # Invariants
//! - Includes are resolved against the schema before any row is read.
//! - The primary row and its includes are read inside one transaction when
//!   the connection is not already in one.
//! - Table and column names in SQL text come from the schema only.

use super::predicate::{build_where, scalar_to_sql, WhereClause};
use super::{FindOne, Included, RecordHandle, RecordStore, StoreError, StoreResult};
use crate::model::entity::{EntityDef, EntityType, Relation, RelationKind, Schema, PRIMARY_KEY};
use crate::model::record::Record;
use log::{debug, error};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, Row};
use serde_json::{Number, Value};
use std::time::Instant;

/// Record store reading through a borrowed SQLite connection.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
    schema: &'conn Schema,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Constructs a store after checking every schema table and column exists.
    pub fn try_new(conn: &'conn Connection, schema: &'conn Schema) -> StoreResult<Self> {
        ensure_schema_ready(conn, schema)?;
        Ok(Self { conn, schema })
    }

    fn entity_def(&self, entity: EntityType) -> StoreResult<&'conn EntityDef> {
        self.schema
            .entity(entity)
            .ok_or(StoreError::UnknownEntity(entity))
    }

    fn resolve_includes(
        &self,
        def: &EntityDef,
        includes: &[EntityType],
    ) -> StoreResult<Vec<(&'conn Relation, &'conn EntityDef)>> {
        let schema: &'conn Schema = self.schema;
        includes
            .iter()
            .map(|include| -> StoreResult<(&'conn Relation, &'conn EntityDef)> {
                let relation =
                    schema
                        .relation(def.entity, *include)
                        .ok_or(StoreError::RelationNotFound {
                            target: def.entity,
                            relation: *include,
                        })?;
                Ok((relation, self.entity_def(relation.target)?))
            })
            .collect()
    }

    fn find_one_inner(&self, request: &FindOne<'_>) -> StoreResult<Option<RecordHandle>> {
        let def = self.entity_def(request.target)?;
        let relations = self.resolve_includes(def, request.includes)?;
        let clause = build_where(def, request.id, request.filter)?;

        let tx = if self.conn.is_autocommit() {
            Some(self.conn.unchecked_transaction()?)
        } else {
            None
        };

        let Some(fields) = select_first(self.conn, def, &clause)? else {
            return Ok(None);
        };

        let mut handle = RecordHandle::new(def.entity, fields);
        for (relation, related) in relations {
            let included = load_relation(self.conn, handle.fields(), relation, related)?;
            handle = handle.with_included(relation.alias, included);
        }

        if let Some(tx) = tx {
            tx.commit()?;
        }
        Ok(Some(handle))
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn find_one(&self, request: &FindOne<'_>) -> StoreResult<Option<RecordHandle>> {
        let started_at = Instant::now();
        let result = self.find_one_inner(request);

        match &result {
            Ok(handle) => debug!(
                "event=store_find_one module=store status=ok target={} includes={} found={} duration_ms={}",
                request.target,
                request.includes.len(),
                handle.is_some(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=store_find_one module=store status=error target={} duration_ms={} error_code={} error={}",
                request.target,
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }

        result
    }
}

fn select_first(
    conn: &Connection,
    def: &EntityDef,
    clause: &WhereClause,
) -> StoreResult<Option<Record>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} LIMIT 1;",
        def.columns.join(", "),
        def.table,
        clause.sql
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(clause.binds.iter()))?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_row(row, def)?)),
        None => Ok(None),
    }
}

fn load_relation(
    conn: &Connection,
    parent: &Record,
    relation: &Relation,
    related: &EntityDef,
) -> StoreResult<Included> {
    match relation.kind {
        RelationKind::HasMany => {
            let parent_id = key_value(parent, PRIMARY_KEY)?;
            let sql = format!(
                "SELECT {} FROM {} WHERE {} = ?1 ORDER BY rowid ASC;",
                related.columns.join(", "),
                related.table,
                relation.foreign_key
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([parent_id])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(parse_row(row, related)?);
            }
            Ok(Included::Many(records))
        }
        RelationKind::BelongsTo => {
            let foreign_id = key_value(parent, relation.foreign_key)?;
            if foreign_id == SqlValue::Null {
                return Ok(Included::One(None));
            }
            let clause = WhereClause {
                sql: format!("{PRIMARY_KEY} = ?"),
                binds: vec![foreign_id],
            };
            Ok(Included::One(select_first(conn, related, &clause)?))
        }
    }
}

fn key_value(record: &Record, column: &str) -> StoreResult<SqlValue> {
    let value = record.get(column).ok_or_else(|| {
        StoreError::InvalidData(format!("column `{column}` missing from fetched row"))
    })?;
    scalar_to_sql(column, value).map_err(|_| {
        StoreError::InvalidData(format!("column `{column}` holds a non-scalar key"))
    })
}

fn parse_row(row: &Row<'_>, def: &EntityDef) -> StoreResult<Record> {
    let mut record = Record::new();
    for (index, column) in def.columns.iter().enumerate() {
        let value = match row.get_ref(index)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(integer) => Value::from(integer),
            ValueRef::Real(real) => Number::from_f64(real).map(Value::Number).ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "non-finite real in {}.{column}",
                    def.table
                ))
            })?,
            ValueRef::Text(bytes) => Value::String(
                std::str::from_utf8(bytes)
                    .map_err(|_| {
                        StoreError::InvalidData(format!(
                            "non utf-8 text in {}.{column}",
                            def.table
                        ))
                    })?
                    .to_string(),
            ),
            ValueRef::Blob(_) => {
                return Err(StoreError::InvalidData(format!(
                    "blob value in {}.{column} cannot be snapshotted",
                    def.table
                )));
            }
        };
        record.insert((*column).to_string(), value);
    }
    Ok(record)
}

fn ensure_schema_ready(conn: &Connection, schema: &Schema) -> StoreResult<()> {
    for def in schema.entities() {
        if !table_exists(conn, def.table)? {
            return Err(StoreError::MissingRequiredTable(def.table));
        }
        for column in def.columns.iter().copied() {
            if !table_has_column(conn, def.table, column)? {
                return Err(StoreError::MissingRequiredColumn {
                    table: def.table,
                    column,
                });
            }
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

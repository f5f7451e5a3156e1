//! Entity handles and the schema registry.
//!
//! # Responsibility
//! - Provide cheap, copyable handles for queryable collections.
//! - Map each handle to its table, columns and declared relations.
//!
//! # Invariants
//! - A schema holds at most one definition per entity.
//! - Relation lookup is by target entity; the first declaration wins.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Column every entity uses as its primary key.
pub const PRIMARY_KEY: &str = "id";

/// Opaque handle to a queryable collection such as `User` or `Post`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityType(&'static str);

impl EntityType {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(self) -> &'static str {
        self.0
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Cardinality of a declared relation, seen from the declaring entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Related rows carry `foreign_key` pointing at this entity's `id`.
    HasMany,
    /// This entity carries `foreign_key` pointing at the related row's `id`.
    BelongsTo,
}

/// Association from one entity to another, used for eager loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub target: EntityType,
    pub kind: RelationKind,
    /// Key the included records appear under in a snapshot.
    pub alias: &'static str,
    pub foreign_key: &'static str,
}

/// Storage layout of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDef {
    pub entity: EntityType,
    pub table: &'static str,
    /// Selectable columns, primary key first.
    pub columns: &'static [&'static str],
    pub relations: Vec<Relation>,
}

impl EntityDef {
    pub fn new(
        entity: EntityType,
        table: &'static str,
        columns: &'static [&'static str],
    ) -> Self {
        Self {
            entity,
            table,
            columns,
            relations: Vec::new(),
        }
    }

    /// Declares a one-to-many relation; `foreign_key` lives on `target`.
    pub fn has_many(
        mut self,
        target: EntityType,
        alias: &'static str,
        foreign_key: &'static str,
    ) -> Self {
        self.relations.push(Relation {
            target,
            kind: RelationKind::HasMany,
            alias,
            foreign_key,
        });
        self
    }

    /// Declares a many-to-one relation; `foreign_key` lives on this entity.
    pub fn belongs_to(
        mut self,
        target: EntityType,
        alias: &'static str,
        foreign_key: &'static str,
    ) -> Self {
        self.relations.push(Relation {
            target,
            kind: RelationKind::BelongsTo,
            alias,
            foreign_key,
        });
        self
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|known| *known == column)
    }

    pub fn relation_to(&self, target: EntityType) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|relation| relation.target == target)
    }
}

/// Registry mapping entity handles to their definitions.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: BTreeMap<EntityType, EntityDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `def`, replacing any earlier definition of the same entity.
    pub fn define(mut self, def: EntityDef) -> Self {
        self.entities.insert(def.entity, def);
        self
    }

    pub fn entity(&self, entity: EntityType) -> Option<&EntityDef> {
        self.entities.get(&entity)
    }

    /// Finds the relation declared on `from` that includes `to`.
    pub fn relation(&self, from: EntityType, to: EntityType) -> Option<&Relation> {
        self.entity(from).and_then(|def| def.relation_to(to))
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityDef> {
        self.entities.values()
    }
}

//! Entity handles, relation declarations and record shapes.
//!
//! # Responsibility
//! - Name queryable collections (`EntityType`) and the relations between them.
//! - Define the plain map shapes used for filters and fetched records.
//!
//! # Invariants
//! - Every entity exposes a text primary key column named `id`.
//! - Relations are declared once, on the entity they are included from.

pub mod blog;
pub mod entity;
pub mod record;
